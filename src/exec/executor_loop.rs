// src/exec/executor_loop.rs

//! Main executor loop that manages running task instances.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::exec::task_runner::run_task;
use crate::services::Services;

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<ScheduledTask>` is what
/// `OperatorExecutorBackend` sends to. Each scheduled task runs in its own
/// Tokio task, so tasks dispatched in the same step (the two validation
/// checks) run in parallel. Per `(task, run_id)` there is never more than
/// one instance running; a duplicate dispatch is ignored.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    services: Arc<Services>,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        let mut active: HashMap<(String, u64), tokio::task::JoinHandle<()>> = HashMap::new();

        while let Some(task) = rx.recv().await {
            active.retain(|_, handle| !handle.is_finished());
            handle_scheduled_task(task, &mut active, &runtime_tx, &services);
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}

fn handle_scheduled_task(
    task: ScheduledTask,
    active: &mut HashMap<(String, u64), tokio::task::JoinHandle<()>>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
    services: &Arc<Services>,
) {
    let key = (task.name.clone(), task.run_id);

    if active.contains_key(&key) {
        warn!(
            task = %task.name,
            run_id = task.run_id,
            "task instance already running; ignoring duplicate dispatch"
        );
        return;
    }

    let rt_tx = runtime_tx.clone();
    let services = Arc::clone(services);
    let spawn_name = task.name.clone();

    let handle = tokio::spawn(async move {
        run_task(task, services, rt_tx).await;
        debug!(task = %spawn_name, "task runner future finished");
    });

    active.insert(key, handle);
}
