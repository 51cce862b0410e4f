// src/exec/task_runner.rs

//! Individual task runner.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::exec::operators::execute;
use crate::services::Services;

/// Run a single task's operator on the blocking pool and emit a
/// `TaskCompleted` event with its outcome.
///
/// Operator errors (and panics) become `TaskOutcome::Failed` carrying the
/// error message.
pub async fn run_task(
    task: ScheduledTask,
    services: Arc<Services>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let task_name = task.name.clone();
    let run_id = task.run_id;
    if let Err(err) = run_task_inner(task, services, &runtime_tx).await {
        error!(
            task = %task_name,
            run_id,
            error = %err,
            "task execution error"
        );
    }
}

async fn run_task_inner(
    task: ScheduledTask,
    services: Arc<Services>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) -> Result<()> {
    let kind = task.operator.kind();
    info!(
        task = %task.name,
        run_id = task.run_id,
        %kind,
        "starting task"
    );

    let started = Instant::now();
    let name = task.name.clone();
    let operator = task.operator.clone();
    let joined =
        tokio::task::spawn_blocking(move || execute(&name, &operator, &services)).await;

    let (outcome, output) = match joined {
        Ok(Ok(output)) => {
            info!(
                task = %task.name,
                run_id = task.run_id,
                %kind,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "task succeeded"
            );
            (TaskOutcome::Success, output)
        }
        Ok(Err(err)) => {
            let reason = format!("{err:#}");
            warn!(
                task = %task.name,
                run_id = task.run_id,
                %kind,
                error = %reason,
                "task failed"
            );
            (TaskOutcome::Failed(reason), None)
        }
        Err(join_err) => {
            let reason = format!("task panicked: {join_err}");
            error!(task = %task.name, run_id = task.run_id, "{reason}");
            (TaskOutcome::Failed(reason), None)
        }
    };

    runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.name.clone(),
            run_id: task.run_id,
            outcome,
            output,
        })
        .await
        .with_context(|| {
            format!(
                "sending TaskCompleted event for task '{}' to runtime",
                task.name
            )
        })?;

    Ok(())
}
