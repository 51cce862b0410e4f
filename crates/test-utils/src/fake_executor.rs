use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use qualitydag::dag::ScheduledTask;
use qualitydag::engine::{RuntimeEvent, TaskOutcome};
use qualitydag::errors::Result;
use qualitydag::exec::ExecutorBackend;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records which tasks were "run", with their run id
/// - immediately reports `TaskCompleted` for each scheduled task: success,
///   unless the task was registered with [`FakeExecutor::failing`].
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<(String, u64)>>>,
    failures: HashMap<String, String>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<(String, u64)>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            failures: HashMap::new(),
        }
    }

    /// Make every run of `task` fail with `reason`.
    pub fn failing(mut self, task: &str, reason: &str) -> Self {
        self.failures.insert(task.to_string(), reason.to_string());
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failures = self.failures.clone();

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push((t.name.clone(), t.run_id));
                }

                let outcome = match failures.get(&t.name) {
                    Some(reason) => TaskOutcome::Failed(reason.clone()),
                    None => TaskOutcome::Success,
                };

                tx.send(RuntimeEvent::TaskCompleted {
                    task: t.name.clone(),
                    run_id: t.run_id,
                    outcome,
                    output: None,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}

/// Names of executed tasks, in dispatch order.
pub fn executed_names(executed: &Arc<Mutex<Vec<(String, u64)>>>) -> Vec<String> {
    executed
        .lock()
        .unwrap()
        .iter()
        .map(|(name, _)| name.clone())
        .collect()
}
