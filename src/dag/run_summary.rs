// src/dag/run_summary.rs

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dag::task_info::TaskRunState;
use crate::engine::TaskName;

/// Terminal record of one DAG run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub dag_id: String,
    pub run_id: u64,
    /// Final state of every task.
    pub states: BTreeMap<TaskName, TaskRunState>,
    /// Failure messages of failed tasks.
    pub errors: BTreeMap<TaskName, String>,
    /// Structured task outputs (load statistics, checkpoint reports, ...).
    pub outputs: BTreeMap<TaskName, serde_json::Value>,
    /// True when every leaf task succeeded.
    pub succeeded: bool,
}

impl RunSummary {
    pub fn state_of(&self, task: &str) -> Option<TaskRunState> {
        self.states.get(task).copied()
    }

    pub fn tasks_in_state(&self, state: TaskRunState) -> Vec<&str> {
        self.states
            .iter()
            .filter(|(_, s)| **s == state)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
