// src/dag/task_info.rs

//! Task metadata and per-run state.

use serde::Serialize;

use crate::dag::definition::TaskNode;
use crate::dag::operator::Operator;
use crate::engine::TaskName;
use crate::types::TriggerRule;

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Part of this run, waiting on its predecessors.
    Pending,
    /// Dispatched to the executor.
    Running,
    Success,
    Failed,
    /// Not executed because its trigger rule can no longer be met.
    Skipped,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Success | RunState::Failed | RunState::Skipped)
    }
}

/// Public, read-only view of a task's per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskRunState {
    /// The task is not participating in an active run.
    NotInRun,
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
}

impl TaskRunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskRunState::Success | TaskRunState::Failed | TaskRunState::Skipped
        )
    }
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::Success) => TaskRunState::Success,
            Some(RunState::Failed) => TaskRunState::Failed,
            Some(RunState::Skipped) => TaskRunState::Skipped,
        }
    }
}

/// Static task information derived from the definition, plus per-run state.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    pub operator: Operator,
    pub trigger_rule: TriggerRule,
    /// Direct predecessors.
    pub deps: Vec<TaskName>,

    /// Per-run state (None if not participating in the current run).
    pub run_state: Option<RunState>,
    /// Failure message recorded in the current run.
    pub error: Option<String>,
    /// Structured output recorded in the current run (e.g. a checkpoint report).
    pub output: Option<serde_json::Value>,
}

impl TaskInfo {
    pub fn from_node(node: &TaskNode, deps: Vec<TaskName>) -> Self {
        Self {
            name: node.id.clone(),
            operator: node.operator.clone(),
            trigger_rule: node.trigger_rule,
            deps,
            run_state: None,
            error: None,
            output: None,
        }
    }

    /// Forget everything recorded for the previous run.
    pub fn reset_for_run(&mut self) {
        self.run_state = Some(RunState::Pending);
        self.error = None;
        self.output = None;
    }
}

/// Description of a task that the scheduler wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub operator: Operator,
    /// Monotonically increasing DAG run identifier.
    ///
    /// All tasks that belong to the same DAG run share the same `run_id`.
    pub run_id: u64,
}

impl ScheduledTask {
    pub fn from_task_info(info: &TaskInfo, run_id: u64) -> Self {
        Self {
            name: info.name.clone(),
            operator: info.operator.clone(),
            run_id,
        }
    }
}
