// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::run_summary::RunSummary;
use crate::dag::task_info::ScheduledTask;
use crate::engine::TaskName;

/// Structured result of a single scheduler "step".
///
/// This is useful for tests that want to manually step the DAG and make
/// assertions about what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks that were newly marked as failed in this step.
    pub newly_failed: Vec<TaskName>,
    /// Tasks that were newly skipped because their trigger rule can no
    /// longer be met.
    pub newly_skipped: Vec<TaskName>,
    /// Set when this step finished the current run (the scheduler is now idle).
    pub finished_run: Option<RunSummary>,
}

impl SchedulerStep {
    pub fn run_just_finished(&self) -> bool {
        self.finished_run.is_some()
    }
}
