// src/dag/state_manager.rs

//! Per-run state transitions for tasks in the scheduler.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo};
use crate::engine::TaskName;
use crate::types::TriggerRule;

/// What a pending task's trigger rule says about it right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Predecessors not settled yet.
    Wait,
    /// May be dispatched.
    Ready,
    /// Can never run in this run.
    Skip,
}

/// Manages per-run state transitions for tasks.
pub struct StateManager<'a> {
    graph: &'a DagGraph,
    tasks: &'a mut HashMap<TaskName, TaskInfo>,
    current_run_id: Option<u64>,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a DagGraph,
        tasks: &'a mut HashMap<TaskName, TaskInfo>,
        current_run_id: Option<u64>,
    ) -> Self {
        Self {
            graph,
            tasks,
            current_run_id,
        }
    }

    /// Put every task of the graph into `Pending` for a fresh run.
    pub fn mark_all_pending(&mut self) {
        for name in self.graph.tasks() {
            if let Some(info) = self.tasks.get_mut(name) {
                info.reset_for_run();
            } else {
                warn!(task = %name, "node in DAG not present in tasks map");
            }
        }
    }

    /// Skip every pending task whose trigger rule can no longer be met,
    /// repeating until nothing changes (a skip can cascade downstream).
    ///
    /// Returns the newly skipped tasks in the order they were skipped.
    pub fn propagate_skips(&mut self) -> Vec<TaskName> {
        let mut skipped = Vec::new();

        loop {
            let to_skip: Vec<TaskName> = self
                .graph
                .tasks()
                .filter(|name| {
                    self.tasks.get(*name).is_some_and(|info| {
                        info.run_state == Some(RunState::Pending)
                            && ReadOnlyStateManager::new(self.tasks).readiness_of(info)
                                == Readiness::Skip
                    })
                })
                .map(str::to_string)
                .collect();

            if to_skip.is_empty() {
                break;
            }

            for name in to_skip {
                if let Some(info) = self.tasks.get_mut(&name) {
                    info.run_state = Some(RunState::Skipped);
                    debug!(
                        task = %info.name,
                        run_id = self.current_run_id,
                        trigger_rule = %info.trigger_rule,
                        "upstream did not succeed; skipping task"
                    );
                    skipped.push(name);
                }
            }
        }

        skipped
    }

    /// Collect tasks that are `Pending` and whose trigger rule is met, mark
    /// them as `Running`, and return them as `ScheduledTask`s.
    pub fn collect_new_ready_tasks(&mut self) -> Vec<ScheduledTask> {
        let mut ready = Vec::new();

        // Decide first, then mutate to avoid borrowing issues.
        let candidates: Vec<TaskName> = self
            .graph
            .tasks()
            .filter(|name| {
                self.tasks.get(*name).is_some_and(|info| {
                    info.run_state == Some(RunState::Pending)
                        && ReadOnlyStateManager::new(self.tasks).readiness_of(info)
                            == Readiness::Ready
                })
            })
            .map(str::to_string)
            .collect();

        for name in candidates {
            if let Some(info) = self.tasks.get_mut(&name) {
                info!(
                    task = %info.name,
                    run_id = self.current_run_id,
                    operator = %info.operator.kind(),
                    trigger_rule = %info.trigger_rule,
                    "trigger rule met; scheduling task"
                );

                info.run_state = Some(RunState::Running);
                ready.push(ScheduledTask::from_task_info(
                    info,
                    self.current_run_id.unwrap_or(0),
                ));
            }
        }

        ready
    }

    /// Check if all tasks are in a terminal state.
    pub fn all_tasks_terminal(&self) -> bool {
        self.tasks
            .values()
            .all(|info| info.run_state.is_none_or(RunState::is_terminal))
    }
}

/// A read-only view over the task map for evaluating trigger rules.
///
/// Used when only shared access is available (e.g. `Scheduler::deps_satisfied`).
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a HashMap<TaskName, TaskInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a HashMap<TaskName, TaskInfo>) -> Self {
        Self { tasks }
    }

    /// Evaluate the trigger rule of `info` against its predecessors' states
    /// in the current run.
    ///
    /// This is the canonical implementation of dependency satisfaction.
    pub fn readiness_of(&self, info: &TaskInfo) -> Readiness {
        let mut all_terminal = true;
        let mut any_unsuccessful = false;

        for dep_name in &info.deps {
            let dep = match self.tasks.get(dep_name) {
                Some(d) => d,
                None => {
                    warn!(
                        task = %info.name,
                        dep = %dep_name,
                        "dependency missing from tasks map"
                    );
                    return Readiness::Wait;
                }
            };

            match dep.run_state {
                Some(RunState::Success) => {}
                Some(RunState::Failed) | Some(RunState::Skipped) => any_unsuccessful = true,
                Some(RunState::Pending) | Some(RunState::Running) | None => all_terminal = false,
            }
        }

        match info.trigger_rule {
            TriggerRule::AllSuccess if any_unsuccessful => Readiness::Skip,
            TriggerRule::AllSuccess | TriggerRule::AllDone if all_terminal => Readiness::Ready,
            _ => Readiness::Wait,
        }
    }

    /// Whether the trigger rule of `info` is currently met.
    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        self.readiness_of(info) == Readiness::Ready
    }
}
