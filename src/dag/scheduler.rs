use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use crate::dag::definition::PipelineDefinition;
use crate::dag::graph::DagGraph;
use crate::dag::run_summary::RunSummary;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{ReadOnlyStateManager, StateManager};
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo, TaskRunState};
use crate::engine::{TaskName, TaskOutcome};

/// Scheduler holds the immutable DAG plus mutable per-run state.
///
/// It is responsible for:
/// - instantiating the definition as a run (every task `Pending`)
/// - deciding when a task's trigger rule is met
/// - recording success/failure reported by the executor
/// - skipping tasks whose trigger rule can no longer be met
/// - producing a [`RunSummary`] once every task is terminal
#[derive(Debug)]
pub struct Scheduler {
    dag_id: String,
    graph: DagGraph,
    tasks: HashMap<TaskName, TaskInfo>,
    /// Monotonically increasing run ID.
    run_counter: u64,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<u64>,
}

impl Scheduler {
    /// Construct a scheduler from a validated [`PipelineDefinition`].
    pub fn from_definition(def: &PipelineDefinition) -> Self {
        let graph = DagGraph::from_definition(def);

        let mut tasks = HashMap::new();
        for node in def.tasks() {
            let deps = graph.dependencies_of(&node.id).to_vec();
            tasks.insert(node.id.clone(), TaskInfo::from_node(node, deps));
        }

        Self {
            dag_id: def.dag_id().to_string(),
            graph,
            tasks,
            run_counter: 0,
            current_run_id: None,
        }
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    /// Current run ID, if any.
    pub fn current_run_id(&self) -> Option<u64> {
        self.current_run_id
    }

    /// Read-only view of the given task's run state.
    ///
    /// Outside an active run every known task reports `NotInRun`.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        let info = self.tasks.get(task)?;
        if self.current_run_id.is_none() {
            return Some(TaskRunState::NotInRun);
        }
        Some(info.run_state.into())
    }

    /// Names of tasks participating in the active run.
    pub fn tasks_in_current_run(&self) -> Vec<TaskName> {
        if self.current_run_id.is_none() {
            return Vec::new();
        }

        self.graph
            .tasks()
            .filter(|name| self.tasks.get(*name).is_some_and(|i| i.run_state.is_some()))
            .map(str::to_string)
            .collect()
    }

    /// Whether the trigger rule of `task` is met in the current run.
    ///
    /// Returns `None` if the task is unknown.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        let info = self.tasks.get(task)?;
        let mgr = ReadOnlyStateManager::new(&self.tasks);
        Some(mgr.deps_satisfied_for_info(info))
    }

    /// Task ids in declaration order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.graph.tasks()
    }

    /// Start a new run and return the tasks that are immediately ready.
    ///
    /// Ignored (with a warning) while another run is active.
    pub fn start_new_run(&mut self) -> Vec<ScheduledTask> {
        self.start_step_internal().newly_scheduled
    }

    /// Record the outcome of a running task (production API).
    pub fn handle_completion(
        &mut self,
        task: &str,
        outcome: TaskOutcome,
        output: Option<serde_json::Value>,
    ) -> Vec<ScheduledTask> {
        self.completion_step_internal(task, outcome, output)
            .newly_scheduled
    }

    /// Manual-step variant of `start_new_run` that returns a rich [`SchedulerStep`].
    pub fn step_start(&mut self) -> SchedulerStep {
        self.start_step_internal()
    }

    /// Manual-step variant of `handle_completion` that returns a rich [`SchedulerStep`].
    pub fn step_completion(
        &mut self,
        task: &str,
        outcome: TaskOutcome,
        output: Option<serde_json::Value>,
    ) -> SchedulerStep {
        self.completion_step_internal(task, outcome, output)
    }

    fn start_step_internal(&mut self) -> SchedulerStep {
        if let Some(run_id) = self.current_run_id {
            warn!(run_id, "start_new_run called while a run is active; ignoring");
            return SchedulerStep::default();
        }

        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);
        info!(dag_id = %self.dag_id, run_id = self.run_counter, "scheduler: starting new DAG run");

        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        manager.mark_all_pending();
        let newly_skipped = manager.propagate_skips();
        let newly_scheduled = manager.collect_new_ready_tasks();
        let finished_run = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            newly_skipped,
            finished_run,
        }
    }

    fn completion_step_internal(
        &mut self,
        task: &str,
        outcome: TaskOutcome,
        output: Option<serde_json::Value>,
    ) -> SchedulerStep {
        let run_id = match self.current_run_id {
            Some(id) => id,
            None => {
                warn!(task = %task, "completion reported with no active run; ignoring");
                return SchedulerStep::default();
            }
        };

        let mut newly_failed = Vec::new();

        match self.tasks.get_mut(task) {
            Some(info) if info.run_state == Some(RunState::Running) => {
                info.output = output;
                match outcome {
                    TaskOutcome::Success => {
                        info.run_state = Some(RunState::Success);
                        debug!(task = %info.name, run_id, "task completed successfully");
                    }
                    TaskOutcome::Failed(reason) => {
                        warn!(
                            task = %info.name,
                            run_id,
                            error = %reason,
                            "task failed"
                        );
                        info.run_state = Some(RunState::Failed);
                        info.error = Some(reason);
                        newly_failed.push(info.name.clone());
                    }
                }
            }
            Some(info) => {
                warn!(
                    task = %task,
                    run_id,
                    state = ?info.run_state,
                    "completion for task that is not running; ignoring"
                );
                return SchedulerStep::default();
            }
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
                return SchedulerStep::default();
            }
        }

        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        let newly_skipped = manager.propagate_skips();
        let newly_scheduled = manager.collect_new_ready_tasks();
        let finished_run = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_failed,
            newly_skipped,
            finished_run,
        }
    }

    /// If every task is terminal, clear `current_run_id` and summarise the run.
    fn maybe_finish_run(&mut self) -> Option<RunSummary> {
        let run_id = self.current_run_id?;

        let manager = StateManager::new(&self.graph, &mut self.tasks, self.current_run_id);
        if !manager.all_tasks_terminal() {
            return None;
        }

        let summary = self.summarise(run_id);
        info!(
            dag_id = %self.dag_id,
            run_id,
            succeeded = summary.succeeded,
            "scheduler: all tasks terminal; marking run as finished"
        );
        self.current_run_id = None;
        Some(summary)
    }

    fn summarise(&self, run_id: u64) -> RunSummary {
        let mut states = BTreeMap::new();
        let mut errors = BTreeMap::new();
        let mut outputs = BTreeMap::new();

        for (name, info) in &self.tasks {
            states.insert(name.clone(), TaskRunState::from(info.run_state));
            if let Some(err) = &info.error {
                errors.insert(name.clone(), err.clone());
            }
            if let Some(out) = &info.output {
                outputs.insert(name.clone(), out.clone());
            }
        }

        let succeeded = self
            .graph
            .leaves()
            .iter()
            .all(|leaf| states.get(*leaf) == Some(&TaskRunState::Success));

        RunSummary {
            dag_id: self.dag_id.clone(),
            run_id,
            states,
            errors,
            outputs,
            succeeded,
        }
    }
}
