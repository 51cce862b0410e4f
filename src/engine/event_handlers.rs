// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info, warn};

use crate::dag::{RunSummary, ScheduledTask, Scheduler, SchedulerStep};
use crate::engine::queue::RunQueue;
use crate::engine::{RuntimeOptions, TaskName, TaskOutcome, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// A run reached its terminal state.
    RunFinished(RunSummary),
    /// Request that the process exits (idle with `exit_when_idle`).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Handle a run request.
///
/// - Idle scheduler: start a new run right away.
/// - Active run: hand the request to the queue.
pub fn handle_run_request(
    scheduler: &mut Scheduler,
    queue: &mut RunQueue,
    reason: TriggerReason,
) -> CoreStep {
    let mut commands = Vec::new();

    if scheduler.is_idle() {
        debug!(?reason, "scheduler idle; starting run");
        let step = scheduler.step_start();
        push_step_commands(&mut commands, step);
        commands.extend(maybe_start_queued_run(scheduler, queue));
    } else {
        queue.record_request(reason);
    }

    CoreStep {
        commands,
        keep_running: true,
    }
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    queue: &mut RunQueue,
    options: &RuntimeOptions,
    task: TaskName,
    run_id: u64,
    outcome: TaskOutcome,
    output: Option<serde_json::Value>,
) -> CoreStep {
    let mut commands = Vec::new();

    if scheduler.current_run_id() != Some(run_id) {
        warn!(
            task = %task,
            run_id,
            current_run_id = scheduler.current_run_id(),
            "completion for a run that is not active; ignoring"
        );
    } else {
        let step = scheduler.step_completion(&task, outcome, output);
        push_step_commands(&mut commands, step);
        commands.extend(maybe_start_queued_run(scheduler, queue));
    }

    let mut keep_running = true;
    if options.exit_when_idle && scheduler.is_idle() && queue.is_empty() {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}

fn push_step_commands(commands: &mut Vec<CoreCommand>, step: SchedulerStep) {
    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }
    if let Some(summary) = step.finished_run {
        commands.push(CoreCommand::RunFinished(summary));
    }
}

/// If the scheduler is idle and there are queued requests, start the next run.
fn maybe_start_queued_run(scheduler: &mut Scheduler, queue: &mut RunQueue) -> Vec<CoreCommand> {
    let mut commands = Vec::new();

    while scheduler.is_idle() {
        let Some(reason) = queue.pop_next() else {
            break;
        };
        info!(?reason, remaining = queue.len(), "starting queued run");
        let step = scheduler.step_start();
        push_step_commands(&mut commands, step);
    }

    commands
}
