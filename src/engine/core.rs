// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledTask`s to the executor
//! - handling Ctrl+C / shutdown
//!
//! The core can be unit tested without any Tokio, channels, filesystem, or
//! collaborators.

use crate::dag::Scheduler;
use crate::engine::event_handlers::{handle_run_request, handle_task_completion, CoreStep};
use crate::engine::queue::RunQueue;
use crate::engine::{RuntimeEvent, RuntimeOptions};
use crate::types::RunRequestBehaviour;

/// Pure core runtime state.
///
/// Owns the DAG scheduler, the run queue and runtime options. It has **no**
/// channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    queue: RunQueue,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(
        scheduler: Scheduler,
        behaviour: RunRequestBehaviour,
        max_queued_runs: usize,
        options: RuntimeOptions,
    ) -> Self {
        let queue = RunQueue::new(behaviour, max_queued_runs);
        Self {
            scheduler,
            queue,
            options,
        }
    }

    /// Expose whether the scheduler is idle (for tests).
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Expose queue emptiness (for tests).
    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::RunRequested { reason } => {
                handle_run_request(&mut self.scheduler, &mut self.queue, reason)
            }
            RuntimeEvent::TaskCompleted {
                task,
                run_id,
                outcome,
                output,
            } => handle_task_completion(
                &mut self.scheduler,
                &mut self.queue,
                &self.options,
                task,
                run_id,
                outcome,
                output,
            ),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}
