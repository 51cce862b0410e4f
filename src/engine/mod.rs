// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - the DAG scheduler
//! - the run queue (what happens to run requests that arrive while a run
//!   is active)
//! - the main runtime event loop that reacts to:
//!   - run requests
//!   - task completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a task execution for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// Failed with a human-readable reason.
    Failed(String),
}

/// Why a run was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Requested when the process started (e.g. `--runs N`).
    Startup,
    /// Requested explicitly by a caller at runtime.
    Manual,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once the DAG is idle and there are no
    /// queued run requests.
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from callers and the executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A new DAG run should be started (or queued).
    RunRequested { reason: TriggerReason },
    /// A task finished executing.
    TaskCompleted {
        task: TaskName,
        run_id: u64,
        outcome: TaskOutcome,
        output: Option<serde_json::Value>,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::RunQueue;
pub use crate::types::RunRequestBehaviour;
pub use runtime::Runtime;
