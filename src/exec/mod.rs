// src/exec/mod.rs

//! Task execution layer.
//!
//! This module runs the operator bound to each scheduled task and reports
//! back to the orchestration runtime via `RuntimeEvent`s.
//!
//! - [`executor_loop`] owns the main executor loop which spawns one Tokio
//!   task per scheduled task.
//! - [`task_runner`] runs one operator on the blocking pool and reports its
//!   outcome.
//! - [`operators`] implements each operator kind against the collaborators.
//! - [`backend`] provides the `ExecutorBackend` trait and the production
//!   `OperatorExecutorBackend`, which tests can replace with a fake.

pub mod backend;
pub mod executor_loop;
pub mod operators;
pub mod task_runner;

pub use backend::{ExecutorBackend, OperatorExecutorBackend};
pub use executor_loop::spawn_executor;
pub use operators::execute;
