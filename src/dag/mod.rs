// src/dag/mod.rs

//! Pipeline graph definition and per-run scheduling.
//!
//! - [`definition`] holds the immutable node list + edge list and its
//!   builder.
//! - [`operator`] and [`schema`] describe what each node invokes.
//! - [`fifa`] builds the concrete FIFA-21 pipeline from settings.
//! - [`graph`] is the adjacency view used for scheduling.
//! - [`scheduler`] contains the per-run state machine that applies trigger
//!   rules and decides which tasks are ready.
//! - [`task_info`], [`scheduler_step`], [`state_manager`] and
//!   [`run_summary`] support the scheduler.

pub mod definition;
pub mod fifa;
pub mod graph;
pub mod operator;
pub mod run_summary;
pub mod scheduler;
pub mod scheduler_step;
pub mod schema;
pub mod state_manager;
pub mod task_info;

pub use definition::{Edge, Link, PipelineBuilder, PipelineDefinition, TaskNode};
pub use graph::DagGraph;
pub use operator::{LoadTableParams, Operator, OperatorKind};
pub use run_summary::RunSummary;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use schema::SchemaField;
pub use task_info::{ScheduledTask, TaskRunState};
