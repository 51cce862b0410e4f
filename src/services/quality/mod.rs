// src/services/quality/mod.rs

//! Data-quality collaborator.
//!
//! [`QualityEngine::run_checkpoint`] runs a named checkpoint and returns a
//! structured report. The verdict lives in the report; an `Err` means the
//! checkpoint could not be executed at all.

pub mod checkpoint;
pub mod local;
pub mod report;

use std::fmt::Debug;
use std::path::Path;

use crate::errors::Result;

pub use checkpoint::{CheckpointFile, Expectation};
pub use local::LocalQualityEngine;
pub use report::{CheckpointReport, ExpectationResult, Statistics};

pub trait QualityEngine: Send + Sync + Debug {
    fn run_checkpoint(&self, context_root: &Path, name: &str) -> Result<CheckpointReport>;
}
