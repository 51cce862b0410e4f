// src/services/quality/report.rs

use serde::Serialize;

/// Outcome of one expectation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpectationResult {
    pub expectation_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub success: bool,
    /// What was measured (row count, unexpected count, ...).
    pub observed_value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub evaluated_expectations: usize,
    pub successful_expectations: usize,
    pub unsuccessful_expectations: usize,
    pub success_percent: f64,
}

impl Statistics {
    pub fn from_results(results: &[ExpectationResult]) -> Self {
        let evaluated = results.len();
        let successful = results.iter().filter(|r| r.success).count();
        let success_percent = if evaluated == 0 {
            100.0
        } else {
            successful as f64 * 100.0 / evaluated as f64
        };

        Self {
            evaluated_expectations: evaluated,
            successful_expectations: successful,
            unsuccessful_expectations: evaluated - successful,
            success_percent,
        }
    }
}

/// Structured result of a checkpoint run.
///
/// `success` is the verdict: true only if every expectation held.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckpointReport {
    pub checkpoint_name: String,
    /// `project.dataset.table` that was validated.
    pub table: String,
    pub success: bool,
    pub statistics: Statistics,
    pub results: Vec<ExpectationResult>,
}

impl CheckpointReport {
    pub fn new(checkpoint_name: &str, table: String, results: Vec<ExpectationResult>) -> Self {
        let statistics = Statistics::from_results(&results);
        Self {
            checkpoint_name: checkpoint_name.to_string(),
            table,
            success: statistics.unsuccessful_expectations == 0,
            statistics,
            results,
        }
    }

    pub fn to_json(&self) -> crate::errors::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
