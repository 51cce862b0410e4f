// src/services/quality/local.rs

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::services::quality::checkpoint::{load_checkpoint, Expectation};
use crate::services::quality::report::{CheckpointReport, ExpectationResult};
use crate::services::quality::QualityEngine;
use crate::services::warehouse::{Table, TableRef, Value, Warehouse};

/// Evaluates TOML checkpoints against tables of a [`Warehouse`].
#[derive(Debug, Clone)]
pub struct LocalQualityEngine {
    fs: Arc<dyn FileSystem>,
    warehouse: Arc<dyn Warehouse>,
    default_dataset: String,
    default_table: String,
}

impl LocalQualityEngine {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        warehouse: Arc<dyn Warehouse>,
        default_dataset: impl Into<String>,
        default_table: impl Into<String>,
    ) -> Self {
        Self {
            fs,
            warehouse,
            default_dataset: default_dataset.into(),
            default_table: default_table.into(),
        }
    }
}

impl QualityEngine for LocalQualityEngine {
    fn run_checkpoint(&self, context_root: &Path, name: &str) -> Result<CheckpointReport> {
        let checkpoint = load_checkpoint(self.fs.as_ref(), context_root, name)?;

        let dataset = checkpoint.dataset.as_deref().unwrap_or(&self.default_dataset);
        let table_name = checkpoint.table.as_deref().unwrap_or(&self.default_table);
        let table_ref = TableRef::parse(
            &format!("{dataset}.{table_name}"),
            self.warehouse.default_project(),
        )?;
        let table = self.warehouse.table(&table_ref)?;

        debug!(
            checkpoint = name,
            table = %table_ref,
            expectations = checkpoint.expectations.len(),
            "running checkpoint"
        );

        let results: Vec<ExpectationResult> = checkpoint
            .expectations
            .iter()
            .map(|e| evaluate(e, &table))
            .collect();

        let report = CheckpointReport::new(name, table_ref.to_string(), results);
        info!(
            checkpoint = name,
            table = %table_ref,
            success = report.success,
            successful = report.statistics.successful_expectations,
            evaluated = report.statistics.evaluated_expectations,
            "checkpoint evaluated"
        );
        Ok(report)
    }
}

/// Evaluate one expectation. Column-level expectations over a missing column
/// fail rather than erroring.
pub fn evaluate(expectation: &Expectation, table: &Table) -> ExpectationResult {
    let column = expectation.column().map(str::to_string);
    let result = |success: bool, observed: serde_json::Value, details: Option<String>| {
        ExpectationResult {
            expectation_type: expectation.type_name().to_string(),
            column: column.clone(),
            success,
            observed_value: observed,
            details,
        }
    };

    let values = match expectation.column() {
        Some(col) => match table.column(col) {
            Some(values) => values,
            None => {
                return result(
                    false,
                    serde_json::Value::Null,
                    Some(format!("column {col} not found")),
                );
            }
        },
        None => Vec::new(),
    };

    match expectation {
        Expectation::ExpectTableRowCountToBeBetween {
            min_value,
            max_value,
        } => {
            let count = table.rows.len() as i64;
            result(
                within(count, *min_value, *max_value),
                json!(count),
                None,
            )
        }
        Expectation::ExpectTableColumnCountToEqual { value } => {
            let count = table.schema.len();
            result(count == *value, json!(count), None)
        }
        Expectation::ExpectColumnToExist { .. } => result(true, json!(true), None),
        Expectation::ExpectColumnValuesToNotBeNull { .. } => {
            let unexpected = values.iter().filter(|v| v.is_null()).count();
            unexpected_result(result, unexpected, values.len())
        }
        Expectation::ExpectColumnValuesToBeBetween {
            min_value,
            max_value,
            ..
        } => {
            let non_null: Vec<&&Value> = values.iter().filter(|v| !v.is_null()).collect();
            let unexpected = non_null
                .iter()
                .filter(|v| !v.as_i64().is_some_and(|n| within(n, *min_value, *max_value)))
                .count();
            unexpected_result(result, unexpected, non_null.len())
        }
        Expectation::ExpectColumnValuesToBeInSet { value_set, .. } => {
            let non_null: Vec<&&Value> = values.iter().filter(|v| !v.is_null()).collect();
            let unexpected = non_null
                .iter()
                .filter(|v| !value_set.contains(&v.to_json()))
                .count();
            unexpected_result(result, unexpected, non_null.len())
        }
        Expectation::ExpectColumnValuesToBeUnique { .. } => {
            let mut seen = HashSet::new();
            let mut duplicated = HashSet::new();
            for v in values.iter().filter(|v| !v.is_null()) {
                if !seen.insert(*v) {
                    duplicated.insert(*v);
                }
            }
            let unexpected = values
                .iter()
                .filter(|v| duplicated.contains(*v))
                .count();
            let evaluated = values.iter().filter(|v| !v.is_null()).count();
            unexpected_result(result, unexpected, evaluated)
        }
    }
}

fn within(n: i64, min: Option<i64>, max: Option<i64>) -> bool {
    min.is_none_or(|m| n >= m) && max.is_none_or(|m| n <= m)
}

fn unexpected_result<F>(result: F, unexpected: usize, evaluated: usize) -> ExpectationResult
where
    F: Fn(bool, serde_json::Value, Option<String>) -> ExpectationResult,
{
    let details = (unexpected > 0).then(|| format!("{unexpected} of {evaluated} values unexpected"));
    result(
        unexpected == 0,
        json!({ "unexpected_count": unexpected, "element_count": evaluated }),
        details,
    )
}
