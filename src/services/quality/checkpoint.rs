// src/services/quality/checkpoint.rs

//! Checkpoint files.
//!
//! A checkpoint lives at `<context_root>/checkpoints/<name>.toml`:
//!
//! ```toml
//! table = "FIFA"
//!
//! [[expectations]]
//! type = "expect_column_values_to_not_be_null"
//! column = "player_id"
//!
//! [[expectations]]
//! type = "expect_column_values_to_be_between"
//! column = "overall"
//! min_value = 0
//! max_value = 100
//! ```

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;

/// Directory under the context root holding checkpoint files.
pub const CHECKPOINTS_DIR: &str = "checkpoints";

#[derive(Debug, Clone, Deserialize)]
pub struct CheckpointFile {
    /// Warehouse dataset to validate; the engine default when omitted.
    #[serde(default)]
    pub dataset: Option<String>,

    /// Table to validate; the engine default when omitted.
    #[serde(default)]
    pub table: Option<String>,

    #[serde(default)]
    pub expectations: Vec<Expectation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expectation {
    ExpectTableRowCountToBeBetween {
        #[serde(default)]
        min_value: Option<i64>,
        #[serde(default)]
        max_value: Option<i64>,
    },
    ExpectTableColumnCountToEqual {
        value: usize,
    },
    ExpectColumnToExist {
        column: String,
    },
    ExpectColumnValuesToNotBeNull {
        column: String,
    },
    ExpectColumnValuesToBeBetween {
        column: String,
        #[serde(default)]
        min_value: Option<i64>,
        #[serde(default)]
        max_value: Option<i64>,
    },
    ExpectColumnValuesToBeInSet {
        column: String,
        value_set: Vec<serde_json::Value>,
    },
    ExpectColumnValuesToBeUnique {
        column: String,
    },
}

impl Expectation {
    pub fn type_name(&self) -> &'static str {
        match self {
            Expectation::ExpectTableRowCountToBeBetween { .. } => {
                "expect_table_row_count_to_be_between"
            }
            Expectation::ExpectTableColumnCountToEqual { .. } => {
                "expect_table_column_count_to_equal"
            }
            Expectation::ExpectColumnToExist { .. } => "expect_column_to_exist",
            Expectation::ExpectColumnValuesToNotBeNull { .. } => {
                "expect_column_values_to_not_be_null"
            }
            Expectation::ExpectColumnValuesToBeBetween { .. } => {
                "expect_column_values_to_be_between"
            }
            Expectation::ExpectColumnValuesToBeInSet { .. } => "expect_column_values_to_be_in_set",
            Expectation::ExpectColumnValuesToBeUnique { .. } => "expect_column_values_to_be_unique",
        }
    }

    /// Column the expectation applies to, if it is column-level.
    pub fn column(&self) -> Option<&str> {
        match self {
            Expectation::ExpectTableRowCountToBeBetween { .. }
            | Expectation::ExpectTableColumnCountToEqual { .. } => None,
            Expectation::ExpectColumnToExist { column }
            | Expectation::ExpectColumnValuesToNotBeNull { column }
            | Expectation::ExpectColumnValuesToBeBetween { column, .. }
            | Expectation::ExpectColumnValuesToBeInSet { column, .. }
            | Expectation::ExpectColumnValuesToBeUnique { column } => Some(column),
        }
    }
}

/// Path of checkpoint `name` under `context_root`.
///
/// Names are single path components; anything else is rejected.
pub fn checkpoint_path(context_root: &Path, name: &str) -> Result<PathBuf> {
    let mut components = Path::new(name).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single {
        return Err(PipelineError::CheckpointError {
            name: name.to_string(),
            reason: "checkpoint names must be a single path component".to_string(),
        });
    }

    Ok(context_root
        .join(CHECKPOINTS_DIR)
        .join(format!("{name}.toml")))
}

/// Read and parse checkpoint `name`.
pub fn load_checkpoint(fs: &dyn FileSystem, context_root: &Path, name: &str) -> Result<CheckpointFile> {
    let path = checkpoint_path(context_root, name)?;
    if !fs.is_file(&path) {
        return Err(PipelineError::CheckpointError {
            name: name.to_string(),
            reason: format!("no checkpoint file at {}", path.display()),
        });
    }

    let contents = fs.read_to_string(&path)?;
    toml::from_str(&contents).map_err(|e| PipelineError::CheckpointError {
        name: name.to_string(),
        reason: format!("invalid checkpoint file {}: {e}", path.display()),
    })
}
