// src/config/validate.rs

use crate::config::model::{RawSettings, Settings};
use crate::errors::{PipelineError, Result};

impl TryFrom<RawSettings> for Settings {
    type Error = crate::errors::PipelineError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        validate_raw_settings(&raw)?;
        Ok(Settings::from_raw_unchecked(raw))
    }
}

fn validate_raw_settings(raw: &RawSettings) -> Result<()> {
    validate_identifiers(raw)?;
    validate_runtime(raw)?;
    Ok(())
}

fn validate_identifiers(raw: &RawSettings) -> Result<()> {
    let named = [
        ("[pipeline].dag_id", raw.pipeline.dag_id.as_str()),
        ("[warehouse].dataset", raw.warehouse.dataset.as_str()),
        ("[warehouse].table", raw.warehouse.table.as_str()),
        ("[warehouse].clustered_table", raw.warehouse.clustered_table.as_str()),
        ("[paths].object_key", raw.paths.object_key.as_str()),
        ("[quality].pass_checkpoint", raw.quality.pass_checkpoint.as_str()),
        ("[quality].fail_checkpoint", raw.quality.fail_checkpoint.as_str()),
    ];

    for (field, value) in named {
        if value.trim().is_empty() {
            return Err(PipelineError::ConfigError(format!(
                "{field} must not be empty"
            )));
        }
    }

    // Warehouse identifiers end up inside SQL text and table references.
    for (field, value) in &named[1..4] {
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(PipelineError::ConfigError(format!(
                "{field} may only contain letters, digits and '_' (got {value:?})"
            )));
        }
    }

    if raw.warehouse.table == raw.warehouse.clustered_table {
        return Err(PipelineError::ConfigError(
            "[warehouse].clustered_table must differ from [warehouse].table".to_string(),
        ));
    }

    Ok(())
}

fn validate_runtime(raw: &RawSettings) -> Result<()> {
    if raw.runtime.max_queued_runs == 0 {
        return Err(PipelineError::ConfigError(
            "[runtime].max_queued_runs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
