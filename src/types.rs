use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Policy deciding whether a task runs given its predecessors' terminal states.
///
/// - `AllSuccess`: run only once every predecessor succeeded. If any
///   predecessor failed (or was itself skipped) the task is skipped.
/// - `AllDone`: run as soon as every predecessor is terminal, whatever the
///   outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerRule {
    AllSuccess,
    AllDone,
}

impl Default for TriggerRule {
    fn default() -> Self {
        TriggerRule::AllSuccess
    }
}

impl fmt::Display for TriggerRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerRule::AllSuccess => write!(f, "all_success"),
            TriggerRule::AllDone => write!(f, "all_done"),
        }
    }
}

/// Behaviour when a run is requested while another run is in progress.
///
/// - `Queue`: remember the request and start it once the active run
///   finishes (default behaviour). At most `max_queued_runs` requests are
///   remembered; the oldest are dropped first.
/// - `Skip`: drop the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunRequestBehaviour {
    Queue,
    Skip,
}

impl Default for RunRequestBehaviour {
    fn default() -> Self {
        RunRequestBehaviour::Queue
    }
}

impl FromStr for RunRequestBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(RunRequestBehaviour::Queue),
            "skip" => Ok(RunRequestBehaviour::Skip),
            other => Err(format!(
                "invalid run_request_behaviour: {other} (expected \"queue\" or \"skip\")"
            )),
        }
    }
}

/// Primitive column type understood by the warehouse load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Integer,
    String,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "INTEGER"),
            ColumnType::String => write!(f, "STRING"),
        }
    }
}

/// Nullability of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnMode {
    Required,
    Nullable,
}

impl fmt::Display for ColumnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnMode::Required => write!(f, "REQUIRED"),
            ColumnMode::Nullable => write!(f, "NULLABLE"),
        }
    }
}

/// What a load does to rows already present in the destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WriteDisposition {
    /// Replace the table contents entirely.
    WriteTruncate,
    /// Append rows to the existing contents.
    WriteAppend,
    /// Fail unless the table is empty.
    WriteEmpty,
}

/// Whether a load may create its destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreateDisposition {
    CreateIfNeeded,
    CreateNever,
}

/// SQL dialect flag passed along with a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    Standard,
    Legacy,
}
