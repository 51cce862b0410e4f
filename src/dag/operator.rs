// src/dag/operator.rs

//! Operator kinds and their bound parameters.
//!
//! A node never computes anything itself: it names one of these operators
//! and the executor invokes the matching collaborator call (see
//! [`crate::exec::operators`]).

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::dag::schema::SchemaField;
use crate::types::{CreateDisposition, SqlDialect, WriteDisposition};

/// Parameters of a CSV load from object storage into a warehouse table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadTableParams {
    pub bucket: Option<String>,
    pub source_objects: Vec<String>,
    /// `project.dataset.table` or `dataset.table`.
    pub destination: String,
    pub schema: Vec<SchemaField>,
    pub skip_leading_rows: usize,
    pub write_disposition: WriteDisposition,
    pub create_disposition: CreateDisposition,
    pub allow_jagged_rows: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operator {
    /// Marker node; always succeeds immediately.
    NoOp,
    DeleteDataset {
        project_id: Option<String>,
        dataset_id: String,
        delete_contents: bool,
    },
    CreateDataset {
        project_id: Option<String>,
        dataset_id: String,
    },
    UploadFile {
        src: PathBuf,
        dst: String,
        bucket: Option<String>,
    },
    /// Only acts on paths ending in `.csv`.
    DeleteLocalFile { path: PathBuf },
    LoadTable(LoadTableParams),
    DeleteObject { bucket: Option<String>, key: String },
    ExecuteQuery { sql: String, dialect: SqlDialect },
    ValidationCheck {
        context_root: PathBuf,
        checkpoint_name: String,
        return_json: bool,
    },
}

/// Discriminant of [`Operator`], used for logging and dry-run output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    NoOp,
    DatasetDelete,
    DatasetCreate,
    FileUpload,
    FileDeleteLocal,
    FileLoadToTable,
    FileDeleteRemote,
    QueryExecute,
    ValidationCheck,
}

impl Operator {
    pub fn kind(&self) -> OperatorKind {
        match self {
            Operator::NoOp => OperatorKind::NoOp,
            Operator::DeleteDataset { .. } => OperatorKind::DatasetDelete,
            Operator::CreateDataset { .. } => OperatorKind::DatasetCreate,
            Operator::UploadFile { .. } => OperatorKind::FileUpload,
            Operator::DeleteLocalFile { .. } => OperatorKind::FileDeleteLocal,
            Operator::LoadTable(_) => OperatorKind::FileLoadToTable,
            Operator::DeleteObject { .. } => OperatorKind::FileDeleteRemote,
            Operator::ExecuteQuery { .. } => OperatorKind::QueryExecute,
            Operator::ValidationCheck { .. } => OperatorKind::ValidationCheck,
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperatorKind::NoOp => "no-op",
            OperatorKind::DatasetDelete => "dataset-delete",
            OperatorKind::DatasetCreate => "dataset-create",
            OperatorKind::FileUpload => "file-upload",
            OperatorKind::FileDeleteLocal => "file-delete-local",
            OperatorKind::FileLoadToTable => "file-load-to-table",
            OperatorKind::FileDeleteRemote => "file-delete-remote",
            OperatorKind::QueryExecute => "query-execute",
            OperatorKind::ValidationCheck => "validation-check",
        };
        f.write_str(s)
    }
}
