// src/services/warehouse/mod.rs

//! Data-warehouse collaborator.
//!
//! - [`Warehouse`] is the interface the pipeline's operators call.
//! - [`memory`] provides an in-process emulation used for local runs and
//!   tests. It reads CSV objects with the `csv` crate.
//! - [`sql`] recognises the one query shape the emulation executes.

pub mod memory;
pub mod sql;

use std::fmt::{self, Debug};

use serde::Serialize;

use crate::dag::SchemaField;
use crate::errors::{PipelineError, Result};
use crate::types::{CreateDisposition, SqlDialect, WriteDisposition};

pub use memory::InMemoryWarehouse;

/// Fully resolved table reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TableRef {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    pub fn new(project: &str, dataset: &str, table: &str) -> Self {
        Self {
            project: project.to_string(),
            dataset: dataset.to_string(),
            table: table.to_string(),
        }
    }

    /// Parse `project.dataset.table` or `dataset.table`, filling in
    /// `default_project` for the short form. Surrounding backticks are
    /// ignored.
    pub fn parse(reference: &str, default_project: &str) -> Result<Self> {
        let trimmed = reference.trim().trim_matches('`');
        let parts: Vec<&str> = trimmed.split('.').collect();
        let invalid = || PipelineError::ConfigError(format!("invalid table reference {reference:?}"));

        if parts.iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }

        match parts.as_slice() {
            [project, dataset, table] => Ok(Self::new(project, dataset, table)),
            [dataset, table] => Ok(Self::new(default_project, dataset, table)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// A single cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Integer(v) => serde_json::Value::from(*v),
            Value::String(s) => serde_json::Value::from(s.clone()),
        }
    }
}

/// Snapshot of a table's schema and rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub schema: Vec<SchemaField>,
    pub rows: Vec<Vec<Value>>,
    /// Clustering columns, if the table is clustered.
    pub clustering: Option<Vec<String>>,
}

impl Table {
    pub fn empty(schema: Vec<SchemaField>) -> Self {
        Self {
            schema,
            rows: Vec::new(),
            clustering: None,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.iter().position(|f| f.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.iter().map(|f| f.name.as_str()).collect()
    }

    /// Values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }
}

/// Parameters of a load from object storage.
#[derive(Debug, Clone)]
pub struct LoadJob {
    pub bucket: String,
    pub source_objects: Vec<String>,
    pub destination: TableRef,
    pub schema: Vec<SchemaField>,
    pub skip_leading_rows: usize,
    pub write_disposition: WriteDisposition,
    pub create_disposition: CreateDisposition,
    pub allow_jagged_rows: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub destination: TableRef,
    pub rows_loaded: usize,
    /// Rows that were shorter than the schema and padded with nulls.
    pub jagged_rows: usize,
    pub table_created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryStats {
    pub destination: TableRef,
    pub rows_written: usize,
}

/// Result of a dataset deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { tables: usize },
    NotFound,
}

/// The warehouse operations the pipeline invokes.
pub trait Warehouse: Send + Sync + Debug {
    /// Project used when a call does not name one.
    fn default_project(&self) -> &str;

    /// Delete a dataset. An absent dataset is reported as
    /// [`DeleteOutcome::NotFound`], not as an error.
    fn delete_dataset(
        &self,
        project: Option<&str>,
        dataset: &str,
        delete_contents: bool,
    ) -> Result<DeleteOutcome>;

    /// Create an empty dataset; fails with `DatasetAlreadyExists` if present.
    fn create_dataset(&self, project: Option<&str>, dataset: &str) -> Result<()>;

    fn load_from_object_store(&self, job: &LoadJob) -> Result<LoadStats>;

    fn execute_query(&self, sql: &str, dialect: SqlDialect) -> Result<QueryStats>;

    /// Snapshot of a table, for validation.
    fn table(&self, table: &TableRef) -> Result<Table>;
}
