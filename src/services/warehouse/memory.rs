// src/services/warehouse/memory.rs

//! In-process warehouse emulation.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use csv::StringRecord;

use tracing::{debug, info};

use crate::dag::SchemaField;
use crate::errors::{PipelineError, Result};
use crate::services::object_store::ObjectStore;
use crate::services::warehouse::sql::{parse_create_table_as_select, Projection};
use crate::services::warehouse::{
    DeleteOutcome, LoadJob, LoadStats, QueryStats, Table, TableRef, Value, Warehouse,
};
use crate::types::{ColumnType, CreateDisposition, SqlDialect, WriteDisposition};

type DatasetKey = (String, String);
type Datasets = BTreeMap<DatasetKey, BTreeMap<String, Table>>;

/// Warehouse holding datasets and tables in memory.
///
/// Loads read their source objects from the object store it was built with.
#[derive(Debug)]
pub struct InMemoryWarehouse {
    default_project: String,
    object_store: Arc<dyn ObjectStore>,
    datasets: Mutex<Datasets>,
}

impl InMemoryWarehouse {
    pub fn new(default_project: impl Into<String>, object_store: Arc<dyn ObjectStore>) -> Self {
        Self {
            default_project: default_project.into(),
            object_store,
            datasets: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn dataset_exists(&self, project: Option<&str>, dataset: &str) -> bool {
        self.lock().contains_key(&self.key(project, dataset))
    }

    /// Table names of a dataset, sorted; empty if the dataset is absent.
    pub fn table_names(&self, project: Option<&str>, dataset: &str) -> Vec<String> {
        self.lock()
            .get(&self.key(project, dataset))
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn key(&self, project: Option<&str>, dataset: &str) -> DatasetKey {
        (
            project.unwrap_or(&self.default_project).to_string(),
            dataset.to_string(),
        )
    }

    fn lock(&self) -> MutexGuard<'_, Datasets> {
        self.datasets.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Read and coerce every source object before touching any table, so a
    /// failed load leaves the destination unchanged.
    fn read_rows(&self, job: &LoadJob) -> Result<(Vec<Vec<Value>>, usize)> {
        let mut rows = Vec::new();
        let mut jagged = 0usize;

        for object in &job.source_objects {
            let bytes = self.object_store.get_object(&job.bucket, object)?;
            let text = String::from_utf8(bytes).map_err(|e| PipelineError::SchemaMismatch {
                row: 0,
                reason: format!("gs://{}/{} is not valid UTF-8: {e}", job.bucket, object),
            })?;

            let records = read_records(&text)?;
            for (idx, record) in records.iter().enumerate().skip(job.skip_leading_rows) {
                let (row, was_jagged) =
                    coerce_record(record, &job.schema, job.allow_jagged_rows, idx + 1)?;
                if was_jagged {
                    jagged += 1;
                }
                rows.push(row);
            }
        }

        Ok((rows, jagged))
    }
}

impl Warehouse for InMemoryWarehouse {
    fn default_project(&self) -> &str {
        &self.default_project
    }

    fn delete_dataset(
        &self,
        project: Option<&str>,
        dataset: &str,
        delete_contents: bool,
    ) -> Result<DeleteOutcome> {
        let key = self.key(project, dataset);
        let mut datasets = self.lock();

        let Some(tables) = datasets.get(&key) else {
            debug!(project = %key.0, dataset, "dataset absent; nothing to delete");
            return Ok(DeleteOutcome::NotFound);
        };

        if !tables.is_empty() && !delete_contents {
            return Err(PipelineError::DatasetNotEmpty(format!("{}.{}", key.0, key.1)));
        }

        let count = tables.len();
        datasets.remove(&key);
        info!(project = %key.0, dataset, tables = count, "dataset deleted");
        Ok(DeleteOutcome::Deleted { tables: count })
    }

    fn create_dataset(&self, project: Option<&str>, dataset: &str) -> Result<()> {
        let key = self.key(project, dataset);
        let mut datasets = self.lock();

        if datasets.contains_key(&key) {
            return Err(PipelineError::DatasetAlreadyExists(format!(
                "{}.{}",
                key.0, key.1
            )));
        }

        info!(project = %key.0, dataset, "dataset created");
        datasets.insert(key, BTreeMap::new());
        Ok(())
    }

    fn load_from_object_store(&self, job: &LoadJob) -> Result<LoadStats> {
        let dest = &job.destination;
        let key = (dest.project.clone(), dest.dataset.clone());

        // Cheap checks first so a missing dataset is reported before any
        // object is read.
        {
            let datasets = self.lock();
            let tables = datasets
                .get(&key)
                .ok_or_else(|| PipelineError::DatasetNotFound(format!("{}.{}", key.0, key.1)))?;
            if !tables.contains_key(&dest.table)
                && job.create_disposition == CreateDisposition::CreateNever
            {
                return Err(PipelineError::TableNotFound(dest.to_string()));
            }
        }

        let (rows, jagged_rows) = self.read_rows(job)?;
        let rows_loaded = rows.len();

        let mut datasets = self.lock();
        let tables = datasets
            .get_mut(&key)
            .ok_or_else(|| PipelineError::DatasetNotFound(format!("{}.{}", key.0, key.1)))?;

        let table_created = !tables.contains_key(&dest.table);
        if table_created && job.create_disposition == CreateDisposition::CreateNever {
            return Err(PipelineError::TableNotFound(dest.to_string()));
        }

        match job.write_disposition {
            WriteDisposition::WriteTruncate => {
                tables.insert(
                    dest.table.clone(),
                    Table {
                        schema: job.schema.clone(),
                        rows,
                        clustering: None,
                    },
                );
            }
            WriteDisposition::WriteAppend | WriteDisposition::WriteEmpty => {
                let table = tables
                    .entry(dest.table.clone())
                    .or_insert_with(|| Table::empty(job.schema.clone()));

                if job.write_disposition == WriteDisposition::WriteEmpty && !table.rows.is_empty() {
                    return Err(PipelineError::TableNotEmpty(dest.to_string()));
                }
                if !same_columns(&table.schema, &job.schema) {
                    return Err(PipelineError::SchemaMismatch {
                        row: 0,
                        reason: format!("schema of {dest} does not match the load schema"),
                    });
                }
                table.rows.extend(rows);
            }
        }

        info!(
            destination = %dest,
            rows_loaded,
            jagged_rows,
            table_created,
            "load job completed"
        );

        Ok(LoadStats {
            destination: dest.clone(),
            rows_loaded,
            jagged_rows,
            table_created,
        })
    }

    fn execute_query(&self, sql: &str, dialect: SqlDialect) -> Result<QueryStats> {
        if dialect == SqlDialect::Legacy {
            return Err(PipelineError::UnsupportedQuery(
                "DDL statements require the standard SQL dialect".to_string(),
            ));
        }

        let stmt = parse_create_table_as_select(sql)?;
        let dest = TableRef::parse(&stmt.destination, &self.default_project)?;
        let src = TableRef::parse(&stmt.source, &self.default_project)?;

        let mut datasets = self.lock();

        let source = datasets
            .get(&(src.project.clone(), src.dataset.clone()))
            .ok_or_else(|| PipelineError::DatasetNotFound(format!("{}.{}", src.project, src.dataset)))?
            .get(&src.table)
            .ok_or_else(|| PipelineError::TableNotFound(src.to_string()))?;

        let names: Vec<String> = match &stmt.projection {
            Projection::All => source.schema.iter().map(|f| f.name.clone()).collect(),
            Projection::Columns(cols) => cols.clone(),
        };
        let mut indices = Vec::with_capacity(names.len());
        for name in &names {
            let idx = source.column_index(name).ok_or_else(|| {
                PipelineError::UnsupportedQuery(format!("unrecognized name: {name} in {src}"))
            })?;
            indices.push(idx);
        }

        let schema: Vec<SchemaField> = indices.iter().map(|i| source.schema[*i].clone()).collect();
        let mut rows: Vec<Vec<Value>> = source
            .rows
            .iter()
            .map(|row| indices.iter().map(|i| row[*i].clone()).collect())
            .collect();

        let clustering = if stmt.cluster_by.is_empty() {
            None
        } else {
            let mut cluster_idx = Vec::new();
            for col in &stmt.cluster_by {
                let idx = names.iter().position(|n| n == col).ok_or_else(|| {
                    PipelineError::UnsupportedQuery(format!(
                        "clustering column {col} is not in the SELECT list"
                    ))
                })?;
                cluster_idx.push(idx);
            }
            // Physical organisation: rows ordered by the clustering columns.
            rows.sort_by(|a, b| {
                cluster_idx
                    .iter()
                    .map(|i| a[*i].cmp(&b[*i]))
                    .find(|o| o.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            Some(stmt.cluster_by.clone())
        };

        let rows_written = rows.len();
        let dest_tables = datasets
            .get_mut(&(dest.project.clone(), dest.dataset.clone()))
            .ok_or_else(|| PipelineError::DatasetNotFound(format!("{}.{}", dest.project, dest.dataset)))?;
        dest_tables.insert(
            dest.table.clone(),
            Table {
                schema,
                rows,
                clustering,
            },
        );

        info!(destination = %dest, source = %src, rows_written, "query created table");

        Ok(QueryStats {
            destination: dest,
            rows_written,
        })
    }

    fn table(&self, table: &TableRef) -> Result<Table> {
        let datasets = self.lock();
        datasets
            .get(&(table.project.clone(), table.dataset.clone()))
            .ok_or_else(|| {
                PipelineError::DatasetNotFound(format!("{}.{}", table.project, table.dataset))
            })?
            .get(&table.table)
            .cloned()
            .ok_or_else(|| PipelineError::TableNotFound(table.to_string()))
    }
}

fn same_columns(a: &[SchemaField], b: &[SchemaField]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| x.name == y.name && x.column_type == y.column_type)
}

/// Split CSV text into records. Rows may differ in length; blank lines are
/// skipped.
fn read_records(text: &str) -> Result<Vec<StringRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PipelineError::SchemaMismatch {
            row: e.position().map_or(0, |p| p.record() as usize + 1),
            reason: format!("malformed CSV: {e}"),
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Coerce one CSV record to the schema. Returns the row and whether it was
/// jagged (shorter than the schema and padded with nulls).
fn coerce_record(
    record: &StringRecord,
    schema: &[SchemaField],
    allow_jagged_rows: bool,
    row: usize,
) -> Result<(Vec<Value>, bool)> {
    if record.len() > schema.len() {
        return Err(PipelineError::SchemaMismatch {
            row,
            reason: format!(
                "too many values: expected {}, got {}",
                schema.len(),
                record.len()
            ),
        });
    }

    let jagged = record.len() < schema.len();
    if jagged && !allow_jagged_rows {
        return Err(PipelineError::SchemaMismatch {
            row,
            reason: format!(
                "missing values: expected {}, got {}",
                schema.len(),
                record.len()
            ),
        });
    }

    let mut values = Vec::with_capacity(schema.len());
    for (idx, field) in schema.iter().enumerate() {
        let value = match record.get(idx) {
            None => Value::Null,
            Some(cell) => coerce_cell(cell, field, row)?,
        };

        if value.is_null() && field.is_required() {
            return Err(PipelineError::SchemaMismatch {
                row,
                reason: format!("missing required field {}", field.name),
            });
        }
        values.push(value);
    }

    Ok((values, jagged))
}

/// Empty cells are null.
fn coerce_cell(cell: &str, field: &SchemaField, row: usize) -> Result<Value> {
    if cell.is_empty() {
        return Ok(Value::Null);
    }

    match field.column_type {
        ColumnType::String => Ok(Value::String(cell.to_string())),
        ColumnType::Integer => {
            let trimmed = cell.trim();
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            trimmed
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| PipelineError::SchemaMismatch {
                    row,
                    reason: format!(
                        "could not parse {:?} as INTEGER for field {}",
                        cell, field.name
                    ),
                })
        }
    }
}
