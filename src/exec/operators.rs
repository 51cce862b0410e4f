// src/exec/operators.rs

//! Operator implementations.
//!
//! Each operator is a blocking call into the collaborators in [`Services`].
//! The returned JSON (if any) is kept as the task's output in the run
//! summary.

use std::path::Path;

use serde_json::json;
use tracing::{info, warn};

use crate::dag::{LoadTableParams, Operator};
use crate::errors::{PipelineError, Result};
use crate::services::object_store::digest_hex;
use crate::services::warehouse::{DeleteOutcome, LoadJob, TableRef};
use crate::services::Services;
use crate::types::SqlDialect;

/// Execute `operator` on behalf of task `task`.
pub fn execute(task: &str, operator: &Operator, services: &Services) -> Result<Option<serde_json::Value>> {
    match operator {
        Operator::NoOp => Ok(None),
        Operator::DeleteDataset {
            project_id,
            dataset_id,
            delete_contents,
        } => delete_dataset(task, services, project_id.as_deref(), dataset_id, *delete_contents),
        Operator::CreateDataset {
            project_id,
            dataset_id,
        } => create_dataset(task, services, project_id.as_deref(), dataset_id),
        Operator::UploadFile { src, dst, bucket } => {
            upload_file(task, services, src, dst, bucket.as_deref())
        }
        Operator::DeleteLocalFile { path } => delete_local_file(task, services, path),
        Operator::LoadTable(params) => load_table(task, services, params),
        Operator::DeleteObject { bucket, key } => {
            delete_object(task, services, bucket.as_deref(), key)
        }
        Operator::ExecuteQuery { sql, dialect } => execute_query(task, services, sql, *dialect),
        Operator::ValidationCheck {
            context_root,
            checkpoint_name,
            return_json,
        } => validation_check(task, services, context_root, checkpoint_name, *return_json),
    }
}

fn require_bucket<'a>(task: &str, bucket: Option<&'a str>) -> Result<&'a str> {
    bucket.ok_or_else(|| {
        PipelineError::ConfigError(format!(
            "task {task} needs an object-store bucket; set GCP_GCS_BUCKET or [gcp].bucket"
        ))
    })
}

fn delete_dataset(
    task: &str,
    services: &Services,
    project: Option<&str>,
    dataset: &str,
    delete_contents: bool,
) -> Result<Option<serde_json::Value>> {
    match services
        .warehouse
        .delete_dataset(project, dataset, delete_contents)?
    {
        DeleteOutcome::Deleted { tables } => {
            info!(task, dataset, tables, "deleted dataset");
            Ok(Some(json!({ "deleted": true, "tables": tables })))
        }
        DeleteOutcome::NotFound => {
            warn!(task, dataset, "dataset does not exist; nothing to delete");
            Ok(Some(json!({ "deleted": false })))
        }
    }
}

fn create_dataset(
    task: &str,
    services: &Services,
    project: Option<&str>,
    dataset: &str,
) -> Result<Option<serde_json::Value>> {
    match services.warehouse.create_dataset(project, dataset) {
        Ok(()) => Ok(Some(json!({ "created": true }))),
        Err(PipelineError::DatasetAlreadyExists(name)) => {
            warn!(task, dataset = %name, "dataset already exists; continuing");
            Ok(Some(json!({ "created": false })))
        }
        Err(e) => Err(e),
    }
}

fn upload_file(
    task: &str,
    services: &Services,
    src: &Path,
    key: &str,
    bucket: Option<&str>,
) -> Result<Option<serde_json::Value>> {
    let bucket = require_bucket(task, bucket)?;
    let bytes = services.fs.read(src)?;

    services.object_store.put_object(bucket, key, &bytes)?;

    let stored = services
        .object_store
        .head_object(bucket, key)?
        .ok_or_else(|| PipelineError::UploadMismatch {
            key: key.to_string(),
            reason: "object missing after upload".to_string(),
        })?;

    if stored.size != bytes.len() as u64 {
        return Err(PipelineError::UploadMismatch {
            key: key.to_string(),
            reason: format!("sent {} bytes, stored {}", bytes.len(), stored.size),
        });
    }
    if stored.digest != digest_hex(&bytes) {
        return Err(PipelineError::UploadMismatch {
            key: key.to_string(),
            reason: "digest differs from local file".to_string(),
        });
    }

    info!(task, bucket, key, size = stored.size, "uploaded file");
    Ok(Some(serde_json::to_value(&stored)?))
}

fn delete_local_file(task: &str, services: &Services, path: &Path) -> Result<Option<serde_json::Value>> {
    let is_csv = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".csv"));
    if !is_csv {
        info!(task, ?path, "not a .csv file; leaving it in place");
        return Ok(Some(json!({ "deleted": false })));
    }

    if !services.fs.exists(path) {
        warn!(task, ?path, "local file already absent");
        return Ok(Some(json!({ "deleted": false })));
    }

    services.fs.remove_file(path)?;
    info!(task, ?path, "deleted local file");
    Ok(Some(json!({ "deleted": true })))
}

fn load_table(task: &str, services: &Services, params: &LoadTableParams) -> Result<Option<serde_json::Value>> {
    let bucket = require_bucket(task, params.bucket.as_deref())?;
    let destination = TableRef::parse(&params.destination, services.warehouse.default_project())?;

    let job = LoadJob {
        bucket: bucket.to_string(),
        source_objects: params.source_objects.clone(),
        destination,
        schema: params.schema.clone(),
        skip_leading_rows: params.skip_leading_rows,
        write_disposition: params.write_disposition,
        create_disposition: params.create_disposition,
        allow_jagged_rows: params.allow_jagged_rows,
    };

    let stats = services.warehouse.load_from_object_store(&job)?;
    Ok(Some(serde_json::to_value(&stats)?))
}

fn delete_object(
    task: &str,
    services: &Services,
    bucket: Option<&str>,
    key: &str,
) -> Result<Option<serde_json::Value>> {
    let bucket = require_bucket(task, bucket)?;
    match services.object_store.delete_object(bucket, key) {
        Ok(()) => {
            info!(task, bucket, key, "deleted object");
            Ok(Some(json!({ "deleted": true })))
        }
        Err(PipelineError::ObjectNotFound { .. }) => {
            warn!(task, bucket, key, "object already absent");
            Ok(Some(json!({ "deleted": false })))
        }
        Err(e) => Err(e),
    }
}

fn execute_query(
    _task: &str,
    services: &Services,
    sql: &str,
    dialect: SqlDialect,
) -> Result<Option<serde_json::Value>> {
    let stats = services.warehouse.execute_query(sql, dialect)?;
    Ok(Some(serde_json::to_value(&stats)?))
}

fn validation_check(
    task: &str,
    services: &Services,
    context_root: &Path,
    checkpoint: &str,
    return_json: bool,
) -> Result<Option<serde_json::Value>> {
    let report = services.quality.run_checkpoint(context_root, checkpoint)?;
    if !report.success {
        warn!(
            task,
            checkpoint,
            unsuccessful = report.statistics.unsuccessful_expectations,
            "checkpoint verdict is failure"
        );
    }

    if return_json {
        Ok(Some(report.to_json()?))
    } else {
        Ok(None)
    }
}
