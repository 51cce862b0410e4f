// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Duplicate task id: {0}")]
    DuplicateTask(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("Invalid DAG structure: {0}")]
    InvalidGraph(String),

    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Dataset already exists: {0}")]
    DatasetAlreadyExists(String),

    #[error("Dataset {0} is not empty and delete_contents is false")]
    DatasetNotEmpty(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table {0} already exists and is not empty")]
    TableNotEmpty(String),

    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Object not found: gs://{bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("Upload verification failed for {key}: {reason}")]
    UploadMismatch { key: String, reason: String },

    #[error("Schema mismatch at row {row}: {reason}")]
    SchemaMismatch { row: usize, reason: String },

    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),

    #[error("Checkpoint error ({name}): {reason}")]
    CheckpointError { name: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;
