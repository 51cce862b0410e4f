// src/services/mod.rs

//! External collaborators reached by the pipeline's operators.
//!
//! - [`warehouse`]: datasets, tables, loads and queries.
//! - [`object_store`]: bucket/key object storage.
//! - [`quality`]: data-quality checkpoints.
//!
//! Each collaborator is a trait with a local emulation so a pipeline run
//! needs no cloud credentials.

pub mod object_store;
pub mod quality;
pub mod warehouse;

use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::fs::FileSystem;

use object_store::{LocalObjectStore, ObjectStore};
use quality::{LocalQualityEngine, QualityEngine};
use warehouse::{InMemoryWarehouse, Warehouse};

/// Project used by the local warehouse when no project id is configured.
pub const LOCAL_PROJECT: &str = "local-project";

/// The collaborators an operator may call.
#[derive(Debug, Clone)]
pub struct Services {
    pub fs: Arc<dyn FileSystem>,
    pub object_store: Arc<dyn ObjectStore>,
    pub warehouse: Arc<dyn Warehouse>,
    pub quality: Arc<dyn QualityEngine>,
}

impl Services {
    /// Local emulations: objects stored under `object_root`, an in-memory
    /// warehouse, and checkpoints read through `fs`.
    ///
    /// The quality engine validates `settings.table` unless a checkpoint
    /// names another table.
    pub fn local(settings: &Settings, object_root: &Path, fs: Arc<dyn FileSystem>) -> Self {
        let object_store: Arc<dyn ObjectStore> =
            Arc::new(LocalObjectStore::new(object_root, fs.clone()));
        let project = settings.project_id.as_deref().unwrap_or(LOCAL_PROJECT);
        let warehouse: Arc<dyn Warehouse> =
            Arc::new(InMemoryWarehouse::new(project, object_store.clone()));
        let quality: Arc<dyn QualityEngine> = Arc::new(LocalQualityEngine::new(
            fs.clone(),
            warehouse.clone(),
            settings.dataset.clone(),
            settings.table.clone(),
        ));

        Self {
            fs,
            object_store,
            warehouse,
            quality,
        }
    }
}
