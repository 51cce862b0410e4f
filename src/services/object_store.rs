// src/services/object_store.rs

//! Object-store collaborator and two local emulations.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;

/// Metadata returned for a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectMeta {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    /// blake3 hex digest of the object bytes.
    pub digest: String,
}

impl ObjectMeta {
    pub fn for_bytes(bucket: &str, key: &str, bytes: &[u8]) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size: bytes.len() as u64,
            digest: digest_hex(bytes),
        }
    }
}

/// blake3 hex digest used to verify uploads.
pub fn digest_hex(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Cloud object storage, reduced to the calls the pipeline makes.
pub trait ObjectStore: Send + Sync + Debug {
    fn put_object(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<ObjectMeta>;
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;
    /// Fails with `ObjectNotFound` if the object does not exist.
    fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;
    /// `None` if the object does not exist.
    fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>>;
}

/// In-memory object store. Buckets must be created up front.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    buckets: Arc<Mutex<BTreeMap<String, BTreeMap<String, Vec<u8>>>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(self, bucket: &str) -> Self {
        self.create_bucket(bucket);
        self
    }

    pub fn create_bucket(&self, bucket: &str) {
        self.lock().entry(bucket.to_string()).or_default();
    }

    /// Keys currently stored in `bucket`.
    pub fn keys(&self, bucket: &str) -> BTreeSet<String> {
        self.lock()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, BTreeMap<String, Vec<u8>>>> {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put_object(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<ObjectMeta> {
        let mut buckets = self.lock();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| PipelineError::BucketNotFound(bucket.to_string()))?;
        objects.insert(key.to_string(), bytes.to_vec());
        debug!(bucket, key, size = bytes.len(), "stored object");
        Ok(ObjectMeta::for_bytes(bucket, key, bytes))
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let buckets = self.lock();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| PipelineError::BucketNotFound(bucket.to_string()))?;
        objects.get(key).cloned().ok_or_else(|| not_found(bucket, key))
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let mut buckets = self.lock();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| PipelineError::BucketNotFound(bucket.to_string()))?;
        objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| not_found(bucket, key))
    }

    fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>> {
        let buckets = self.lock();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| PipelineError::BucketNotFound(bucket.to_string()))?;
        Ok(objects
            .get(key)
            .map(|bytes| ObjectMeta::for_bytes(bucket, key, bytes)))
    }
}

/// Object store laid out on a filesystem as `<root>/<bucket>/<key>`.
///
/// Buckets are created on first write.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
        }
    }

    /// Resolve an object to its on-disk path, rejecting keys that would
    /// escape the bucket directory.
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        for part in [bucket, key] {
            let escapes = part.is_empty()
                || Path::new(part)
                    .components()
                    .any(|c| !matches!(c, Component::Normal(_)));
            if escapes {
                return Err(PipelineError::ConfigError(format!(
                    "invalid object location gs://{bucket}/{key}"
                )));
            }
        }
        Ok(self.root.join(bucket).join(key))
    }
}

impl ObjectStore for LocalObjectStore {
    fn put_object(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<ObjectMeta> {
        let path = self.object_path(bucket, key)?;
        self.fs.write(&path, bytes)?;
        debug!(bucket, key, ?path, size = bytes.len(), "stored object on disk");
        Ok(ObjectMeta::for_bytes(bucket, key, bytes))
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        if !self.fs.is_file(&path) {
            return Err(not_found(bucket, key));
        }
        Ok(self.fs.read(&path)?)
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if !self.fs.is_file(&path) {
            return Err(not_found(bucket, key));
        }
        Ok(self.fs.remove_file(&path)?)
    }

    fn head_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectMeta>> {
        let path = self.object_path(bucket, key)?;
        if !self.fs.is_file(&path) {
            return Ok(None);
        }
        let bytes = self.fs.read(&path)?;
        Ok(Some(ObjectMeta::for_bytes(bucket, key, &bytes)))
    }
}

fn not_found(bucket: &str, key: &str) -> PipelineError {
    PipelineError::ObjectNotFound {
        bucket: bucket.to_string(),
        key: key.to_string(),
    }
}
