// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::RunRequestBehaviour;

pub const DEFAULT_DAG_ID: &str = "FIFA_21_GROUP4";
pub const DEFAULT_DESCRIPTION: &str =
    "Example DAG showcasing loading and data quality checking with FIFA data.";
pub const DEFAULT_DATASET: &str = "great_expectations_bigquery_example";
pub const DEFAULT_TABLE: &str = "FIFA";
pub const DEFAULT_CLUSTERED_TABLE: &str = "FIFA_clustered";
pub const DEFAULT_DATA_FILE_NAME: &str = "FIFA-21 Complete.csv";
pub const DEFAULT_PASS_CHECKPOINT: &str = "demo_taxi_pass_chk";
pub const DEFAULT_FAIL_CHECKPOINT: &str = "demo_taxi_fail_chk";

/// Environment variable holding the warehouse project id.
pub const PROJECT_ID_ENV: &str = "GCP_PROJECT_ID";
/// Environment variable holding the object-store bucket name.
pub const BUCKET_ENV: &str = "GCP_GCS_BUCKET";

/// Settings file as read from TOML, before validation.
///
/// Every section is optional; the defaults reproduce the FIFA pipeline:
///
/// ```toml
/// [pipeline]
/// dag_id = "FIFA_21_GROUP4"
///
/// [gcp]
/// project_id = "my-project"
/// bucket = "my-bucket"
///
/// [paths]
/// base_dir = "."
///
/// [runtime]
/// run_request_behaviour = "queue"
/// max_queued_runs = 16
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSettings {
    #[serde(default)]
    pub pipeline: PipelineSection,

    #[serde(default)]
    pub gcp: GcpSection,

    #[serde(default)]
    pub warehouse: WarehouseSection,

    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub quality: QualitySection,

    #[serde(default)]
    pub runtime: RuntimeSection,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    #[serde(default = "default_dag_id")]
    pub dag_id: String,

    #[serde(default = "default_description")]
    pub description: String,
}

fn default_dag_id() -> String {
    DEFAULT_DAG_ID.to_string()
}

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            dag_id: default_dag_id(),
            description: default_description(),
        }
    }
}

/// `[gcp]` section. Both values are normally supplied through the
/// environment; see [`PROJECT_ID_ENV`] and [`BUCKET_ENV`].
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GcpSection {
    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub bucket: Option<String>,
}

/// `[warehouse]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseSection {
    #[serde(default = "default_dataset")]
    pub dataset: String,

    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default = "default_clustered_table")]
    pub clustered_table: String,
}

fn default_dataset() -> String {
    DEFAULT_DATASET.to_string()
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_clustered_table() -> String {
    DEFAULT_CLUSTERED_TABLE.to_string()
}

impl Default for WarehouseSection {
    fn default() -> Self {
        Self {
            dataset: default_dataset(),
            table: default_table(),
            clustered_table: default_clustered_table(),
        }
    }
}

/// `[paths]` section.
///
/// Relative paths are resolved against `base_dir`.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Defaults to `<base_dir>/data/FIFA-21 Complete.csv`.
    #[serde(default)]
    pub data_file: Option<PathBuf>,

    /// File removed by the local cleanup node. Defaults to `data_file`.
    #[serde(default)]
    pub local_cleanup_path: Option<PathBuf>,

    /// Data-quality context root. Defaults to `<base_dir>/config/ge`.
    #[serde(default)]
    pub context_root: Option<PathBuf>,

    /// Object key the CSV is uploaded to.
    #[serde(default = "default_object_key")]
    pub object_key: String,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_object_key() -> String {
    DEFAULT_DATA_FILE_NAME.to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            data_file: None,
            local_cleanup_path: None,
            context_root: None,
            object_key: default_object_key(),
        }
    }
}

/// `[quality]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct QualitySection {
    #[serde(default = "default_pass_checkpoint")]
    pub pass_checkpoint: String,

    #[serde(default = "default_fail_checkpoint")]
    pub fail_checkpoint: String,
}

fn default_pass_checkpoint() -> String {
    DEFAULT_PASS_CHECKPOINT.to_string()
}

fn default_fail_checkpoint() -> String {
    DEFAULT_FAIL_CHECKPOINT.to_string()
}

impl Default for QualitySection {
    fn default() -> Self {
        Self {
            pass_checkpoint: default_pass_checkpoint(),
            fail_checkpoint: default_fail_checkpoint(),
        }
    }
}

/// `[runtime]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeSection {
    #[serde(default)]
    pub run_request_behaviour: RunRequestBehaviour,

    /// Maximum number of run requests remembered while a run is active.
    #[serde(default = "default_max_queued_runs")]
    pub max_queued_runs: usize,
}

fn default_max_queued_runs() -> usize {
    16
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            run_request_behaviour: RunRequestBehaviour::default(),
            max_queued_runs: default_max_queued_runs(),
        }
    }
}

/// Validated settings with every path resolved.
///
/// Construct through `Settings::try_from(RawSettings)` (see
/// `config::validate`) or the loader functions.
#[derive(Debug, Clone)]
pub struct Settings {
    pub dag_id: String,
    pub description: String,
    pub project_id: Option<String>,
    pub bucket: Option<String>,
    pub dataset: String,
    pub table: String,
    pub clustered_table: String,
    pub data_file: PathBuf,
    pub local_cleanup_path: PathBuf,
    pub context_root: PathBuf,
    pub object_key: String,
    pub pass_checkpoint: String,
    pub fail_checkpoint: String,
    pub run_request_behaviour: RunRequestBehaviour,
    pub max_queued_runs: usize,
}

impl Settings {
    pub(crate) fn from_raw_unchecked(raw: RawSettings) -> Self {
        let base = raw.paths.base_dir;
        let resolve = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };

        let data_file = raw
            .paths
            .data_file
            .map(&resolve)
            .unwrap_or_else(|| base.join("data").join(DEFAULT_DATA_FILE_NAME));
        let local_cleanup_path = raw
            .paths
            .local_cleanup_path
            .map(&resolve)
            .unwrap_or_else(|| data_file.clone());
        let context_root = raw
            .paths
            .context_root
            .map(&resolve)
            .unwrap_or_else(|| base.join("config").join("ge"));

        Self {
            dag_id: raw.pipeline.dag_id,
            description: raw.pipeline.description,
            project_id: raw.gcp.project_id,
            bucket: raw.gcp.bucket,
            dataset: raw.warehouse.dataset,
            table: raw.warehouse.table,
            clustered_table: raw.warehouse.clustered_table,
            data_file,
            local_cleanup_path,
            context_root,
            object_key: raw.paths.object_key,
            pass_checkpoint: raw.quality.pass_checkpoint,
            fail_checkpoint: raw.quality.fail_checkpoint,
            run_request_behaviour: raw.runtime.run_request_behaviour,
            max_queued_runs: raw.runtime.max_queued_runs,
        }
    }

    /// `project.dataset.table` when a project is known, else `dataset.table`.
    pub fn qualified_table(&self, table: &str) -> String {
        match &self.project_id {
            Some(project) => format!("{project}.{}.{table}", self.dataset),
            None => format!("{}.{table}", self.dataset),
        }
    }
}
