// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{BUCKET_ENV, PROJECT_ID_ENV, RawSettings, Settings};
use crate::errors::{PipelineError, Result};

/// Load a settings file from a given path and return the raw `RawSettings`.
///
/// This only performs TOML deserialization; it does **not** apply the
/// environment overlay or validate anything. Use [`load_settings`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let raw: RawSettings = toml::from_str(&contents)?;

    Ok(raw)
}

/// Overlay the process environment on top of the file settings.
///
/// `GCP_PROJECT_ID` and `GCP_GCS_BUCKET` win over the `[gcp]` section when
/// set and non-empty. Absence is not an error here.
pub fn apply_env_overrides(raw: &mut RawSettings) {
    apply_overrides_from(raw, |key| std::env::var(key).ok());
}

/// Same as [`apply_env_overrides`], with an injectable lookup (for tests).
pub fn apply_overrides_from<F>(raw: &mut RawSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(project) = non_empty(PROJECT_ID_ENV) {
        debug!(%project, "project id taken from environment");
        raw.gcp.project_id = Some(project);
    }
    if let Some(bucket) = non_empty(BUCKET_ENV) {
        debug!(%bucket, "bucket taken from environment");
        raw.gcp.bucket = Some(bucket);
    }
}

/// Load settings for a run.
///
/// - Reads TOML from `path` if the file exists; otherwise starts from the
///   built-in defaults.
/// - Applies the environment overlay.
/// - Validates and resolves paths.
pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    let mut raw = if path.exists() {
        load_from_path(path)?
    } else {
        debug!(?path, "settings file not found; using defaults");
        RawSettings::default()
    };

    apply_env_overrides(&mut raw);
    Settings::try_from(raw)
}

/// Resolve settings for the CLI.
///
/// A path named with `--config` must exist. Without one, the default
/// `Qualitydag.toml` is read when present.
pub fn load_cli_settings(explicit: Option<&Path>) -> Result<Settings> {
    match explicit {
        Some(path) if !path.exists() => Err(PipelineError::ConfigError(format!(
            "settings file {} does not exist",
            path.display()
        ))),
        Some(path) => load_settings(path),
        None => load_settings(default_config_path()),
    }
}

/// Default settings file location: `Qualitydag.toml` in the current
/// working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Qualitydag.toml")
}
