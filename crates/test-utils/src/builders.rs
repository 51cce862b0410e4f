#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use qualitydag::config::{RawSettings, Settings};
use qualitydag::types::RunRequestBehaviour;

/// Header plus six players; one name is quoted.
pub const FIFA_CSV: &str = "\
player_id,name,nationality,position,overall,age,hits,potential,team
158023,Lionel Messi,Argentina,ST|CF|RW,94,33,299,94,FC Barcelona
20801,Cristiano Ronaldo,Portugal,ST|LW,93,35,276,93,Juventus
200389,Jan Oblak,Slovenia,GK,91,27,186,93,Atlético Madrid
190871,Neymar Jr,Brazil,CAM|LW,91,28,595,91,Paris Saint-Germain
192985,\"Kevin De Bruyne\",Belgium,CAM|CM,91,29,268,91,Manchester City
231747,Kylian Mbappé,France,ST|LW|RW,90,21,1363,95,Paris Saint-Germain
";

/// Number of data rows in [`FIFA_CSV`].
pub const FIFA_ROWS: usize = 6;

/// Checkpoint the loaded table satisfies.
pub const PASS_CHECKPOINT_TOML: &str = r#"
table = "FIFA"

[[expectations]]
type = "expect_table_row_count_to_be_between"
min_value = 1

[[expectations]]
type = "expect_column_values_to_not_be_null"
column = "player_id"

[[expectations]]
type = "expect_column_values_to_be_unique"
column = "player_id"

[[expectations]]
type = "expect_column_values_to_be_between"
column = "overall"
min_value = 0
max_value = 100
"#;

/// Checkpoint the clustered table violates (ages and positions).
pub const FAIL_CHECKPOINT_TOML: &str = r#"
table = "FIFA_clustered"

[[expectations]]
type = "expect_table_column_count_to_equal"
value = 9

[[expectations]]
type = "expect_column_values_to_be_between"
column = "age"
min_value = 16
max_value = 21

[[expectations]]
type = "expect_column_values_to_be_in_set"
column = "position"
value_set = ["GK"]
"#;

pub const TEST_BUCKET: &str = "test-bucket";

/// Builder for `Settings` rooted at a test directory.
pub struct SettingsBuilder {
    raw: RawSettings,
}

impl SettingsBuilder {
    /// Defaults, with `base_dir = root` and bucket [`TEST_BUCKET`].
    pub fn new(root: &Path) -> Self {
        let mut raw = RawSettings::default();
        raw.paths.base_dir = root.to_path_buf();
        raw.gcp.bucket = Some(TEST_BUCKET.to_string());
        Self { raw }
    }

    pub fn project(mut self, project: &str) -> Self {
        self.raw.gcp.project_id = Some(project.to_string());
        self
    }

    pub fn no_bucket(mut self) -> Self {
        self.raw.gcp.bucket = None;
        self
    }

    pub fn local_cleanup_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.raw.paths.local_cleanup_path = Some(path.into());
        self
    }

    pub fn behaviour(mut self, behaviour: RunRequestBehaviour, max_queued_runs: usize) -> Self {
        self.raw.runtime.run_request_behaviour = behaviour;
        self.raw.runtime.max_queued_runs = max_queued_runs;
        self
    }

    pub fn raw(self) -> RawSettings {
        self.raw
    }

    pub fn build(self) -> Settings {
        Settings::try_from(self.raw).expect("Failed to build valid settings from builder")
    }
}

/// Write `contents` as the settings' data file, creating parent dirs.
pub fn write_data_file(settings: &Settings, contents: &str) {
    write_file(&settings.data_file, contents);
}

/// Write checkpoint `name` under the settings' context root.
pub fn write_checkpoint(settings: &Settings, name: &str, contents: &str) {
    let path = settings
        .context_root
        .join("checkpoints")
        .join(format!("{name}.toml"));
    write_file(&path, contents);
}

/// Write the data file and both default checkpoints.
pub fn write_fixtures(settings: &Settings) {
    write_data_file(settings, FIFA_CSV);
    write_checkpoint(settings, &settings.pass_checkpoint, PASS_CHECKPOINT_TOML);
    write_checkpoint(settings, &settings.fail_checkpoint, FAIL_CHECKPOINT_TOML);
}

fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture dir");
    }
    fs::write(path, contents).expect("write fixture file");
}
