// tests/quality_checkpoints.rs

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use qualitydag::dag::fifa::{clustered_table_sql, schema_fields};
use qualitydag::errors::PipelineError;
use qualitydag::fs::mock::MockFileSystem;
use qualitydag::services::object_store::{InMemoryObjectStore, ObjectStore};
use qualitydag::services::quality::checkpoint::checkpoint_path;
use qualitydag::services::quality::{LocalQualityEngine, QualityEngine};
use qualitydag::services::warehouse::{InMemoryWarehouse, LoadJob, TableRef, Warehouse};
use qualitydag::types::{CreateDisposition, SqlDialect, WriteDisposition};
use qualitydag_test_utils::builders::{FAIL_CHECKPOINT_TOML, FIFA_CSV, PASS_CHECKPOINT_TOML};

type TestResult = Result<(), Box<dyn Error>>;

const ROOT: &str = "/ctx";

/// Warehouse with `ds.FIFA` and `ds.FIFA_clustered` loaded from [`FIFA_CSV`].
fn engine(fs: &MockFileSystem) -> LocalQualityEngine {
    let store = InMemoryObjectStore::new().with_bucket("b");
    store
        .put_object("b", "fifa.csv", FIFA_CSV.as_bytes())
        .expect("put");
    let warehouse = Arc::new(InMemoryWarehouse::new("proj", Arc::new(store)));
    warehouse.create_dataset(None, "ds").expect("dataset");
    warehouse
        .load_from_object_store(&LoadJob {
            bucket: "b".to_string(),
            source_objects: vec!["fifa.csv".to_string()],
            destination: TableRef::new("proj", "ds", "FIFA"),
            schema: schema_fields(),
            skip_leading_rows: 1,
            write_disposition: WriteDisposition::WriteTruncate,
            create_disposition: CreateDisposition::CreateIfNeeded,
            allow_jagged_rows: true,
        })
        .expect("load");
    warehouse
        .execute_query(
            &clustered_table_sql("ds.FIFA", "ds.FIFA_clustered"),
            SqlDialect::Standard,
        )
        .expect("query");

    LocalQualityEngine::new(Arc::new(fs.clone()), warehouse, "ds", "FIFA")
}

fn add_checkpoint(fs: &MockFileSystem, name: &str, contents: &str) {
    fs.add_file(
        Path::new(ROOT).join("checkpoints").join(format!("{name}.toml")),
        contents,
    );
}

#[test]
fn pass_checkpoint_reports_success() -> TestResult {
    let fs = MockFileSystem::new();
    add_checkpoint(&fs, "pass", PASS_CHECKPOINT_TOML);

    let report = engine(&fs).run_checkpoint(Path::new(ROOT), "pass")?;

    assert!(report.success);
    assert_eq!(report.checkpoint_name, "pass");
    assert_eq!(report.table, "proj.ds.FIFA");
    assert_eq!(report.statistics.evaluated_expectations, 4);
    assert_eq!(report.statistics.unsuccessful_expectations, 0);
    assert_eq!(report.statistics.success_percent, 100.0);
    assert_eq!(report.results[0].observed_value, serde_json::json!(6));
    Ok(())
}

#[test]
fn fail_checkpoint_reports_failure_with_details() -> TestResult {
    let fs = MockFileSystem::new();
    add_checkpoint(&fs, "fail", FAIL_CHECKPOINT_TOML);

    let report = engine(&fs).run_checkpoint(Path::new(ROOT), "fail")?;

    assert!(!report.success);
    assert_eq!(report.table, "proj.ds.FIFA_clustered");
    let outcomes: Vec<bool> = report.results.iter().map(|r| r.success).collect();
    assert_eq!(outcomes, vec![true, false, false]);

    let ages = &report.results[1];
    assert_eq!(ages.column.as_deref(), Some("age"));
    assert_eq!(
        ages.observed_value,
        serde_json::json!({ "unexpected_count": 5, "element_count": 6 })
    );

    let json = report.to_json()?;
    assert_eq!(json["success"], serde_json::json!(false));
    assert_eq!(
        json["results"][2]["expectation_type"],
        serde_json::json!("expect_column_values_to_be_in_set")
    );
    Ok(())
}

#[test]
fn expectations_on_missing_columns_fail_without_erroring() -> TestResult {
    let fs = MockFileSystem::new();
    add_checkpoint(
        &fs,
        "ghost",
        r#"
[[expectations]]
type = "expect_column_to_exist"
column = "shirt_number"

[[expectations]]
type = "expect_column_values_to_be_unique"
column = "team"

[[expectations]]
type = "expect_table_row_count_to_be_between"
max_value = 3
"#,
    );

    let report = engine(&fs).run_checkpoint(Path::new(ROOT), "ghost")?;

    assert!(!report.success);
    assert_eq!(report.statistics.successful_expectations, 0);
    assert!(report.results[0].details.as_deref().unwrap().contains("shirt_number"));
    // Two players share Paris Saint-Germain; both count as unexpected.
    assert_eq!(
        report.results[1].observed_value["unexpected_count"],
        serde_json::json!(2)
    );
    Ok(())
}

#[test]
fn unknown_or_malformed_checkpoints_are_errors() {
    let fs = MockFileSystem::new();
    add_checkpoint(&fs, "broken", "[[expectations]]\ntype = \"expect_magic\"\n");
    let engine = engine(&fs);

    let err = engine.run_checkpoint(Path::new(ROOT), "missing").unwrap_err();
    assert!(matches!(err, PipelineError::CheckpointError { name, .. } if name == "missing"));

    let err = engine.run_checkpoint(Path::new(ROOT), "broken").unwrap_err();
    assert!(matches!(err, PipelineError::CheckpointError { .. }));

    assert!(checkpoint_path(Path::new(ROOT), "../escape").is_err());
    assert!(checkpoint_path(Path::new(ROOT), "").is_err());
}

#[test]
fn checkpoint_against_missing_table_is_an_error() {
    let fs = MockFileSystem::new();
    add_checkpoint(&fs, "other", "table = \"NOPE\"\n");

    let err = engine(&fs)
        .run_checkpoint(Path::new(ROOT), "other")
        .unwrap_err();
    assert!(matches!(err, PipelineError::TableNotFound(_)));
}
