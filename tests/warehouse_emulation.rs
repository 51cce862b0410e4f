// tests/warehouse_emulation.rs

use std::error::Error;
use std::sync::Arc;

use qualitydag::dag::fifa::{clustered_table_sql, schema_fields};
use qualitydag::dag::SchemaField;
use qualitydag::errors::PipelineError;
use qualitydag::services::object_store::{InMemoryObjectStore, ObjectStore};
use qualitydag::services::warehouse::sql::parse_create_table_as_select;
use qualitydag::services::warehouse::{
    DeleteOutcome, InMemoryWarehouse, LoadJob, TableRef, Value, Warehouse,
};
use qualitydag::types::{ColumnType, CreateDisposition, SqlDialect, WriteDisposition};
use qualitydag_test_utils::builders::{FIFA_CSV, FIFA_ROWS};

type TestResult = Result<(), Box<dyn Error>>;

const PROJECT: &str = "proj";
const DATASET: &str = "ds";
const BUCKET: &str = "bucket";

fn setup(csv: &str) -> (InMemoryObjectStore, InMemoryWarehouse) {
    let store = InMemoryObjectStore::new().with_bucket(BUCKET);
    store
        .put_object(BUCKET, "fifa.csv", csv.as_bytes())
        .expect("put");
    let warehouse = InMemoryWarehouse::new(PROJECT, Arc::new(store.clone()));
    warehouse.create_dataset(None, DATASET).expect("create dataset");
    (store, warehouse)
}

fn job(allow_jagged_rows: bool) -> LoadJob {
    LoadJob {
        bucket: BUCKET.to_string(),
        source_objects: vec!["fifa.csv".to_string()],
        destination: TableRef::new(PROJECT, DATASET, "FIFA"),
        schema: schema_fields(),
        skip_leading_rows: 1,
        write_disposition: WriteDisposition::WriteTruncate,
        create_disposition: CreateDisposition::CreateIfNeeded,
        allow_jagged_rows,
    }
}

#[test]
fn load_reads_quoted_fields_and_any_line_ending() -> TestResult {
    // CR-only, CRLF and LF terminators, a blank line, escaped quotes and a
    // quoted field spanning two lines.
    let data = "key,value\r1,\"x,y\"\r\n\n\"say \"\"hi\"\"\",\"multi\nline\"\r2,\n";
    let (_store, warehouse) = setup(data);

    let stats = warehouse.load_from_object_store(&LoadJob {
        schema: vec![
            SchemaField::required("key", ColumnType::String),
            SchemaField::nullable("value", ColumnType::String),
        ],
        ..job(false)
    })?;
    assert_eq!(stats.rows_loaded, 3);

    let table = warehouse.table(&TableRef::new(PROJECT, DATASET, "FIFA"))?;
    assert_eq!(table.rows[0][1], Value::String("x,y".to_string()));
    assert_eq!(table.rows[1][0], Value::String("say \"hi\"".to_string()));
    assert_eq!(table.rows[1][1], Value::String("multi\nline".to_string()));
    assert_eq!(table.rows[2][0], Value::String("2".to_string()));
    assert!(table.rows[2][1].is_null());
    Ok(())
}

#[test]
fn load_coerces_rows_per_schema() -> TestResult {
    let (_store, warehouse) = setup(FIFA_CSV);

    let stats = warehouse.load_from_object_store(&job(true))?;
    assert_eq!(stats.rows_loaded, FIFA_ROWS);
    assert_eq!(stats.jagged_rows, 0);
    assert!(stats.table_created);

    let table = warehouse.table(&TableRef::new(PROJECT, DATASET, "FIFA"))?;
    assert_eq!(table.schema.len(), 9);
    assert_eq!(table.rows.len(), FIFA_ROWS);
    assert_eq!(table.rows[0][0], Value::Integer(158023));
    assert_eq!(table.rows[4][1], Value::String("Kevin De Bruyne".to_string()));
    assert_eq!(table.rows[2][8], Value::String("Atlético Madrid".to_string()));
    assert_eq!(table.clustering, None);
    Ok(())
}

#[test]
fn jagged_rows_are_padded_when_allowed_and_rejected_otherwise() -> TestResult {
    let csv = format!("{FIFA_CSV}999,Short Row,Nowhere\n");
    let (_store, warehouse) = setup(&csv);

    let err = warehouse.load_from_object_store(&job(false)).unwrap_err();
    assert!(matches!(err, PipelineError::SchemaMismatch { row: 8, .. }));
    // A failed load leaves no table behind.
    assert!(warehouse.table_names(None, DATASET).is_empty());

    let stats = warehouse.load_from_object_store(&job(true))?;
    assert_eq!(stats.rows_loaded, FIFA_ROWS + 1);
    assert_eq!(stats.jagged_rows, 1);

    let table = warehouse.table(&TableRef::new(PROJECT, DATASET, "FIFA"))?;
    let last = table.rows.last().unwrap();
    assert_eq!(last[2], Value::String("Nowhere".to_string()));
    assert!(last[3..].iter().all(Value::is_null));
    Ok(())
}

#[test]
fn missing_required_value_and_bad_integers_are_fatal() {
    let header = "player_id,name,nationality,position,overall,age,hits,potential,team\n";

    let (_s, warehouse) = setup(&format!("{header},Nobody,X,GK,50,20,1,60,Team\n"));
    let err = warehouse.load_from_object_store(&job(true)).unwrap_err();
    assert!(matches!(err, PipelineError::SchemaMismatch { reason, .. } if reason.contains("player_id")));

    let (_s, warehouse) = setup(&format!("{header}1,A,X,GK,high,20,1,60,Team\n"));
    let err = warehouse.load_from_object_store(&job(true)).unwrap_err();
    assert!(matches!(err, PipelineError::SchemaMismatch { reason, .. } if reason.contains("overall")));

    let (_s, warehouse) = setup(&format!("{header}1,A,X,GK,50,20,1,60,Team,extra\n"));
    let err = warehouse.load_from_object_store(&job(true)).unwrap_err();
    assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
}

#[test]
fn write_and_create_dispositions() -> TestResult {
    let (_store, warehouse) = setup(FIFA_CSV);

    let mut never = job(true);
    never.create_disposition = CreateDisposition::CreateNever;
    assert!(matches!(
        warehouse.load_from_object_store(&never),
        Err(PipelineError::TableNotFound(_))
    ));

    warehouse.load_from_object_store(&job(true))?;
    let stats = warehouse.load_from_object_store(&job(true))?;
    assert!(!stats.table_created);
    let fifa = TableRef::new(PROJECT, DATASET, "FIFA");
    assert_eq!(warehouse.table(&fifa)?.rows.len(), FIFA_ROWS);

    let mut append = job(true);
    append.write_disposition = WriteDisposition::WriteAppend;
    warehouse.load_from_object_store(&append)?;
    assert_eq!(warehouse.table(&fifa)?.rows.len(), FIFA_ROWS * 2);

    let mut empty = job(true);
    empty.write_disposition = WriteDisposition::WriteEmpty;
    assert!(matches!(
        warehouse.load_from_object_store(&empty),
        Err(PipelineError::TableNotEmpty(_))
    ));
    Ok(())
}

#[test]
fn load_requires_dataset_and_object() {
    let (_store, warehouse) = setup(FIFA_CSV);

    let mut other_dataset = job(true);
    other_dataset.destination = TableRef::new(PROJECT, "missing", "FIFA");
    assert!(matches!(
        warehouse.load_from_object_store(&other_dataset),
        Err(PipelineError::DatasetNotFound(_))
    ));

    let mut missing_object = job(true);
    missing_object.source_objects = vec!["nope.csv".to_string()];
    assert!(matches!(
        warehouse.load_from_object_store(&missing_object),
        Err(PipelineError::ObjectNotFound { .. })
    ));
}

#[test]
fn clustered_query_creates_projected_table_ordered_by_team() -> TestResult {
    let (_store, warehouse) = setup(FIFA_CSV);
    warehouse.load_from_object_store(&job(true))?;

    let sql = clustered_table_sql("ds.FIFA", "proj.ds.FIFA_clustered");
    let stats = warehouse.execute_query(&sql, SqlDialect::Standard)?;
    assert_eq!(stats.rows_written, FIFA_ROWS);
    assert_eq!(stats.destination, TableRef::new(PROJECT, DATASET, "FIFA_clustered"));

    let table = warehouse.table(&stats.destination)?;
    assert_eq!(table.column_names()[0], "team");
    assert_eq!(table.schema.len(), 9);
    assert_eq!(table.clustering, Some(vec!["team".to_string()]));

    let teams: Vec<&Value> = table.column("team").unwrap();
    let mut sorted = teams.clone();
    sorted.sort();
    assert_eq!(teams, sorted);

    // Re-running replaces the table.
    warehouse.execute_query(&sql, SqlDialect::Standard)?;
    assert_eq!(
        warehouse.table_names(None, DATASET),
        vec!["FIFA".to_string(), "FIFA_clustered".to_string()]
    );
    Ok(())
}

#[test]
fn unsupported_queries_are_rejected() {
    let (_store, warehouse) = setup(FIFA_CSV);

    let sql = clustered_table_sql("ds.FIFA", "ds.FIFA_clustered");
    assert!(matches!(
        warehouse.execute_query(&sql, SqlDialect::Legacy),
        Err(PipelineError::UnsupportedQuery(_))
    ));
    assert!(matches!(
        warehouse.execute_query("SELECT 1", SqlDialect::Standard),
        Err(PipelineError::UnsupportedQuery(_))
    ));
    assert!(matches!(
        warehouse.execute_query(&sql, SqlDialect::Standard),
        Err(PipelineError::TableNotFound(_))
    ));
    assert!(parse_create_table_as_select(
        "CREATE OR REPLACE TABLE `a.b` AS SELECT COUNT(*) FROM `a.c`"
    )
    .is_err());
}

#[test]
fn dataset_lifecycle() -> TestResult {
    let (_store, warehouse) = setup(FIFA_CSV);

    assert!(matches!(
        warehouse.create_dataset(Some(PROJECT), DATASET),
        Err(PipelineError::DatasetAlreadyExists(_))
    ));
    assert_eq!(
        warehouse.delete_dataset(None, "absent", true)?,
        DeleteOutcome::NotFound
    );

    warehouse.load_from_object_store(&job(true))?;
    assert!(matches!(
        warehouse.delete_dataset(None, DATASET, false),
        Err(PipelineError::DatasetNotEmpty(_))
    ));
    assert_eq!(
        warehouse.delete_dataset(Some(PROJECT), DATASET, true)?,
        DeleteOutcome::Deleted { tables: 1 }
    );
    assert!(!warehouse.dataset_exists(None, DATASET));

    // Datasets are keyed by project.
    warehouse.create_dataset(Some("other"), DATASET)?;
    assert!(!warehouse.dataset_exists(None, DATASET));
    assert!(warehouse.dataset_exists(Some("other"), DATASET));
    Ok(())
}

#[test]
fn table_refs_parse_short_and_long_forms() -> TestResult {
    assert_eq!(
        TableRef::parse("`p.d.t`", "default")?,
        TableRef::new("p", "d", "t")
    );
    assert_eq!(
        TableRef::parse("d.t", "default")?,
        TableRef::new("default", "d", "t")
    );
    assert!(TableRef::parse("t", "default").is_err());
    assert!(TableRef::parse("p..t", "default").is_err());
    Ok(())
}
