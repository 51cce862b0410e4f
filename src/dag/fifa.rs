// src/dag/fifa.rs

//! The FIFA-21 load-and-validate pipeline.
//!
//! ```text
//! begin -> delete_dataset -> create_dataset -> upload_FIFA_data
//!       -> delete_csv_files -> FIFA_gcs_to_bigquery -> delete_csv_GCS_files
//!       -> create_clustered_table -> { ge_bigquery_validation_fail,
//!                                      ge_bigquery_validation_pass } -> end
//! ```

use crate::config::Settings;
use crate::dag::definition::{Link, PipelineBuilder, PipelineDefinition, TaskNode};
use crate::dag::operator::{LoadTableParams, Operator};
use crate::dag::schema::SchemaField;
use crate::errors::Result;
use crate::types::{ColumnType, CreateDisposition, SqlDialect, TriggerRule, WriteDisposition};

pub const BEGIN: &str = "begin";
pub const DELETE_DATASET: &str = "delete_dataset";
pub const CREATE_DATASET: &str = "create_dataset";
pub const UPLOAD_DATA: &str = "upload_FIFA_data";
pub const DELETE_LOCAL_CSV: &str = "delete_csv_files";
pub const LOAD_TO_TABLE: &str = "FIFA_gcs_to_bigquery";
pub const DELETE_REMOTE_CSV: &str = "delete_csv_GCS_files";
pub const CREATE_CLUSTERED_TABLE: &str = "create_clustered_table";
pub const VALIDATION_PASS: &str = "ge_bigquery_validation_pass";
pub const VALIDATION_FAIL: &str = "ge_bigquery_validation_fail";
pub const END: &str = "end";

/// Column the derived table is clustered by.
pub const CLUSTER_COLUMN: &str = "team";

/// Columns selected into the derived clustered table, in order.
pub const CLUSTERED_COLUMNS: [&str; 9] = [
    "team",
    "player_id",
    "name",
    "nationality",
    "position",
    "overall",
    "age",
    "hits",
    "potential",
];

/// Schema of the raw FIFA table, in CSV column order.
pub fn schema_fields() -> Vec<SchemaField> {
    vec![
        SchemaField::required("player_id", ColumnType::Integer),
        SchemaField::nullable("name", ColumnType::String),
        SchemaField::nullable("nationality", ColumnType::String),
        SchemaField::nullable("position", ColumnType::String),
        SchemaField::nullable("overall", ColumnType::Integer),
        SchemaField::nullable("age", ColumnType::Integer),
        SchemaField::nullable("hits", ColumnType::Integer),
        SchemaField::nullable("potential", ColumnType::Integer),
        SchemaField::nullable("team", ColumnType::String),
    ]
}

/// `CREATE OR REPLACE TABLE ... CLUSTER BY team AS SELECT ...` for the
/// derived table.
pub fn clustered_table_sql(source_table: &str, clustered_table: &str) -> String {
    format!(
        "CREATE OR REPLACE TABLE `{clustered_table}`\nCLUSTER BY {CLUSTER_COLUMN}\nAS\nSELECT {}\nFROM `{source_table}`\n",
        CLUSTERED_COLUMNS.join(", ")
    )
}

/// Build the pipeline definition from settings.
pub fn build_pipeline(settings: &Settings) -> Result<PipelineDefinition> {
    let source_table = settings.qualified_table(&settings.table);
    let clustered_table = settings.qualified_table(&settings.clustered_table);

    let begin = TaskNode::new(BEGIN, Operator::NoOp);

    let delete_dataset = TaskNode::new(
        DELETE_DATASET,
        Operator::DeleteDataset {
            project_id: settings.project_id.clone(),
            dataset_id: settings.dataset.clone(),
            delete_contents: true,
        },
    )
    .with_trigger_rule(TriggerRule::AllDone);

    let create_dataset = TaskNode::new(
        CREATE_DATASET,
        Operator::CreateDataset {
            project_id: None,
            dataset_id: settings.dataset.clone(),
        },
    );

    let upload = TaskNode::new(
        UPLOAD_DATA,
        Operator::UploadFile {
            src: settings.data_file.clone(),
            dst: settings.object_key.clone(),
            bucket: settings.bucket.clone(),
        },
    );

    let delete_local = TaskNode::new(
        DELETE_LOCAL_CSV,
        Operator::DeleteLocalFile {
            path: settings.local_cleanup_path.clone(),
        },
    );

    let load = TaskNode::new(
        LOAD_TO_TABLE,
        Operator::LoadTable(LoadTableParams {
            bucket: settings.bucket.clone(),
            source_objects: vec![settings.object_key.clone()],
            destination: source_table.clone(),
            schema: schema_fields(),
            skip_leading_rows: 1,
            write_disposition: WriteDisposition::WriteTruncate,
            create_disposition: CreateDisposition::CreateIfNeeded,
            allow_jagged_rows: true,
        }),
    );

    let delete_remote = TaskNode::new(
        DELETE_REMOTE_CSV,
        Operator::DeleteObject {
            bucket: settings.bucket.clone(),
            key: settings.object_key.clone(),
        },
    );

    let clustered = TaskNode::new(
        CREATE_CLUSTERED_TABLE,
        Operator::ExecuteQuery {
            sql: clustered_table_sql(&source_table, &clustered_table),
            dialect: SqlDialect::Standard,
        },
    );

    let validation_pass = TaskNode::new(
        VALIDATION_PASS,
        Operator::ValidationCheck {
            context_root: settings.context_root.clone(),
            checkpoint_name: settings.pass_checkpoint.clone(),
            return_json: true,
        },
    );

    let validation_fail = TaskNode::new(
        VALIDATION_FAIL,
        Operator::ValidationCheck {
            context_root: settings.context_root.clone(),
            checkpoint_name: settings.fail_checkpoint.clone(),
            return_json: true,
        },
    );

    let end = TaskNode::new(END, Operator::NoOp).with_trigger_rule(TriggerRule::AllDone);

    PipelineBuilder::new(settings.dag_id.clone())
        .description(settings.description.clone())
        .task(begin)
        .task(delete_dataset)
        .task(create_dataset)
        .task(upload)
        .task(delete_local)
        .task(load)
        .task(delete_remote)
        .task(clustered)
        .task(validation_fail)
        .task(validation_pass)
        .task(end)
        .chain([
            Link::from(BEGIN),
            Link::from(DELETE_DATASET),
            Link::from(CREATE_DATASET),
            Link::from(UPLOAD_DATA),
            Link::from(DELETE_LOCAL_CSV),
            Link::from(LOAD_TO_TABLE),
            Link::from(DELETE_REMOTE_CSV),
            Link::from(CREATE_CLUSTERED_TABLE),
            Link::from(vec![VALIDATION_FAIL, VALIDATION_PASS]),
            Link::from(END),
        ])
        .build()
}
