// src/services/warehouse/sql.rs

//! Recogniser for the one statement shape the local warehouse executes:
//!
//! ```sql
//! CREATE OR REPLACE TABLE `p.d.derived`
//! CLUSTER BY col[, col...]
//! AS
//! SELECT col, col, ... | *
//! FROM `p.d.source`
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{PipelineError, Result};

static CTAS: LazyLock<Regex> = LazyLock::new(|| {
    let ident = r"`[^`]+`|[A-Za-z0-9_.\-]+";
    Regex::new(&format!(
        r"(?is)^\s*CREATE\s+OR\s+REPLACE\s+TABLE\s+(?P<dest>{ident})\s+(?:CLUSTER\s+BY\s+(?P<cluster>[A-Za-z0-9_,\s]+?)\s+)?AS\s+SELECT\s+(?P<cols>.+?)\s+FROM\s+(?P<src>{ident})\s*;?\s*$"
    ))
    .expect("static CTAS regex is valid")
});

/// Column projection of the SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    All,
    Columns(Vec<String>),
}

/// Parsed `CREATE OR REPLACE TABLE ... AS SELECT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableAsSelect {
    pub destination: String,
    pub source: String,
    pub cluster_by: Vec<String>,
    pub projection: Projection,
}

pub fn parse_create_table_as_select(sql: &str) -> Result<CreateTableAsSelect> {
    let caps = CTAS.captures(sql).ok_or_else(|| {
        PipelineError::UnsupportedQuery(format!(
            "expected CREATE OR REPLACE TABLE ... AS SELECT ... FROM ..., got: {}",
            sql.trim()
        ))
    })?;

    let cluster_by = caps
        .name("cluster")
        .map(|m| split_identifiers(m.as_str()))
        .unwrap_or_default();

    let cols = caps["cols"].trim();
    let projection = if cols == "*" {
        Projection::All
    } else {
        let columns = split_identifiers(cols);
        if let Some(bad) = columns
            .iter()
            .find(|c| !c.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_'))
        {
            return Err(PipelineError::UnsupportedQuery(format!(
                "only plain column names may be selected (got {bad:?})"
            )));
        }
        Projection::Columns(columns)
    };

    Ok(CreateTableAsSelect {
        destination: caps["dest"].trim_matches('`').to_string(),
        source: caps["src"].trim_matches('`').to_string(),
        cluster_by,
        projection,
    })
}

fn split_identifiers(list: &str) -> Vec<String> {
    list.split(',')
        .map(|c| c.trim().trim_matches('`').to_string())
        .filter(|c| !c.is_empty())
        .collect()
}
