// src/dag/schema.rs

//! Column descriptors used by the load-to-table node.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ColumnMode, ColumnType};

/// One column of a destination table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub mode: ColumnMode,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, column_type: ColumnType, mode: ColumnMode) -> Self {
        Self {
            name: name.into(),
            column_type,
            mode,
        }
    }

    pub fn required(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self::new(name, column_type, ColumnMode::Required)
    }

    pub fn nullable(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self::new(name, column_type, ColumnMode::Nullable)
    }

    pub fn is_required(&self) -> bool {
        self.mode == ColumnMode::Required
    }
}

impl fmt::Display for SchemaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.column_type, self.mode)
    }
}
