//! Mapping file: which worksheet each table is checked against.
//!
//! The file is YAML (JSON documents parse the same way) and maps a table name
//! to its workbook and sheet:
//!
//! ```yaml
//! customers:
//!   file: customers.xlsx
//!   sheet: Active
//!   order_by: [customer_id]
//!   ignore_missing_source_columns: true
//! ```
//!
//! Entries keep their declaration order, which is also the report order.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("mapping file must be a map of table names to {{file, sheet}} entries")]
    NotAMapping,
    #[error("table name {0} is not a string")]
    NonStringKey(String),
    #[error("table '{table}': '{field}' must not be empty")]
    EmptyField { table: String, field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntrySpec {
    file: String,
    sheet: String,
    #[serde(default)]
    order_by: Vec<String>,
    #[serde(default)]
    ignore_missing_source_columns: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMapping {
    pub table: String,
    pub file: String,
    pub sheet: String,
    /// Columns the table is sorted by before comparison.
    pub order_by: Vec<String>,
    /// Overrides the command-line default for this table only.
    pub ignore_missing_source_columns: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonConfig {
    pub tables: Vec<TableMapping>,
}

impl ComparisonConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read_to_string(path).with_context(|| format!("Reading mapping file {path:?}"))?;
        Self::parse(&raw).with_context(|| format!("Parsing mapping file {path:?}"))
    }

    pub fn parse(input: &str) -> Result<Self> {
        let document: Value = serde_yaml::from_str(input)?;
        let mapping = match document {
            Value::Mapping(mapping) => mapping,
            Value::Null => Mapping::new(),
            _ => return Err(ConfigError::NotAMapping.into()),
        };

        let mut tables = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let table = match key {
                Value::String(name) => name,
                other => return Err(ConfigError::NonStringKey(format!("{other:?}")).into()),
            };
            let entry: EntrySpec = serde_yaml::from_value(value)
                .with_context(|| format!("Table '{table}'"))?;
            for (field, value) in [("file", &entry.file), ("sheet", &entry.sheet)] {
                if value.trim().is_empty() {
                    return Err(ConfigError::EmptyField {
                        table: table.clone(),
                        field,
                    }
                    .into());
                }
            }
            tables.push(TableMapping {
                table,
                file: entry.file,
                sheet: entry.sheet,
                order_by: entry.order_by,
                ignore_missing_source_columns: entry.ignore_missing_source_columns,
            });
        }
        Ok(Self { tables })
    }
}
