//! SQLite table reader.

use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use rusqlite::{Connection, OpenFlags, OptionalExtension, types::ValueRef};

use crate::{
    data::{RawValue, TabularDataset},
    source::{RelationalSource, SourceError},
};

pub struct SqliteReader {
    conn: Connection,
}

impl SqliteReader {
    /// Opens an existing database read-only.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Opening database {path:?}"))?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn table_exists(&self, table: &str) -> Result<bool, SourceError> {
        self.conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
                [table],
                |_| Ok(()),
            )
            .optional()
            .map(|found| found.is_some())
            .map_err(|e| SourceError::read(table, e))
    }
}

impl RelationalSource for SqliteReader {
    fn read_table(&self, table: &str, order_by: &[String]) -> Result<TabularDataset, SourceError> {
        if !self.table_exists(table)? {
            return Err(SourceError::MissingTable(table.to_string()));
        }
        let query = select_query(table, order_by);
        debug!("Running {query}");

        let mut stmt = self
            .conn
            .prepare(&query)
            .map_err(|e| SourceError::read(table, e))?;
        let columns = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let width = columns.len();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|idx| row.get_ref(idx).map(sql_to_raw))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .map_err(|e| SourceError::read(table, e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| SourceError::read(table, e))?;

        TabularDataset::new(columns, rows).map_err(|source| SourceError::Dataset {
            origin: format!("table '{table}'"),
            source,
        })
    }
}

pub fn select_query(table: &str, order_by: &[String]) -> String {
    let mut query = format!("SELECT * FROM {}", quote_identifier(table));
    if !order_by.is_empty() {
        let keys = order_by
            .iter()
            .map(|column| quote_identifier(column.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        query.push_str(" ORDER BY ");
        query.push_str(&keys);
    }
    query
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_to_raw(value: ValueRef<'_>) -> RawValue {
    match value {
        ValueRef::Null => RawValue::Blank,
        ValueRef::Integer(i) => RawValue::Integer(i),
        ValueRef::Real(f) => RawValue::Float(f),
        ValueRef::Text(bytes) => RawValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => {
            RawValue::Text(bytes.iter().map(|b| format!("{b:02x}")).collect())
        }
    }
}
