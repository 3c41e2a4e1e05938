//! Seams between the comparison run and the readers that materialize data.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::data::{DatasetError, TabularDataset};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("workbook {0:?} does not exist")]
    MissingFile(PathBuf),
    #[error("sheet '{sheet}' not found in {path:?}")]
    MissingSheet { path: PathBuf, sheet: String },
    #[error("table '{0}' not found")]
    MissingTable(String),
    #[error("invalid dataset from {origin}: {source}")]
    Dataset {
        origin: String,
        #[source]
        source: DatasetError,
    },
    #[error("reading {origin}: {message}")]
    Read { origin: String, message: String },
}

impl SourceError {
    pub fn read(origin: impl Into<String>, err: impl std::fmt::Display) -> Self {
        SourceError::Read {
            origin: origin.into(),
            message: err.to_string(),
        }
    }

    /// Short status used in reports when a pair cannot be compared.
    pub fn status(&self) -> &'static str {
        match self {
            SourceError::MissingFile(_) => "MISSING FILE",
            SourceError::MissingSheet { .. } => "MISSING SHEET",
            SourceError::MissingTable(_) => "MISSING TABLE",
            SourceError::Dataset { .. } | SourceError::Read { .. } => "ERROR",
        }
    }
}

/// Reads one worksheet of a workbook; the first row holds column names.
pub trait SpreadsheetSource {
    fn read_sheet(&self, path: &Path, sheet: &str) -> Result<TabularDataset, SourceError>;
}

/// Reads every row of a table in a stable order, optionally sorted by `order_by`.
pub trait RelationalSource {
    fn read_table(&self, table: &str, order_by: &[String]) -> Result<TabularDataset, SourceError>;
}
