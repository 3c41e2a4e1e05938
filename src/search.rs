//! Free-text search across every sheet of every workbook in a folder.

use std::path::Path;

use anyhow::{Context, Result, bail};
use log::{info, warn};
use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::{io_utils, workbook::WorkbookReader};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    pub file: String,
    pub sheet: String,
    /// Spreadsheet row number; the header occupies row 1.
    pub row: usize,
    pub column: String,
    pub value: String,
}

#[derive(Debug)]
pub enum Pattern {
    Substring(String),
    Regex(Regex),
}

impl Pattern {
    /// Case-insensitive substring, or case-insensitive regex when `regex` is set.
    pub fn new(term: &str, regex: bool) -> Result<Self> {
        if term.is_empty() {
            bail!("Search term cannot be empty");
        }
        if regex {
            let compiled = RegexBuilder::new(term)
                .case_insensitive(true)
                .build()
                .with_context(|| format!("Compiling search pattern '{term}'"))?;
            Ok(Pattern::Regex(compiled))
        } else {
            Ok(Pattern::Substring(term.to_lowercase()))
        }
    }

    pub fn is_match(&self, value: &str) -> bool {
        match self {
            Pattern::Substring(needle) => value.to_lowercase().contains(needle.as_str()),
            Pattern::Regex(regex) => regex.is_match(value),
        }
    }
}

pub fn search_folder(
    folder: &Path,
    pattern: &Pattern,
    reader: &WorkbookReader,
) -> Result<Vec<SearchMatch>> {
    let mut matches = Vec::new();
    for path in io_utils::list_spreadsheets(folder)? {
        let file = io_utils::file_name(&path);
        info!("Searching {file}...");
        let sheets = match reader.read_all_sheets(&path) {
            Ok(sheets) => sheets,
            Err(err) => {
                warn!("Could not read {file}: {err}");
                continue;
            }
        };
        for (sheet, dataset) in sheets {
            for (row_idx, row) in dataset.rows().iter().enumerate() {
                for (column, cell) in dataset.columns().iter().zip(row) {
                    let value = cell.as_display();
                    if pattern.is_match(&value) {
                        matches.push(SearchMatch {
                            file: file.clone(),
                            sheet: sheet.clone(),
                            row: row_idx + 2,
                            column: column.clone(),
                            value,
                        });
                    }
                }
            }
        }
    }
    Ok(matches)
}

pub fn format_match(found: &SearchMatch) -> String {
    format!(
        "{} | {} | Row {} | Column {} -> {}",
        found.file, found.sheet, found.row, found.column, found.value
    )
}
