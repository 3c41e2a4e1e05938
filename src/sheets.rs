//! Workbook and worksheet listing.

use std::path::Path;

use anyhow::Result;
use log::warn;

use crate::{io_utils, workbook::WorkbookReader};

/// `(file name, sheet name)` for every readable spreadsheet in `folder`.
pub fn list_sheets(folder: &Path, reader: &WorkbookReader) -> Result<Vec<(String, String)>> {
    let mut listing = Vec::new();
    for path in io_utils::list_spreadsheets(folder)? {
        let file = io_utils::file_name(&path);
        match reader.sheet_names(&path) {
            Ok(sheets) => listing.extend(sheets.into_iter().map(|sheet| (file.clone(), sheet))),
            Err(err) => warn!("Error reading {file}: {err}"),
        }
    }
    Ok(listing)
}
