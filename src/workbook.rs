//! Worksheet reader.
//!
//! Binary workbooks (xlsx, xlsm, xlsb, xls, ods) are opened with calamine.
//! Delimited text files are accepted as one-sheet workbooks whose only sheet
//! is named after the file stem, which lets plain exports sit next to
//! workbooks in the same mapping file.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use calamine::{Data, Reader, open_workbook_auto};
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{
    data::{RawValue, TabularDataset, parse_naive_date, parse_naive_datetime},
    io_utils,
    source::{SourceError, SpreadsheetSource},
};

#[derive(Debug, Clone, Copy)]
pub struct WorkbookReader {
    delimiter: Option<u8>,
    encoding: &'static Encoding,
}

impl Default for WorkbookReader {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

impl WorkbookReader {
    /// `delimiter` and `encoding` only apply to delimited text workbooks.
    pub fn new(delimiter: Option<u8>, encoding: &'static Encoding) -> Self {
        Self {
            delimiter,
            encoding,
        }
    }

    pub fn sheet_names(&self, path: &Path) -> Result<Vec<String>, SourceError> {
        ensure_exists(path)?;
        if io_utils::is_delimited(path) {
            return Ok(vec![delimited_sheet_name(path)]);
        }
        let workbook = open_workbook_auto(path).map_err(|e| SourceError::read(origin(path), e))?;
        Ok(workbook.sheet_names())
    }

    /// Every sheet in workbook order.
    pub fn read_all_sheets(&self, path: &Path) -> Result<Vec<(String, TabularDataset)>, SourceError> {
        self.sheet_names(path)?
            .into_iter()
            .map(|sheet| {
                let dataset = self.read_sheet(path, &sheet)?;
                Ok((sheet, dataset))
            })
            .collect()
    }

    fn read_workbook_sheet(&self, path: &Path, sheet: &str) -> Result<TabularDataset, SourceError> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| SourceError::read(origin(path), e))?;
        if !workbook.sheet_names().iter().any(|name| name == sheet) {
            return Err(SourceError::MissingSheet {
                path: path.to_path_buf(),
                sheet: sheet.to_string(),
            });
        }
        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| SourceError::read(format!("{} [{sheet}]", origin(path)), e))?;

        let mut rows = range.rows();
        let Some(header_cells) = rows.next() else {
            return Ok(TabularDataset::empty());
        };
        let headers = header_names(header_cells.iter().map(cell_to_raw));
        let body = rows
            .map(|row| row.iter().map(cell_to_raw).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        debug!(
            "Read {} row(s) x {} column(s) from {:?} [{}]",
            body.len(),
            headers.len(),
            path,
            sheet
        );
        build_dataset(path, headers, body)
    }

    fn read_delimited(&self, path: &Path, sheet: &str) -> Result<TabularDataset, SourceError> {
        let expected = delimited_sheet_name(path);
        if expected != sheet {
            return Err(SourceError::MissingSheet {
                path: path.to_path_buf(),
                sheet: sheet.to_string(),
            });
        }
        let delimiter = io_utils::resolve_input_delimiter(path, self.delimiter);
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)
            .map_err(|e| SourceError::read(origin(path), e))?;
        let raw_headers = io_utils::reader_headers(&mut reader, self.encoding)
            .map_err(|e| SourceError::read(origin(path), e))?;
        let headers = header_names(raw_headers.into_iter().map(RawValue::Text));

        let mut body = Vec::new();
        for (idx, record) in reader.byte_records().enumerate() {
            let record = record
                .map_err(|e| SourceError::read(format!("{} row {}", origin(path), idx + 2), e))?;
            let mut cells = io_utils::decode_record(&record, self.encoding)
                .map_err(|e| SourceError::read(format!("{} row {}", origin(path), idx + 2), e))?
                .into_iter()
                .map(|cell| {
                    if cell.trim().is_empty() {
                        RawValue::Blank
                    } else {
                        RawValue::Text(cell)
                    }
                })
                .collect::<Vec<_>>();
            if cells.len() < headers.len() {
                cells.resize(headers.len(), RawValue::Blank);
            }
            body.push(cells);
        }
        build_dataset(path, headers, body)
    }
}

impl SpreadsheetSource for WorkbookReader {
    fn read_sheet(&self, path: &Path, sheet: &str) -> Result<TabularDataset, SourceError> {
        ensure_exists(path)?;
        if io_utils::is_delimited(path) {
            self.read_delimited(path, sheet)
        } else {
            self.read_workbook_sheet(path, sheet)
        }
    }
}

fn ensure_exists(path: &Path) -> Result<(), SourceError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SourceError::MissingFile(path.to_path_buf()))
    }
}

fn origin(path: &Path) -> String {
    path.display().to_string()
}

fn delimited_sheet_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn build_dataset(
    path: &Path,
    headers: Vec<String>,
    mut body: Vec<Vec<RawValue>>,
) -> Result<TabularDataset, SourceError> {
    while body
        .last()
        .is_some_and(|row| row.iter().all(RawValue::is_blank))
    {
        body.pop();
    }
    TabularDataset::new(headers, body).map_err(|source| SourceError::Dataset {
        origin: origin(path),
        source,
    })
}

pub fn cell_to_raw(cell: &Data) -> RawValue {
    match cell {
        Data::Empty => RawValue::Blank,
        Data::String(s) => {
            if s.trim().is_empty() {
                RawValue::Blank
            } else {
                RawValue::Text(s.clone())
            }
        }
        Data::Int(i) => RawValue::Integer(*i),
        Data::Float(f) => RawValue::Float(*f),
        Data::Bool(b) => RawValue::Boolean(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(RawValue::DateTime)
            .unwrap_or_else(|| RawValue::Float(dt.as_f64())),
        Data::DateTimeIso(s) => parse_naive_datetime(s)
            .map(RawValue::DateTime)
            .or_else(|_| parse_naive_date(s).map(RawValue::Date))
            .unwrap_or_else(|_| RawValue::Text(s.clone())),
        Data::DurationIso(s) => RawValue::Text(s.clone()),
        Data::Error(e) => RawValue::Text(e.to_string()),
    }
}

/// Header row to column names: blank headers become `Unnamed: <index>` and
/// repeated names get `.1`, `.2`, ... suffixes.
pub fn header_names(cells: impl IntoIterator<Item = RawValue>) -> Vec<String> {
    let raw = cells
        .into_iter()
        .enumerate()
        .map(|(idx, cell)| {
            let name = cell.as_display().trim().to_string();
            if name.is_empty() {
                format!("Unnamed: {idx}")
            } else {
                name
            }
        })
        .collect::<Vec<_>>();

    let mut taken = raw.iter().cloned().collect::<HashSet<_>>();
    let mut seen = HashSet::with_capacity(raw.len());
    let mut suffixes: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(raw.len());
    for name in raw {
        if seen.insert(name.clone()) {
            names.push(name);
            continue;
        }
        let counter = suffixes.entry(name.clone()).or_insert(0);
        let renamed = loop {
            *counter += 1;
            let candidate = format!("{name}.{counter}");
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        taken.insert(renamed.clone());
        names.push(renamed);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_names_fill_blanks_and_dedupe() {
        let names = header_names(vec![
            RawValue::text("id"),
            RawValue::Blank,
            RawValue::text(" id "),
            RawValue::text("id.1"),
            RawValue::text("id"),
            RawValue::Integer(2024),
        ]);
        assert_eq!(names, vec!["id", "Unnamed: 1", "id.2", "id.1", "id.3", "2024"]);
    }

    #[test]
    fn cell_to_raw_maps_calamine_kinds() {
        assert_eq!(cell_to_raw(&Data::Empty), RawValue::Blank);
        assert_eq!(cell_to_raw(&Data::String("  ".into())), RawValue::Blank);
        assert_eq!(cell_to_raw(&Data::Int(4)), RawValue::Integer(4));
        assert_eq!(cell_to_raw(&Data::Bool(true)), RawValue::Boolean(true));
        assert_eq!(
            cell_to_raw(&Data::DateTimeIso("2024-01-05T10:00:00".into())).as_display(),
            "2024-01-05 10:00:00"
        );
        assert_eq!(
            cell_to_raw(&Data::DateTimeIso("2024-01-05".into())).as_display(),
            "2024-01-05"
        );
    }

    #[test]
    fn delimited_sheet_name_is_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        std::fs::write(&path, "id\n1\n").unwrap();
        let reader = WorkbookReader::default();
        assert!(reader.read_sheet(&path, "orders").is_ok());
        let err = reader.read_sheet(&path, "Orders").unwrap_err();
        assert_eq!(err.status(), "MISSING SHEET");
    }

    #[test]
    fn missing_file_is_classified() {
        let reader = WorkbookReader::default();
        let err = reader
            .read_sheet(Path::new("definitely/missing.xlsx"), "Sheet1")
            .unwrap_err();
        assert_eq!(err.status(), "MISSING FILE");
    }
}
