//! File plumbing shared by the readers and the report writer.
//!
//! - **Delimiter resolution**: `.tsv` → tab, anything else → comma, unless
//!   overridden on the command line.
//! - **Encoding**: delimited text workbooks are decoded via `encoding_rs`,
//!   defaulting to UTF-8.
//! - **Spreadsheet detection**: which file extensions count as workbooks.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Extensions opened through the binary workbook reader.
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];
/// Extensions read as single-sheet delimited text workbooks.
pub const DELIMITED_EXTENSIONS: &[&str] = &["csv", "tsv"];

fn has_extension(path: &Path, candidates: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| candidates.iter().any(|c| ext.eq_ignore_ascii_case(c)))
}

pub fn is_workbook(path: &Path) -> bool {
    has_extension(path, WORKBOOK_EXTENSIONS)
}

pub fn is_delimited(path: &Path) -> bool {
    has_extension(path, DELIMITED_EXTENSIONS)
}

pub fn is_spreadsheet(path: &Path) -> bool {
    is_workbook(path) || is_delimited(path)
}

/// Spreadsheet files directly inside `folder`, sorted by file name.
pub fn list_spreadsheets(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(folder).with_context(|| format!("Listing spreadsheet folder {folder:?}"))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Reading entry in {folder:?}"))?
            .path();
        if path.is_file() && is_spreadsheet(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    Ok(open_csv_reader(BufReader::new(file), delimiter))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    decode_record(&headers, encoding)
}

/// Writes `contents` to `dir/name`, creating `dir` if needed.
pub fn write_report_file(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Creating report directory {dir:?}"))?;
    let path = dir.join(name);
    let file = File::create(&path).with_context(|| format!("Creating report file {path:?}"))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(contents.as_bytes())
        .with_context(|| format!("Writing report file {path:?}"))?;
    writer
        .flush()
        .with_context(|| format!("Flushing report file {path:?}"))?;
    Ok(path)
}
