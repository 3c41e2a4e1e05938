use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Reconcile spreadsheet worksheets against database tables",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare mapped worksheets against SQLite tables cell by cell
    Compare(CompareArgs),
    /// List every workbook and worksheet in a folder
    Sheets(SheetsArgs),
    /// Search all worksheets in a folder for a piece of text
    Search(SearchArgs),
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// SQLite database holding the migrated tables
    #[arg(long)]
    pub db: PathBuf,
    /// Folder containing the source workbooks
    #[arg(long = "excel-dir")]
    pub excel_dir: PathBuf,
    /// YAML or JSON file mapping table names to workbook files and sheets
    #[arg(short, long)]
    pub config: PathBuf,
    /// Do not report columns that exist only in the database table
    #[arg(long = "ignore-missing-source-columns")]
    pub ignore_missing_source_columns: bool,
    /// Write a timestamped report file into this folder
    #[arg(long = "report-dir")]
    pub report_dir: Option<PathBuf>,
    /// Report file format
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,
    /// Maximum cell mismatches shown per table on the console (0 = all)
    #[arg(long = "max-cell-rows", default_value_t = 20)]
    pub max_cell_rows: usize,
    /// Delimiter for CSV/TSV workbooks (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of CSV/TSV workbooks (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct SheetsArgs {
    /// Folder containing workbooks
    pub folder: PathBuf,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Folder containing workbooks
    pub folder: PathBuf,
    /// Text to look for (case-insensitive, partial matches allowed)
    pub term: String,
    /// Treat the term as a regular expression
    #[arg(long)]
    pub regex: bool,
    /// Character encoding of CSV/TSV workbooks (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
