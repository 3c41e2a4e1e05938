//! Cell values and in-memory tables handed to the comparison engine.
//!
//! Collaborators (workbook and database readers) materialize a
//! [`TabularDataset`] per worksheet or table. A dataset is a read-only
//! snapshot: column names are trimmed once at construction and every row
//! carries exactly one [`RawValue`] per column.

use std::{collections::HashSet, fmt};

use anyhow::{Result, anyhow};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RawValue {
    Blank,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl RawValue {
    pub fn text(value: impl Into<String>) -> Self {
        RawValue::Text(value.into())
    }

    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Blank => true,
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            RawValue::Blank => String::new(),
            RawValue::Text(s) => s.clone(),
            RawValue::Integer(i) => i.to_string(),
            RawValue::Float(f) => {
                if f.is_nan() {
                    String::new()
                } else if f.fract() == 0.0 && f.abs() < 1e15 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            RawValue::Boolean(true) => "TRUE".to_string(),
            RawValue::Boolean(false) => "FALSE".to_string(),
            RawValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            RawValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Boolean(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawValue::Blank)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("duplicate column '{0}' after trimming")]
    DuplicateColumn(String),
    #[error("row {row} has {actual} value(s) but {expected} column(s) are declared")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TabularDataset {
    columns: Vec<String>,
    rows: Vec<Vec<RawValue>>,
}

impl TabularDataset {
    pub fn new<S: AsRef<str>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<RawValue>>,
    ) -> Result<Self, DatasetError> {
        let columns = columns
            .into_iter()
            .map(|c| normalize_column_name(c.as_ref()))
            .collect::<Vec<_>>();
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(DatasetError::DuplicateColumn(column.clone()));
            }
        }
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DatasetError::RowWidth {
                    row: idx + 1,
                    expected: columns.len(),
                    actual: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<RawValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Restricts every row to `columns`, in that order. Names that are not
    /// part of this dataset are skipped, so the projected width can be
    /// smaller than `columns.len()`.
    pub fn project(&self, columns: &[String]) -> Vec<Vec<&RawValue>> {
        let indices = columns
            .iter()
            .filter_map(|c| self.column_index(c))
            .collect::<Vec<_>>();
        self.rows
            .iter()
            .map(|row| indices.iter().map(|&idx| &row[idx]).collect())
            .collect()
    }
}

pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_string()
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%m/%d/%Y",
        "%d/%m/%Y",
        "%Y/%m/%d",
        "%d-%m-%Y",
        "%d-%b-%Y",
        "%b %d, %Y",
        "%B %d, %Y",
        "%d %B %Y",
    ];
    const SHORT_YEAR_FORMATS: &[&str] = &["%m/%d/%y", "%d/%m/%y"];
    let value = value.trim();
    let formats = if has_full_year(value) {
        DATE_FORMATS
    } else {
        SHORT_YEAR_FORMATS
    };
    for fmt in formats {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%m/%d/%Y %H:%M",
    ];
    let value = value.trim();
    if !has_full_year(value) {
        return Err(anyhow!("Failed to parse '{value}' as datetime"));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Timestamps carrying a UTC offset, e.g. `2024-01-05T10:00:00Z` or
/// `2024-01-05 10:00:00+02:00`.
pub fn parse_offset_datetime(value: &str) -> Result<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed);
    }
    DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z")
        .map_err(|err| anyhow!("Failed to parse '{value}' as offset datetime: {err}"))
}

/// Calendar date of `value`, discarding any time of day. Offset timestamps
/// keep the date as written, not the UTC date.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    parse_offset_datetime(value)
        .map(|dt| dt.naive_local().date())
        .or_else(|_| parse_naive_datetime(value).map(|dt| dt.date()))
        .or_else(|_| parse_naive_date(value))
        .ok()
}

// `%Y` accepts any digit count, so "1/5/24" would otherwise read as year 24.
fn has_full_year(value: &str) -> bool {
    value
        .split(|c: char| !c.is_ascii_digit())
        .any(|run| run.len() == 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_naive_date_prefers_month_first_slashes() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(parse_naive_date("2024-01-05").unwrap(), expected);
        assert_eq!(parse_naive_date("01/05/2024").unwrap(), expected);
        assert_eq!(parse_naive_date("2024/01/05").unwrap(), expected);
        // Only valid day-first.
        assert_eq!(
            parse_naive_date("25/12/2024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()
        );
    }

    #[test]
    fn parse_calendar_date_drops_time_of_day() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(parse_calendar_date("2024-01-05 13:45:00"), Some(expected));
        assert_eq!(parse_calendar_date("2024-01-05T00:00:00.000"), Some(expected));
        assert_eq!(parse_calendar_date("42"), None);
        assert_eq!(parse_calendar_date("NaT"), None);
    }

    #[test]
    fn parse_calendar_date_reads_offsets_and_month_names() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(parse_calendar_date("2024-01-05T00:00:00Z"), Some(expected));
        assert_eq!(parse_calendar_date("2024-01-05 00:00:00+00:00"), Some(expected));
        assert_eq!(parse_calendar_date("2024-01-05T23:30:00-05:00"), Some(expected));
        assert_eq!(parse_calendar_date("Jan 5, 2024"), Some(expected));
        assert_eq!(parse_calendar_date("January 5, 2024"), Some(expected));
        assert_eq!(parse_calendar_date("5 January 2024"), Some(expected));
    }

    #[test]
    fn short_years_use_the_two_digit_century_window() {
        assert_eq!(
            parse_calendar_date("1/5/24"),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
        assert_eq!(parse_calendar_date("1-1-1"), None);
        assert_eq!(parse_calendar_date("1/1/1 00:00:00"), None);
        assert_eq!(parse_calendar_date("24-01-05"), None);
    }

    #[test]
    fn as_display_formats_numbers_and_booleans() {
        assert_eq!(RawValue::Float(3.0).as_display(), "3");
        assert_eq!(RawValue::Float(2.5).as_display(), "2.5");
        assert_eq!(RawValue::Float(f64::NAN).as_display(), "");
        assert_eq!(RawValue::Boolean(true).as_display(), "TRUE");
        assert_eq!(RawValue::from(None::<i64>), RawValue::Blank);
    }

    #[test]
    fn new_trims_columns_and_rejects_duplicates() {
        let dataset = TabularDataset::new([" id ", "name"], vec![]).unwrap();
        assert_eq!(dataset.columns(), ["id", "name"]);

        let err = TabularDataset::new(["id", "id "], vec![]).unwrap_err();
        assert_eq!(err, DatasetError::DuplicateColumn("id".to_string()));
    }

    #[test]
    fn new_rejects_ragged_rows() {
        let err = TabularDataset::new(["a", "b"], vec![vec![RawValue::from(1i64)]]).unwrap_err();
        assert_eq!(
            err,
            DatasetError::RowWidth {
                row: 1,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn project_keeps_row_order_and_requested_columns() {
        let dataset = TabularDataset::new(
            ["id", "name", "extra"],
            vec![
                vec![1i64.into(), "Alice".into(), RawValue::Blank],
                vec![2i64.into(), "Bob".into(), RawValue::Blank],
            ],
        )
        .unwrap();
        let projected = dataset.project(&["name".to_string(), "id".to_string()]);
        assert_eq!(projected.len(), 2);
        assert_eq!(projected[1], vec![&RawValue::from("Bob"), &RawValue::Integer(2)]);
    }
}
