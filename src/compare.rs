//! Worksheet-to-table comparison.
//!
//! [`compare()`] is the single entry point of the engine. It never fails:
//! every outcome, including "nothing differs", is reported as a [`Finding`].
//! Findings come out in discovery order: the column finding, the row-count
//! finding, then either one shape finding or the cell findings row by row,
//! left to right across the common columns.

use std::fmt;

use itertools::Itertools;
use log::debug;
use serde::Serialize;

use crate::{
    data::TabularDataset,
    normalize::{NormalizedValue, normalize},
    rules, schema,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonOptions {
    pub ignore_missing_source_columns: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ComparisonRequest<'a> {
    /// Workbook the source sheet was read from.
    pub source_label: &'a str,
    pub source_sheet: &'a str,
    pub target_table: &'a str,
    pub source: &'a TabularDataset,
    pub target: &'a TabularDataset,
    pub options: ComparisonOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Shape {
    pub rows: usize,
    pub columns: usize,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.columns)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    ColumnCountMismatch {
        expected_count: usize,
        actual_count: usize,
        missing_in_source: Vec<String>,
        missing_in_target: Vec<String>,
    },
    RowCountMismatch {
        source_count: usize,
        target_count: usize,
    },
    ShapeMismatchSkipped {
        source_shape: Shape,
        target_shape: Shape,
    },
    CellMismatch {
        /// 1-based data row, header excluded.
        row: usize,
        column: String,
        source_value: NormalizedValue,
        target_value: NormalizedValue,
    },
    AllMatched,
}

impl Finding {
    pub fn is_discrepancy(&self) -> bool {
        !matches!(self, Finding::AllMatched)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Finding::ColumnCountMismatch { .. } => "Column mismatch",
            Finding::RowCountMismatch { .. } => "Row mismatch",
            Finding::ShapeMismatchSkipped { .. } => "Shape mismatch",
            Finding::CellMismatch { .. } => "Data mismatch",
            Finding::AllMatched => "OK",
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::ColumnCountMismatch {
                expected_count,
                actual_count,
                missing_in_source,
                missing_in_target,
            } => {
                write!(f, "source={expected_count} target={actual_count}")?;
                if !missing_in_source.is_empty() {
                    write!(f, "; missing in source: {}", missing_in_source.iter().join(", "))?;
                }
                if !missing_in_target.is_empty() {
                    write!(f, "; missing in target: {}", missing_in_target.iter().join(", "))?;
                }
                Ok(())
            }
            Finding::RowCountMismatch {
                source_count,
                target_count,
            } => write!(f, "source={source_count} target={target_count}"),
            Finding::ShapeMismatchSkipped {
                source_shape,
                target_shape,
            } => write!(
                f,
                "source={source_shape} target={target_shape}; cell comparison skipped"
            ),
            Finding::CellMismatch {
                row,
                column,
                source_value,
                target_value,
            } => write!(
                f,
                "row {row}, column '{column}': source='{source_value}' target='{target_value}'"
            ),
            Finding::AllMatched => f.write_str("all cells match"),
        }
    }
}

pub fn compare(request: &ComparisonRequest<'_>) -> Vec<Finding> {
    let source = request.source;
    let target = request.target;
    let mut findings = Vec::new();

    let alignment = schema::align(
        source.columns(),
        target.columns(),
        request.options.ignore_missing_source_columns,
    );
    findings.extend(alignment.mismatch);

    if source.row_count() != target.row_count() {
        findings.push(Finding::RowCountMismatch {
            source_count: source.row_count(),
            target_count: target.row_count(),
        });
    }

    let common = &alignment.common_columns;
    let source_cells = source.project(common);
    let target_cells = target.project(common);
    let source_shape = Shape {
        rows: source_cells.len(),
        columns: common.len(),
    };
    let target_shape = Shape {
        rows: target_cells.len(),
        columns: common.len(),
    };

    if source_shape != target_shape {
        debug!(
            "Skipping cell comparison of '{}'/'{}' against '{}': {} vs {}",
            request.source_label, request.source_sheet, request.target_table, source_shape, target_shape
        );
        findings.push(Finding::ShapeMismatchSkipped {
            source_shape,
            target_shape,
        });
        return findings;
    }

    for (row_idx, (source_row, target_row)) in source_cells.iter().zip(&target_cells).enumerate() {
        for (column, (left, right)) in common.iter().zip(source_row.iter().zip(target_row)) {
            let left = normalize(left);
            let right = normalize(right);
            if !rules::equivalent(&left, &right) {
                debug!(
                    "'{}' row {} column '{}': '{}' != '{}'",
                    request.target_table,
                    row_idx + 1,
                    column,
                    left,
                    right
                );
                findings.push(Finding::CellMismatch {
                    row: row_idx + 1,
                    column: column.clone(),
                    source_value: left,
                    target_value: right,
                });
            }
        }
    }

    if findings.is_empty() {
        findings.push(Finding::AllMatched);
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawValue;

    fn dataset(columns: &[&str], rows: Vec<Vec<RawValue>>) -> TabularDataset {
        TabularDataset::new(columns.iter().copied(), rows).expect("valid dataset")
    }

    fn run(source: &TabularDataset, target: &TabularDataset, ignore: bool) -> Vec<Finding> {
        compare(&ComparisonRequest {
            source_label: "book.xlsx",
            source_sheet: "Sheet1",
            target_table: "people",
            source,
            target,
            options: ComparisonOptions {
                ignore_missing_source_columns: ignore,
            },
        })
    }

    #[test]
    fn identical_datasets_yield_all_matched() {
        let data = dataset(
            &["id", "name"],
            vec![vec![1i64.into(), "Alice".into()], vec![2i64.into(), "Bob".into()]],
        );
        assert_eq!(run(&data, &data.clone(), false), vec![Finding::AllMatched]);
    }

    #[test]
    fn empty_datasets_match() {
        let empty = TabularDataset::empty();
        assert_eq!(run(&empty, &empty, false), vec![Finding::AllMatched]);
    }

    #[test]
    fn trailing_whitespace_is_not_a_difference() {
        let source = dataset(&["id", "name"], vec![vec![1i64.into(), "Alice".into()]]);
        let target = dataset(&["id", "name"], vec![vec![1i64.into(), "Alice ".into()]]);
        assert_eq!(run(&source, &target, false), vec![Finding::AllMatched]);
    }

    #[test]
    fn blank_matches_sentinel_date() {
        let source = dataset(&["id", "val"], vec![vec![1i64.into(), "".into()]]);
        let target = dataset(&["id", "val"], vec![vec![1i64.into(), "0001-01-01".into()]]);
        assert_eq!(run(&source, &target, false), vec![Finding::AllMatched]);
    }

    #[test]
    fn cell_mismatches_are_reported_in_reading_order() {
        let source = dataset(
            &["b", "a"],
            vec![vec!["x".into(), "1".into()], vec!["y".into(), "2".into()]],
        );
        let target = dataset(
            &["a", "b"],
            vec![vec!["9".into(), "z".into()], vec!["2".into(), "y".into()]],
        );
        let findings = run(&source, &target, false);
        assert_eq!(
            findings,
            vec![
                Finding::CellMismatch {
                    row: 1,
                    column: "a".to_string(),
                    source_value: "1".into(),
                    target_value: "9".into(),
                },
                Finding::CellMismatch {
                    row: 1,
                    column: "b".to_string(),
                    source_value: "x".into(),
                    target_value: "z".into(),
                },
            ]
        );
    }

    #[test]
    fn row_count_difference_skips_cell_comparison() {
        let source = dataset(&["id"], vec![vec![1i64.into()], vec![2i64.into()]]);
        let target = dataset(&["id"], vec![vec![1i64.into()]]);
        assert_eq!(
            run(&source, &target, false),
            vec![
                Finding::RowCountMismatch {
                    source_count: 2,
                    target_count: 1,
                },
                Finding::ShapeMismatchSkipped {
                    source_shape: Shape { rows: 2, columns: 1 },
                    target_shape: Shape { rows: 1, columns: 1 },
                },
            ]
        );
    }

    #[test]
    fn column_mismatch_still_compares_common_cells() {
        let source = dataset(&["A", "B"], vec![vec!["1".into(), "2".into()]]);
        let target = dataset(&["A", "B", "C"], vec![vec!["1".into(), "3".into(), "x".into()]]);
        let findings = run(&source, &target, false);
        assert_eq!(findings.len(), 2);
        assert!(matches!(findings[0], Finding::ColumnCountMismatch { .. }));
        assert!(matches!(
            &findings[1],
            Finding::CellMismatch { row: 1, column, .. } if column == "B"
        ));

        let ignored = run(&source, &target, true);
        assert_eq!(ignored.len(), 1);
        assert!(matches!(ignored[0], Finding::CellMismatch { .. }));
    }

    #[test]
    fn finding_display_is_readable() {
        let finding = Finding::CellMismatch {
            row: 3,
            column: "name".to_string(),
            source_value: "Alice".into(),
            target_value: NormalizedValue::Blank,
        };
        assert_eq!(
            finding.to_string(),
            "row 3, column 'name': source='Alice' target=''"
        );
        assert_eq!(finding.label(), "Data mismatch");
        assert!(!Finding::AllMatched.is_discrepancy());
    }
}
