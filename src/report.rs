//! Rendering of comparison results.
//!
//! The console and `.txt` reports share one grid layout with a row per
//! finding. The console view folds long runs of cell mismatches into a
//! single "more" row; files always carry every finding.

use std::borrow::Cow;
use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::{
    cli::ReportFormat,
    compare::Finding,
    reconcile::{PairOutcome, PairReport},
};

pub const REPORT_PREFIX: &str = "comparison_report";

pub fn headers() -> Vec<String> {
    ["Table", "File", "Sheet", "Result", "Detail"]
        .iter()
        .map(|h| h.to_string())
        .collect()
}

/// One row per finding; `cell_limit` caps the data-mismatch rows per pair.
pub fn finding_rows(reports: &[PairReport], cell_limit: Option<usize>) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for report in reports {
        let row = |result: &str, detail: String| {
            vec![
                report.table.clone(),
                report.file.clone(),
                report.sheet.clone(),
                result.to_string(),
                detail,
            ]
        };
        match &report.outcome {
            PairOutcome::Unavailable { reason, detail } => rows.push(row(*reason, detail.clone())),
            PairOutcome::Compared { findings } => {
                let mut cells_shown = 0usize;
                let mut cells_hidden = 0usize;
                for finding in findings {
                    if matches!(finding, Finding::CellMismatch { .. }) {
                        if cell_limit.is_some_and(|limit| cells_shown >= limit) {
                            cells_hidden += 1;
                            continue;
                        }
                        cells_shown += 1;
                    }
                    rows.push(row(finding.label(), finding.to_string()));
                }
                if cells_hidden > 0 {
                    rows.push(row(
                        "Data mismatch",
                        format!("... {cells_hidden} more cell mismatch(es)"),
                    ));
                }
            }
        }
    }
    rows
}

pub fn summary_line(reports: &[PairReport]) -> String {
    let clean = reports.iter().filter(|r| r.is_clean()).count();
    format!(
        "{} of {} table(s) matched; {} with discrepancies or unavailable inputs",
        clean,
        reports.len(),
        reports.len() - clean
    )
}

pub fn render(reports: &[PairReport], format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => {
            let mut output = render_grid(&headers(), &finding_rows(reports, None));
            let _ = writeln!(output, "{}", summary_line(reports));
            Ok(output)
        }
        ReportFormat::Json => {
            let mut output =
                serde_json::to_string_pretty(reports).context("Serializing report as JSON")?;
            output.push('\n');
            Ok(output)
        }
    }
}

pub fn report_file_name(timestamp: NaiveDateTime, format: ReportFormat) -> String {
    let extension = match format {
        ReportFormat::Text => "txt",
        ReportFormat::Json => "json",
    };
    format!(
        "{REPORT_PREFIX}_{}.{extension}",
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

pub fn render_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(&sanitize_cell(cell)));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", border(&widths, '-'));
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let _ = writeln!(output, "{}", border(&widths, '='));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
        let _ = writeln!(output, "{}", border(&widths, '-'));
    }
    output
}

pub fn print_grid(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_grid(headers, rows));
}

fn border(widths: &[usize], fill: char) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.extend(std::iter::repeat_n(fill, width + 2));
        line.push('+');
    }
    line
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (idx, width) in widths.iter().enumerate() {
        let sanitized = values.get(idx).map(|v| sanitize_cell(v)).unwrap_or_default();
        let padding = width.saturating_sub(display_width(&sanitized));
        let _ = write!(line, " {sanitized}{} |", " ".repeat(padding));
    }
    line
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI colour sequence, e.g. \x1b[31m
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
