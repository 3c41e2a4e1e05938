//! Runs every mapped (sheet, table) pair through the comparison engine.
//!
//! Pairs are independent: a pair whose workbook, sheet or table cannot be
//! read is recorded with a status and the run moves on to the next one.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use crate::{
    compare::{ComparisonOptions, ComparisonRequest, Finding, compare},
    config::{ComparisonConfig, TableMapping},
    data::TabularDataset,
    source::{RelationalSource, SourceError, SpreadsheetSource},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PairOutcome {
    Compared { findings: Vec<Finding> },
    Unavailable { reason: &'static str, detail: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairReport {
    pub table: String,
    pub file: String,
    pub sheet: String,
    #[serde(flatten)]
    pub outcome: PairOutcome,
}

impl PairReport {
    pub fn is_clean(&self) -> bool {
        match &self.outcome {
            PairOutcome::Compared { findings } => findings.iter().all(|f| !f.is_discrepancy()),
            PairOutcome::Unavailable { .. } => false,
        }
    }
}

pub struct Reconciler<'a> {
    spreadsheets: &'a dyn SpreadsheetSource,
    tables: &'a dyn RelationalSource,
    workbook_dir: PathBuf,
    defaults: ComparisonOptions,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        spreadsheets: &'a dyn SpreadsheetSource,
        tables: &'a dyn RelationalSource,
        workbook_dir: &Path,
        defaults: ComparisonOptions,
    ) -> Self {
        Self {
            spreadsheets,
            tables,
            workbook_dir: workbook_dir.to_path_buf(),
            defaults,
        }
    }

    /// One report per mapping entry, in declaration order.
    pub fn run(&self, config: &ComparisonConfig) -> Vec<PairReport> {
        config.tables.iter().map(|m| self.reconcile(m)).collect()
    }

    pub fn reconcile(&self, mapping: &TableMapping) -> PairReport {
        let outcome = match self.load(mapping) {
            Ok((source, target)) => {
                let options = ComparisonOptions {
                    ignore_missing_source_columns: mapping
                        .ignore_missing_source_columns
                        .unwrap_or(self.defaults.ignore_missing_source_columns),
                };
                let findings = compare(&ComparisonRequest {
                    source_label: &mapping.file,
                    source_sheet: &mapping.sheet,
                    target_table: &mapping.table,
                    source: &source,
                    target: &target,
                    options,
                });
                let discrepancies = findings.iter().filter(|f| f.is_discrepancy()).count();
                info!(
                    "Compared '{}' with {} [{}]: {} finding(s)",
                    mapping.table, mapping.file, mapping.sheet, discrepancies
                );
                PairOutcome::Compared { findings }
            }
            Err(err) => {
                warn!("Skipping '{}': {}", mapping.table, err);
                PairOutcome::Unavailable {
                    reason: err.status(),
                    detail: err.to_string(),
                }
            }
        };
        PairReport {
            table: mapping.table.clone(),
            file: mapping.file.clone(),
            sheet: mapping.sheet.clone(),
            outcome,
        }
    }

    fn load(&self, mapping: &TableMapping) -> Result<(TabularDataset, TabularDataset), SourceError> {
        let path = self.workbook_dir.join(&mapping.file);
        if !path.is_file() {
            return Err(SourceError::MissingFile(path));
        }
        let source = self.spreadsheets.read_sheet(&path, &mapping.sheet)?;
        let target = self.tables.read_table(&mapping.table, &mapping.order_by)?;
        Ok((source, target))
    }
}
