//! Column-set alignment between a worksheet and a table.
//!
//! Cells are compared by column name, so the only structural question is
//! which names both sides share. Names are trimmed before they are compared
//! and every list produced here is sorted, which keeps reports stable from
//! one run to the next.

use std::collections::BTreeSet;

use itertools::Itertools;
use log::debug;

use crate::{compare::Finding, data::normalize_column_name};

#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub common_columns: Vec<String>,
    pub mismatch: Option<Finding>,
}

pub fn align<S, T>(
    source_columns: &[S],
    target_columns: &[T],
    ignore_missing_source_columns: bool,
) -> Alignment
where
    S: AsRef<str>,
    T: AsRef<str>,
{
    let source = name_set(source_columns);
    let target = name_set(target_columns);

    let common_columns = source.intersection(&target).cloned().collect::<Vec<_>>();
    let mut missing_in_source = target.difference(&source).cloned().collect::<Vec<_>>();
    let missing_in_target = source.difference(&target).cloned().collect::<Vec<_>>();

    debug!(
        "Aligned {} common column(s); missing in source: [{}]; missing in target: [{}]",
        common_columns.len(),
        missing_in_source.iter().join(", "),
        missing_in_target.iter().join(", ")
    );

    if ignore_missing_source_columns {
        missing_in_source.clear();
    }
    // Equal-width renames only narrow the common columns.
    let mismatch = if source.len() == target.len()
        || (missing_in_source.is_empty() && missing_in_target.is_empty())
    {
        None
    } else {
        Some(Finding::ColumnCountMismatch {
            expected_count: source.len(),
            actual_count: target.len(),
            missing_in_source,
            missing_in_target,
        })
    };

    Alignment {
        common_columns,
        mismatch,
    }
}

fn name_set<S: AsRef<str>>(columns: &[S]) -> BTreeSet<String> {
    columns
        .iter()
        .map(|c| normalize_column_name(c.as_ref()))
        .collect()
}
