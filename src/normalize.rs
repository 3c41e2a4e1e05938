//! Canonical text form of a single cell.
//!
//! Every cell is reduced to trimmed printable text before it reaches the
//! equivalence rules. Spreadsheet exports leave `_x000D_` markers where a
//! carriage return used to be; those go too. A cell whose text ends up empty
//! is [`NormalizedValue::Blank`], whatever its original type.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::data::RawValue;

/// Escaped carriage return left behind by OOXML writers.
const CARRIAGE_RETURN_MARKER: &str = "_x000D_";

#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedValue {
    Blank,
    Present { text: String, original: RawValue },
}

impl NormalizedValue {
    pub fn is_blank(&self) -> bool {
        matches!(self, NormalizedValue::Blank)
    }

    /// Normalized text; empty for blanks.
    pub fn text(&self) -> &str {
        match self {
            NormalizedValue::Blank => "",
            NormalizedValue::Present { text, .. } => text,
        }
    }

    pub fn original(&self) -> Option<&RawValue> {
        match self {
            NormalizedValue::Blank => None,
            NormalizedValue::Present { original, .. } => Some(original),
        }
    }
}

impl fmt::Display for NormalizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl Serialize for NormalizedValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.text())
    }
}

impl From<&str> for NormalizedValue {
    fn from(value: &str) -> Self {
        normalize(&RawValue::text(value))
    }
}

pub fn normalize(raw: &RawValue) -> NormalizedValue {
    if raw.is_blank() {
        return NormalizedValue::Blank;
    }
    let text = clean_text(&raw.as_display());
    if text.is_empty() {
        NormalizedValue::Blank
    } else {
        NormalizedValue::Present {
            text,
            original: raw.clone(),
        }
    }
}

fn clean_text(value: &str) -> String {
    value
        .replace(CARRIAGE_RETURN_MARKER, "")
        .chars()
        .filter(|ch| !is_control(*ch))
        .collect::<String>()
        .trim()
        .to_string()
}

// Covers \r, \n and \t along with the rest of the C0 range.
fn is_control(ch: char) -> bool {
    (ch as u32) < 0x20 || ch == '\u{7f}'
}
