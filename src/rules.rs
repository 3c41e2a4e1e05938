//! Cell equivalence rules.
//!
//! Two normalized cells are equivalent when any rule in [`RULES`] accepts the
//! pair. Rules run in list order and the first one that accepts wins, so the
//! cheap representation checks (blanks, zero, booleans) are settled before
//! the parsing rules run. Every rule is symmetric in its two arguments.
//!
//! A parse failure inside a rule only means that rule does not apply; the
//! chain moves on to the next one.

use chrono::NaiveDate;

use crate::{data::parse_calendar_date, normalize::NormalizedValue};

/// Placeholder spreadsheet libraries emit for a missing or unreadable date.
pub const NOT_A_TIME: &str = "NaT";

/// Stand-in relational stores write instead of a null date.
pub const SENTINEL_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1, 1, 1) {
    Some(date) => date,
    None => panic!("0001-01-01 is a valid date"),
};

type RuleFn = fn(&NormalizedValue, &NormalizedValue) -> bool;

#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    test: RuleFn,
}

impl Rule {
    pub fn accepts(&self, a: &NormalizedValue, b: &NormalizedValue) -> bool {
        (self.test)(a, b)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "blank",
        test: both_blank,
    },
    Rule {
        name: "blank-as-zero",
        test: blank_as_zero,
    },
    Rule {
        name: "blank-as-default-date",
        test: blank_as_default_date,
    },
    Rule {
        name: "boolean",
        test: boolean_spelling,
    },
    Rule {
        name: "date",
        test: same_calendar_date,
    },
    Rule {
        name: "exact",
        test: identical_text,
    },
    Rule {
        name: "numeric",
        test: same_number,
    },
];

/// The rule that decides `a` and `b` are equivalent, if any.
pub fn first_matching_rule(a: &NormalizedValue, b: &NormalizedValue) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.accepts(a, b))
}

pub fn equivalent(a: &NormalizedValue, b: &NormalizedValue) -> bool {
    first_matching_rule(a, b).is_some()
}

fn either_way(a: &NormalizedValue, b: &NormalizedValue, one_sided: RuleFn) -> bool {
    one_sided(a, b) || one_sided(b, a)
}

fn both_blank(a: &NormalizedValue, b: &NormalizedValue) -> bool {
    a.is_blank() && b.is_blank()
}

fn blank_as_zero(a: &NormalizedValue, b: &NormalizedValue) -> bool {
    either_way(a, b, |blank, other| {
        blank.is_blank() && matches!(other.text(), "0" | "0.0")
    })
}

fn blank_as_default_date(a: &NormalizedValue, b: &NormalizedValue) -> bool {
    either_way(a, b, |missing, other| {
        is_blank_or_not_a_time(missing) && (other.is_blank() || is_sentinel_date(other))
    })
}

fn boolean_spelling(a: &NormalizedValue, b: &NormalizedValue) -> bool {
    either_way(a, b, |word, other| match boolean_word(word.text()) {
        Some(flag) => boolean_token(other.text()) == Some(flag),
        None => false,
    })
}

fn same_calendar_date(a: &NormalizedValue, b: &NormalizedValue) -> bool {
    match (parse_calendar_date(a.text()), parse_calendar_date(b.text())) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

fn identical_text(a: &NormalizedValue, b: &NormalizedValue) -> bool {
    a.text() == b.text()
}

// Blank reads as 0.0 here, overlapping with `blank-as-zero` for forms like "0.00".
fn same_number(a: &NormalizedValue, b: &NormalizedValue) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

fn is_blank_or_not_a_time(value: &NormalizedValue) -> bool {
    value.is_blank() || value.text() == NOT_A_TIME
}

fn is_sentinel_date(value: &NormalizedValue) -> bool {
    parse_calendar_date(value.text()) == Some(SENTINEL_DATE)
}

fn boolean_word(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn boolean_token(value: &str) -> Option<bool> {
    match value {
        "1" => Some(true),
        "0" => Some(false),
        other => boolean_word(other),
    }
}

fn as_number(value: &NormalizedValue) -> Option<f64> {
    if value.is_blank() {
        return Some(0.0);
    }
    value.text().parse::<f64>().ok()
}
