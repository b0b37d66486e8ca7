//! Domain models for sift

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single statement row as captured by the host's extraction step.
///
/// Immutable within a working set; `row_index` is the row's stable identity.
/// The date is kept as captured text (re-scans of the same page are compared
/// verbatim) and parsed on demand for date-range views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub row_index: usize,
    pub date: String,
    pub description: String,
    pub amount_in: f64,
    pub amount_out: f64,
    /// Statement type column, empty when the capture has none
    #[serde(default)]
    pub type_code: String,
}

impl RawTransaction {
    /// A row with zero in both columns carries no amount information.
    pub fn has_amount(&self) -> bool {
        self.amount_in != 0.0 || self.amount_out != 0.0
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_statement_date(&self.date)
    }
}

/// Aggregated view of every row currently mapped to one canonical name.
///
/// A derived projection, never a source of truth: recomputed whenever the
/// mapping or the category/type/comment tables change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityGroup {
    pub name: String,
    pub category: String,
    pub type_code: String,
    pub comment: String,
    pub count: usize,
    pub total_in: f64,
    pub total_out: f64,
    pub members: Vec<RawTransaction>,
}

/// Parse an amount cell defensively.
///
/// Currency symbols and grouping characters are stripped; anything that
/// still fails to parse yields zero rather than an error.
pub fn parse_amount(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse().unwrap_or(0.0)
}

/// Date formats seen across statement captures, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%Y",
    "%d/%m/%y",
    "%d-%m-%Y",
    "%d-%m-%y",
    "%Y-%m-%d",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%d %b %y",
];

/// Parse a captured date string, `None` for anything unrecognized.
pub fn parse_statement_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}
