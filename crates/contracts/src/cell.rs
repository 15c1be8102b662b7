//! Cell - a single typed table value

use std::borrow::Cow;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Display format for calendar dates (`DD/MM/YYYY`)
pub const PREVIEW_DATE_FORMAT: &str = "%d/%m/%Y";

/// Largest magnitude rendered as an integer without a fractional part
const INTEGRAL_DISPLAY_LIMIT: f64 = 1e15;

/// Table cell
///
/// Parsing, filtering and serialization all operate on this enum, so a date read
/// from a spreadsheet stays a date until it is written back out.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Cell {
    /// Text value
    String(String),

    /// Numeric value
    Number(f64),

    /// Calendar date without time of day
    Date(NaiveDate),

    /// Empty cell
    #[default]
    Null,
}

impl Cell {
    /// Build a string cell, mapping the empty string to `Null`
    pub fn text_or_null(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Null
        } else {
            Self::String(value)
        }
    }

    /// Whether the cell holds no value
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the cell is null or holds only whitespace
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Canonical text of the cell
    ///
    /// Integral numbers render without a trailing `.0`, so a phone number stored
    /// as a numeric cell reads back as its digits. Dates render as `DD/MM/YYYY`.
    /// Returns `None` for `Null`.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::String(s) => Some(Cow::Borrowed(s.as_str())),
            Self::Number(n) => Some(Cow::Owned(format_number(*n))),
            Self::Date(d) => Some(Cow::Owned(d.format(PREVIEW_DATE_FORMAT).to_string())),
            Self::Null => None,
        }
    }

    /// Trimmed canonical text, `None` when null or blank
    pub fn trimmed_text(&self) -> Option<String> {
        self.text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// The date held by the cell, if it is a `Date`
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::text_or_null(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::text_or_null(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < INTEGRAL_DISPLAY_LIMIT {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
