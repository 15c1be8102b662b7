//! Filter criteria and their wire form

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::ContractError;

/// Combined neighborhood / status / date-range predicate description
///
/// Empty sets and an absent range are inactive and let every row through.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Allowed neighborhood values (OR within)
    #[serde(default)]
    pub neighborhoods: BTreeSet<String>,

    /// Allowed status values (OR within)
    #[serde(default)]
    pub statuses: BTreeSet<String>,

    /// Inclusive calendar-day range
    #[serde(default)]
    pub date_range: Option<DateRange>,
}

impl FilterCriteria {
    /// Criteria that match every row
    pub fn all() -> Self {
        Self::default()
    }

    /// Whether no dimension is active
    pub fn is_empty(&self) -> bool {
        self.neighborhoods.is_empty() && self.statuses.is_empty() && self.active_range().is_none()
    }

    /// The date range if it constrains anything
    pub fn active_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref().filter(|r| r.is_active())
    }

    pub fn with_neighborhoods<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.neighborhoods = collect_values(values);
        self
    }

    pub fn with_statuses<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statuses = collect_values(values);
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }
}

/// Inclusive date range at day granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Range with both bounds
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Single-day range
    pub fn day(day: NaiveDate) -> Self {
        Self {
            from: Some(day),
            to: None,
        }
    }

    /// Whether at least one bound is set
    pub fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Effective upper bound: `to`, or `from` when only `from` is given
    pub fn upper(&self) -> Option<NaiveDate> {
        self.to.or(self.from)
    }

    /// Whether `day` lies inside the range (both ends inclusive)
    pub fn contains(&self, day: NaiveDate) -> bool {
        let after_from = self.from.map_or(true, |from| day >= from);
        let before_to = self.upper().map_or(true, |to| day <= to);
        after_from && before_to
    }
}

/// Filter request as received from callers (camelCase JSON)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    #[serde(default)]
    pub neighborhoods: Option<Vec<String>>,

    #[serde(default)]
    pub statuses: Option<Vec<String>>,

    #[serde(default)]
    pub date_range: Option<DateRangeRequest>,
}

/// Date range as received from callers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRangeRequest {
    #[serde(default)]
    pub from: Option<String>,

    #[serde(default)]
    pub to: Option<String>,
}

impl TryFrom<FilterRequest> for FilterCriteria {
    type Error = ContractError;

    fn try_from(request: FilterRequest) -> Result<Self, Self::Error> {
        let date_range = match request.date_range {
            Some(range) => {
                let from = parse_optional_day("dateRange.from", range.from.as_deref())?;
                let to = parse_optional_day("dateRange.to", range.to.as_deref())?;
                if let (Some(from), Some(to)) = (from, to) {
                    if from > to {
                        return Err(ContractError::validation(
                            "dateRange",
                            format!("'from' ({from}) is after 'to' ({to})"),
                        ));
                    }
                }
                Some(DateRange { from, to })
            }
            None => None,
        };

        Ok(Self {
            neighborhoods: collect_values(request.neighborhoods.unwrap_or_default()),
            statuses: collect_values(request.statuses.unwrap_or_default()),
            date_range,
        })
    }
}

/// Parse an ISO calendar day (`YYYY-MM-DD`) or an RFC 3339 timestamp
pub fn parse_iso_day(field: &str, value: &str) -> Result<NaiveDate, ContractError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| ContractError::validation(field, format!("invalid date '{value}'")))
}

fn parse_optional_day(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ContractError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => parse_iso_day(field, v).map(Some),
        _ => Ok(None),
    }
}

fn collect_values<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values
        .into_iter()
        .map(|v| v.into().trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Distinct values offered for the categorical filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub neighborhoods: Vec<String>,
    pub statuses: Vec<String>,
}

/// What to do with a row whose date cannot be resolved while the date filter is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnparseableDatePolicy {
    /// Row does not match
    #[default]
    Exclude,
    /// Row matches the date dimension
    Include,
}
