//! FilterEngine - per-row predicate evaluation

use std::collections::BTreeSet;

use contracts::{
    column_index, Cell, ColumnBindings, ContractError, Dataset, DateRange, FilterConfig,
    FilterCriteria, Row, UnparseableDatePolicy,
};
use tracing::{debug, instrument};

use crate::dates::resolve_cell_date;

/// Compiled filter for one header layout
///
/// Columns are bound only for active dimensions.
#[derive(Debug, Clone)]
pub struct RowPredicate {
    neighborhood: Option<(usize, BTreeSet<String>)>,
    status: Option<(usize, BTreeSet<String>)>,
    date: Option<(usize, DateRange)>,
    policy: UnparseableDatePolicy,
}

impl RowPredicate {
    /// Whether every row passes
    pub fn is_identity(&self) -> bool {
        self.neighborhood.is_none() && self.status.is_none() && self.date.is_none()
    }

    /// Evaluate the active dimensions (AND)
    pub fn matches(&self, row: &[Cell]) -> bool {
        if let Some((idx, allowed)) = &self.neighborhood {
            if !member(row, *idx, allowed) {
                return false;
            }
        }
        if let Some((idx, allowed)) = &self.status {
            if !member(row, *idx, allowed) {
                return false;
            }
        }
        if let Some((idx, range)) = &self.date {
            let resolved = row.get(*idx).and_then(resolve_cell_date);
            return match resolved {
                Some(day) => range.contains(day),
                None => self.policy == UnparseableDatePolicy::Include,
            };
        }
        true
    }

    /// Filter a row sequence, keeping order
    pub fn apply<'a, I>(&self, rows: I) -> Vec<Row>
    where
        I: IntoIterator<Item = &'a Row>,
    {
        rows.into_iter()
            .filter(|row| self.matches(row))
            .cloned()
            .collect()
    }
}

fn member(row: &[Cell], idx: usize, allowed: &BTreeSet<String>) -> bool {
    row.get(idx)
        .and_then(Cell::trimmed_text)
        .is_some_and(|value| allowed.contains(&value))
}

/// Applies [`FilterCriteria`] to datasets
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterEngine {
    policy: UnparseableDatePolicy,
}

impl FilterEngine {
    pub fn new(policy: UnparseableDatePolicy) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.unparseable_dates)
    }

    pub fn policy(&self) -> UnparseableDatePolicy {
        self.policy
    }

    /// Bind the active dimensions of `criteria` to columns of `headers`
    ///
    /// # Errors
    /// `ContractError::Validation` when an active dimension's column is missing.
    pub fn compile(
        &self,
        headers: &[String],
        bindings: &ColumnBindings,
        criteria: &FilterCriteria,
    ) -> Result<RowPredicate, ContractError> {
        let neighborhood = if criteria.neighborhoods.is_empty() {
            None
        } else {
            let idx = bind(headers, "neighborhood", &bindings.neighborhood)?;
            Some((idx, criteria.neighborhoods.clone()))
        };

        let status = if criteria.statuses.is_empty() {
            None
        } else {
            let idx = bind(headers, "status", &bindings.status)?;
            Some((idx, criteria.statuses.clone()))
        };

        let date = match criteria.active_range() {
            Some(range) => Some((bind(headers, "date", &bindings.date)?, *range)),
            None => None,
        };

        Ok(RowPredicate {
            neighborhood,
            status,
            date,
            policy: self.policy,
        })
    }

    /// Rows of `dataset` matching `criteria`, same headers, same order
    #[instrument(
        name = "filter_dataset",
        skip(self, dataset, bindings, criteria),
        fields(rows = dataset.total_rows())
    )]
    pub fn filter(
        &self,
        dataset: &Dataset,
        bindings: &ColumnBindings,
        criteria: &FilterCriteria,
    ) -> Result<Dataset, ContractError> {
        let predicate = self.compile(&dataset.headers, bindings, criteria)?;
        if predicate.is_identity() {
            return Ok(dataset.clone());
        }

        let rows = predicate.apply(&dataset.rows);
        metrics::counter!("rowcast_rows_matched_total").increment(rows.len() as u64);
        debug!(matched = rows.len(), total = dataset.total_rows(), "Filter applied");
        Ok(dataset.with_rows(rows))
    }
}

fn bind(headers: &[String], dimension: &str, column: &str) -> Result<usize, ContractError> {
    column_index(headers, column).ok_or_else(|| {
        ContractError::validation(
            format!("columns.{dimension}"),
            format!("column '{column}' not found in file headers"),
        )
    })
}
