//! RowIndexer - distinct values for the categorical filters

use std::collections::BTreeSet;

use contracts::{Cell, ColumnBindings, ContractError, Dataset, FilterOptions};
use tracing::warn;

/// Scans whole datasets for distinct column values
pub struct RowIndexer;

impl RowIndexer {
    /// Sorted, deduplicated, trimmed non-empty values of `column`
    ///
    /// # Errors
    /// `ContractError::Validation` when no header matches `column`.
    pub fn extract_unique_values(
        dataset: &Dataset,
        column: &str,
    ) -> Result<Vec<String>, ContractError> {
        let idx = dataset.column_index(column).ok_or_else(|| {
            ContractError::validation("column", format!("column '{column}' not found"))
        })?;

        let values: BTreeSet<String> = dataset
            .rows
            .iter()
            .filter_map(|row| row.get(idx).and_then(Cell::trimmed_text))
            .collect();
        Ok(values.into_iter().collect())
    }

    /// Neighborhood and status options for an upload summary
    ///
    /// A missing column yields an empty list rather than an error, so files
    /// without those columns can still be previewed.
    pub fn extract_filter_options(dataset: &Dataset, bindings: &ColumnBindings) -> FilterOptions {
        FilterOptions {
            neighborhoods: Self::lenient(dataset, &bindings.neighborhood),
            statuses: Self::lenient(dataset, &bindings.status),
        }
    }

    fn lenient(dataset: &Dataset, column: &str) -> Vec<String> {
        Self::extract_unique_values(dataset, column).unwrap_or_else(|_| {
            warn!(column, "Filter column missing from file headers");
            Vec::new()
        })
    }
}
