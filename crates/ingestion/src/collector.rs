//! Row collectors shared by both readers
//!
//! Readers locate the header row and push data rows; collectors decide what
//! to keep.

use contracts::{Cell, Dataset, Row};

/// Bounded preview of a file plus its full row count
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewScan {
    /// Normalized headers
    pub headers: Vec<String>,

    /// At most `limit` leading rows
    pub rows: Vec<Row>,

    /// Number of data rows in the whole file
    pub total_rows: usize,
}

/// Destination of parsed rows
pub(crate) trait RowCollector {
    fn push(&mut self, row: Row);
}

/// Keeps every row
#[derive(Default)]
pub(crate) struct FullCollector {
    rows: Vec<Row>,
}

impl RowCollector for FullCollector {
    fn push(&mut self, row: Row) {
        self.rows.push(row);
    }
}

impl FullCollector {
    pub fn finish(self, headers: Vec<String>) -> Dataset {
        Dataset::new(headers, self.rows)
    }
}

/// Keeps the first `limit` rows and counts all of them
pub(crate) struct PreviewCollector {
    limit: usize,
    rows: Vec<Row>,
    total: usize,
}

impl PreviewCollector {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            rows: Vec::with_capacity(limit.min(1024)),
            total: 0,
        }
    }

    pub fn finish(self, headers: Vec<String>) -> PreviewScan {
        let preview = Dataset::new(headers, self.rows);
        PreviewScan {
            headers: preview.headers,
            rows: preview.rows,
            total_rows: self.total,
        }
    }
}

impl RowCollector for PreviewCollector {
    fn push(&mut self, row: Row) {
        self.total += 1;
        if self.rows.len() < self.limit {
            self.rows.push(row);
        }
    }
}

/// Whether every cell of a raw row is blank
pub(crate) fn is_blank_row(row: &[Cell]) -> bool {
    row.iter().all(Cell::is_blank)
}
