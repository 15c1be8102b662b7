//! Dataset - FormatParser output
//!
//! Normalized headers plus rows of typed cells.

use serde::{Deserialize, Serialize};

use crate::{Cell, DatasetId, SourceKind};

/// One table row, always `headers.len()` cells long inside a [`Dataset`]
pub type Row = Vec<Cell>;

/// Parsed tabular file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    /// Column names, in file order
    pub headers: Vec<String>,

    /// Data rows, in file order
    pub rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset and enforce the row-width invariant
    ///
    /// Blank header names become `Column N`. Short rows are padded with `Null`;
    /// a row wider than the header row widens the header row instead of losing cells.
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        let mut dataset = Self { headers, rows };
        dataset.normalize();
        dataset
    }

    /// Number of data rows
    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Whether the dataset has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Locate a column by header name
    ///
    /// Both sides are trimmed. An exact match wins over a case-insensitive one.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        column_index(&self.headers, name)
    }

    /// First `limit` rows, for previews
    pub fn preview(&self, limit: usize) -> &[Row] {
        &self.rows[..self.rows.len().min(limit)]
    }

    /// Copy of this dataset's headers with a different row set
    pub fn with_rows(&self, rows: Vec<Row>) -> Self {
        Self {
            headers: self.headers.clone(),
            rows,
        }
    }

    fn normalize(&mut self) {
        let width = self
            .rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(self.headers.len());

        while self.headers.len() < width {
            self.headers.push(String::new());
        }
        for (idx, header) in self.headers.iter_mut().enumerate() {
            if header.trim().is_empty() {
                *header = placeholder_header(idx);
            }
        }
        for row in &mut self.rows {
            row.resize(width, Cell::Null);
        }
    }
}

/// Placeholder name for the header at 0-based `idx`
pub fn placeholder_header(idx: usize) -> String {
    format!("Column {}", idx + 1)
}

/// Normalize a raw header cell at 0-based `idx`
pub fn normalize_header(cell: &Cell, idx: usize) -> String {
    match cell.text() {
        Some(text) if !text.trim().is_empty() => text.into_owned(),
        _ => placeholder_header(idx),
    }
}

/// Locate a column by header name in a header slice
pub fn column_index(headers: &[String], name: &str) -> Option<usize> {
    let wanted = name.trim();
    headers
        .iter()
        .position(|h| h.trim() == wanted)
        .or_else(|| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(wanted))
        })
}

/// Ingestion summary returned to callers after an upload
///
/// Carries a bounded preview while reporting the full row count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSummary {
    /// Handle for every later operation on this dataset
    pub dataset_id: DatasetId,

    /// Original file name
    pub file_name: String,

    /// Size in bytes
    pub file_size: u64,

    /// Declared content kind
    pub source_kind: SourceKind,

    /// Number of rows in `rows`
    pub preview_rows: usize,

    /// Number of columns
    pub column_count: usize,

    /// Normalized headers
    pub headers: Vec<String>,

    /// Preview rows
    pub rows: Vec<Row>,

    /// Total number of data rows in the file
    pub total_rows: usize,

    /// Sorted distinct neighborhood values over the whole file
    pub unique_neighborhoods: Vec<String>,

    /// Sorted distinct status values over the whole file
    pub unique_statuses: Vec<String>,
}
