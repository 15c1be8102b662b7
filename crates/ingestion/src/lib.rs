//! # Ingestion
//!
//! Tabular file ingestion module.
//!
//! Responsibilities:
//! - Parse delimited text (streamed) and spreadsheets (in-memory) into `Dataset`
//! - Enforce per-kind size ceilings before or while reading
//! - Normalize headers and row widths
//! - Produce bounded previews with full row counts
//!
//! ## Usage Example
//!
//! ```no_run
//! use contracts::SourceKind;
//! use ingestion::FormatParser;
//! use std::path::Path;
//!
//! let parser = FormatParser::default();
//! let dataset = parser
//!     .parse_path(Path::new("clients.csv"), SourceKind::DelimitedText)
//!     .unwrap();
//! println!("{} rows", dataset.total_rows());
//! ```

mod collector;
mod delimited;
mod error;
mod limits;
mod parser;
mod spreadsheet;

// Re-exports
pub use collector::PreviewScan;
pub use contracts::{Dataset, SourceKind};
pub use error::{IngestionError, Result};
pub use limits::{format_bytes, ParseLimits};
pub use parser::FormatParser;
