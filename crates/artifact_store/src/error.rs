//! Artifact store error types

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

/// Artifact store specific error
#[derive(Debug, Error)]
pub enum StoreError {
    /// Workbook could not be built
    #[error("failed to build workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    /// Report could not be encoded or decoded
    #[error("invalid report json: {0}")]
    Report(#[from] serde_json::Error),

    /// Row or column index beyond what a sheet can address
    #[error("sheet exceeds workbook row or column limits")]
    SheetLimit,

    /// Date outside the range a workbook can hold
    #[error("date {0} cannot be stored in a workbook")]
    DateOutOfRange(chrono::NaiveDate),

    /// Atomic replace failed
    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Convert to a persistence error for `path`
    pub fn at(self, path: &std::path::Path) -> ContractError {
        ContractError::persistence(path, self.to_string())
    }
}

/// Artifact store Result type alias
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
