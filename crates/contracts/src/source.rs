//! SourceKind - declared content kind of an upload

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::ContractError;

const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Declared content kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Delimited text (CSV), streamed
    DelimitedText,
    /// Spreadsheet workbook, loaded into memory
    Spreadsheet,
}

impl SourceKind {
    /// Resolve from a MIME type
    pub fn from_mime(mime: &str) -> Result<Self, ContractError> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "text/csv" | "application/csv" => Ok(Self::DelimitedText),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel"
            | "application/vnd.oasis.opendocument.spreadsheet" => Ok(Self::Spreadsheet),
            other => Err(ContractError::parse(format!(
                "unsupported file type '{other}': only Excel and CSV files are allowed"
            ))),
        }
    }

    /// Resolve from a file extension (without the dot)
    pub fn from_extension(ext: &str) -> Result<Self, ContractError> {
        let ext = ext.to_ascii_lowercase();
        if ext == "csv" {
            Ok(Self::DelimitedText)
        } else if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
            Ok(Self::Spreadsheet)
        } else {
            Err(ContractError::parse(format!(
                "unsupported file extension '.{ext}': only Excel and CSV files are allowed"
            )))
        }
    }

    /// Resolve from a path's extension
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ContractError::parse("cannot determine file type from extension"))?;
        Self::from_extension(ext)
    }

    /// Extension used when the original name carries none
    pub fn default_extension(&self) -> &'static str {
        match self {
            Self::DelimitedText => "csv",
            Self::Spreadsheet => "xlsx",
        }
    }

    /// Every extension recognized for this kind
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::DelimitedText => &["csv"],
            Self::Spreadsheet => &SPREADSHEET_EXTENSIONS,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DelimitedText => write!(f, "delimited_text"),
            Self::Spreadsheet => write!(f, "spreadsheet"),
        }
    }
}
