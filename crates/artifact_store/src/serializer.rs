//! OutputSerializer - final artifact writer
//!
//! Cells keep their types: dates are written as workbook dates with a
//! `dd/mm/yyyy` number format, never as preformatted text.

use std::path::PathBuf;

use contracts::{Cell, ContractError, Row, StorageConfig};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use tracing::{debug, instrument};

use crate::atomic::atomic_write;
use crate::error::{Result, StoreError};

/// Number format applied to date cells
pub const ARTIFACT_DATE_FORMAT: &str = "dd/mm/yyyy";

/// Writes the filtered subset to a fixed destination
#[derive(Debug, Clone)]
pub struct OutputSerializer {
    artifact_path: PathBuf,
    message_path: PathBuf,
}

impl OutputSerializer {
    pub fn new(artifact_path: impl Into<PathBuf>, message_path: impl Into<PathBuf>) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            message_path: message_path.into(),
        }
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(storage.artifact_path(), storage.message_path())
    }

    pub fn artifact_path(&self) -> &PathBuf {
        &self.artifact_path
    }

    /// Persist `headers` and `rows` as a single-sheet workbook, replacing any prior artifact
    ///
    /// # Errors
    /// `ContractError::Persistence` when the workbook cannot be built or written.
    #[instrument(name = "artifact_serialize", skip(self, headers, rows), fields(rows = rows.len()))]
    pub fn serialize(&self, headers: &[String], rows: &[Row]) -> Result<PathBuf, ContractError> {
        let bytes = workbook_bytes(headers, rows).map_err(|e| e.at(&self.artifact_path))?;
        atomic_write(&self.artifact_path, &bytes).map_err(|e| e.at(&self.artifact_path))?;

        metrics::counter!("rowcast_artifacts_written_total").increment(1);
        debug!(
            path = %self.artifact_path.display(),
            bytes = bytes.len(),
            "Artifact written"
        );
        Ok(self.artifact_path.clone())
    }

    /// Persist the outbound message body beside the artifact
    pub fn write_message(&self, message: &str) -> Result<PathBuf, ContractError> {
        atomic_write(&self.message_path, message.as_bytes())
            .map_err(|e| e.at(&self.message_path))?;
        Ok(self.message_path.clone())
    }
}

/// Encode `headers` and `rows` as xlsx bytes
pub fn workbook_bytes(headers: &[String], rows: &[Row]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format(ARTIFACT_DATE_FORMAT);
    let sheet = workbook.add_worksheet();

    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, column(col)?, header.as_str())?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let r = u32::try_from(idx + 1).map_err(|_| StoreError::SheetLimit)?;
        for (col, cell) in row.iter().enumerate() {
            let c = column(col)?;
            match cell {
                Cell::String(s) => {
                    sheet.write_string(r, c, s.as_str())?;
                }
                Cell::Number(n) => {
                    sheet.write_number(r, c, *n)?;
                }
                Cell::Date(d) => {
                    let excel = excel_date(*d)?;
                    sheet.write_datetime_with_format(r, c, &excel, &date_format)?;
                }
                Cell::Null => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn column(idx: usize) -> Result<u16> {
    u16::try_from(idx).map_err(|_| StoreError::SheetLimit)
}

fn excel_date(date: chrono::NaiveDate) -> Result<ExcelDateTime> {
    use chrono::Datelike;

    let year = u16::try_from(date.year()).map_err(|_| StoreError::DateOutOfRange(date))?;
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8)
        .map_err(|_| StoreError::DateOutOfRange(date))
}
