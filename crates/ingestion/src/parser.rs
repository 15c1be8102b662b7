//! FormatParser - format-agnostic entry point

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Instant;

use bytes::{Buf, Bytes};
use contracts::{ContractError, Dataset, LimitsConfig, SourceKind};
use tracing::{debug, instrument, warn};

use crate::collector::{FullCollector, PreviewCollector, PreviewScan, RowCollector};
use crate::delimited::read_delimited;
use crate::error::{IngestionError, Result};
use crate::limits::ParseLimits;
use crate::spreadsheet::{read_bounded, read_spreadsheet};

/// Parses delimited text and spreadsheets into [`Dataset`]s
///
/// Delimited text is streamed under its ceiling. Spreadsheets are size-checked
/// before they are loaded into memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatParser {
    limits: ParseLimits,
}

impl FormatParser {
    pub fn new(limits: ParseLimits) -> Self {
        Self { limits }
    }

    pub fn from_config(config: &LimitsConfig) -> Self {
        Self::new(ParseLimits::from(config))
    }

    pub fn limits(&self) -> &ParseLimits {
        &self.limits
    }

    /// Parse any reader
    ///
    /// # Errors
    /// `ContractError::Parse` when the content is unreadable or over its ceiling.
    #[instrument(name = "format_parse_reader", skip(self, reader), fields(kind = %kind))]
    pub fn parse_reader<R: Read>(&self, reader: R, kind: SourceKind) -> Result<Dataset, ContractError> {
        let started = Instant::now();
        let mut collector = FullCollector::default();
        let result = self.read_into(reader, kind, &mut collector);
        finish(result, kind, started).map(|headers| collector.finish(headers)).map(|dataset| {
            record_dataset(&dataset, kind);
            dataset
        })
    }

    /// Parse a file, checking its size before opening it
    #[instrument(name = "format_parse_path", skip(self), fields(path = %path.display(), kind = %kind))]
    pub fn parse_path(&self, path: &Path, kind: SourceKind) -> Result<Dataset, ContractError> {
        self.check_file_size(path, kind)?;
        let file = File::open(path)?;
        self.parse_reader(BufReader::new(file), kind)
    }

    /// Parse an in-memory upload body
    pub fn parse_bytes(&self, bytes: Bytes, kind: SourceKind) -> Result<Dataset, ContractError> {
        self.check_len(bytes.len() as u64, kind)?;
        match kind {
            SourceKind::DelimitedText => self.parse_reader(bytes.reader(), kind),
            SourceKind::Spreadsheet => {
                let started = Instant::now();
                let mut collector = FullCollector::default();
                let result = read_spreadsheet(bytes.to_vec(), &mut collector);
                let dataset = finish(result, kind, started).map(|h| collector.finish(h))?;
                record_dataset(&dataset, kind);
                Ok(dataset)
            }
        }
    }

    /// Keep the first `limit` rows while counting every row
    #[instrument(name = "format_scan_preview", skip(self, reader), fields(kind = %kind))]
    pub fn scan_preview<R: Read>(
        &self,
        reader: R,
        kind: SourceKind,
        limit: usize,
    ) -> Result<PreviewScan, ContractError> {
        let started = Instant::now();
        let mut collector = PreviewCollector::new(limit);
        let result = self.read_into(reader, kind, &mut collector);
        finish(result, kind, started).map(|headers| collector.finish(headers))
    }

    /// Reject a file whose metadata size exceeds the kind's ceiling
    pub fn check_file_size(&self, path: &Path, kind: SourceKind) -> Result<(), ContractError> {
        let len = std::fs::metadata(path)?.len();
        self.check_len(len, kind)
    }

    /// Reject a body of `len` bytes over the kind's ceiling
    pub fn check_len(&self, len: u64, kind: SourceKind) -> Result<(), ContractError> {
        let limit = self.limits.for_kind(kind);
        if len > limit {
            metrics::counter!("rowcast_parse_failures_total", "kind" => kind.to_string())
                .increment(1);
            warn!(len, limit, kind = %kind, "Upload rejected by size ceiling");
            return Err(IngestionError::SizeLimitExceeded { kind, limit }.into());
        }
        Ok(())
    }

    fn read_into<R: Read, C: RowCollector>(
        &self,
        reader: R,
        kind: SourceKind,
        collector: &mut C,
    ) -> Result<Vec<String>> {
        let limit = self.limits.for_kind(kind);
        match kind {
            SourceKind::DelimitedText => read_delimited(reader, limit, collector),
            SourceKind::Spreadsheet => {
                let bytes = read_bounded(reader, limit)?;
                read_spreadsheet(bytes, collector)
            }
        }
    }
}

fn finish<T>(result: Result<T>, kind: SourceKind, started: Instant) -> Result<T, ContractError> {
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    match result {
        Ok(value) => {
            metrics::histogram!("rowcast_parse_duration_ms", "kind" => kind.to_string())
                .record(elapsed_ms);
            Ok(value)
        }
        Err(e) => {
            metrics::counter!("rowcast_parse_failures_total", "kind" => kind.to_string())
                .increment(1);
            warn!(error = %e, kind = %kind, "Parse failed");
            Err(e.into())
        }
    }
}

fn record_dataset(dataset: &Dataset, kind: SourceKind) {
    metrics::counter!("rowcast_datasets_ingested_total", "kind" => kind.to_string()).increment(1);
    metrics::counter!("rowcast_rows_ingested_total").increment(dataset.total_rows() as u64);
    debug!(
        rows = dataset.total_rows(),
        columns = dataset.column_count(),
        "Dataset parsed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Cell;
    use std::io::Write;

    const CSV: &str = "Nome,Bairro,Status,Data,Telefone\n\
        Ana,Centro,Ativo,01/02/2024,555-0001\n\
        Bia,Norte,Inativo,02/02/2024,555-0002\n\
        Caio,Centro,Ativo,03/02/2024,\n";

    fn small_limits(delimited: u64, spreadsheet: u64) -> FormatParser {
        FormatParser::new(ParseLimits {
            delimited_max_bytes: delimited,
            spreadsheet_max_bytes: spreadsheet,
        })
    }

    #[test]
    fn test_parse_bytes_csv() {
        let parser = FormatParser::default();
        let ds = parser
            .parse_bytes(Bytes::from_static(CSV.as_bytes()), SourceKind::DelimitedText)
            .unwrap();
        assert_eq!(ds.column_count(), 5);
        assert_eq!(ds.total_rows(), 3);
        assert_eq!(ds.rows[2][4], Cell::Null);
    }

    #[test]
    fn test_parse_path_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();

        let ds = FormatParser::default()
            .parse_path(file.path(), SourceKind::DelimitedText)
            .unwrap();
        assert_eq!(ds.headers[1], "Bairro");
        assert!(ds.rows.iter().all(|r| r.len() == ds.column_count()));
    }

    #[test]
    fn test_spreadsheet_rejected_before_parse() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        // Not a workbook: a size error proves the content was never parsed.
        file.write_all(&[0u8; 2048]).unwrap();

        let err = small_limits(1 << 20, 1024)
            .parse_path(file.path(), SourceKind::Spreadsheet)
            .unwrap_err();
        match err {
            ContractError::Parse { message } => {
                assert!(message.contains("1 KiB"), "got: {message}");
                assert!(message.contains("CSV"), "got: {message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_spreadsheet_reader_bounded() {
        let err = small_limits(1 << 20, 16)
            .parse_reader(&[0u8; 64][..], SourceKind::Spreadsheet)
            .unwrap_err();
        assert!(matches!(err, ContractError::Parse { .. }));
    }

    #[test]
    fn test_csv_stream_over_limit() {
        let err = small_limits(32, 16)
            .parse_reader(CSV.as_bytes(), SourceKind::DelimitedText)
            .unwrap_err();
        assert!(err.to_string().contains("CSV files are limited to 32 B"));
    }

    #[test]
    fn test_corrupt_spreadsheet_is_parse_error() {
        let err = FormatParser::default()
            .parse_bytes(Bytes::from_static(b"PK\x03\x04garbage"), SourceKind::Spreadsheet)
            .unwrap_err();
        assert!(matches!(err, ContractError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = FormatParser::default()
            .parse_path(Path::new("/nonexistent/rowcast.csv"), SourceKind::DelimitedText)
            .unwrap_err();
        assert!(matches!(err, ContractError::Io(_)));
    }

    #[test]
    fn test_scan_preview() {
        let mut csv = String::from("Phone\n");
        for i in 0..50 {
            csv.push_str(&format!("{i}\n"));
        }
        let scan = FormatParser::default()
            .scan_preview(csv.as_bytes(), SourceKind::DelimitedText, 20)
            .unwrap();
        assert_eq!(scan.headers, vec!["Phone"]);
        assert_eq!(scan.rows.len(), 20);
        assert_eq!(scan.total_rows, 50);
        assert_eq!(scan.rows[19][0], Cell::from("19"));
    }
}
