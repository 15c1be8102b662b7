//! Delimited text (CSV) reader
//!
//! Streams records through the `csv` crate; nothing but the collected rows is
//! held in memory.

use std::io::Read;

use contracts::{normalize_header, Cell, Row, SourceKind};

use crate::collector::{is_blank_row, RowCollector};
use crate::error::{IngestionError, Result};
use crate::limits::{LimitExceeded, LimitedReader};

const UTF8_BOM: char = '\u{feff}';

/// Read a delimited stream into `collector`, returning the normalized headers
///
/// The stream fails as soon as it crosses `limit` bytes.
pub(crate) fn read_delimited<R, C>(reader: R, limit: u64, collector: &mut C) -> Result<Vec<String>>
where
    R: Read,
    C: RowCollector,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(LimitedReader::new(reader, limit));

    let mut record = csv::ByteRecord::new();
    let mut headers: Option<Vec<String>> = None;
    let mut first_record = true;

    while csv_reader
        .read_byte_record(&mut record)
        .map_err(map_csv_error)?
    {
        let mut row: Row = record.iter().map(decode_field).collect();
        if first_record {
            strip_bom(&mut row);
            first_record = false;
        }
        match headers {
            None if is_blank_row(&row) => continue,
            None => {
                headers = Some(
                    row.iter()
                        .enumerate()
                        .map(|(idx, cell)| normalize_header(cell, idx))
                        .collect(),
                );
            }
            Some(_) => collector.push(row),
        }
    }

    Ok(headers.unwrap_or_default())
}

/// Every field is text; empty fields are null
fn decode_field(field: &[u8]) -> Cell {
    Cell::text_or_null(String::from_utf8_lossy(field).into_owned())
}

fn strip_bom(row: &mut Row) {
    if let Some(Cell::String(first)) = row.first_mut() {
        if first.starts_with(UTF8_BOM) {
            let stripped = first.trim_start_matches(UTF8_BOM).to_string();
            row[0] = Cell::text_or_null(stripped);
        }
    }
}

fn map_csv_error(err: csv::Error) -> IngestionError {
    if let csv::ErrorKind::Io(io_err) = err.kind() {
        if let Some(limit) = LimitExceeded::find(io_err) {
            return IngestionError::SizeLimitExceeded {
                kind: SourceKind::DelimitedText,
                limit,
            };
        }
    }
    IngestionError::Delimited(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::FullCollector;

    fn read(input: &[u8]) -> contracts::Dataset {
        let mut collector = FullCollector::default();
        let headers = read_delimited(input, u64::MAX, &mut collector).unwrap();
        collector.finish(headers)
    }

    #[test]
    fn test_basic_csv() {
        let ds = read(b"Name,Phone\nAna,555\nBia,\n");
        assert_eq!(ds.headers, vec!["Name", "Phone"]);
        assert_eq!(ds.total_rows(), 2);
        assert_eq!(ds.rows[0], vec![Cell::from("Ana"), Cell::from("555")]);
        assert_eq!(ds.rows[1][1], Cell::Null);
    }

    #[test]
    fn test_numbers_stay_text() {
        let ds = read(b"Phone\n0563238044\n");
        assert_eq!(ds.rows[0][0], Cell::String("0563238044".into()));
    }

    #[test]
    fn test_ragged_rows() {
        let ds = read(b"a,b,c\n1\n1,2,3,4\n");
        assert_eq!(ds.headers, vec!["a", "b", "c", "Column 4"]);
        assert!(ds.rows.iter().all(|r| r.len() == 4));
        assert_eq!(ds.rows[0][1], Cell::Null);
        assert_eq!(ds.rows[1][3], Cell::from("4"));
    }

    #[test]
    fn test_blank_headers_and_rows() {
        let ds = read(b"\n,,\nName,,Date\n,,\nAna,x,01/02/2024\n");
        assert_eq!(ds.headers, vec!["Name", "Column 2", "Date"]);
        assert_eq!(ds.total_rows(), 2);
        assert_eq!(ds.rows[0], vec![Cell::Null, Cell::Null, Cell::Null]);
    }

    #[test]
    fn test_blank_records_after_header_are_counted() {
        let ds = read(b"a,b\n1,2\n,\n3,4\n \t, \n5,6\n");
        assert_eq!(ds.total_rows(), 5);
        assert_eq!(ds.rows[1], vec![Cell::Null, Cell::Null]);
        assert_eq!(ds.rows[4], vec![Cell::from("5"), Cell::from("6")]);
    }

    #[test]
    fn test_empty_lines_are_not_rows() {
        let ds = read(b"a,b\n1,2\n\n\n3,4\n");
        assert_eq!(ds.total_rows(), 2);
    }

    #[test]
    fn test_bom_stripped() {
        let ds = read("\u{feff}Name,Phone\nAna,1\n".as_bytes());
        assert_eq!(ds.headers[0], "Name");
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let ds = read(b"Name\nJo\xe3o\n");
        let text = ds.rows[0][0].text().unwrap().into_owned();
        assert!(text.starts_with("Jo"));
        assert!(text.contains('\u{fffd}'));
    }

    #[test]
    fn test_quoted_fields() {
        let ds = read(b"Name,Note\n\"Silva, Ana\",\"said \"\"hi\"\"\"\n");
        assert_eq!(ds.rows[0][0], Cell::from("Silva, Ana"));
        assert_eq!(ds.rows[0][1], Cell::from("said \"hi\""));
    }

    #[test]
    fn test_limit_exceeded() {
        let mut input = b"Name\n".to_vec();
        input.extend(std::iter::repeat(b"row\n").take(100).flatten());
        let mut collector = FullCollector::default();
        let err = read_delimited(input.as_slice(), 64, &mut collector).unwrap_err();
        assert!(matches!(
            err,
            IngestionError::SizeLimitExceeded {
                kind: SourceKind::DelimitedText,
                limit: 64
            }
        ));
    }

    #[test]
    fn test_empty_input() {
        let ds = read(b"");
        assert!(ds.headers.is_empty());
        assert!(ds.is_empty());
    }
}
