//! Spreadsheet reader (first sheet only)

use std::io::{Cursor, Read};

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use contracts::{normalize_header, Cell, Row, SourceKind};

use crate::collector::{is_blank_row, RowCollector};
use crate::error::{IngestionError, Result};

/// Read a stream fully into memory, rejecting it once it exceeds `limit`
///
/// At most `limit + 1` bytes are ever buffered.
pub(crate) fn read_bounded<R: Read>(reader: R, limit: u64) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut buf)?;
    if buf.len() as u64 > limit {
        return Err(IngestionError::SizeLimitExceeded {
            kind: SourceKind::Spreadsheet,
            limit,
        });
    }
    Ok(buf)
}

/// Parse an in-memory workbook into `collector`, returning the normalized headers
pub(crate) fn read_spreadsheet<C: RowCollector>(bytes: Vec<u8>, collector: &mut C) -> Result<Vec<String>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| IngestionError::spreadsheet(e.to_string()))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| IngestionError::spreadsheet(e.to_string()))?,
        None => return Err(IngestionError::spreadsheet("workbook contains no sheets")),
    };

    Ok(collect_range(&range, collector))
}

fn collect_range<C: RowCollector>(range: &Range<Data>, collector: &mut C) -> Vec<String> {
    // The range starts at the first used cell; keep leading empty columns.
    let leading = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    let mut headers: Option<Vec<String>> = None;

    for raw in range.rows() {
        let mut row: Row = Vec::with_capacity(leading + raw.len());
        row.resize(leading, Cell::Null);
        row.extend(raw.iter().map(convert_cell));

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

    headers.unwrap_or_default()
}

/// Map a workbook value onto a typed cell
fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Null,
        Data::String(s) => Cell::text_or_null(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::String(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                return Cell::Number(dt.as_f64());
            }
            dt.as_datetime()
                .map(|d| Cell::Date(d.date()))
                .unwrap_or_else(|| Cell::Number(dt.as_f64()))
        }
        Data::DateTimeIso(s) => parse_iso_date(s)
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::text_or_null(s.clone())),
        Data::DurationIso(s) => Cell::text_or_null(s.clone()),
    }
}

fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}
