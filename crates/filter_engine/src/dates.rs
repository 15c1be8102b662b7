//! Date resolution for the date dimension
//!
//! Day-first formats are tried before anything else; month-first is the last
//! resort, so `03/04/2024` is always 3 April.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use contracts::Cell;

/// Day/month/year formats, tried on the leading date token
const PRIMARY_FORMATS: [&str; 3] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// Formats tried on the whole text after the primary parse fails
const FALLBACK_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// `%Y` also accepts one to three digits; such years are treated as typos
const MIN_YEAR: i32 = 1000;

const FALLBACK_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Calendar day of a cell, if it can be resolved
///
/// `Date` cells are used directly and `String` cells are parsed.
/// `Number` and `Null` never resolve.
pub fn resolve_cell_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::String(s) => parse_date_text(s),
        Cell::Number(_) | Cell::Null => None,
    }
}

/// Parse free-form date text to a calendar day
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    parse_primary(text).or_else(|| parse_fallback(text).filter(four_digit_year))
}

fn four_digit_year(date: &NaiveDate) -> bool {
    date.year() >= MIN_YEAR
}

/// Day-first parse; a trailing time of day is ignored
fn parse_primary(text: &str) -> Option<NaiveDate> {
    let token = text.split_whitespace().next()?;
    PRIMARY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
        .filter(four_digit_year)
}

fn parse_fallback(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    FALLBACK_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            FALLBACK_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_primary_formats() {
        assert_eq!(parse_date_text("03/04/2024"), day(2024, 4, 3));
        assert_eq!(parse_date_text("03-04-2024"), day(2024, 4, 3));
        assert_eq!(parse_date_text("03.04.2024"), day(2024, 4, 3));
        assert_eq!(parse_date_text(" 3/4/2024 "), day(2024, 4, 3));
        assert_eq!(parse_date_text("03/04/2024 14:30"), day(2024, 4, 3));
    }

    #[test]
    fn test_fallback_formats() {
        assert_eq!(parse_date_text("2024-04-03"), day(2024, 4, 3));
        assert_eq!(parse_date_text("2024/04/03"), day(2024, 4, 3));
        assert_eq!(parse_date_text("2024-04-03T10:00:00Z"), day(2024, 4, 3));
        assert_eq!(parse_date_text("2024-04-03 10:00"), day(2024, 4, 3));
        assert_eq!(parse_date_text("2024-04-03 10:00:59"), day(2024, 4, 3));
        // only valid month-first
        assert_eq!(parse_date_text("12/31/2024"), day(2024, 12, 31));
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_date_text(""), None);
        assert_eq!(parse_date_text("soon"), None);
        assert_eq!(parse_date_text("31/31/2024"), None);
        assert_eq!(parse_date_text("05/01/24"), None);
        assert_eq!(parse_date_text("05-01-924"), None);
        assert_eq!(parse_date_text("24-01-05"), None);
        assert_eq!(resolve_cell_date(&Cell::Number(45000.0)), None);
        assert_eq!(resolve_cell_date(&Cell::Null), None);
    }

    #[test]
    fn test_date_cell_used_directly() {
        let d = NaiveDate::from_ymd_opt(2023, 12, 25).unwrap();
        assert_eq!(resolve_cell_date(&Cell::Date(d)), Some(d));
    }
}
