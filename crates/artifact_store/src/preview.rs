//! Preview text rendering

use contracts::Row;

/// Render rows as display text, blank for null cells
pub fn format_for_preview(rows: &[Row]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.text().map(|t| t.into_owned()).unwrap_or_default())
                .collect()
        })
        .collect()
}
