//! `filter` command implementation.

use anyhow::Result;
use artifact_store::format_for_preview;
use serde::Serialize;

use super::{criteria_from, print_json};
use crate::cli::FilterArgs;
use crate::pipeline::Pipeline;

/// Filter preview for JSON output
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FilterPreview {
    total_rows: usize,
    matched_rows: usize,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Execute the `filter` command
pub async fn run_filter(pipeline: &Pipeline, args: &FilterArgs) -> Result<()> {
    let criteria = criteria_from(&args.criteria)?;
    let preview = if criteria.is_empty() {
        // every row matches, so stream only the leading rows
        let scan = pipeline.preview(args.dataset, args.limit).await?;
        FilterPreview {
            total_rows: scan.total_rows,
            matched_rows: scan.total_rows,
            headers: scan.headers,
            rows: format_for_preview(&scan.rows),
        }
    } else {
        let selection = pipeline.select(args.dataset, &criteria).await?;
        let dataset = &selection.dataset;
        FilterPreview {
            total_rows: selection.total_rows,
            matched_rows: dataset.total_rows(),
            headers: dataset.headers.clone(),
            rows: format_for_preview(dataset.preview(args.limit)),
        }
    };

    if args.json {
        return print_json(&preview);
    }

    println!(
        "{} of {} rows match",
        preview.matched_rows, preview.total_rows
    );
    if preview.rows.is_empty() {
        return Ok(());
    }
    println!("\n  {}", preview.headers.join(" | "));
    for row in &preview.rows {
        println!("  {}", row.join(" | "));
    }
    if preview.matched_rows > preview.rows.len() {
        println!("  ... {} more", preview.matched_rows - preview.rows.len());
    }
    Ok(())
}
