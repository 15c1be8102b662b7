//! `ingest` command implementation.

use anyhow::Result;
use artifact_store::format_for_preview;
use contracts::{SourceKind, UploadSummary};
use ingestion::format_bytes;
use tracing::info;

use super::print_json;
use crate::cli::IngestArgs;
use crate::pipeline::Pipeline;

/// Execute the `ingest` command
pub async fn run_ingest(pipeline: &Pipeline, args: &IngestArgs) -> Result<()> {
    let kind = match args.kind {
        Some(kind) => SourceKind::from(kind),
        None => SourceKind::from_path(&args.file)?,
    };
    info!(file = %args.file.display(), kind = %kind, "Ingesting file");

    let summary = pipeline.upload(&args.file, kind).await?;

    if args.json {
        print_json(&summary)
    } else {
        print_summary(&summary);
        Ok(())
    }
}

fn print_summary(summary: &UploadSummary) {
    println!("✓ Stored {} as dataset {}", summary.file_name, summary.dataset_id);
    println!("\n  Size: {}", format_bytes(summary.file_size));
    println!("  Kind: {}", summary.source_kind);
    println!("  Rows: {}", summary.total_rows);
    println!("  Columns: {}", summary.column_count);

    if !summary.unique_neighborhoods.is_empty() {
        println!("\n  Neighborhoods: {}", summary.unique_neighborhoods.join(", "));
    }
    if !summary.unique_statuses.is_empty() {
        println!("  Statuses: {}", summary.unique_statuses.join(", "));
    }

    if summary.preview_rows > 0 {
        println!("\n  Preview ({} of {} rows):", summary.preview_rows, summary.total_rows);
        println!("  {}", summary.headers.join(" | "));
        for row in format_for_preview(&summary.rows) {
            println!("  {}", row.join(" | "));
        }
    }
}
