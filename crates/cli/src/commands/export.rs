//! `export` command implementation.

use anyhow::Result;
use tracing::info;

use super::criteria_from;
use crate::cli::ExportArgs;
use crate::pipeline::Pipeline;

/// Execute the `export` command
pub async fn run_export(pipeline: &Pipeline, args: &ExportArgs) -> Result<()> {
    let criteria = criteria_from(&args.criteria)?;
    let selection = pipeline.select(args.dataset, &criteria).await?;
    let path = pipeline.export(&selection.dataset, args.message.as_deref())?;

    info!(
        path = %path.display(),
        rows = selection.dataset.total_rows(),
        "Selection exported"
    );
    println!(
        "✓ Wrote {} of {} rows to {}",
        selection.dataset.total_rows(),
        selection.total_rows,
        path.display()
    );
    if args.message.is_some() {
        println!(
            "  Message saved to {}",
            pipeline.blueprint().storage.message_path().display()
        );
    }
    Ok(())
}
