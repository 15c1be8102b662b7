//! `values` command implementation.

use anyhow::Result;
use filter_engine::RowIndexer;

use super::print_json;
use crate::cli::ValuesArgs;
use crate::pipeline::Pipeline;

/// Execute the `values` command
pub async fn run_values(pipeline: &Pipeline, args: &ValuesArgs) -> Result<()> {
    let dataset = pipeline.dataset(args.dataset).await?;
    let values = RowIndexer::extract_unique_values(&dataset, &args.column)?;

    if args.json {
        return print_json(&values);
    }

    println!("{} ({} distinct):", args.column, values.len());
    for value in &values {
        println!("  - {}", value);
    }
    Ok(())
}
