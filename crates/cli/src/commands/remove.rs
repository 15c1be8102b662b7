//! `remove` command implementation.

use anyhow::Result;

use crate::cli::RemoveArgs;
use crate::pipeline::Pipeline;

/// Execute the `remove` command
pub fn run_remove(pipeline: &Pipeline, args: &RemoveArgs) -> Result<()> {
    pipeline.remove(args.dataset)?;
    println!("✓ Removed dataset {}", args.dataset);
    Ok(())
}
