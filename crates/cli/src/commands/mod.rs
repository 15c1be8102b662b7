//! Command implementations.

mod export;
mod filter;
mod ingest;
mod remove;
mod report;
mod send;
mod validate;
mod values;

use anyhow::{Context, Result};
use contracts::{DateRangeRequest, FilterCriteria, FilterRequest};
use serde::Serialize;

use crate::cli::CriteriaArgs;

pub use export::run_export;
pub use filter::run_filter;
pub use ingest::run_ingest;
pub use remove::run_remove;
pub use report::run_report;
pub use send::run_send;
pub use validate::run_validate;
pub use values::run_values;

/// Build filter criteria from a JSON request file or from the individual flags
pub(crate) fn criteria_from(args: &CriteriaArgs) -> Result<FilterCriteria> {
    let request = match &args.filters {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read filters from {}", path.display()))?;
            serde_json::from_str::<FilterRequest>(&content)
                .with_context(|| format!("Invalid filter request in {}", path.display()))?
        }
        None => FilterRequest {
            neighborhoods: Some(args.neighborhoods.clone()),
            statuses: Some(args.statuses.clone()),
            date_range: (args.from.is_some() || args.to.is_some()).then(|| DateRangeRequest {
                from: args.from.clone(),
                to: args.to.clone(),
            }),
        },
    };
    Ok(FilterCriteria::try_from(request)?)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
