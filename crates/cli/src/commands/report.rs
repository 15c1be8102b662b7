//! `report` command implementation.

use anyhow::Result;
use contracts::{DispatchReport, DispatchStatus};

use super::print_json;
use crate::cli::ReportArgs;
use crate::pipeline::Pipeline;

/// Execute the `report` command
pub fn run_report(pipeline: &Pipeline, args: &ReportArgs) -> Result<()> {
    let Some(report) = pipeline.latest_report()? else {
        if args.json {
            println!("null");
        } else {
            println!("No send has been recorded yet");
        }
        return Ok(());
    };

    if args.json {
        print_json(&report)
    } else {
        print_report(&report);
        Ok(())
    }
}

/// Human-readable dispatch report
pub(crate) fn print_report(report: &DispatchReport) {
    let marker = if report.outcome.is_success() { "✓" } else { "✗" };
    println!("{} {}", marker, report.outcome.user_message());
    println!(
        "\n  Started: {}",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "  Finished: {}",
        report.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Sent: {}", report.summary.success_count);
    println!("  Failed: {}", report.summary.fail_count);
    println!("  Skipped (no phone): {}", report.summary.skipped_count);
    if let Some(status) = report.summary.last_failure_status {
        println!("  Last failure status: {}", status);
    }

    if report.results.is_empty() {
        return;
    }
    println!("\n  Recipients:");
    for result in &report.results {
        let marker = match result.status {
            DispatchStatus::Sent => "✓",
            DispatchStatus::Failed => "✗",
            DispatchStatus::Pending => "…",
        };
        println!(
            "  {} {} {} {}",
            marker, result.identifier, result.display_name, result.phone
        );
    }
}
