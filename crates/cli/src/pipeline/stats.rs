//! Send run statistics.

use std::path::PathBuf;
use std::time::Duration;

use observability::DispatchMetricsAggregator;

/// Statistics from a `send` run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Rows in the stored dataset
    pub total_rows: usize,

    /// Rows matching the filters
    pub matched_rows: usize,

    /// Workbook written before sending
    pub artifact: Option<PathBuf>,

    /// Duration of the dispatch loop
    pub duration: Duration,

    /// Dispatch metrics aggregator
    pub dispatch_metrics: DispatchMetricsAggregator,
}

impl PipelineStats {
    /// Messages attempted per second
    pub fn throughput(&self) -> f64 {
        let summary = self.dispatch_metrics.summary();
        let attempted = summary.total_sent + summary.total_failed;
        if self.duration.as_secs_f64() > 0.0 {
            attempted as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Send Statistics ===\n");

        println!("Overview");
        println!("   ├─ Rows in file: {}", self.total_rows);
        println!("   ├─ Rows matched: {}", self.matched_rows);
        if let Some(ref artifact) = self.artifact {
            println!("   ├─ Workbook: {}", artifact.display());
        }
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   └─ Messages/s: {:.2}", self.throughput());

        println!("\n{}", self.dispatch_metrics.summary());
    }
}
