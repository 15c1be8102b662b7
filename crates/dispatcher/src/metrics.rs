//! Transport counters for observability

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::SendAttempt;

/// Cumulative counters of one coordinator, across runs
#[derive(Debug, Default)]
pub struct TransportMetrics {
    /// Sends accepted with a 2xx status
    accepted: AtomicU64,
    /// Sends answered with a non-2xx status
    rejected: AtomicU64,
    /// Sends that got no response
    no_response: AtomicU64,
    /// Rows skipped for a blank phone
    skipped: AtomicU64,
}

impl TransportMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one send attempt
    pub fn record(&self, attempt: &SendAttempt) {
        let counter = match attempt {
            SendAttempt::Accepted { .. } => &self.accepted,
            SendAttempt::Rejected { .. } => &self.rejected,
            SendAttempt::NoResponse { .. } => &self.no_response,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn no_response(&self) -> u64 {
        self.no_response.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            accepted: self.accepted(),
            rejected: self.rejected(),
            no_response: self.no_response(),
            skipped: self.skipped(),
        }
    }
}

/// Snapshot of transport metrics (for reporting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub accepted: u64,
    pub rejected: u64,
    pub no_response: u64,
    pub skipped: u64,
}

impl MetricsSnapshot {
    pub fn attempts(&self) -> u64 {
        self.accepted + self.rejected + self.no_response
    }
}
