//! ReportStore - last dispatch report on disk

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use contracts::{ContractError, DispatchReport, StorageConfig};
use tracing::{debug, instrument};

use crate::atomic::atomic_write;
use crate::error::StoreError;

/// Keeps the report of the most recent dispatch run
///
/// Each save replaces the previous report.
#[derive(Debug, Clone)]
pub struct ReportStore {
    path: PathBuf,
}

impl ReportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(storage.report_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[instrument(name = "report_save", skip(self, report), fields(results = report.results.len()))]
    pub fn save(&self, report: &DispatchReport) -> Result<(), ContractError> {
        let json = serde_json::to_vec_pretty(report).map_err(|e| StoreError::from(e).at(&self.path))?;
        atomic_write(&self.path, &json).map_err(|e| e.at(&self.path))?;
        debug!(path = %self.path.display(), "Dispatch report saved");
        Ok(())
    }

    /// Most recent report, `None` before the first run
    pub fn latest(&self) -> Result<Option<DispatchReport>, ContractError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let report = serde_json::from_slice(&bytes).map_err(|e| StoreError::from(e).at(&self.path))?;
        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::{DispatchResult, DispatchStatus, DispatchSummary};

    fn report(phones: &[&str]) -> DispatchReport {
        let results: Vec<_> = phones
            .iter()
            .enumerate()
            .map(|(i, phone)| {
                let mut r = DispatchResult::pending((i + 1).to_string(), String::new(), phone.to_string());
                r.finalize(DispatchStatus::Sent);
                r
            })
            .collect();
        let summary = DispatchSummary {
            success_count: results.len(),
            ..Default::default()
        };
        DispatchReport {
            outcome: summary.classify(),
            results,
            summary,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn test_latest_before_any_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path().join("report.json"));
        assert!(store.latest().unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path().join("out/report.json"));

        store.save(&report(&["111", "222"])).unwrap();
        let second = report(&["333"]);
        store.save(&second).unwrap();

        let latest = store.latest().unwrap().unwrap();
        assert_eq!(latest, second);
        assert_eq!(latest.count(DispatchStatus::Sent), 1);
    }

    #[test]
    fn test_corrupt_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        fs::write(&path, b"{ not json").unwrap();

        let err = ReportStore::new(&path).latest().unwrap_err();
        assert!(matches!(err, ContractError::Persistence { .. }));
    }
}
