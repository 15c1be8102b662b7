//! Pipeline orchestrator - wires the stage crates to one configuration.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use artifact_store::{ArtifactStore, OutputSerializer, ReportStore};
use contracts::{
    Dataset, DatasetId, DispatchReport, FilterCriteria, MessageTransport, RowcastBlueprint,
    SourceKind, UploadSummary,
};
use dispatcher::DispatchCoordinator;
use filter_engine::{FilterEngine, RowIndexer};
use ingestion::{FormatParser, PreviewScan};
use tracing::{info, instrument};

use super::PipelineStats;
use crate::error::CliError;

/// Rows selected from a stored dataset
#[derive(Debug, Clone)]
pub struct Selection {
    /// Rows in the stored dataset
    pub total_rows: usize,

    /// Matching rows, same headers
    pub dataset: Dataset,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    blueprint: RowcastBlueprint,
    store: ArtifactStore,
    engine: FilterEngine,
    serializer: OutputSerializer,
    reports: ReportStore,
}

impl Pipeline {
    /// Create a pipeline from a loaded configuration
    pub fn new(blueprint: RowcastBlueprint) -> Self {
        let parser = FormatParser::from_config(&blueprint.limits);
        Self {
            store: ArtifactStore::new(blueprint.storage.temp_dir(), parser),
            engine: FilterEngine::from_config(&blueprint.filters),
            serializer: OutputSerializer::from_config(&blueprint.storage),
            reports: ReportStore::from_config(&blueprint.storage),
            blueprint,
        }
    }

    /// Load configuration from `path` and build the pipeline
    pub fn from_config_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::config_not_found(path.display().to_string()).into());
        }
        let blueprint = config_loader::ConfigLoader::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        Ok(Self::new(blueprint))
    }

    pub fn blueprint(&self) -> &RowcastBlueprint {
        &self.blueprint
    }

    /// Store `path` and summarize it
    #[instrument(name = "pipeline_upload", skip(self), fields(path = %path.display(), kind = %kind))]
    pub async fn upload(&self, path: &Path, kind: SourceKind) -> Result<UploadSummary> {
        let file_size = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("Cannot read {}", path.display()))?
            .len();

        let store = self.store.clone();
        let source = path.to_path_buf();
        let (dataset_id, dataset) = tokio::task::spawn_blocking(move || store.ingest(&source, kind))
            .await
            .context("Ingestion task failed")?
            .with_context(|| format!("Failed to ingest {}", path.display()))?;

        let options = RowIndexer::extract_filter_options(&dataset, &self.blueprint.columns);
        let rows = dataset.preview(self.blueprint.limits.preview_rows).to_vec();
        observability::record_upload(&kind.to_string(), dataset.total_rows(), file_size);

        info!(
            dataset_id = %dataset_id,
            rows = dataset.total_rows(),
            columns = dataset.column_count(),
            "Dataset ingested"
        );

        Ok(UploadSummary {
            dataset_id,
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file_size,
            source_kind: kind,
            preview_rows: rows.len(),
            column_count: dataset.column_count(),
            headers: dataset.headers.clone(),
            rows,
            total_rows: dataset.total_rows(),
            unique_neighborhoods: options.neighborhoods,
            unique_statuses: options.statuses,
        })
    }

    /// Parse a stored dataset
    pub async fn dataset(&self, id: DatasetId) -> Result<Dataset> {
        let store = self.store.clone();
        let dataset = tokio::task::spawn_blocking(move || store.load(id))
            .await
            .context("Ingestion task failed")??;
        Ok(dataset)
    }

    /// Leading rows of a stored dataset without loading all of it
    pub async fn preview(&self, id: DatasetId, limit: usize) -> Result<PreviewScan> {
        let store = self.store.clone();
        let scan = tokio::task::spawn_blocking(move || store.preview(id, limit))
            .await
            .context("Ingestion task failed")??;
        Ok(scan)
    }

    /// Rows of a stored dataset matching `criteria`
    #[instrument(name = "pipeline_select", skip(self, criteria), fields(dataset_id = %id))]
    pub async fn select(&self, id: DatasetId, criteria: &FilterCriteria) -> Result<Selection> {
        let dataset = self.dataset(id).await?;
        let filtered = self
            .engine
            .filter(&dataset, &self.blueprint.columns, criteria)
            .context("Failed to apply filters")?;

        observability::record_filter_selectivity(dataset.total_rows(), filtered.total_rows());
        Ok(Selection {
            total_rows: dataset.total_rows(),
            dataset: filtered,
        })
    }

    /// Write the selection (and optionally the message) to the output directory
    pub fn export(&self, selection: &Dataset, message: Option<&str>) -> Result<PathBuf> {
        let path = self
            .serializer
            .serialize(&selection.headers, &selection.rows)
            .context("Failed to write output workbook")?;
        if let Some(message) = message {
            self.serializer
                .write_message(message)
                .context("Failed to write message file")?;
        }
        Ok(path)
    }

    /// Send `message` to every row of `selection` and persist the report
    #[instrument(name = "pipeline_send", skip_all, fields(rows = selection.total_rows()))]
    pub async fn send<T: MessageTransport>(
        &self,
        coordinator: &mut DispatchCoordinator<T>,
        selection: &Dataset,
        message: &str,
        stats: &mut PipelineStats,
    ) -> Result<DispatchReport> {
        let started = Instant::now();
        let report = coordinator
            .dispatch(selection, &self.blueprint.columns, message)
            .await?;
        stats.duration = started.elapsed();

        self.reports
            .save(&report)
            .context("Failed to save dispatch report")?;
        observability::record_dispatch_report(&report);
        stats.dispatch_metrics.update(&report);
        Ok(report)
    }

    /// Report of the most recent send
    pub fn latest_report(&self) -> Result<Option<DispatchReport>> {
        Ok(self.reports.latest()?)
    }

    /// Delete a stored dataset
    pub fn remove(&self, id: DatasetId) -> Result<()> {
        self.store.remove(id)?;
        info!(dataset_id = %id, "Dataset removed");
        Ok(())
    }
}
