//! ArtifactStore - handle-keyed temp artifacts
//!
//! Each upload is copied to `<temp_dir>/<dataset_id>.<ext>` and every later
//! operation names it by [`DatasetId`]. Artifacts live until removed.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use contracts::{ContractError, Dataset, DatasetId, SourceKind};
use ingestion::{FormatParser, PreviewScan};
use tracing::{debug, error, info, instrument, warn};

/// Temp-artifact store
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    temp_dir: PathBuf,
    parser: FormatParser,
}

impl ArtifactStore {
    pub fn new(temp_dir: impl Into<PathBuf>, parser: FormatParser) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            parser,
        }
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn parser(&self) -> &FormatParser {
        &self.parser
    }

    /// Copy an upload into the store and parse it
    ///
    /// The copy is removed again when parsing fails.
    #[instrument(name = "artifact_ingest", skip(self), fields(path = %source.display(), kind = %kind))]
    pub fn ingest(&self, source: &Path, kind: SourceKind) -> Result<(DatasetId, Dataset), ContractError> {
        self.parser.check_file_size(source, kind)?;

        let id = DatasetId::generate();
        let target = self.artifact_path(id, extension_for(source, kind));
        fs::create_dir_all(&self.temp_dir)?;
        fs::copy(source, &target)?;

        self.parse_or_discard(id, &target, kind)
    }

    /// Store an in-memory upload body and parse it
    #[instrument(name = "artifact_ingest_bytes", skip(self, bytes), fields(kind = %kind))]
    pub fn ingest_bytes(
        &self,
        bytes: Bytes,
        file_name: &str,
        kind: SourceKind,
    ) -> Result<(DatasetId, Dataset), ContractError> {
        self.parser.check_len(bytes.len() as u64, kind)?;

        let id = DatasetId::generate();
        let target = self.artifact_path(id, extension_for(Path::new(file_name), kind));
        fs::create_dir_all(&self.temp_dir)?;
        fs::write(&target, &bytes)?;

        match self.parser.parse_bytes(bytes, kind) {
            Ok(dataset) => {
                info!(dataset_id = %id, rows = dataset.total_rows(), "Dataset stored");
                Ok((id, dataset))
            }
            Err(e) => {
                discard(&target);
                Err(e)
            }
        }
    }

    /// Path of a stored artifact
    ///
    /// # Errors
    /// `ContractError::NotFound` when no artifact exists for `id`.
    pub fn locate(&self, id: DatasetId) -> Result<PathBuf, ContractError> {
        let stem = id.to_string();
        let entries = match fs::read_dir(&self.temp_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ContractError::not_found(id));
            }
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let path = entry?.path();
            let matches_stem = path.file_stem().and_then(|s| s.to_str()) == Some(stem.as_str());
            if matches_stem && SourceKind::from_path(&path).is_ok() {
                return Ok(path);
            }
        }
        Err(ContractError::not_found(id))
    }

    /// Parse a stored artifact again
    #[instrument(name = "artifact_load", skip(self), fields(dataset_id = %id))]
    pub fn load(&self, id: DatasetId) -> Result<Dataset, ContractError> {
        let path = self.locate(id)?;
        let kind = SourceKind::from_path(&path)?;
        self.parser.parse_path(&path, kind).map_err(|e| {
            if let ContractError::Io(io_err) = &e {
                if io_err.kind() == io::ErrorKind::NotFound {
                    return ContractError::not_found(id);
                }
                error!(dataset_id = %id, error = %io_err, "Failed to read stored artifact");
            }
            e
        })
    }

    /// Leading rows of a stored artifact plus its row count
    ///
    /// Streams the file and keeps at most `limit` rows in memory.
    #[instrument(name = "artifact_preview", skip(self), fields(dataset_id = %id))]
    pub fn preview(&self, id: DatasetId, limit: usize) -> Result<PreviewScan, ContractError> {
        let path = self.locate(id)?;
        let kind = SourceKind::from_path(&path)?;
        self.parser.check_file_size(&path, kind)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ContractError::not_found(id)),
            Err(e) => return Err(e.into()),
        };
        self.parser.scan_preview(BufReader::new(file), kind, limit)
    }

    /// Delete a stored artifact
    #[instrument(name = "artifact_remove", skip(self), fields(dataset_id = %id))]
    pub fn remove(&self, id: DatasetId) -> Result<(), ContractError> {
        let path = self.locate(id)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Artifact removed");
                Ok(())
            }
            // lost a race with another remover
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ContractError::not_found(id)),
            Err(e) => Err(e.into()),
        }
    }

    fn artifact_path(&self, id: DatasetId, ext: &str) -> PathBuf {
        self.temp_dir.join(format!("{id}.{ext}"))
    }

    fn parse_or_discard(
        &self,
        id: DatasetId,
        target: &Path,
        kind: SourceKind,
    ) -> Result<(DatasetId, Dataset), ContractError> {
        match self.parser.parse_path(target, kind) {
            Ok(dataset) => {
                info!(dataset_id = %id, rows = dataset.total_rows(), "Dataset stored");
                Ok((id, dataset))
            }
            Err(e) => {
                discard(target);
                Err(e)
            }
        }
    }
}

/// Keep the source extension when it matches the kind, else the kind's default
fn extension_for(source: &Path, kind: SourceKind) -> &'static str {
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    kind.extensions()
        .iter()
        .copied()
        .find(|known| ext.as_deref() == Some(*known))
        .unwrap_or_else(|| kind.default_extension())
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "Failed to remove rejected upload");
    }
}
