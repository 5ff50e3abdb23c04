use crate::config::IngestConfig;
use crate::progress::checkpoint::ProgressCheckpoint;
use crate::progress::error::ProgressError;
use crate::types::station::StationRecord;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::{fs, task};

/// Reads and writes the checkpoint and output files.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    checkpoint_path: PathBuf,
    output_path: PathBuf,
}

impl ProgressStore {
    pub fn new(checkpoint_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            checkpoint_path: checkpoint_path.into(),
            output_path: output_path.into(),
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.checkpoint_path(), config.output_path())
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Loads the checkpoint, falling back to an empty one when the file is
    /// missing or cannot be read. The result is always reconciled.
    pub async fn load(&self) -> ProgressCheckpoint {
        let bytes = match fs::read(&self.checkpoint_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(
                    "No checkpoint at {}, starting fresh",
                    self.checkpoint_path.display()
                );
                return ProgressCheckpoint::default();
            }
            Err(e) => {
                warn!(
                    "Failed to read checkpoint {}: {e}. Starting fresh.",
                    self.checkpoint_path.display()
                );
                return ProgressCheckpoint::default();
            }
        };

        let mut checkpoint: ProgressCheckpoint = match serde_json::from_slice(&bytes) {
            Ok(checkpoint) => checkpoint,
            Err(e) => {
                warn!(
                    "Checkpoint {} is not valid: {e}. Starting fresh.",
                    self.checkpoint_path.display()
                );
                return ProgressCheckpoint::default();
            }
        };

        let repairs = checkpoint.reconcile();
        info!(
            "Resuming from checkpoint {} with {} stations ({repairs} repairs)",
            self.checkpoint_path.display(),
            checkpoint.stations_data.len()
        );
        checkpoint
    }

    /// Atomically replaces the checkpoint file with `checkpoint`.
    pub async fn save(&self, checkpoint: &ProgressCheckpoint) -> Result<(), ProgressError> {
        let bytes = encode(&self.checkpoint_path, checkpoint, false)?;
        write_atomic(self.checkpoint_path.clone(), bytes).await?;
        debug!("Saved checkpoint to {}", self.checkpoint_path.display());
        Ok(())
    }

    /// Deletes the checkpoint file. A missing file is not an error.
    pub async fn clear(&self) -> Result<(), ProgressError> {
        match fs::remove_file(&self.checkpoint_path).await {
            Ok(()) => {
                debug!("Removed checkpoint {}", self.checkpoint_path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ProgressError::Remove(self.checkpoint_path.clone(), e)),
        }
    }

    /// Atomically writes the consolidated station data, pretty-printed.
    pub async fn write_output(
        &self,
        stations: &BTreeMap<String, StationRecord>,
    ) -> Result<(), ProgressError> {
        let bytes = encode(&self.output_path, stations, true)?;
        write_atomic(self.output_path.clone(), bytes).await?;
        info!(
            "Wrote data for {} stations to {}",
            stations.len(),
            self.output_path.display()
        );
        Ok(())
    }
}

fn encode<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<Vec<u8>, ProgressError> {
    let mut bytes = Vec::new();
    let result = if pretty {
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
        value.serialize(&mut serializer)
    } else {
        serde_json::to_writer(&mut bytes, value)
    };
    result.map_err(|e| ProgressError::Serialize(path.to_path_buf(), e))?;
    Ok(bytes)
}

/// Writes `bytes` to a temporary file next to `path` and renames it into place.
async fn write_atomic(path: PathBuf, bytes: Vec<u8>) -> Result<(), ProgressError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)
        .await
        .map_err(|e| ProgressError::DirCreation(dir.clone(), e))?;

    task::spawn_blocking(move || {
        let mut temp_file =
            NamedTempFile::new_in(&dir).map_err(|e| ProgressError::Write(path.clone(), e))?;
        temp_file
            .write_all(&bytes)
            .map_err(|e| ProgressError::Write(path.clone(), e))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| ProgressError::Write(path.clone(), e))?;
        temp_file
            .persist(&path)
            .map_err(|e| ProgressError::Persist(path.clone(), e))?;
        Ok(())
    })
    .await?
}
