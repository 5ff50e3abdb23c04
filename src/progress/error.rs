use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Failed to create directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to serialize data for '{0}'")]
    Serialize(PathBuf, #[source] serde_json::Error),

    #[error("I/O error writing '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Failed to move temporary file into place at '{0}'")]
    Persist(PathBuf, #[source] tempfile::PersistError),

    #[error("Failed to delete '{0}'")]
    Remove(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
