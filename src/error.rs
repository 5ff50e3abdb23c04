use crate::progress::error::ProgressError;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run before any station is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable '{0}' with the AEMET API key is not set")]
    MissingApiKey(&'static str),

    #[error("The AEMET API key contains characters that are not valid in an HTTP header")]
    InvalidApiKey,

    #[error("Start date {start} lies after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Failed to parse date '{value}' from '{variable}'")]
    InvalidDate {
        variable: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Failed to read station table '{0}'")]
    StationTableRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse station table '{0}'")]
    StationTableParse(PathBuf, #[source] serde_json::Error),

    #[error("Station table '{path}' has a non-string code for station '{station}'")]
    InvalidStationCode { path: PathBuf, station: String },

    #[error("The station list is empty")]
    EmptyStationList,

    #[error("Failed to determine a data directory")]
    DataDirResolution,
}

/// Run-level failure reported by [`crate::IngestionOrchestrator::run`].
///
/// Station-level problems never surface here; they are logged and the
/// station is skipped.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Persistence(#[from] ProgressError),

    #[error("No station produced any data across {stations} stations")]
    NoData { stations: usize },
}
