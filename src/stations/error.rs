use crate::http::error::FetchError;
use thiserror::Error;

/// Why a station could not be fetched. Always station-scoped: the
/// orchestrator logs it and moves on to the next station.
#[derive(Debug, Error)]
pub enum StationError {
    #[error(transparent)]
    Http(#[from] FetchError),

    /// The metadata endpoint answered, but not with the success sentinel.
    #[error("AEMET reported estado {estado} for station {station}: {description}")]
    Domain {
        station: String,
        estado: i64,
        description: String,
    },

    /// The metadata endpoint answered with an empty body or without a data pointer.
    #[error("No usable metadata for station {station}: {reason}")]
    MissingMetadata { station: String, reason: String },
}
