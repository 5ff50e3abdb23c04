mod config;
mod error;
mod http;
mod ingest;
mod progress;
mod stations;
mod types;

pub use config::*;
pub use error::{ConfigError, IngestError};

pub use http::client::{RateLimitAwareClient, RATE_LIMIT_ESTADO};
pub use http::error::{FetchError, TransportFailure};
pub use http::retry::RetryPolicy;
pub use http::transport::{RawResponse, ReqwestTransport, Transport};

pub use stations::error::StationError;
pub use stations::fetcher::{StationDataFetcher, SUCCESS_ESTADO};
pub use stations::journal::{ErrorJournal, JournalEntry};
pub use stations::normalize::{daily_values, normalize_payload};
pub use stations::station_list::{StationEntry, StationList};
pub use stations::{FetchOutcome, StationSource};

pub use progress::checkpoint::{ProcessedDateIndex, ProgressCheckpoint};
pub use progress::error::ProgressError;
pub use progress::store::ProgressStore;

pub use ingest::merge::merge_station;
pub use ingest::orchestrator::{IngestionOrchestrator, IngestionResult, RunSummary};

pub use types::date_range::DateRange;
pub use types::observation::{DailyValues, ObservationEntry};
pub use types::reading::{Reading, MISSING_SENTINEL};
pub use types::station::StationRecord;
