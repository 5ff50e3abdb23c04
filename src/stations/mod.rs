pub mod error;
pub mod fetcher;
pub mod journal;
pub mod normalize;
pub mod station_list;

use crate::stations::error::StationError;
use crate::types::date_range::DateRange;
use crate::types::station::StationRecord;
use std::future::Future;

/// What a successful fetch for one station produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// One record per station found in the payload, never empty.
    Records(Vec<StationRecord>),
    /// The data endpoint answered, but with nothing usable.
    NoData,
}

/// Anything that can produce normalized records for a station and date range.
pub trait StationSource: Send + Sync {
    fn fetch_station(
        &self,
        station_code: &str,
        range: &DateRange,
    ) -> impl Future<Output = Result<FetchOutcome, StationError>> + Send;
}
