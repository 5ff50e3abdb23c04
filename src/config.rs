//! Run configuration, built once at process start and handed to every component.

use crate::error::ConfigError;
use crate::http::retry::RetryPolicy;
use crate::types::date_range::DateRange;
use bon::Builder;
use chrono::NaiveDate;
use reqwest::header::HeaderValue;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Root of the AEMET OpenData REST API.
pub const AEMET_BASE_URL: &str = "https://opendata.aemet.es/opendata/api";

pub const API_KEY_ENV: &str = "AEMET_API_KEY";
pub const DATA_DIR_ENV: &str = "AEMET_DATA_DIR";
pub const START_DATE_ENV: &str = "AEMET_START_DATE";
pub const END_DATE_ENV: &str = "AEMET_END_DATE";

/// First day requested when no start date is configured.
pub const DEFAULT_START_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2025, 1, 1) {
    Some(date) => date,
    None => panic!("invalid default start date"),
};

const DATA_DIR_NAME: &str = "aemet_ingest";
const CHECKPOINT_FILE_NAME: &str = "progress.json";
const OUTPUT_FILE_NAME: &str = "weather_data.json";
const JOURNAL_FILE_NAME: &str = "no_data_journal.jsonl";
const STATION_TABLE_FILE_NAME: &str = "ema_codes.json";

/// The AEMET OpenData API key, kept as a sensitive header value so it never
/// shows up in `Debug` output or logs.
#[derive(Clone)]
pub struct ApiKey(HeaderValue);

impl ApiKey {
    pub fn new(key: &str) -> Result<Self, ConfigError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::MissingApiKey(API_KEY_ENV));
        }
        let mut value = HeaderValue::from_str(key).map_err(|_| ConfigError::InvalidApiKey)?;
        value.set_sensitive(true);
        Ok(Self(value))
    }

    pub(crate) fn header_value(&self) -> &HeaderValue {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Everything a run needs to know.
///
/// # Examples
///
/// ```
/// use aemet_ingest::{ApiKey, DateRange, IngestConfig};
/// use chrono::NaiveDate;
/// use std::time::Duration;
///
/// let range = DateRange::new(
///     NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
/// )?;
/// let config = IngestConfig::builder()
///     .api_key(ApiKey::new("my-key")?)
///     .date_range(range)
///     .data_dir("/tmp/aemet")
///     .inter_station_delay(Duration::from_secs(5))
///     .build();
/// assert_eq!(config.checkpoint_every, 5);
/// # Ok::<(), aemet_ingest::ConfigError>(())
/// ```
#[derive(Debug, Clone, Builder)]
pub struct IngestConfig {
    pub api_key: ApiKey,
    pub date_range: DateRange,
    #[builder(into, default = AEMET_BASE_URL.to_string())]
    pub base_url: String,
    #[builder(default)]
    pub retry: RetryPolicy,
    /// Upper bound for a single HTTP request.
    #[builder(default = Duration::from_secs(15))]
    pub request_timeout: Duration,
    /// Pause between two stations, on top of the client's own pacing.
    #[builder(default = Duration::from_secs(3))]
    pub inter_station_delay: Duration,
    /// Save the checkpoint after every this many stations.
    #[builder(default = 5)]
    pub checkpoint_every: usize,
    /// Directory holding the checkpoint, output, journal and station table.
    #[builder(into, default = default_data_dir())]
    pub data_dir: PathBuf,
}

impl IngestConfig {
    /// Builds the configuration from environment variables.
    ///
    /// * `AEMET_API_KEY` (required)
    /// * `AEMET_END_DATE` (optional, `YYYY-MM-DD`, defaults to today in UTC)
    /// * `AEMET_START_DATE` (optional, defaults to 2025-01-01)
    /// * `AEMET_DATA_DIR` (optional, defaults to the platform data directory)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] when no API key is configured, before
    /// any request is made.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        let api_key = ApiKey::new(&api_key)?;

        let start = read_date_env(START_DATE_ENV)?.unwrap_or(DEFAULT_START_DATE);
        let end = read_date_env(END_DATE_ENV)?.unwrap_or_else(|| chrono::Utc::now().date_naive());
        let date_range = DateRange::new(start, end)?;

        let data_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .map(|dir| dir.join(DATA_DIR_NAME))
                .ok_or(ConfigError::DataDirResolution)?,
        };

        Ok(Self::builder()
            .api_key(api_key)
            .date_range(date_range)
            .data_dir(data_dir)
            .build())
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.data_dir.join(CHECKPOINT_FILE_NAME)
    }

    pub fn output_path(&self) -> PathBuf {
        self.data_dir.join(OUTPUT_FILE_NAME)
    }

    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join(JOURNAL_FILE_NAME)
    }

    pub fn station_table_path(&self) -> PathBuf {
        self.data_dir.join(STATION_TABLE_FILE_NAME)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(DATA_DIR_NAME))
}

fn read_date_env(variable: &'static str) -> Result<Option<NaiveDate>, ConfigError> {
    let Ok(value) = std::env::var(variable) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|source| ConfigError::InvalidDate {
            variable,
            value,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_api_key_is_rejected() {
        assert!(matches!(
            ApiKey::new("   "),
            Err(ConfigError::MissingApiKey(API_KEY_ENV))
        ));
        assert!(matches!(
            ApiKey::new("bad\nkey"),
            Err(ConfigError::InvalidApiKey)
        ));
    }

    #[test]
    fn test_api_key_is_not_printed() {
        let key = ApiKey::new("super-secret").unwrap();
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
        assert!(key.header_value().is_sensitive());
    }

    #[test]
    fn test_paths_live_in_data_dir() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        )
        .unwrap();
        let config = IngestConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .date_range(range)
            .data_dir("/srv/aemet")
            .build();
        assert_eq!(config.checkpoint_path(), PathBuf::from("/srv/aemet/progress.json"));
        assert_eq!(config.output_path(), PathBuf::from("/srv/aemet/weather_data.json"));
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.base_url, AEMET_BASE_URL);
    }
}
