//! Provides [`StationDataFetcher`], which speaks AEMET OpenData's two-phase protocol.
//!
//! Phase 1 asks the climatological endpoint for a station and date range and
//! receives a small envelope (`estado`, `datos`, `descripcion`). Phase 2
//! follows the `datos` pointer to the actual array of daily records.

use crate::config::{ApiKey, IngestConfig};
use crate::http::client::RateLimitAwareClient;
use crate::http::transport::{ReqwestTransport, Transport};
use crate::stations::error::StationError;
use crate::stations::journal::{ErrorJournal, JournalEntry};
use crate::stations::normalize::normalize_payload;
use crate::stations::{FetchOutcome, StationSource};
use crate::types::date_range::DateRange;
use chrono::Utc;
use log::{debug, error, info, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CACHE_CONTROL};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// `estado` value of a successful metadata response.
pub const SUCCESS_ESTADO: i64 = 200;

const API_KEY_HEADER: &str = "api_key";

/// The phase-1 envelope.
#[derive(Debug, Deserialize)]
struct MetadataResponse {
    estado: i64,
    datos: Option<String>,
    descripcion: Option<String>,
}

pub struct StationDataFetcher<T> {
    client: RateLimitAwareClient<T>,
    base_url: String,
    api_key: ApiKey,
    request_timeout: Duration,
    journal: ErrorJournal,
}

impl StationDataFetcher<ReqwestTransport> {
    /// Creates a fetcher that talks to the network through `reqwest`.
    pub fn from_config(config: &IngestConfig) -> Self {
        let client = RateLimitAwareClient::new(ReqwestTransport::new(), config.retry.clone());
        Self::new(client, config)
    }
}

impl<T: Transport> StationDataFetcher<T> {
    pub fn new(client: RateLimitAwareClient<T>, config: &IngestConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            request_timeout: config.request_timeout,
            journal: ErrorJournal::new(config.journal_path()),
        }
    }

    pub fn client(&self) -> &RateLimitAwareClient<T> {
        &self.client
    }

    pub fn journal(&self) -> &ErrorJournal {
        &self.journal
    }

    /// Fetches and normalizes all daily records of `station_code` within `range`.
    ///
    /// # Errors
    ///
    /// * [`StationError::Http`] when either phase fails at the HTTP level.
    /// * [`StationError::Domain`] when AEMET answers phase 1 with a non-200 `estado`.
    /// * [`StationError::MissingMetadata`] when phase 1 has no usable `datos` pointer.
    ///
    /// An empty phase-2 payload is not an error: it is journaled and reported
    /// as [`FetchOutcome::NoData`].
    pub async fn fetch_station(
        &self,
        station_code: &str,
        range: &DateRange,
    ) -> Result<FetchOutcome, StationError> {
        info!("Requesting data for station {station_code} ({range})");
        let data_url = self.request_data_url(station_code, range).await?;
        debug!("Data URL for station {station_code}: {data_url}");

        let payload = self
            .client
            .fetch(&data_url, &HeaderMap::new(), self.request_timeout)
            .await?;

        let records = match &payload {
            Some(Value::Array(records)) if !records.is_empty() => records,
            _ => {
                warn!("No usable data received for station {station_code}");
                self.record_no_data(station_code, &data_url, payload).await;
                return Ok(FetchOutcome::NoData);
            }
        };

        let stations = normalize_payload(station_code, records, Utc::now());
        if stations.is_empty() {
            warn!("None of the {} records for station {station_code} were usable", records.len());
            self.record_no_data(station_code, &data_url, payload).await;
            return Ok(FetchOutcome::NoData);
        }
        Ok(FetchOutcome::Records(stations))
    }

    /// Phase 1: resolves the URL that holds the station's daily records.
    async fn request_data_url(
        &self,
        station_code: &str,
        range: &DateRange,
    ) -> Result<String, StationError> {
        let url = self.metadata_url(station_code, range);
        let body = self
            .client
            .fetch(&url, &self.metadata_headers(), self.request_timeout)
            .await?
            .ok_or_else(|| StationError::MissingMetadata {
                station: station_code.to_string(),
                reason: "empty response body".to_string(),
            })?;

        let metadata: MetadataResponse =
            serde_json::from_value(body).map_err(|e| StationError::MissingMetadata {
                station: station_code.to_string(),
                reason: format!("unexpected response shape: {e}"),
            })?;

        if metadata.estado != SUCCESS_ESTADO {
            let description = metadata
                .descripcion
                .unwrap_or_else(|| "unknown error".to_string());
            error!("AEMET error for station {station_code}: {description}");
            return Err(StationError::Domain {
                station: station_code.to_string(),
                estado: metadata.estado,
                description,
            });
        }

        metadata
            .datos
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| StationError::MissingMetadata {
                station: station_code.to_string(),
                reason: "response carries no 'datos' URL".to_string(),
            })
    }

    fn metadata_url(&self, station_code: &str, range: &DateRange) -> String {
        format!(
            "{}/valores/climatologicos/diarios/datos/fechaini/{}/fechafin/{}/estacion/{}",
            self.base_url,
            range.encoded_start(),
            range.encoded_end(),
            station_code
        )
    }

    fn metadata_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            self.api_key.header_value().clone(),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers
    }

    async fn record_no_data(&self, station_code: &str, url: &str, payload: Option<Value>) {
        let entry = JournalEntry {
            station_code: station_code.to_string(),
            url: url.to_string(),
            payload: payload.unwrap_or(Value::Null),
            logged_at: Utc::now(),
        };
        if let Err(e) = self.journal.append(&entry).await {
            error!(
                "Failed to write journal entry for station {station_code} to {}: {e}",
                self.journal.path().display()
            );
        }
    }
}

impl<T: Transport> StationSource for StationDataFetcher<T> {
    async fn fetch_station(
        &self,
        station_code: &str,
        range: &DateRange,
    ) -> Result<FetchOutcome, StationError> {
        StationDataFetcher::fetch_station(self, station_code, range).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::error::FetchError;
    use crate::http::retry::RetryPolicy;
    use crate::http::testing::ScriptedTransport;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    const BASE: &str = "https://opendata.example/api";
    const DATA_URL: &str = "https://opendata.example/sh/abc123";

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
        )
        .unwrap()
    }

    fn fetcher(transport: ScriptedTransport) -> (StationDataFetcher<ScriptedTransport>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = IngestConfig::builder()
            .api_key(ApiKey::new("test-key").unwrap())
            .date_range(range())
            .base_url(BASE)
            .data_dir(dir.path())
            .build();
        let client = RateLimitAwareClient::new(transport, RetryPolicy::default());
        (StationDataFetcher::new(client, &config), dir)
    }

    fn metadata_ok() -> String {
        format!(r#"{{"descripcion": "exito", "estado": 200, "datos": "{DATA_URL}"}}"#)
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_phase_fetch() {
        let payload = r#"[
            {"fecha": "2025-01-01", "indicativo": "3195", "nombre": "MADRID, RETIRO", "provincia": "MADRID", "tmed": "6,4"},
            {"fecha": "2025-01-02", "indicativo": "3195", "nombre": "MADRID, RETIRO", "provincia": "MADRID", "tmed": "7,1"}
        ]"#;
        let (fetcher, _dir) =
            fetcher(ScriptedTransport::new().reply(200, metadata_ok()).reply(200, payload));

        let outcome = fetcher.fetch_station("3195", &range()).await.unwrap();
        let FetchOutcome::Records(stations) = outcome else {
            panic!("expected records");
        };
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].len(), 2);

        let calls = fetcher.client().transport().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].url,
            "https://opendata.example/api/valores/climatologicos/diarios/datos/fechaini/2025-01-01T00%3A00%3A00UTC/fechafin/2025-01-03T00%3A00%3A00UTC/estacion/3195"
        );
        assert_eq!(calls[0].headers["api_key"], "test-key");
        assert_eq!(calls[0].headers["accept"], "application/json");
        assert_eq!(calls[0].headers["cache-control"], "no-cache");
        assert_eq!(calls[1].url, DATA_URL);
        assert!(calls[1].headers.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_metadata_then_success_proceeds() {
        let payload = r#"[{"fecha": "2025-01-01", "indicativo": "3195", "tmed": "6,4"}]"#;
        let (fetcher, _dir) = fetcher(
            ScriptedTransport::new()
                .reply(200, r#"{"estado": 429}"#)
                .reply(200, metadata_ok())
                .reply(200, payload),
        );

        let outcome = fetcher.fetch_station("3195", &range()).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Records(_)));

        let calls = fetcher.client().transport().calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].at - calls[0].at, Duration::from_secs(61));
        assert_eq!(calls[2].url, DATA_URL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_domain_error_skips_phase_two() {
        let (fetcher, _dir) = fetcher(ScriptedTransport::new().reply(
            200,
            r#"{"descripcion": "No hay datos que satisfagan esos criterios", "estado": 404}"#,
        ));

        let err = fetcher.fetch_station("3195", &range()).await.unwrap_err();
        match err {
            StationError::Domain {
                estado,
                description,
                ..
            } => {
                assert_eq!(estado, 404);
                assert!(description.starts_with("No hay datos"));
            }
            other => panic!("expected Domain error, got {other:?}"),
        }
        assert_eq!(fetcher.client().transport().calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_payload_is_journaled_no_data() {
        let (fetcher, _dir) =
            fetcher(ScriptedTransport::new().reply(200, metadata_ok()).reply(200, "[]"));

        let outcome = fetcher.fetch_station("3195", &range()).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::NoData));

        let entries = fetcher.journal().read_all().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].station_code, "3195");
        assert_eq!(entries[0].url, DATA_URL);
        assert_eq!(entries[0].payload, serde_json::json!([]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_list_payload_is_no_data() {
        let (fetcher, _dir) = fetcher(
            ScriptedTransport::new()
                .reply(200, metadata_ok())
                .reply(200, r#"{"unexpected": true}"#),
        );
        let outcome = fetcher.fetch_station("3195", &range()).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::NoData));
        assert_eq!(fetcher.journal().read_all().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_pointer_is_metadata_error() {
        let (fetcher, _dir) =
            fetcher(ScriptedTransport::new().reply(200, r#"{"estado": 200}"#));
        let err = fetcher.fetch_station("3195", &range()).await.unwrap_err();
        assert!(matches!(err, StationError::MissingMetadata { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_failure_propagates_as_station_error() {
        let (fetcher, _dir) = fetcher(ScriptedTransport::new().reply(401, "unauthorized"));
        let err = fetcher.fetch_station("3195", &range()).await.unwrap_err();
        assert!(matches!(
            err,
            StationError::Http(FetchError::Permanent { .. })
        ));
    }
}
