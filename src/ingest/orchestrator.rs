//! Drives a full ingestion run: one station after another, merging new dates
//! into the checkpoint and writing the consolidated output at the end.

use crate::config::IngestConfig;
use crate::error::{ConfigError, IngestError};
use crate::http::transport::ReqwestTransport;
use crate::ingest::merge::merge_station;
use crate::progress::checkpoint::ProgressCheckpoint;
use crate::progress::store::ProgressStore;
use crate::stations::fetcher::StationDataFetcher;
use crate::stations::station_list::{StationEntry, StationList};
use crate::stations::{FetchOutcome, StationSource};
use crate::types::date_range::DateRange;
use crate::types::station::StationRecord;
use bon::Builder;
use chrono::Utc;
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;

/// Counters describing what a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Stations for which a fetch was attempted.
    pub attempted: usize,
    /// Stations that contributed at least one new date.
    pub updated: usize,
    /// Stations whose data endpoint returned nothing usable.
    pub no_data: usize,
    /// Stations skipped because of an error.
    pub failed: usize,
    /// Dates merged across all stations.
    pub new_dates: usize,
}

/// The consolidated data of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionResult {
    pub stations: BTreeMap<String, StationRecord>,
    pub summary: RunSummary,
}

/// Sequential, resumable ingestion over a station list.
///
/// # Examples
///
/// ```no_run
/// use aemet_ingest::{IngestConfig, IngestionOrchestrator, StationList};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = IngestConfig::from_env()?;
/// let stations = StationList::load(&config.station_table_path()).await?;
/// let orchestrator = IngestionOrchestrator::from_config(&config);
/// let result = orchestrator.run(&stations, &config.date_range).await?;
/// println!("{} stations ingested", result.stations.len());
/// # Ok(())
/// # }
/// ```
#[derive(Builder)]
pub struct IngestionOrchestrator<S> {
    source: S,
    store: ProgressStore,
    /// Save the checkpoint after every this many stations. `0` saves only at the end.
    #[builder(default = 5)]
    checkpoint_every: usize,
    #[builder(default = Duration::from_secs(3))]
    inter_station_delay: Duration,
}

impl IngestionOrchestrator<StationDataFetcher<ReqwestTransport>> {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self::builder()
            .source(StationDataFetcher::from_config(config))
            .store(ProgressStore::from_config(config))
            .checkpoint_every(config.checkpoint_every)
            .inter_station_delay(config.inter_station_delay)
            .build()
    }
}

impl<S: StationSource> IngestionOrchestrator<S> {
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    /// Fetches every station in `stations` for `range` and merges what is new.
    ///
    /// Station-level failures are logged and skipped. On success the output
    /// file holds the consolidated data and the checkpoint file is removed.
    ///
    /// # Errors
    ///
    /// * [`IngestError::Config`] when the station list is empty.
    /// * [`IngestError::NoData`] when no station data exists after the run,
    ///   including data resumed from a checkpoint. The output file is not touched.
    /// * [`IngestError::Persistence`] when the output cannot be written or the
    ///   checkpoint cannot be removed afterwards.
    pub async fn run(
        &self,
        stations: &StationList,
        range: &DateRange,
    ) -> Result<IngestionResult, IngestError> {
        if stations.is_empty() {
            return Err(ConfigError::EmptyStationList.into());
        }

        let mut checkpoint = self.store.load().await;
        let mut summary = RunSummary::default();
        let total = stations.len();
        info!("Ingesting {total} stations for {range}");

        for (i, station) in stations.iter().enumerate() {
            let position = i + 1;
            info!(
                "[{position}/{total}] station {} ({})",
                station.name, station.code
            );
            self.process_station(station, range, &mut checkpoint, &mut summary)
                .await;

            if self.checkpoint_due(position, total) {
                if let Err(e) = self.store.save(&checkpoint).await {
                    error!("Failed to save checkpoint after station {position}: {e}");
                }
            }
            if position < total && !self.inter_station_delay.is_zero() {
                sleep(self.inter_station_delay).await;
            }
        }

        info!(
            "Run finished: {} updated, {} without data, {} failed, {} new dates",
            summary.updated, summary.no_data, summary.failed, summary.new_dates
        );

        if checkpoint.stations_data.is_empty() {
            error!("No data was obtained for any of the {total} stations");
            return Err(IngestError::NoData { stations: total });
        }

        self.store.write_output(&checkpoint.stations_data).await?;
        self.store.clear().await?;

        Ok(IngestionResult {
            stations: checkpoint.stations_data,
            summary,
        })
    }

    async fn process_station(
        &self,
        station: &StationEntry,
        range: &DateRange,
        checkpoint: &mut ProgressCheckpoint,
        summary: &mut RunSummary,
    ) {
        summary.attempted += 1;
        let records = match self.source.fetch_station(&station.code, range).await {
            Ok(FetchOutcome::Records(records)) => records,
            Ok(FetchOutcome::NoData) => {
                warn!("No data for station {} ({})", station.name, station.code);
                summary.no_data += 1;
                return;
            }
            Err(e) => {
                warn!("Skipping station {} ({}): {e}", station.name, station.code);
                summary.failed += 1;
                return;
            }
        };

        let now = Utc::now();
        let mut merged = 0;
        for record in records {
            let code = record.station_code.clone();
            let count = merge_station(checkpoint, record, now);
            if count > 0 {
                info!("Merged {count} new dates for station {code}");
            }
            merged += count;
        }

        if merged == 0 {
            info!("Station {} has no new dates", station.code);
        } else {
            summary.updated += 1;
            summary.new_dates += merged;
        }
    }

    fn checkpoint_due(&self, position: usize, total: usize) -> bool {
        position == total || (self.checkpoint_every > 0 && position % self.checkpoint_every == 0)
    }
}
