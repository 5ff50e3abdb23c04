//! The resumable state of a run: which dates each station already has, and
//! the accumulated station data itself.

use crate::types::station::StationRecord;
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Dates already merged, per station code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessedDateIndex(BTreeMap<String, BTreeSet<NaiveDate>>);

impl ProcessedDateIndex {
    /// Dates known for `station_code`, or `None` if the station was never merged.
    pub fn dates_for(&self, station_code: &str) -> Option<&BTreeSet<NaiveDate>> {
        self.0.get(station_code)
    }

    pub fn contains(&self, station_code: &str, date: &NaiveDate) -> bool {
        self.dates_for(station_code)
            .is_some_and(|dates| dates.contains(date))
    }

    /// Marks `date` as processed. Returns `false` if it already was.
    pub fn record(&mut self, station_code: &str, date: NaiveDate) -> bool {
        self.0
            .entry(station_code.to_string())
            .or_default()
            .insert(date)
    }

    pub fn stations(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything written to the checkpoint file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressCheckpoint {
    #[serde(default)]
    pub processed_dates: ProcessedDateIndex,
    #[serde(default)]
    pub stations_data: BTreeMap<String, StationRecord>,
}

impl ProgressCheckpoint {
    pub fn is_empty(&self) -> bool {
        self.processed_dates.is_empty() && self.stations_data.is_empty()
    }

    /// Brings the date index back in line with the station data.
    ///
    /// Dates present in a record but absent from the index are added to the
    /// index. Indexed dates without an entry in the record are dropped, so the
    /// next fetch merges them again. Returns the number of repairs made.
    pub fn reconcile(&mut self) -> usize {
        let mut repairs = 0;

        for (code, record) in &self.stations_data {
            for date in record.dates() {
                if self.processed_dates.record(code, *date) {
                    warn!("Checkpoint: station {code} has data for {date} that was not indexed");
                    repairs += 1;
                }
            }
        }

        let stations_data = &self.stations_data;
        self.processed_dates.0.retain(|code, dates| {
            let record = stations_data.get(code);
            dates.retain(|date| {
                let present = record.is_some_and(|r| r.contains(date));
                if !present {
                    warn!("Checkpoint: station {code} lists {date} as processed without data, dropping it");
                    repairs += 1;
                }
                present
            });
            !dates.is_empty()
        });

        repairs
    }
}
