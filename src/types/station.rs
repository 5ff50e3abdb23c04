//! Defines [`StationRecord`], the per-station container of merged daily observations.

use crate::types::observation::ObservationEntry;
use crate::types::reading::MISSING_SENTINEL;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All observations known for a single AEMET station.
///
/// The identity fields (`station_code`, `province`, `town`) are set when the
/// record is created and are not modified by later merges.
///
/// Serialized with the field names used by the checkpoint and output files:
///
/// ```json
/// { "town_code": "1234", "province": "MADRID", "town": "RETIRO", "date": { "2025-01-01": { ... } } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    /// The AEMET station identifier (`indicativo`).
    #[serde(rename = "town_code")]
    pub station_code: String,
    pub province: String,
    pub town: String,
    /// Observations keyed by calendar date.
    #[serde(rename = "date", default)]
    pub entries: BTreeMap<NaiveDate, ObservationEntry>,
}

impl StationRecord {
    pub fn new(
        station_code: impl Into<String>,
        province: impl Into<String>,
        town: impl Into<String>,
    ) -> Self {
        Self {
            station_code: station_code.into(),
            province: province.into(),
            town: town.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Creates an empty record whose identity fields are unknown.
    pub fn unidentified(station_code: impl Into<String>) -> Self {
        Self::new(station_code, MISSING_SENTINEL, MISSING_SENTINEL)
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.entries.contains_key(date)
    }

    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
