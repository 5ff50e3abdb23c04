use crate::types::reading::Reading;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed set of daily fields kept for every station and date.
///
/// Every field is always present; values the provider did not report are
/// [`Reading::Missing`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyValues {
    pub avg_t: Reading,    // tmed (°C)
    pub max_t: Reading,    // tmax (°C)
    pub min_t: Reading,    // tmin (°C)
    pub prec: Reading,     // prec (mm)
    pub avg_wind: Reading, // velmedia (m/s)
    pub max_wind: Reading, // racha (m/s)
    pub avg_hr: Reading,   // hrMedia (%)
    pub max_hr: Reading,   // hrMax (%)
    pub min_hr: Reading,   // hrMin (%)
}

/// A merged daily observation together with its bookkeeping timestamps.
///
/// Stored as `{ "values": { "avg_t": ..., ... }, "ts_insert": ..., "ts_update": ... }`.
/// An entry without a `values` object does not deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationEntry {
    pub values: DailyValues,
    /// When this date was first merged for the station. Never changes afterwards.
    pub ts_insert: DateTime<Utc>,
    /// When this date was last touched by a merge.
    pub ts_update: DateTime<Utc>,
}

impl ObservationEntry {
    pub fn new(values: DailyValues, now: DateTime<Utc>) -> Self {
        Self {
            values,
            ts_insert: now,
            ts_update: now,
        }
    }

    /// Refreshes `ts_update`, leaving `ts_insert` and the values untouched.
    /// A clock running backwards never moves `ts_update` into the past.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.ts_update = self.ts_update.max(now);
    }
}
