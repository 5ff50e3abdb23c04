//! Maps AEMET's per-day records onto [`StationRecord`]s.

use crate::types::observation::{DailyValues, ObservationEntry};
use crate::types::reading::{Reading, MISSING_SENTINEL};
use crate::types::station::StationRecord;
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::HashMap;

const FIELD_STATION: &str = "indicativo";
const FIELD_PROVINCE: &str = "provincia";
const FIELD_TOWN: &str = "nombre";
const FIELD_DATE: &str = "fecha";

/// Groups a phase-2 payload by station and normalizes every daily record.
///
/// A payload may carry several stations; each one becomes its own record, in
/// order of first appearance. Records without `indicativo` belong to
/// `requested_station`. Entries that are not objects, or that lack a parsable
/// `fecha`, are skipped. When a date repeats for the same station, the first
/// record wins.
pub fn normalize_payload(
    requested_station: &str,
    records: &[Value],
    fetched_at: DateTime<Utc>,
) -> Vec<StationRecord> {
    let mut stations: Vec<StationRecord> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (i, raw) in records.iter().enumerate() {
        let Some(raw) = raw.as_object() else {
            warn!("Skipping record {i} for station {requested_station}: not a JSON object");
            continue;
        };
        let Some(date) = parse_date(raw) else {
            warn!(
                "Skipping record {i} for station {requested_station}: missing or invalid '{FIELD_DATE}'"
            );
            continue;
        };

        let code = raw
            .get(FIELD_STATION)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .unwrap_or(requested_station);
        let position = *positions.entry(code.to_string()).or_insert_with(|| {
            stations.push(StationRecord::new(
                code,
                text_field(raw, FIELD_PROVINCE),
                text_field(raw, FIELD_TOWN),
            ));
            stations.len() - 1
        });

        let station = &mut stations[position];
        if station.contains(&date) {
            debug!("Duplicate record for station {code} on {date}, keeping the first one");
            continue;
        }
        station
            .entries
            .insert(date, ObservationEntry::new(daily_values(raw), fetched_at));
    }

    stations
}

/// Maps AEMET field names onto the fixed daily schema.
pub fn daily_values(raw: &Map<String, Value>) -> DailyValues {
    let field = |name: &str| Reading::from_raw(raw.get(name));
    DailyValues {
        avg_t: field("tmed"),
        max_t: field("tmax"),
        min_t: field("tmin"),
        prec: field("prec"),
        avg_wind: field("velmedia"),
        max_wind: field("racha"),
        avg_hr: field("hrMedia"),
        max_hr: field("hrMax"),
        min_hr: field("hrMin"),
    }
}

fn parse_date(raw: &Map<String, Value>) -> Option<NaiveDate> {
    let fecha = raw.get(FIELD_DATE)?.as_str()?;
    NaiveDate::parse_from_str(fecha.trim(), "%Y-%m-%d").ok()
}

fn text_field(raw: &Map<String, Value>, name: &str) -> String {
    raw.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(MISSING_SENTINEL)
        .to_string()
}
