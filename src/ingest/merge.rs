use crate::progress::checkpoint::ProgressCheckpoint;
use crate::types::observation::ObservationEntry;
use crate::types::station::StationRecord;
use chrono::{DateTime, Utc};
use log::debug;

/// Merges the dates of `incoming` that are not yet processed into `checkpoint`.
///
/// The stored record is created from `incoming` the first time the station
/// contributes data; its identity fields are never changed afterwards. Every
/// newly merged date is stamped with `now` and added to the processed index.
/// Returns the number of dates merged.
pub fn merge_station(
    checkpoint: &mut ProgressCheckpoint,
    incoming: StationRecord,
    now: DateTime<Utc>,
) -> usize {
    let StationRecord {
        station_code,
        province,
        town,
        entries,
    } = incoming;

    let fresh: Vec<_> = entries
        .into_iter()
        .filter(|(date, _)| !checkpoint.processed_dates.contains(&station_code, date))
        .collect();
    if fresh.is_empty() {
        debug!("Station {station_code}: nothing new");
        return 0;
    }

    let record = checkpoint
        .stations_data
        .entry(station_code.clone())
        .or_insert_with(|| StationRecord::new(station_code.as_str(), province, town));

    let merged = fresh.len();
    for (date, entry) in fresh {
        match record.entries.get_mut(&date) {
            Some(existing) => existing.touch(now),
            None => {
                record
                    .entries
                    .insert(date, ObservationEntry::new(entry.values, now));
            }
        }
        checkpoint.processed_dates.record(&station_code, date);
    }
    merged
}
