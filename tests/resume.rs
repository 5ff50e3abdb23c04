use aemet_ingest::{
    DailyValues, DateRange, FetchOutcome, IngestionOrchestrator, ObservationEntry,
    ProgressCheckpoint, ProgressStore, Reading, StationError, StationList, StationRecord,
    StationSource,
};
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use std::future;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Serves fixed days per station. Stations listed in `hang` never answer,
/// which stands in for a process killed mid-run.
struct DaysSource {
    days: BTreeMap<&'static str, Vec<u32>>,
    hang: Vec<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl DaysSource {
    fn new(days: &[(&'static str, Vec<u32>)], hang: &[&'static str]) -> Self {
        Self {
            days: days.iter().map(|(code, d)| (*code, d.clone())).collect(),
            hang: hang.to_vec(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl StationSource for DaysSource {
    async fn fetch_station(
        &self,
        station_code: &str,
        _range: &DateRange,
    ) -> Result<FetchOutcome, StationError> {
        self.calls.lock().unwrap().push(station_code.to_string());
        if self.hang.iter().any(|code| *code == station_code) {
            future::pending::<()>().await;
        }
        let Some(days) = self.days.get(station_code) else {
            return Ok(FetchOutcome::NoData);
        };

        let mut record = StationRecord::new(station_code, "ZARAGOZA", "AEROPUERTO");
        for day in days {
            let values = DailyValues {
                avg_t: Reading::Value(f64::from(*day)),
                ..Default::default()
            };
            record.entries.insert(
                NaiveDate::from_ymd_opt(2025, 1, *day).unwrap(),
                ObservationEntry::new(values, Utc::now()),
            );
        }
        Ok(FetchOutcome::Records(vec![record]))
    }
}

fn store(dir: &Path) -> ProgressStore {
    ProgressStore::new(dir.join("progress.json"), dir.join("weather_data.json"))
}

fn orchestrator(source: DaysSource, dir: &Path) -> IngestionOrchestrator<DaysSource> {
    IngestionOrchestrator::builder()
        .source(source)
        .store(store(dir))
        .checkpoint_every(1)
        .inter_station_delay(Duration::ZERO)
        .build()
}

#[tokio::test(start_paused = true)]
async fn test_interrupted_run_resumes_from_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
    )
    .unwrap();
    let stations = StationList::from_pairs([("ZARAGOZA", "9434"), ("ALICANTE", "8025")]);

    let first = orchestrator(DaysSource::new(&[("9434", vec![1, 2])], &["8025"]), dir.path());
    // The clock is paused, so the timeout only fires once the run is parked on the hung station.
    let interrupted =
        tokio::time::timeout(Duration::from_secs(60), first.run(&stations, &range)).await;
    assert!(interrupted.is_err());

    let saved = store(dir.path()).load().await;
    assert_eq!(saved.stations_data["9434"].len(), 2);
    assert!(saved.processed_dates.dates_for("8025").is_none());
    let first_insert = saved.stations_data["9434"].entries
        [&NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()]
        .ts_insert;

    let second = orchestrator(
        DaysSource::new(&[("9434", vec![1, 2, 3]), ("8025", vec![1, 2, 3])], &[]),
        dir.path(),
    );
    let result = second.run(&stations, &range).await.unwrap();

    assert_eq!(*second.source().calls.lock().unwrap(), ["9434", "8025"]);
    assert_eq!(result.summary.new_dates, 4);
    assert_eq!(result.stations["9434"].len(), 3);
    assert_eq!(result.stations["8025"].len(), 3);
    assert_eq!(
        result.stations["9434"].entries[&NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()].ts_insert,
        first_insert
    );

    assert!(!dir.path().join("progress.json").exists());
    let written: BTreeMap<String, StationRecord> = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("weather_data.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(written, result.stations);
}

#[tokio::test]
async fn test_resumed_data_counts_when_no_station_answers() {
    let dir = tempfile::tempdir().unwrap();
    let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let range = DateRange::new(day, day).unwrap();
    let stations = StationList::from_pairs([("ZARAGOZA", "9434")]);

    let mut record = StationRecord::new("9434", "ZARAGOZA", "AEROPUERTO");
    record
        .entries
        .insert(day, ObservationEntry::new(DailyValues::default(), Utc::now()));
    let mut checkpoint = ProgressCheckpoint::default();
    checkpoint.processed_dates.record("9434", day);
    checkpoint.stations_data.insert("9434".to_string(), record);
    store(dir.path()).save(&checkpoint).await.unwrap();

    let result = orchestrator(DaysSource::new(&[], &[]), dir.path())
        .run(&stations, &range)
        .await
        .unwrap();

    assert_eq!(result.summary.no_data, 1);
    assert_eq!(result.summary.new_dates, 0);
    assert_eq!(result.stations, checkpoint.stations_data);
    assert!(!dir.path().join("progress.json").exists());
}
