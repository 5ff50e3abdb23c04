use aemet_ingest::normalize_payload;
use chrono::{Duration, NaiveDate, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

fn payload(stations: usize, days: i64) -> Vec<Value> {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    (0..stations)
        .flat_map(|station| {
            (0..days).map(move |day| {
                json!({
                    "fecha": (start + Duration::days(day)).format("%Y-%m-%d").to_string(),
                    "indicativo": format!("{:04}", 3000 + station),
                    "nombre": "MADRID, RETIRO",
                    "provincia": "MADRID",
                    "tmed": "12,4",
                    "prec": "Ip",
                    "tmin": "6,1",
                    "tmax": "18,7",
                    "velmedia": "2,2",
                    "racha": "9,4",
                    "hrMedia": "61",
                    "hrMax": "88",
                    "hrMin": "35"
                })
            })
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let single = payload(1, 1826);
    let grouped = payload(20, 365);
    let now = Utc::now();
    c.bench_function("normalize_single_station_5y", |b| {
        b.iter(|| normalize_payload(black_box("3000"), black_box(&single), now))
    });
    c.bench_function("normalize_grouped_20_stations", |b| {
        b.iter(|| normalize_payload(black_box("3000"), black_box(&grouped), now))
    });
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
