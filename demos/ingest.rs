//! Runs a full ingestion with configuration taken from the environment.
//!
//! ```sh
//! AEMET_API_KEY=... AEMET_START_DATE=2025-01-01 RUST_LOG=info cargo run --example ingest
//! ```
//!
//! The station table is read from `ema_codes.json` inside the data directory.
//! Interrupting the run leaves `progress.json` behind; starting it again resumes
//! from there.

use aemet_ingest::{IngestConfig, IngestError, IngestionOrchestrator, StationList};

#[tokio::main]
async fn main() -> Result<(), IngestError> {
    env_logger::init();

    let config = IngestConfig::from_env()?;
    let stations = StationList::load(&config.station_table_path()).await?;
    println!(
        "Ingesting {} stations for {} into {}",
        stations.len(),
        config.date_range,
        config.data_dir.display()
    );

    let orchestrator = IngestionOrchestrator::from_config(&config);
    let result = orchestrator.run(&stations, &config.date_range).await?;

    println!("{:#?}", result.summary);
    println!(
        "Data for {} stations written to {}",
        result.stations.len(),
        config.output_path().display()
    );
    Ok(())
}
