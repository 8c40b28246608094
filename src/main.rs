//! Contact ETL - main entry point.
//!
//! Runs the full Extract -> Transform -> Load pipeline once. Pass `--update`
//! to use the batch update variant instead of batch create.

use anyhow::Result;
use contact_etl::{
    Config, ContactPipeline, CrmClient, GeoResolver, LoadMode, NominatimGeocoder, SnapshotWriter,
};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // RUST_LOG wins; LOG_LEVEL is the documented knob for non-Rust operators
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        EnvFilter::new(level)
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let mode = if std::env::args().any(|arg| arg == "--update") {
        LoadMode::Update
    } else {
        LoadMode::Create
    };

    info!(
        "Starting contact ETL against {} (load mode: {:?})",
        config.crm_base_url, mode
    );

    let client = CrmClient::new(&config);
    let geocoder = NominatimGeocoder::new(
        config.geo_base_url.clone(),
        Duration::from_secs(config.request_timeout),
    );
    let geo = GeoResolver::new(
        geocoder,
        config.geo_retries,
        Duration::from_secs(config.geo_retry_delay_secs),
    );
    let snapshots = SnapshotWriter::new(&config.snapshot_dir);

    let pipeline = ContactPipeline::new(client, geo, snapshots);
    let report = pipeline.run(mode)?;

    info!(
        "Load finished: {} records, {}/{} batches succeeded",
        report.records, report.chunks_succeeded, report.chunks_attempted
    );

    if !report.is_complete() {
        for (chunk, reason) in &report.failures {
            error!("Batch {} failed: {}", chunk, reason);
        }
        anyhow::bail!("{} batch(es) failed", report.failures.len());
    }

    Ok(())
}
