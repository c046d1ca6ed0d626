use anyhow::Result;
use geofill_core::{GeofillEngine, NominatimClient, ThreadSleepPacer};

mod cli;

fn main() -> Result<()> {
    let args = cli::parse_args();

    // Logs go to stderr; stdout carries only the table output
    if std::env::var("RUST_LOG").is_err() {
        if args.verbose {
            std::env::set_var("RUST_LOG", "debug");
        } else {
            std::env::set_var("RUST_LOG", "warn");
        }
    }
    env_logger::init();

    let engine = GeofillEngine::new(args.into_config());
    let config = engine.config();

    log::info!(
        "Reading {} against {}",
        config.csv_path.display(),
        config.existing_path.display()
    );

    let geocoder = NominatimClient::new(config.geocode.clone())?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = engine.process(&geocoder, &mut ThreadSleepPacer, &mut out)?;

    log::info!(
        "Geocoded {}/{} locations, {} need manual review",
        summary.succeeded,
        summary.attempted,
        summary.failed.len()
    );

    Ok(())
}
