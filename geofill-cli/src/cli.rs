use clap::Parser;
use geofill_core::GeofillConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Geocode new dataset locations into coordinate table entries
#[derive(Parser, Debug)]
#[command(name = "geofill")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Looks up coordinates for locations missing from a coordinate table and prints entries to paste into it",
    long_about = None
)]
pub struct Args {
    /// Limit number of locations to geocode (0 = no limit)
    #[arg(long = "limit", value_name = "N")]
    pub limit: Option<usize>,

    /// Process in batches (accepted for compatibility, currently informational)
    #[arg(long = "batch-size", value_name = "N", default_value_t = 100)]
    pub batch_size: usize,

    /// CSV dataset to read locations from
    #[arg(long = "csv", value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// Existing coordinate table (or .json location record) to skip known names
    #[arg(long = "existing", value_name = "FILE")]
    pub existing: Option<PathBuf>,

    /// Zero-based index of the location column
    #[arg(long = "column", value_name = "INDEX")]
    pub column: Option<usize>,

    /// Delay between requests in milliseconds
    #[arg(long = "delay-ms", value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Country appended to every query ("" to disable)
    #[arg(long = "country")]
    pub country: Option<String>,

    /// Geocoding search endpoint
    #[arg(long = "endpoint", value_name = "URL")]
    pub endpoint: Option<String>,

    /// User-Agent sent to the geocoding service
    #[arg(long = "user-agent")]
    pub user_agent: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long = "timeout-secs", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Table name shown in the output banner
    #[arg(long = "table-name")]
    pub table_name: Option<String>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    /// Build the run configuration, keeping defaults for anything not given
    pub fn into_config(self) -> GeofillConfig {
        let mut config = GeofillConfig {
            limit: self.limit,
            batch_size: self.batch_size,
            ..GeofillConfig::default()
        };

        if let Some(csv) = self.csv {
            config.csv_path = csv;
        }
        if let Some(existing) = self.existing {
            config.existing_path = existing;
        }
        if let Some(column) = self.column {
            config.column_index = column;
        }
        if let Some(ms) = self.delay_ms {
            config.delay = Duration::from_millis(ms);
        }
        if let Some(table_name) = self.table_name {
            config.table_name = table_name;
        }
        if let Some(country) = self.country {
            config.geocode.country = country;
        }
        if let Some(endpoint) = self.endpoint {
            config.geocode.endpoint = endpoint;
        }
        if let Some(user_agent) = self.user_agent {
            config.geocode.user_agent = user_agent;
        }
        if let Some(secs) = self.timeout_secs {
            config.geocode.timeout = Duration::from_secs(secs);
        }

        config
    }
}

/// Parses command-line arguments
pub fn parse_args() -> Args {
    Args::parse()
}
