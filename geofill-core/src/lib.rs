use anyhow::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

// Internal modules (private)
mod batch;
mod extractor;
mod geocoding;
mod table;

// Re-export public types
pub use batch::{plan_pending, BatchSummary, Pacer, ThreadSleepPacer};
pub use extractor::extract_unique_locations;
pub use geocoding::{GeocodeConfig, Geocoder, NominatimClient, DEFAULT_ENDPOINT};
pub use table::{format_entry, format_placeholder, read_existing_locations};

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Configuration options for a geocoding run
#[derive(Debug, Clone)]
pub struct GeofillConfig {
    /// CSV dataset holding the location column
    pub csv_path: PathBuf,
    /// Previously generated coordinate table (read-only)
    pub existing_path: PathBuf,
    /// Zero-based index of the location column in the CSV
    pub column_index: usize,
    /// Cap on how many new locations to look up (None or 0 = no cap)
    pub limit: Option<usize>,
    /// Accepted for compatibility with older invocations, not used to split work
    pub batch_size: usize,
    /// Pause between consecutive lookups (Nominatim allows 1 request per second)
    pub delay: Duration,
    /// Coordinates written into placeholder lines for failed lookups
    pub default_coordinates: Coordinates,
    /// Name of the table the printed entries belong to
    pub table_name: String,
    /// How many failed names the summary lists before collapsing the rest
    pub max_failures_listed: usize,
    /// Geocoding service settings
    pub geocode: GeocodeConfig,
}

impl Default for GeofillConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("data/victims.csv"),
            existing_path: PathBuf::from("lib/locationCoordinates.ts"),
            column_index: 4,
            limit: None,
            batch_size: 100,
            delay: Duration::from_millis(1100),
            default_coordinates: Coordinates::new(31.5, 34.8),
            table_name: "ISRAEL_LOCATION_COORDINATES".to_string(),
            max_failures_listed: 10,
            geocode: GeocodeConfig::default(),
        }
    }
}

/// Main engine: diffs the dataset against the table and geocodes what is new
pub struct GeofillEngine {
    config: GeofillConfig,
}

impl GeofillEngine {
    /// Create a new engine with the given configuration
    pub fn new(config: GeofillConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeofillConfig {
        &self.config
    }

    /// Read both inputs, report their sizes and return the sorted pending list
    pub fn collect_pending<W: Write>(&self, out: &mut W) -> Result<Vec<String>> {
        let existing = read_existing_locations(&self.config.existing_path)?;
        writeln!(
            out,
            "// Found {} existing locations in {}",
            existing.len(),
            display_name(&self.config.existing_path)
        )?;

        let all = extract_unique_locations(&self.config.csv_path, self.config.column_index)?;
        writeln!(out, "// Found {} total unique locations in CSV", all.len())?;

        let pending = plan_pending(&all, &existing, self.config.limit);
        log::debug!(
            "{} new locations after diff (limit: {:?})",
            pending.len(),
            self.config.limit
        );

        Ok(pending)
    }

    /// Run the whole pipeline: read, diff, geocode and print the summary
    pub fn process<G, P, W>(&self, geocoder: &G, pacer: &mut P, out: &mut W) -> Result<BatchSummary>
    where
        G: Geocoder + ?Sized,
        P: Pacer + ?Sized,
        W: Write,
    {
        log::debug!("Batch size set to {}", self.config.batch_size);

        let pending = self.collect_pending(out)?;
        writeln!(out, "// {} locations to geocode", pending.len())?;
        writeln!(out, "//")?;

        if pending.is_empty() {
            writeln!(out, "// All locations already geocoded!")?;
            out.flush()?;
            return Ok(BatchSummary::default());
        }

        writeln!(out, "// Add these entries to {}:", self.config.table_name)?;
        writeln!(out)?;

        let summary = batch::geocode_pending(&pending, geocoder, pacer, out, &self.config)?;
        summary.write_report(out, self.config.max_failures_listed)?;
        out.flush()?;

        Ok(summary)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
