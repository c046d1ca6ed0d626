use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Dataset value meaning "no location recorded"
const MISSING_LOCATION: &str = "-";

/// Extracts unique, non-empty location names from one column of a CSV file.
/// The header row is skipped and rows too short to reach the column are ignored.
pub fn extract_unique_locations(csv_path: &Path, column_index: usize) -> Result<HashSet<String>> {
    let data = fs::read_to_string(csv_path)
        .with_context(|| format!("Failed to read CSV file {}", csv_path.display()))?;

    // Spreadsheet exports often start with a UTF-8 BOM
    let data = data.strip_prefix('\u{feff}').unwrap_or(&data);

    Ok(locations_from_reader(data.as_bytes(), column_index))
}

fn locations_from_reader<R: Read>(input: R, column_index: usize) -> HashSet<String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let mut locations = HashSet::new();

    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Skipping unreadable CSV row {}: {}", row + 2, e);
                continue;
            }
        };

        if let Some(location) = record.get(column_index).map(str::trim) {
            if !location.is_empty() && location != MISSING_LOCATION {
                locations.insert(location.to_string());
            }
        }
    }

    locations
}
