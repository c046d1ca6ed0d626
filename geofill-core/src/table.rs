//! Reading and writing entries of the generated coordinate table.
//!
//! The table is a source file with one entry per line:
//! `  'Sderot': { latitude: 31.5251, longitude: 34.5962 },`
//! Only the location names are read back; the coordinates already in the
//! table are never compared or rewritten.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::Coordinates;

/// Collect the location names already present in the coordinate table.
///
/// A missing file yields an empty set. Files with a `.json` extension are read
/// as a structured record (an object keyed by name, or an array of names);
/// anything else is scanned line by line for table entries.
pub fn read_existing_locations(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        log::debug!("No existing table at {}", path.display());
        return Ok(HashSet::new());
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read existing table {}", path.display()))?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        names_from_json(&data).with_context(|| format!("Invalid location record {}", path.display()))
    } else {
        Ok(names_from_table(&data))
    }
}

fn names_from_table(data: &str) -> HashSet<String> {
    data.lines()
        .filter(|line| line.contains('{') && line.contains("latitude"))
        .filter_map(entry_name)
        .collect()
}

/// Quoted name starting at the first single quote, with escapes undone.
/// Lines without a closing quote are not entries.
fn entry_name(line: &str) -> Option<String> {
    let (_, rest) = line.split_once('\'')?;
    let mut name = String::new();
    let mut chars = rest.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => name.push(chars.next()?),
            '\'' => return Some(name),
            c => name.push(c),
        }
    }

    None
}

/// Escape a name for a single-quoted string literal
fn quote_name(location: &str) -> String {
    let mut quoted = String::with_capacity(location.len() + 2);
    quoted.push('\'');
    for c in location.chars() {
        if c == '\\' || c == '\'' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

fn names_from_json(data: &str) -> Result<HashSet<String>> {
    match serde_json::from_str::<Value>(data)? {
        Value::Object(map) => Ok(map.into_iter().map(|(name, _)| name).collect()),
        Value::Array(items) => Ok(items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()),
        _ => anyhow::bail!("expected an object keyed by location or an array of names"),
    }
}

/// Table entry for a resolved location, 4 decimal places
pub fn format_entry(location: &str, coords: &Coordinates) -> String {
    format!(
        "  {}: {{ latitude: {:.4}, longitude: {:.4} }},",
        quote_name(location),
        coords.latitude,
        coords.longitude
    )
}

/// Commented-out entry marking a location for manual follow-up
pub fn format_placeholder(location: &str, default: &Coordinates) -> String {
    format!(
        "  // FAILED: {}: {{ latitude: {}, longitude: {} }}, // DEFAULT - manual review needed",
        quote_name(location),
        default.latitude,
        default.longitude
    )
}
