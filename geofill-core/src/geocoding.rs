use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::Coordinates;

/// Nominatim forward-search endpoint
pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

/// Settings for the geocoding HTTP client
#[derive(Debug, Clone)]
pub struct GeocodeConfig {
    /// Search endpoint URL
    pub endpoint: String,
    /// Appended to every query to bias results (empty = no qualifier)
    pub country: String,
    /// User-Agent header; Nominatim rejects anonymous clients
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            country: "Israel".to_string(),
            user_agent: format!("geofill/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Resolves a location name to coordinates
pub trait Geocoder {
    /// `Ok(None)` means the service answered but had no match
    fn lookup(&self, location: &str) -> Result<Option<Coordinates>>;
}

/// One entry of a Nominatim search response
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: Value,
    lon: Value,
}

/// Blocking Nominatim client, one round trip per lookup and no retries
pub struct NominatimClient {
    client: reqwest::blocking::Client,
    config: GeocodeConfig,
}

impl NominatimClient {
    pub fn new(config: GeocodeConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .context("Failed to build geocoding HTTP client")?;

        Ok(Self { client, config })
    }
}

impl Geocoder for NominatimClient {
    fn lookup(&self, location: &str) -> Result<Option<Coordinates>> {
        let query = qualify_query(location, &self.config.country);

        log::debug!("Geocoding '{}' via {}", query, self.config.endpoint);

        // reqwest percent-encodes the query pairs
        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("q", query.as_str()),
                ("format", "json"),
                ("limit", "1"),
                ("addressdetails", "1"),
            ])
            .send()
            .context("Failed to send geocoding request")?;

        if !response.status().is_success() {
            anyhow::bail!("Geocoding API returned status: {}", response.status());
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .context("Failed to parse geocoding response")?;

        first_coordinates(&places)
    }
}

fn qualify_query(location: &str, country: &str) -> String {
    if country.is_empty() {
        location.to_string()
    } else {
        format!("{}, {}", location, country)
    }
}

fn first_coordinates(places: &[NominatimPlace]) -> Result<Option<Coordinates>> {
    let Some(place) = places.first() else {
        return Ok(None);
    };

    Ok(Some(Coordinates {
        latitude: parse_degrees(&place.lat).context("Invalid latitude in geocoding response")?,
        longitude: parse_degrees(&place.lon).context("Invalid longitude in geocoding response")?,
    }))
}

/// Nominatim sends degrees as strings; accept plain numbers too
fn parse_degrees(value: &Value) -> Result<f64> {
    match value {
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .with_context(|| format!("not a number: '{}'", s)),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| anyhow::anyhow!("not representable as f64: {}", n)),
        other => anyhow::bail!("unexpected value: {}", other),
    }
}
