//! Open-Meteo geocoding API client
//!
//! Turns free-text city queries into candidate locations. This sits outside
//! the city store: callers decide when to search and what to do on failure.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use super::CityConfig;

/// Base URL for the Open-Meteo geocoding API
pub const GEOCODING_BASE_URL: &str = "https://geocoding-api.open-meteo.com";

/// Maximum number of candidates returned by a search
pub const MAX_RESULTS: usize = 8;

/// Queries shorter than this (after trimming) return no candidates
pub const MIN_QUERY_LEN: usize = 2;

/// Errors that can occur when searching for cities
#[derive(Debug, Error)]
pub enum SearchError {
    /// HTTP request failed
    #[error("Geocoding request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Geocoding request failed with status {0}")]
    Status(u16),

    /// Failed to parse JSON response
    #[error("Failed to parse geocoding response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// A candidate location returned by the geocoding API
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodingResult {
    pub id: u64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub timezone: String,
    /// First-level administrative area (state, canton, ...)
    pub admin1: Option<String>,
    /// Second-level administrative area
    pub admin2: Option<String>,
    pub population: Option<u64>,
}

impl GeocodingResult {
    /// Convert the candidate into a city the store can hold
    ///
    /// The country code (not the full country name) is kept as `country`.
    pub fn to_city(&self) -> CityConfig {
        CityConfig::new(
            self.name.clone(),
            self.country_code.clone(),
            self.latitude,
            self.longitude,
            self.timezone.clone(),
        )
    }

    /// "Name, Region, CC" label for pick lists
    pub fn display_name(&self) -> String {
        let mut parts = vec![self.name.as_str()];
        if let Some(admin1) = self.admin1.as_deref() {
            parts.push(admin1);
        }
        parts.push(&self.country_code);
        parts.join(", ")
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Option<Vec<GeocodingResult>>,
}

/// Client for the Open-Meteo geocoding API
#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: String,
}

impl Default for GeocodingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GeocodingClient {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: GEOCODING_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Search for cities matching `query`
    ///
    /// Returns an empty list without touching the network when the trimmed
    /// query is shorter than [`MIN_QUERY_LEN`] characters. No retries are
    /// attempted; failures are returned to the caller.
    pub async fn search(&self, query: &str) -> Result<Vec<GeocodingResult>, SearchError> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/search", self.base_url);
        tracing::debug!(%query, %url, "searching cities");

        let count = MAX_RESULTS.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[("name", query), ("count", count.as_str()), ("format", "json")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        let body: GeocodingResponse = serde_json::from_str(&text)?;

        let mut results = body.results.unwrap_or_default();
        results.truncate(MAX_RESULTS);
        Ok(results)
    }
}
