//! Open-Meteo weather API client
//!
//! This module provides the weather fetch gateway used by the city store: a
//! per-city fetch that converts the API response into [`CityWeatherData`], and
//! a batch fetch that runs every city concurrently and captures each outcome
//! independently.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use super::conditions::describe;
use super::{CityConfig, CityWeatherData, WeatherResult};

/// Base URL for the Open-Meteo forecast API
pub const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com";

/// Current-condition fields requested for every city
const CURRENT_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,apparent_temperature,weather_code,wind_speed_10m";

/// Errors that can occur when fetching weather for one city
#[derive(Debug, Error)]
pub enum WeatherError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Failed to fetch weather for {city}: {reason}")]
    Status { city: String, reason: String },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Invalid time format in response
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),
}

/// Source of weather data for the city store
///
/// `fetch_many` has all-settled semantics: it never fails as a whole, returns
/// exactly one result per input city, and keeps the input order.
#[async_trait]
pub trait WeatherGateway: Send + Sync {
    /// Fetch current conditions for a single city
    async fn fetch_one(&self, city: &CityConfig) -> Result<CityWeatherData, WeatherError>;

    /// Fetch every city concurrently; result `i` belongs to `cities[i]`
    async fn fetch_many(&self, cities: &[CityConfig]) -> Vec<WeatherResult> {
        let outcomes = join_all(cities.iter().map(|city| self.fetch_one(city))).await;

        cities
            .iter()
            .zip(outcomes)
            .map(|(city, outcome)| settle(city, outcome))
            .collect()
    }
}

/// Wrap one city's outcome into its result slot
pub fn settle(
    city: &CityConfig,
    outcome: Result<CityWeatherData, WeatherError>,
) -> WeatherResult {
    match outcome {
        Ok(data) => WeatherResult::Success(data),
        Err(err) => {
            tracing::warn!(city = %city.name, error = %err, "weather fetch failed");
            WeatherResult::Failure {
                city: city.name.clone(),
                error: err.to_string(),
            }
        }
    }
}

/// Client for fetching weather data from Open-Meteo API
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherClient {
    /// Create a new WeatherClient pointing at the public Open-Meteo API
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: OPEN_METEO_BASE_URL.to_string(),
        }
    }

    /// Create a new WeatherClient with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: OPEN_METEO_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API host (mirrors, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn forecast_url(&self) -> String {
        format!("{}/v1/forecast", self.base_url)
    }
}

#[async_trait]
impl WeatherGateway for WeatherClient {
    /// Fetch current conditions for the given city
    ///
    /// # Returns
    /// * `Ok(CityWeatherData)` - Weather data for the city
    /// * `Err(WeatherError)` - If the request, status or parsing fails
    async fn fetch_one(&self, city: &CityConfig) -> Result<CityWeatherData, WeatherError> {
        let url = self.forecast_url();
        tracing::debug!(city = %city.name, %url, "fetching weather");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", city.latitude.to_string()),
                ("longitude", city.longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status {
                city: city.name.clone(),
                reason: status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| status.as_str().to_string()),
            });
        }

        let text = response.text().await?;
        let api_response: OpenMeteoResponse = serde_json::from_str(&text)?;

        transform_response(api_response, city)
    }
}

/// Convert the Open-Meteo response into a display snapshot for `city`
fn transform_response(
    response: OpenMeteoResponse,
    city: &CityConfig,
) -> Result<CityWeatherData, WeatherError> {
    let current = response.current;
    let info = describe(current.weather_code);

    Ok(CityWeatherData {
        city: city.name.clone(),
        country: city.country.clone(),
        timezone: city.timezone.clone(),
        temperature: round_half_up(current.temperature_2m),
        feels_like: round_half_up(current.apparent_temperature),
        humidity: current.relative_humidity_2m.round().clamp(0.0, 100.0) as u8,
        wind_speed: round_to_tenth(current.wind_speed_10m),
        weather_code: current.weather_code,
        weather_description: info.description.to_string(),
        timestamp: parse_datetime(&current.time)?,
    })
}

/// Round to the nearest whole number, halves going up (20.5 -> 21, -5.5 -> -5)
pub fn round_half_up(value: f64) -> i32 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor as i32 + 1
    } else {
        floor as i32
    }
}

/// Round to one decimal place (12.345 -> 12.3, 12.35 -> 12.4)
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Parse a datetime string in ISO 8601 format (e.g., "2024-07-15T05:30") to NaiveDateTime
fn parse_datetime(datetime_str: &str) -> Result<NaiveDateTime, WeatherError> {
    NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| WeatherError::InvalidTimeFormat(datetime_str.to_string()))
}

/// Open-Meteo API response structure
#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    current: CurrentWeather,
}

/// Current weather data from Open-Meteo
#[derive(Debug, Deserialize)]
struct CurrentWeather {
    time: String,
    temperature_2m: f64,
    relative_humidity_2m: f64,
    apparent_temperature: f64,
    weather_code: i32,
    wind_speed_10m: f64,
}
