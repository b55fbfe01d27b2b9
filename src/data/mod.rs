//! Core data models for the weather dashboard
//!
//! This module contains the types shared by the gateways, the persistence
//! layer and the city store: the configured cities, the per-city weather
//! snapshots and the per-city fetch outcome.

pub mod cities;
pub mod conditions;
pub mod geocoding;
pub mod weather;

pub use cities::default_cities;
pub use conditions::{describe, dominant_theme, WeatherInfo, WeatherTheme};
pub use geocoding::{GeocodingClient, GeocodingResult, SearchError};
pub use weather::{WeatherClient, WeatherError, WeatherGateway};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Coordinate tolerance (degrees, roughly 1km) under which two cities are the same place
pub const SAME_CITY_TOLERANCE: f64 = 0.01;

/// A city the user wants weather for
///
/// This is the unit that gets persisted. Field names match the stored JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityConfig {
    /// Display name, also the key used for removal
    pub name: String,
    /// Country code (e.g. "GB")
    pub country: String,
    /// Latitude coordinate
    pub latitude: f64,
    /// Longitude coordinate
    pub longitude: f64,
    /// IANA time zone name
    pub timezone: String,
}

impl CityConfig {
    /// Creates a new city configuration
    pub fn new(
        name: impl Into<String>,
        country: impl Into<String>,
        latitude: f64,
        longitude: f64,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            latitude,
            longitude,
            timezone: timezone.into(),
        }
    }

    /// Returns true if `other` is within [`SAME_CITY_TOLERANCE`] on both axes.
    ///
    /// Names are ignored: "Zurich" and "Zürich" at the same coordinates are
    /// the same city, two "Springfield"s far apart are not.
    pub fn is_same_city(&self, other: &CityConfig) -> bool {
        (self.latitude - other.latitude).abs() < SAME_CITY_TOLERANCE
            && (self.longitude - other.longitude).abs() < SAME_CITY_TOLERANCE
    }
}

/// Current conditions for one city, already converted for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityWeatherData {
    /// Name of the city this snapshot belongs to
    pub city: String,
    /// Country code
    pub country: String,
    /// IANA time zone name
    pub timezone: String,
    /// Temperature in Celsius, rounded to a whole degree
    pub temperature: i32,
    /// Apparent temperature in Celsius, rounded to a whole degree
    pub feels_like: i32,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Wind speed in km/h, one decimal
    pub wind_speed: f64,
    /// WMO weather code as reported
    pub weather_code: i32,
    /// Human readable description of the weather code
    pub weather_description: String,
    /// Observation time in the city's local time
    pub timestamp: NaiveDateTime,
}

/// Outcome of fetching weather for one city
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherResult {
    /// Weather was fetched and parsed
    Success(CityWeatherData),
    /// The request for this city failed; other cities are unaffected
    Failure {
        /// Name of the city that failed
        city: String,
        /// Human readable reason
        error: String,
    },
}

impl WeatherResult {
    /// Name of the city this result belongs to
    pub fn city_name(&self) -> &str {
        match self {
            WeatherResult::Success(data) => &data.city,
            WeatherResult::Failure { city, .. } => city,
        }
    }

    /// Returns true for a successful fetch
    pub fn is_success(&self) -> bool {
        matches!(self, WeatherResult::Success(_))
    }

    /// Weather data, if the fetch succeeded
    pub fn data(&self) -> Option<&CityWeatherData> {
        match self {
            WeatherResult::Success(data) => Some(data),
            WeatherResult::Failure { .. } => None,
        }
    }
}
