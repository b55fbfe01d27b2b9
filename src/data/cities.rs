//! Default city list
//!
//! Seeds the dashboard on first run, when nothing usable has been persisted,
//! and on an explicit reset.

use super::CityConfig;

/// Static seed data: (name, country, latitude, longitude, timezone)
const DEFAULT_CITIES: [(&str, &str, f64, f64, &str); 5] = [
    ("Zürich", "CH", 47.3769, 8.5417, "Europe/Zurich"),
    ("London", "GB", 51.5074, -0.1278, "Europe/London"),
    ("New York", "US", 40.7128, -74.006, "America/New_York"),
    ("Tokyo", "JP", 35.6762, 139.6503, "Asia/Tokyo"),
    ("Cape Town", "ZA", -33.9249, 18.4241, "Africa/Johannesburg"),
];

/// Get the default city list
///
/// # Example
///
/// ```
/// use weatherdash::data::cities::default_cities;
///
/// for city in default_cities() {
///     println!("{}: ({}, {})", city.name, city.latitude, city.longitude);
/// }
/// ```
pub fn default_cities() -> Vec<CityConfig> {
    DEFAULT_CITIES
        .iter()
        .map(|&(name, country, latitude, longitude, timezone)| {
            CityConfig::new(name, country, latitude, longitude, timezone)
        })
        .collect()
}
