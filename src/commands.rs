//! Plain-text output and offline list edits for the one-shot subcommands

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::data::{default_cities, CityConfig, GeocodingResult, WeatherResult};
use crate::format::{format_humidity, format_local_time, format_temperature, format_wind_speed};
use crate::storage::CityStorage;
use crate::store::StoreSnapshot;

/// The saved city list, or the defaults when nothing usable is saved
pub fn saved_or_default(storage: Option<&CityStorage>) -> Vec<CityConfig> {
    match storage.and_then(CityStorage::load) {
        Some(cities) if !cities.is_empty() => cities,
        _ => default_cities(),
    }
}

/// Removes every saved city named `name` without fetching weather
///
/// Returns false if no city had that name; nothing is written then.
pub fn remove_saved(storage: &CityStorage, name: &str) -> bool {
    let mut cities = saved_or_default(Some(storage));
    let before = cities.len();
    cities.retain(|city| city.name != name);

    if cities.len() == before {
        return false;
    }
    storage.save(&cities);
    true
}

/// One line per city: name, country and coordinates
pub fn render_city_list(cities: &[CityConfig]) -> String {
    let mut out = String::new();
    for city in cities {
        let _ = writeln!(
            out,
            "{}, {} ({:.4}, {:.4}) {}",
            city.name, city.country, city.latitude, city.longitude, city.timezone
        );
    }
    out
}

/// Numbered candidates, matching the numbering `add --pick` expects
pub fn render_candidates(results: &[GeocodingResult]) -> String {
    let mut out = String::new();
    for (index, result) in results.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {} ({:.4}, {:.4})",
            index + 1,
            result.display_name(),
            result.latitude,
            result.longitude
        );
    }
    out
}

/// The dashboard as text: a theme header, then one line per city result
///
/// Each city's local time is taken at `now`.
pub fn render_report(snapshot: &StoreSnapshot, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let theme = crate::data::dominant_theme(
        snapshot.weather_data.iter().filter_map(WeatherResult::data),
    );
    let _ = writeln!(out, "Overall: {}", theme);

    for result in &snapshot.weather_data {
        match result {
            WeatherResult::Success(data) => {
                let _ = write!(
                    out,
                    "{}, {}: {} (feels like {}), {}, humidity {}, wind {}",
                    data.city,
                    data.country,
                    format_temperature(data.temperature),
                    format_temperature(data.feels_like),
                    data.weather_description,
                    format_humidity(data.humidity),
                    format_wind_speed(data.wind_speed),
                );
                let local = format_local_time(&data.timezone, now);
                if local.is_empty() {
                    out.push('\n');
                } else {
                    let _ = writeln!(out, ", local time {}", local);
                }
            }
            WeatherResult::Failure { city, error } => {
                let _ = writeln!(out, "{}: unavailable ({})", city, error);
            }
        }
    }
    out
}
