//! WMO weather code interpretation
//!
//! Maps the numeric codes reported by Open-Meteo to a description and a coarse
//! theme used for colouring the dashboard.

use serde::{Deserialize, Serialize};

use super::CityWeatherData;

/// Coarse visual category for a weather code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherTheme {
    Sunny,
    Cloudy,
    Rainy,
    Stormy,
    Snowy,
    Misty,
    Night,
}

impl WeatherTheme {
    /// Lowercase name, as used in config and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherTheme::Sunny => "sunny",
            WeatherTheme::Cloudy => "cloudy",
            WeatherTheme::Rainy => "rainy",
            WeatherTheme::Stormy => "stormy",
            WeatherTheme::Snowy => "snowy",
            WeatherTheme::Misty => "misty",
            WeatherTheme::Night => "night",
        }
    }
}

impl std::fmt::Display for WeatherTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description and theme for a weather code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherInfo {
    pub description: &'static str,
    pub theme: WeatherTheme,
}

/// Returned for codes outside the WMO table
pub const UNKNOWN_WEATHER: WeatherInfo = WeatherInfo {
    description: "Unknown",
    theme: WeatherTheme::Cloudy,
};

/// Look up a WMO weather code
///
/// Codes from WMO (World Meteorological Organization), as documented by Open-Meteo:
/// - 0-3: Clear to overcast
/// - 45, 48: Fog
/// - 51-57: Drizzle (56-57 freezing)
/// - 61-67: Rain (66-67 freezing)
/// - 71-77: Snow
/// - 80-82: Rain showers
/// - 85-86: Snow showers
/// - 95-99: Thunderstorm
///
/// Unrecognised codes are not an error; they describe as "Unknown".
pub fn describe(code: i32) -> WeatherInfo {
    use WeatherTheme::*;

    let (description, theme) = match code {
        0 => ("Clear sky", Sunny),
        1 => ("Mainly clear", Sunny),
        2 => ("Partly cloudy", Cloudy),
        3 => ("Overcast", Cloudy),
        45 => ("Fog", Misty),
        48 => ("Depositing rime fog", Misty),
        51 => ("Light drizzle", Rainy),
        53 => ("Moderate drizzle", Rainy),
        55 => ("Dense drizzle", Rainy),
        56 => ("Light freezing drizzle", Rainy),
        57 => ("Dense freezing drizzle", Rainy),
        61 => ("Slight rain", Rainy),
        63 => ("Moderate rain", Rainy),
        65 => ("Heavy rain", Rainy),
        66 => ("Light freezing rain", Rainy),
        67 => ("Heavy freezing rain", Rainy),
        71 => ("Slight snow fall", Snowy),
        73 => ("Moderate snow fall", Snowy),
        75 => ("Heavy snow fall", Snowy),
        77 => ("Snow grains", Snowy),
        80 => ("Slight rain showers", Rainy),
        81 => ("Moderate rain showers", Rainy),
        82 => ("Violent rain showers", Stormy),
        85 => ("Slight snow showers", Snowy),
        86 => ("Heavy snow showers", Snowy),
        95 => ("Thunderstorm", Stormy),
        96 => ("Thunderstorm with slight hail", Stormy),
        99 => ("Thunderstorm with heavy hail", Stormy),
        _ => return UNKNOWN_WEATHER,
    };

    WeatherInfo { description, theme }
}

/// Most frequent theme across the given snapshots
///
/// An empty slice is sunny. On a tie the theme that appeared first wins.
pub fn dominant_theme<'a, I>(weather: I) -> WeatherTheme
where
    I: IntoIterator<Item = &'a CityWeatherData>,
{
    // Counts in first-seen order so ties resolve deterministically
    let mut counts: Vec<(WeatherTheme, usize)> = Vec::new();

    for data in weather {
        let theme = describe(data.weather_code).theme;
        match counts.iter_mut().find(|(t, _)| *t == theme) {
            Some((_, count)) => *count += 1,
            None => counts.push((theme, 1)),
        }
    }

    let mut best: Option<(WeatherTheme, usize)> = None;
    for (theme, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((theme, count));
        }
    }

    best.map(|(theme, _)| theme).unwrap_or(WeatherTheme::Sunny)
}
