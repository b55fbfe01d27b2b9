//! Display formatting for weather values

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// "21°"
pub fn format_temperature(temp: i32) -> String {
    format!("{}°", temp)
}

/// "12.3 km/h"
pub fn format_wind_speed(speed: f64) -> String {
    format!("{} km/h", speed)
}

/// "65%"
pub fn format_humidity(humidity: u8) -> String {
    format!("{}%", humidity)
}

/// Wall-clock time in an IANA `timezone` at `now`, e.g. "2:30 PM"
///
/// An unknown or empty zone gives an empty string.
pub fn format_local_time(timezone: &str, now: DateTime<Utc>) -> String {
    match timezone.parse::<Tz>() {
        Ok(tz) => now.with_timezone(&tz).format("%-I:%M %p").to_string(),
        Err(_) => String::new(),
    }
}
