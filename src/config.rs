//! Configuration file handling
//!
//! Settings live in `config.toml` in the platform config directory
//! (`~/.config/weatherdash/config.toml` on Linux). A missing file is not an
//! error; every field falls back to its default.

use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::data::geocoding::GEOCODING_BASE_URL;
use crate::data::weather::OPEN_METEO_BASE_URL;

/// Errors that can occur when reading the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration stored on disk
///
/// Example TOML:
/// ```toml
/// refresh_interval_secs = 600
/// search_debounce_ms = 250
/// data_dir = "/home/me/.weatherdash"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host of the forecast API
    pub weather_base_url: String,
    /// Host of the geocoding API
    pub geocoding_base_url: String,
    /// Whether the dashboard refreshes weather in the background
    pub auto_refresh: bool,
    /// Seconds between background refreshes
    pub refresh_interval_secs: u64,
    /// Quiet time after the last keystroke before a search is sent
    pub search_debounce_ms: u64,
    /// Where the city list (and the TUI log) is kept; platform default if unset
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weather_base_url: OPEN_METEO_BASE_URL.to_string(),
            geocoding_base_url: GEOCODING_BASE_URL.to_string(),
            auto_refresh: true,
            refresh_interval_secs: 300,
            search_debounce_ms: 300,
            data_dir: None,
        }
    }
}

impl Config {
    /// Load config from the default location, or defaults if it doesn't exist yet
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_file_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from an explicit path, or defaults if the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Path to the default config file, if a config directory exists
    pub fn config_file_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("", "", "weatherdash")?;
        Some(dirs.config_dir().join("config.toml"))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let cfg = Config::load_from(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(300));
        assert_eq!(cfg.search_debounce(), Duration::from_millis(300));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "refresh_interval_secs = 60\nauto_refresh = false\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();

        assert_eq!(cfg.refresh_interval_secs, 60);
        assert!(!cfg.auto_refresh);
        assert_eq!(cfg.weather_base_url, OPEN_METEO_BASE_URL);
        assert_eq!(cfg.search_debounce_ms, 300);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "refresh_interval_secs = \"soon\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_full_file_overrides_everything() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
weather_base_url = "http://localhost:8080"
geocoding_base_url = "http://localhost:8081"
auto_refresh = false
refresh_interval_secs = 120
search_debounce_ms = 150
data_dir = "/tmp/weatherdash"
"#,
        )
        .unwrap();

        let cfg = Config::load_from(&path).unwrap();

        assert_eq!(
            cfg,
            Config {
                weather_base_url: "http://localhost:8080".to_string(),
                geocoding_base_url: "http://localhost:8081".to_string(),
                auto_refresh: false,
                refresh_interval_secs: 120,
                search_debounce_ms: 150,
                data_dir: Some(PathBuf::from("/tmp/weatherdash")),
            }
        );
        assert_eq!(cfg.search_debounce(), Duration::from_millis(150));
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let cfg = Config {
            refresh_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(1));
    }
}
