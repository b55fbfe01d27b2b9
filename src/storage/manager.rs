//! Storage manager for persisting the city list to disk
//!
//! Provides a `CityStorage` that reads and writes a `{version, cities}`
//! envelope as JSON, swallowing and logging every failure.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::data::CityConfig;

/// File name of the persisted city list
pub const STORAGE_FILE: &str = "weather-dashboard-cities.json";

/// Current schema version of the persisted record
pub const STORAGE_VERSION: u32 = 1;

/// Internal failure reasons; never returned from the public API
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("stored record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored record has version {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },
}

/// Envelope written to disk
#[derive(Debug, Serialize, Deserialize)]
struct StoredCities<C> {
    version: u32,
    cities: C,
}

/// Reads and writes the persisted city list
///
/// The record lives in an XDG-compliant data directory
/// (`~/.local/share/weatherdash/` on Linux).
#[derive(Debug, Clone)]
pub struct CityStorage {
    /// Directory holding the storage file
    data_dir: PathBuf,
}

impl CityStorage {
    /// Creates a CityStorage using the platform data directory
    ///
    /// Returns `None` if no data directory can be determined (e.g., no home
    /// directory); callers then run without persistence.
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "weatherdash")?;
        Some(Self::with_dir(project_dirs.data_dir().to_path_buf()))
    }

    /// Creates a CityStorage rooted at a custom directory
    pub fn with_dir(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Directory holding the storage file
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Full path of the storage file
    pub fn path(&self) -> PathBuf {
        self.data_dir.join(STORAGE_FILE)
    }

    /// Loads the persisted cities
    ///
    /// Returns `None` when nothing is stored, or when the record cannot be
    /// read, is not valid JSON, or carries a different schema version.
    pub fn load(&self) -> Option<Vec<CityConfig>> {
        match self.try_load() {
            Ok(cities) => cities,
            Err(err) => {
                tracing::warn!(path = %self.path().display(), error = %err, "ignoring stored cities");
                None
            }
        }
    }

    fn try_load(&self) -> Result<Option<Vec<CityConfig>>, StorageError> {
        let content = match fs::read_to_string(self.path()) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let stored: StoredCities<Vec<CityConfig>> = serde_json::from_str(&content)?;
        if stored.version != STORAGE_VERSION {
            return Err(StorageError::VersionMismatch {
                found: stored.version,
                expected: STORAGE_VERSION,
            });
        }

        Ok(Some(stored.cities))
    }

    /// Persists the city list
    ///
    /// A failure is logged and otherwise ignored; the previous record stays
    /// intact because the new one is written to a temporary file first.
    pub fn save(&self, cities: &[CityConfig]) {
        match self.try_save(cities) {
            Ok(()) => tracing::debug!(count = cities.len(), "saved cities"),
            Err(err) => {
                tracing::warn!(path = %self.path().display(), error = %err, "failed to save cities")
            }
        }
    }

    fn try_save(&self, cities: &[CityConfig]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir)?;

        let record = StoredCities {
            version: STORAGE_VERSION,
            cities,
        };
        let json = serde_json::to_string_pretty(&record)?;

        let tmp = self.data_dir.join(format!("{}.tmp", STORAGE_FILE));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, self.path())?;
        Ok(())
    }

    /// Removes the persisted record, if any
    pub fn clear(&self) {
        match fs::remove_file(self.path()) {
            Ok(()) => tracing::debug!("cleared stored cities"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %self.path().display(), error = %err, "failed to clear cities")
            }
        }
    }
}
