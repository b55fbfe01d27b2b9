//! Persistence for the user's city list
//!
//! This module stores the configured cities as a versioned JSON record in the
//! platform data directory. Weather is never written here; it is always
//! refetched. Every failure is absorbed at this boundary: a broken or
//! incompatible record reads as "nothing stored", a failed write is logged and
//! leaves the previous record in place.

mod manager;

pub use manager::{CityStorage, StorageError, STORAGE_FILE, STORAGE_VERSION};
