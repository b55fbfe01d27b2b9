//! Logging setup
//!
//! The TUI owns the terminal, so in dashboard mode log lines go to a file in
//! the data directory. One-shot subcommands log to stderr. `RUST_LOG`
//! overrides the default level in both cases.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Log file name inside the data directory
pub const LOG_FILE: &str = "weatherdash.log";

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Log to stderr at `default_level` unless `RUST_LOG` says otherwise
pub fn init_stderr(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Append log lines to `<dir>/weatherdash.log`
pub fn init_file(dir: &Path, default_level: &str) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();

    tracing::info!("weatherdash started");
    Ok(())
}
