//! Command-line interface parsing for weatherdash
//!
//! Without a subcommand the interactive dashboard starts. The subcommands
//! cover the same city-list operations for scripting.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

use crate::data::GeocodingResult;

/// Error types for CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    /// The search returned nothing
    #[error("No city found matching '{0}'")]
    NoMatch(String),

    /// `--pick` is past the end of the candidate list
    #[error("Cannot pick result {pick}: only {available} result(s) for '{query}'")]
    InvalidPick {
        pick: usize,
        available: usize,
        query: String,
    },

    /// `remove` named a city that isn't saved
    #[error("No saved city named '{0}'")]
    UnknownCity(String),
}

/// weatherdash - current weather for your cities
#[derive(Parser, Debug)]
#[command(name = "weatherdash")]
#[command(about = "Current weather for a list of cities you choose")]
#[command(version)]
pub struct Cli {
    /// Directory holding the saved city list (overrides the config file)
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Config file to read instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// One-shot commands; the dashboard runs when none is given
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch and print current weather for every saved city
    Show,

    /// Print the saved city list without fetching weather
    Cities,

    /// Look up cities by name
    Search {
        /// Name to search for, e.g. "New York"
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Add a city found by name and print the dashboard
    ///
    /// Examples:
    ///   weatherdash add Oslo
    ///   weatherdash add Springfield --pick 2
    Add {
        /// Name to search for
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Which search result to add (1-based, see `search`)
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        pick: u64,
    },

    /// Remove a saved city by name (no network access)
    Remove {
        /// Exact city name as shown by `cities`
        name: String,
    },

    /// Restore the default cities and print their weather
    Reset,
}

/// Join a multi-word query given as separate arguments
pub fn join_query(words: &[String]) -> String {
    words.join(" ")
}

/// Select the `pick`-th (1-based) candidate of a search
pub fn pick_candidate<'a>(
    results: &'a [GeocodingResult],
    pick: u64,
    query: &str,
) -> Result<&'a GeocodingResult, CliError> {
    if results.is_empty() {
        return Err(CliError::NoMatch(query.to_string()));
    }

    usize::try_from(pick)
        .ok()
        .and_then(|p| p.checked_sub(1))
        .and_then(|index| results.get(index))
        .ok_or_else(|| CliError::InvalidPick {
            pick: pick as usize,
            available: results.len(),
            query: query.to_string(),
        })
}
