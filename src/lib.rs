//! weatherdash library
//!
//! The city store and its gateways, persistence, config and the one-shot
//! command output. The terminal UI lives in the binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
pub mod format;
pub mod logging;
pub mod refresh;
pub mod search;
pub mod storage;
pub mod store;
