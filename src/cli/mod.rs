//! CLI module
//!
//! Command-line interface for uploading row operations.
//!
//! # Commands
//!
//! - `upload` - Upload one destination from an NDJSON file or stdin
//! - `run` - Upload every destination in a run config
//! - `inspect` - Print stored rows

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::{
    run_destinations, upload_operations, DestinationFailure, DestinationReport, RunReport, Runner,
};
