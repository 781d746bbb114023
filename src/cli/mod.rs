//! CLI module for insightdb
//!
//! Provides command-line interface for:
//! - add: Register a dataset from a row file
//! - remove: Drop a dataset
//! - list: Show resident datasets
//! - query: One-shot query execution

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{add, list, query, remove, run, run_cli, run_command};
pub use config::{Config, DEFAULT_DATA_DIR};
pub use errors::{CliError, CliResult};
pub use io::{read_json_file, read_request, write_error, write_response};
