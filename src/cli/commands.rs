//! CLI command implementations
//!
//! Every command loads configuration, opens the engine on the configured
//! data directory, performs one operation and writes one response.

use std::path::Path;

use serde_json::Value;

use crate::engine::InsightEngine;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::schema::DatasetKind;

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{read_json_file, read_request, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments, runs the command and writes its response. On failure
/// the error response is already written when this returns `Err`.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let result = run_cli(cli).and_then(write_response);
    if let Err(e) = &result {
        write_error(e.code(), &e.message())?;
    }
    result
}

/// Runs parsed arguments and returns the response payload
pub fn run_cli(cli: Cli) -> CliResult<Value> {
    let config = Config::load_or_default(cli.config.as_deref())?;
    Logger::set_min_severity(config.severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("data_dir", config.data_dir.as_str()),
            ("max_result_rows", config.max_result_rows.to_string().as_str()),
        ],
    );

    let engine = InsightEngine::with_config(config.engine_config())?;
    run_command(&engine, cli.command)
}

/// Run one command against an open engine
pub fn run_command(engine: &InsightEngine, cmd: Command) -> CliResult<Value> {
    match cmd {
        Command::Add { id, kind, rows } => add(engine, &id, kind, &rows),
        Command::Remove { id } => remove(engine, &id),
        Command::List => list(engine),
        Command::Query { file } => query(engine, file.as_deref()),
    }
}

/// Register a dataset from a file holding a JSON array of rows
pub fn add(engine: &InsightEngine, id: &str, kind: DatasetKind, rows: &Path) -> CliResult<Value> {
    let rows = match read_json_file(rows)? {
        Value::Array(rows) => rows,
        _ => {
            return Err(CliError::io_error(format!(
                "{} must hold a JSON array of rows",
                rows.display()
            )))
        }
    };
    let ids = engine.add_dataset(id, kind, rows)?;
    Ok(Value::from(ids))
}

pub fn remove(engine: &InsightEngine, id: &str) -> CliResult<Value> {
    Ok(Value::from(engine.remove_dataset(id)?))
}

pub fn list(engine: &InsightEngine) -> CliResult<Value> {
    Ok(serde_json::to_value(engine.list_datasets())?)
}

/// Execute one query read from `file`, or from stdin
pub fn query(engine: &InsightEngine, file: Option<&Path>) -> CliResult<Value> {
    let request = match file {
        Some(path) => read_json_file(path)?,
        None => read_request()?,
    };
    let rows = engine.perform_query(&request)?;
    Ok(Value::Array(rows.into_iter().map(Value::Object).collect()))
}
