//! CLI argument definitions using clap
//!
//! Commands:
//! - insightdb add --id <id> --kind <courses|rooms> --rows <file>
//! - insightdb remove --id <id>
//! - insightdb list
//! - insightdb query [--file <file>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::schema::DatasetKind;

/// insightdb - query engine over course and room datasets
#[derive(Parser, Debug)]
#[command(name = "insightdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a dataset from a JSON array of rows
    Add {
        /// Dataset id; no underscores
        #[arg(long)]
        id: String,

        /// Dataset kind
        #[arg(long)]
        kind: DatasetKind,

        /// File holding the rows
        #[arg(long)]
        rows: PathBuf,
    },

    /// Remove a dataset
    Remove {
        /// Dataset id
        #[arg(long)]
        id: String,
    },

    /// List resident datasets
    List,

    /// Execute a single query and exit
    Query {
        /// File holding the query; stdin when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
