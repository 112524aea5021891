//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Batch row operations into a transactional table store
#[derive(Parser, Debug)]
#[command(name = "table-batcher")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Store connection (memory://, duckdb://path, or a .duckdb/.db file)
    /// Falls back to the config file, then TABLE_STORE_CONNECTION
    #[arg(long, global = true)]
    pub connection: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload row operations from an NDJSON file to one destination
    Upload {
        /// Destination table
        #[arg(short, long)]
        destination: String,

        /// NDJSON input file (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Upload every destination listed in a run config
    Run {
        /// Run configuration file (YAML)
        #[arg(short = 'C', long)]
        config: PathBuf,
    },

    /// Print the rows stored in a destination
    Inspect {
        /// Destination table
        #[arg(short, long)]
        destination: String,

        /// Maximum rows to print
        #[arg(long)]
        limit: Option<usize>,
    },
}
