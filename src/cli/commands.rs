//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line client for the JSS REST API
#[derive(Parser, Debug)]
#[command(name = "jss-client")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML); defaults to ~/.config/jss-client/config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List known resource types
    Types,

    /// Query a resource type: a listing, or one record when searching
    Get {
        /// Resource type, e.g. Computer
        kind: String,

        /// Id, name, wildcard pattern or key=value search
        search: Option<String>,

        /// Subsets to fetch, e.g. "general&hardware"
        #[arg(long)]
        subset: Option<String>,
    },

    /// Query a resource type and fetch every listed record in full
    Resolve {
        /// Resource type, e.g. Computer
        kind: String,

        /// Id, name, wildcard pattern or key=value search
        search: Option<String>,

        /// Subsets to fetch for each record
        #[arg(long)]
        subset: Option<String>,
    },

    /// Fetch every record of several types into a JSON file
    Snapshot {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Types to include (comma-separated, empty = all)
        #[arg(long)]
        kinds: Option<String>,
    },

    /// Copy a package or script to every distribution point
    Copy {
        /// File to copy
        file: PathBuf,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Tables for listings, serialized documents for records
    Table,
    /// JSON
    Json,
}
