//! CLI module
//!
//! Command-line interface for querying a server.
//!
//! # Commands
//!
//! - `types` - List known resource types
//! - `get` - Query a listing or a single record
//! - `resolve` - Fetch every listed record in full
//! - `snapshot` - Dump records of several types to JSON
//! - `copy` - Copy a package or script to every distribution point

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
