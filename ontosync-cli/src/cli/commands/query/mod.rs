pub mod handler;

use clap::{Args, ValueEnum};
use std::path::PathBuf;

use super::common::ConnectionArgs;

pub use handler::handle_query_command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns
    Table,
    /// Pretty-printed JSON array of bindings
    Json,
    Csv,
}

#[derive(Args, Debug)]
pub struct QueryCommands {
    /// SPARQL query text
    pub query: Option<String>,

    /// Read the query from a file
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Write results to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}
