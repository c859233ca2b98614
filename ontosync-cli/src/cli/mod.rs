//! Command-line interface

pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::diff::DiffCommands;
use commands::query::QueryCommands;
use commands::sync::{ImportCommands, UpdateCommands};

#[derive(Parser)]
#[command(
    name = "ontosync",
    about = "Synchronize an RDF ontology into a Wikibase knowledge base",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import ontology files into a freshly deployed Wikibase
    Import(ImportCommands),

    /// Bring the knowledge base from one ontology version to another
    Update(UpdateCommands),

    /// Show the operations between two ontology versions without connecting
    Diff(DiffCommands),

    /// Run a SPARQL query against the knowledge base
    Query(QueryCommands),
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Import(args) => commands::sync::handle_import_command(args).await,
        Commands::Update(args) => commands::sync::handle_update_command(args).await,
        Commands::Diff(args) => commands::diff::handle_diff_command(args),
        Commands::Query(args) => commands::query::handle_query_command(args).await,
    }
}
