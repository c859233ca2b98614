pub mod handler;

use clap::Args;
use std::path::PathBuf;

use super::common::{ConnectionArgs, ExecutionArgs};

pub use handler::{handle_import_command, handle_update_command};

#[derive(Args, Debug)]
pub struct ImportCommands {
    /// Ontology files to import (default: wikibase.import from the project file)
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub execution: ExecutionArgs,
}

#[derive(Args, Debug)]
pub struct UpdateCommands {
    /// Ontology version the knowledge base currently reflects
    #[arg(long, short = 's')]
    pub source: PathBuf,

    /// Ontology version to move to
    #[arg(long, short = 't')]
    pub target: PathBuf,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub execution: ExecutionArgs,
}
