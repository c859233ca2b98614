pub mod handler;

use clap::{Args, ValueEnum};
use std::path::PathBuf;

pub use handler::handle_diff_command;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanFormat {
    /// Operations grouped by tier
    Text,
    /// The full plan as JSON
    Json,
}

#[derive(Args, Debug)]
pub struct DiffCommands {
    /// Current ontology version (omit to diff against an empty knowledge base)
    #[arg(long, short = 's')]
    pub source: Option<PathBuf>,

    /// Desired ontology version
    #[arg(long, short = 't')]
    pub target: PathBuf,

    #[arg(long, short = 'f', value_enum, default_value_t = PlanFormat::Text)]
    pub format: PlanFormat,
}
