use anyhow::{Context, Result};

use super::{DiffCommands, PlanFormat};
use crate::cli::commands::common::print_plan;
use ontosync::graph::GraphSource;
use ontosync::sync::Synchronizer;

pub fn handle_diff_command(args: DiffCommands) -> Result<()> {
    let current = match &args.source {
        Some(path) => GraphSource::file(path),
        None => GraphSource::Empty,
    };
    let desired = GraphSource::file(&args.target);

    let prepared = Synchronizer::default().prepare(&current, &desired)?;

    match args.format {
        PlanFormat::Text => print_plan(&prepared.plan),
        PlanFormat::Json => {
            let json = serde_json::to_string_pretty(&prepared.plan).context("Failed to serialize plan")?;
            println!("{}", json);
        }
    }

    Ok(())
}
