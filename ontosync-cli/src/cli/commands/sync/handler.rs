//! Import and update command handlers

use anyhow::{Context, Result};
use colored::*;

use super::{ImportCommands, UpdateCommands};
use crate::cli::commands::common::{
    ConnectionArgs, ExecutionArgs, Project, cancel_on_ctrl_c, confirm, connect, print_plan,
    print_report, write_report,
};
use ontosync::api::{KnowledgeBaseAdapter, MemoryAdapter, WikibaseAdapter};
use ontosync::graph::{Graph, GraphSource};
use ontosync::sync::{CancelHandle, PreparedSync, SyncAborted, Synchronizer};

/// Import into a blank knowledge base: every file against an empty current graph
pub async fn handle_import_command(args: ImportCommands) -> Result<()> {
    let project = Project::load(args.connection.config.as_deref())?;

    let files = if args.files.is_empty() {
        project.config.import_files(&project.base_dir)
    } else {
        args.files.clone()
    };
    if files.is_empty() {
        anyhow::bail!("No files to import. Pass files or list them under wikibase.import in the project file");
    }

    let cancel = CancelHandle::new();
    let synchronizer = Synchronizer::new(args.execution.sync_options(cancel.clone()));

    let mut desired = Graph::new();
    for file in &files {
        println!("Reading {}", file.display().to_string().cyan());
        let graph = synchronizer
            .loader()
            .load(&GraphSource::file(file))
            .with_context(|| format!("Failed to load ontology: {}", file.display()))?;
        desired.extend(graph.iter().cloned());
    }

    let prepared = synchronizer.prepare_graphs(Graph::new(), desired);
    run(&synchronizer, prepared, &project, &args.connection, &args.execution, cancel).await
}

/// Move the knowledge base from the source ontology version to the target
pub async fn handle_update_command(args: UpdateCommands) -> Result<()> {
    let project = Project::load(args.connection.config.as_deref())?;

    for path in [&args.source, &args.target] {
        if !path.exists() {
            anyhow::bail!("Ontology file does not exist: {}", path.display());
        }
    }

    let cancel = CancelHandle::new();
    let synchronizer = Synchronizer::new(args.execution.sync_options(cancel.clone()));
    let prepared = synchronizer.prepare(
        &GraphSource::file(&args.source),
        &GraphSource::file(&args.target),
    )?;

    run(&synchronizer, prepared, &project, &args.connection, &args.execution, cancel).await
}

async fn run(
    synchronizer: &Synchronizer,
    prepared: PreparedSync,
    project: &Project,
    connection: &ConnectionArgs,
    execution: &ExecutionArgs,
    cancel: CancelHandle,
) -> Result<()> {
    print_plan(&prepared.plan);
    if prepared.plan.is_empty() {
        return Ok(());
    }

    if !execution.dry_run {
        let prompt = format!("Apply {} operations to the knowledge base?", prepared.plan.len());
        if !confirm(&prompt, execution.yes)? {
            println!("Cancelled, nothing was changed");
            return Ok(());
        }
    }

    let memory;
    let live: WikibaseAdapter;
    let adapter: &dyn KnowledgeBaseAdapter = if execution.dry_run {
        memory = MemoryAdapter::new();
        &memory
    } else {
        live = connect(project, connection).await?;
        &live
    };

    cancel_on_ctrl_c(cancel);

    match synchronizer.apply(prepared, adapter).await {
        Ok(report) => {
            print_report(&report);
            write_report(&report, execution.report.as_deref())?;
            if report.failed > 0 {
                anyhow::bail!("{} operations failed", report.failed);
            }
            Ok(())
        }
        Err(err) => {
            if let Some(aborted) = err.downcast_ref::<SyncAborted>() {
                print_report(&aborted.report);
                write_report(&aborted.report, execution.report.as_deref())?;
            }
            Err(err)
        }
    }
}
