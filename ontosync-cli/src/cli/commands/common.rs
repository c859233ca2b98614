//! Arguments and helpers shared by the commands that talk to a knowledge base

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use dialoguer::Confirm;
use is_terminal::IsTerminal;
use std::path::{Path, PathBuf};

use ontosync::api::{WikibaseAdapter, WikibaseSettings, wikibase::UriFactory};
use ontosync::config::{ProjectConfig, TransportPolicy, resolve_credentials};
use ontosync::sync::{CancelHandle, DiffPlan, ExecutorConfig, SyncOptions, SyncReport};

/// Where the URI map lives when the project file does not say
pub const DEFAULT_URI_FACTORY_PATH: &str = ".ontosync/uris.json";

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Project file (default: project.yaml or project.toml in the current directory)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Skip TLS certificate verification for this run
    #[arg(long)]
    pub insecure: bool,

    /// Forget stored URI to entity id mappings before running
    #[arg(long)]
    pub reset_uris: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExecutionArgs {
    /// Apply the plan to an in-memory copy and report what would happen
    #[arg(long)]
    pub dry_run: bool,

    /// Do not ask for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Run operations of the same tier concurrently
    #[arg(long)]
    pub parallel_tiers: bool,

    /// Concurrent requests per tier with --parallel-tiers
    #[arg(long, default_value_t = 4)]
    pub max_concurrent: usize,

    /// Write the run report to this file (.json or .csv)
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl ExecutionArgs {
    pub fn sync_options(&self, cancel: CancelHandle) -> SyncOptions {
        let executor = ExecutorConfig::builder()
            .parallel_tiers(self.parallel_tiers)
            .max_concurrent_requests(self.max_concurrent)
            .build();

        SyncOptions {
            dry_run: self.dry_run,
            executor,
            cancel,
        }
    }
}

/// A loaded project file and the directory relative paths resolve against
pub struct Project {
    pub config: ProjectConfig,
    pub base_dir: PathBuf,
}

impl Project {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let cwd = std::env::current_dir().context("Failed to determine current directory")?;
                match ProjectConfig::discover_with_user_fallback(&cwd) {
                    Some(path) => path,
                    None => {
                        log::info!("No project file found, using default settings");
                        return Ok(Self {
                            config: ProjectConfig::default(),
                            base_dir: cwd,
                        });
                    }
                }
            }
        };

        let config = ProjectConfig::from_file(&path)
            .with_context(|| format!("Failed to load project file: {}", path.display()))?;
        let base_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self { config, base_dir })
    }

    pub fn uri_factory_path(&self) -> PathBuf {
        let path = self
            .config
            .uri_factory_path()
            .unwrap_or(Path::new(DEFAULT_URI_FACTORY_PATH));
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

/// Resolve credentials, load the URI map and log in
pub async fn connect(project: &Project, args: &ConnectionArgs) -> Result<WikibaseAdapter> {
    let credentials = resolve_credentials(&project.config, is_interactive())?;

    let mut uris = UriFactory::load(project.uri_factory_path())?;
    if args.reset_uris {
        log::info!("Resetting {} stored URI mappings", uris.len());
        uris.reset();
        uris.save()?;
    }

    let mut settings = WikibaseSettings::from_project(&project.config, credentials, uris);
    if args.insecure {
        settings.transport = TransportPolicy::insecure();
    }

    println!("Connecting to {}", settings.api_endpoint.cyan());
    WikibaseAdapter::authenticate(settings)
        .await
        .context("Failed to log in to Wikibase")
}

/// Cancel the run on Ctrl-C; the operation in flight still completes
pub fn cancel_on_ctrl_c(cancel: CancelHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Interrupted, stopping after the current operation".yellow());
            cancel.cancel();
        }
    });
}

pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !is_interactive() {
        anyhow::bail!("Refusing to modify the knowledge base without confirmation, pass --yes");
    }

    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}

pub fn print_plan(plan: &DiffPlan) {
    if plan.is_empty() {
        println!("{}", "Knowledge base is up to date, nothing to do".green());
        return;
    }

    for (tier, operations) in plan.tiers() {
        println!("{} ({})", tier.label().bold(), operations.len());
        for operation in operations {
            let line = operation.to_string();
            if operation.is_add() {
                println!("  {}", line.green());
            } else {
                println!("  {}", line.red());
            }
        }
    }

    for ambiguity in &plan.ambiguities {
        println!("{} {}", "warning:".yellow().bold(), ambiguity);
    }

    println!(
        "\n{} to add, {} to remove, {} unchanged",
        plan.stats.to_add.to_string().green(),
        plan.stats.to_remove.to_string().red(),
        plan.stats.unchanged
    );
}

pub fn print_report(report: &SyncReport) {
    for entry in report.failures() {
        println!(
            "  {} {}: {}",
            "FAILED".red().bold(),
            entry.operation,
            entry.result.message.as_deref().unwrap_or("no detail")
        );
    }

    let prefix = if report.dry_run { "Dry run: " } else { "" };
    let mut summary = format!("{}{}", prefix, report.summary());
    if let Some(elapsed) = report.duration() {
        summary.push_str(&format!(" in {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0));
    }
    if report.is_success() {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.yellow());
    }
}

pub fn write_report(report: &SyncReport, path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    report
        .export(path)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    println!("Report saved to: {}", path.display().to_string().bright_green());
    Ok(())
}
