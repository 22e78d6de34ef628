//! Rollout - deployment task console
//!
//! Usage:
//!   rollout status              # Dashboard metrics and error catalog
//!   rollout tasks               # List tasks
//!   rollout deployments ...     # Per-target results of a task
//!   rollout create -i           # Task creation wizard
//!   rollout --demo status       # Same, against the built-in demo dataset

mod interactive;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::runtime::Runtime;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rollout_core::config::ConsoleConfig;
use rollout_core::dashboard::{DashboardSnapshot, derive};
use rollout_core::deployments::{DeploymentsView, filter_tasks};
use rollout_core::source::DataSource;
use rollout_core::types::{ExportFormat, StatusFilter, Task, TaskDeploymentDetail};
use rollout_core::wizard::{DEFAULT_AGGRESSIVENESS, Field, SubmitResult, WizardController};

use crate::interactive::{PrefilledOptions, WizardFlow};

#[derive(Parser)]
#[command(name = "rollout")]
#[command(about = "Deployment task console", long_about = None)]
struct Cli {
    /// Use the built-in demo dataset instead of the backend
    #[arg(long, global = true)]
    demo: bool,

    /// Backend base URL (overrides console.toml and ROLLOUT_API_BASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Default `RUST_LOG` directives: this binary and the core library.
const DEFAULT_LOG_FILTER: &str = "rollout=debug,rollout_core=debug,info";

#[derive(Subcommand)]
enum Commands {
    /// Show dashboard metrics, failure breakdowns and the error catalog
    Status {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List deployment tasks
    Tasks {
        /// Only show tasks with this outcome
        #[arg(long)]
        filter: Option<FilterArg>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show per-target deployment results of a task
    ///
    /// Without --task the first task matching the filter is shown.
    #[command(alias = "deploys")]
    Deployments {
        /// Task ID
        #[arg(long, short)]
        task: Option<String>,

        /// Only show tasks and results with this outcome
        #[arg(long)]
        filter: Option<FilterArg>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Download the deployment report of a task
    Export {
        /// Task ID
        task: String,

        /// Report format
        #[arg(long, short, default_value = "csv")]
        format: ReportFormat,

        /// Output file (defaults to task-<id>-deployments.<ext>)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Run an assessment scan against a list of targets
    Scan {
        /// Targets, separated by commas or newlines
        targets: String,

        /// Scan aggressiveness (1-5)
        #[arg(short, long, default_value_t = DEFAULT_AGGRESSIVENESS,
              value_parser = clap::value_parser!(u8).range(1..=5))]
        aggressiveness: u8,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Create a deployment task
    Create(Box<CreateArgs>),
}

impl Commands {
    /// Subcommand name for logging; argument values may hold credentials.
    fn name(&self) -> &'static str {
        match self {
            Commands::Status { .. } => "status",
            Commands::Tasks { .. } => "tasks",
            Commands::Deployments { .. } => "deployments",
            Commands::Export { .. } => "export",
            Commands::Scan { .. } => "scan",
            Commands::Create(_) => "create",
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterArg {
    Success,
    Failed,
}

impl From<FilterArg> for StatusFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Success => StatusFilter::Success,
            FilterArg::Failed => StatusFilter::Failed,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Csv,
    Pdf,
}

impl From<ReportFormat> for ExportFormat {
    fn from(arg: ReportFormat) -> Self {
        match arg {
            ReportFormat::Csv => ExportFormat::Csv,
            ReportFormat::Pdf => ExportFormat::Pdf,
        }
    }
}

#[derive(Args)]
struct CreateArgs {
    /// Interactive mode - walks the wizard and prompts for every field
    #[arg(short, long)]
    interactive: bool,
    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,
    /// Task name
    #[arg(long)]
    name: Option<String>,
    /// Targets (hostnames, IPs, CIDR), separated by commas or newlines
    #[arg(long)]
    targets: Option<String>,
    /// Scan aggressiveness (1-5)
    #[arg(long)]
    aggressiveness: Option<u8>,
    /// Run an assessment scan on the targets before continuing
    #[arg(long)]
    scan: bool,
    #[arg(long)]
    ssh_username: Option<String>,
    #[arg(long)]
    ssh_password: Option<String>,
    /// File containing the SSH private key
    #[arg(long, value_name = "PATH")]
    ssh_private_key: Option<PathBuf>,
    #[arg(long)]
    winrm_username: Option<String>,
    #[arg(long)]
    winrm_password: Option<String>,
    /// URL of an installer already hosted somewhere
    #[arg(long, conflicts_with = "installer")]
    installer_url: Option<String>,
    /// Installer file to upload to the controller
    #[arg(long, value_name = "PATH")]
    installer: Option<PathBuf>,
    /// SHA256 checksum of the installer
    #[arg(long)]
    checksum: Option<String>,
    #[arg(long)]
    installer_id: Option<String>,
    /// Schedule the task for later instead of running it immediately
    #[arg(long, value_name = "TIMESTAMP")]
    start_at: Option<String>,
    /// Output format
    #[arg(short = 'o', long, default_value = "table")]
    format: OutputFormat,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let source = DataSource::from_config(&config)?;
    let runtime = Runtime::new().context("Failed to start async runtime")?;

    run_cli(cli.command, &runtime, source)
}

fn load_config(cli: &Cli) -> Result<ConsoleConfig> {
    let mut config = ConsoleConfig::load()?;
    if let Some(base_url) = &cli.base_url {
        config.set_base_url(base_url)?;
    }
    if cli.demo {
        config.demo_mode = true;
    }
    debug!(base_url = %config.base_url, demo = config.demo_mode, "configuration loaded");
    Ok(config)
}

fn run_cli(command: Commands, runtime: &Runtime, source: DataSource) -> Result<()> {
    debug!(command = command.name(), mode = %source.mode(), "dispatching command");
    match command {
        Commands::Status { format } => {
            let snapshot = runtime.block_on(source.load_snapshot())?;
            match format {
                OutputFormat::Table => print_status(&snapshot),
                OutputFormat::Json => print_json(&snapshot)?,
            }
        }
        Commands::Tasks { filter, format } => {
            let snapshot = runtime.block_on(source.load_snapshot())?;
            let tasks = filter_tasks(&snapshot.tasks, filter.map(Into::into));
            match format {
                OutputFormat::Table => print_tasks_table(&tasks),
                OutputFormat::Json => print_json(&tasks)?,
            }
        }
        Commands::Deployments {
            task,
            filter,
            format,
        } => {
            runtime.block_on(run_deployments(source, task, filter, format))?;
        }
        Commands::Export {
            task,
            format,
            output,
        } => {
            let format = ExportFormat::from(format);
            let bytes = runtime.block_on(source.export_report(&task, format))?;
            let path = output.unwrap_or_else(|| PathBuf::from(format.file_name(&task)));
            std::fs::write(&path, &bytes)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            info!(%task, %format, path = %path.display(), "report written");
            println!("Saved {} ({} bytes)", path.display(), bytes.len());
        }
        Commands::Scan {
            targets,
            aggressiveness,
            format,
        } => {
            run_scan(runtime, source, &targets, aggressiveness, format)?;
        }
        Commands::Create(args) => {
            run_create(runtime, source, *args)?;
        }
    }
    Ok(())
}

async fn run_deployments(
    source: DataSource,
    task: Option<String>,
    filter: Option<FilterArg>,
    format: OutputFormat,
) -> Result<()> {
    let snapshot = source.load_snapshot().await?;
    let mut view = DeploymentsView::new(source, filter.map(Into::into));

    let job = match &task {
        Some(task_id) => view.select_task(task_id),
        None => view.sync_tasks(&snapshot.tasks),
    };
    if let Some(job) = job {
        let outcome = job.run().await;
        view.finish_load(outcome);
    }

    let Some(task_id) = view.selected_task_id() else {
        println!("No tasks match the current filter.");
        return Ok(());
    };
    if let Some(message) = view.error_message() {
        anyhow::bail!("Failed to load deployments for {}: {}", task_id, message);
    }

    let rows = view.visible_rows();
    match format {
        OutputFormat::Table => {
            let name = snapshot
                .tasks
                .iter()
                .find(|t| t.id == task_id)
                .map(|t| t.name.as_str())
                .unwrap_or("-");
            println!("Task: {} ({})", name, task_id);
            if let Some(filter) = view.effective_filter() {
                println!("Filter: {}", filter);
            }
            println!();
            print_deployments_table(&rows);
        }
        OutputFormat::Json => print_json(&rows)?,
    }
    Ok(())
}

fn run_scan(
    runtime: &Runtime,
    source: DataSource,
    targets: &str,
    aggressiveness: u8,
    format: OutputFormat,
) -> Result<()> {
    let mut wizard = WizardController::new(source);
    wizard
        .set_field(Field::Targets, targets)
        .map_err(anyhow::Error::msg)?;
    wizard
        .set_field(Field::Aggressiveness, &aggressiveness.to_string())
        .map_err(anyhow::Error::msg)?;
    if wizard.draft().parsed_targets().is_empty() {
        anyhow::bail!("No targets given");
    }

    runtime.block_on(wizard.run_scan());

    let effects = wizard.effects();
    if let Some(message) = effects.scan().failure() {
        anyhow::bail!("Assessment scan failed: {}", message);
    }
    let summary = effects
        .scan()
        .result()
        .context("Assessment scan did not complete")?;

    match format {
        OutputFormat::Table => {
            if let Some(status) = effects.scan_status() {
                println!("{}", status);
            }
            println!("{}", summary.summary());
            for issue in &summary.issues {
                println!("  - {}", issue);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "targetCount": summary.target_count,
                "targetsScanned": summary.targets_scanned,
                "errors": summary.issues,
                "simulated": summary.simulated,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn run_create(runtime: &Runtime, source: DataSource, args: CreateArgs) -> Result<()> {
    let prefilled = prefilled_from_args(&args)?;
    let mut flow = WizardFlow::new(runtime, source, prefilled, args.interactive);

    let Some(result) = flow.run()? else {
        println!("Cancelled.");
        return Ok(());
    };

    match (result, args.format) {
        (SubmitResult::Created { task, run_id }, OutputFormat::Json) => {
            let output = serde_json::json!({
                "created": true,
                "task": task,
                "runId": run_id,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        (SubmitResult::Created { task, run_id }, OutputFormat::Table) => {
            if let (Some(task), Some(run_id)) = (task, run_id) {
                println!("Task {} ({}) started as run {}", task.name, task.id, run_id);
            }
        }
        (SubmitResult::Invalid(errors), _) => {
            anyhow::bail!("{} field(s) failed validation", errors.len());
        }
        (SubmitResult::Failed(message), _) => {
            anyhow::bail!("Task creation failed: {}", message);
        }
    }
    Ok(())
}

fn prefilled_from_args(args: &CreateArgs) -> Result<PrefilledOptions> {
    let mut fields = Vec::new();
    let mut push = |field: Field, value: Option<String>| {
        if let Some(value) = value {
            fields.push((field, value));
        }
    };

    push(Field::TaskName, args.name.clone());
    push(Field::Targets, args.targets.clone());
    push(Field::Aggressiveness, args.aggressiveness.map(|a| a.to_string()));
    push(Field::SshUsername, args.ssh_username.clone());
    push(Field::SshPassword, args.ssh_password.clone());
    if let Some(path) = &args.ssh_private_key {
        let key = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read SSH private key: {}", path.display()))?;
        push(Field::SshPrivateKey, Some(key));
    }
    push(Field::WinrmUsername, args.winrm_username.clone());
    push(Field::WinrmPassword, args.winrm_password.clone());
    push(Field::InstallerUrl, args.installer_url.clone());
    push(Field::Checksum, args.checksum.clone());
    push(Field::InstallerId, args.installer_id.clone());
    if let Some(start_at) = &args.start_at {
        push(Field::ScheduleMode, Some("later".to_string()));
        push(Field::StartAt, Some(start_at.clone()));
    }

    Ok(PrefilledOptions {
        fields,
        installer_path: args.installer.clone(),
        scan: args.scan,
        yes: args.yes,
    })
}

// =============================================================================
// Output
// =============================================================================

fn print_status(snapshot: &DashboardSnapshot) {
    let metrics = &snapshot.metrics;

    println!(
        "Tasks: {} total, {} running, {} succeeded, {} failed, {} pending",
        metrics.total_tasks,
        metrics.running_tasks,
        metrics.success_tasks,
        metrics.failed_tasks,
        metrics.pending_tasks
    );
    println!();

    for gauge in derive::gauges(metrics) {
        println!(
            "  {:<18} {:>4}/{:<4} {:>5.1}%",
            gauge.label,
            gauge.value,
            gauge.total,
            gauge.ratio() * 100.0
        );
    }

    let charts = [
        ("Failure reasons", derive::failure_reasons(metrics)),
        ("Success by OS", derive::success_by_os(metrics)),
        ("Failures by OS", derive::failure_by_os(metrics)),
        ("Auth methods", derive::auth_methods(metrics)),
    ];
    for (title, points) in charts {
        println!();
        println!("{}:", title);
        for point in points {
            println!(
                "  {:<20} {:>5} {}",
                truncate(&point.label, 20),
                point.value,
                bar(point.width, 30)
            );
        }
    }

    println!();
    println!("Error catalog ({}):", snapshot.errors.len());
    for item in &snapshot.errors {
        println!("  {:<14} {}", item.code, item.message);
        println!("  {:<14} {}", "", item.remediation);
        for (index, step) in item.steps.iter().enumerate() {
            println!("  {:<14} {}. {}", "", index + 1, step);
        }
    }

    if !snapshot.assessments.is_empty() {
        println!();
        println!("Assessments ({}):", snapshot.assessments.len());
        println!(
            "  {:<16} {:<9} {:<10} {:>8} Method",
            "Target", "OS", "Reachable", "Success"
        );
        println!("  {}", "-".repeat(60));
        for assessment in &snapshot.assessments {
            let reachable = match assessment.reachable {
                Some(true) => "yes",
                Some(false) => "no",
                None => "-",
            };
            println!(
                "  {:<16} {:<9} {:<10} {:>7}% {}",
                truncate(&assessment.label, 16),
                assessment.os,
                reachable,
                assessment.predicted_success,
                assessment.secure_method
            );
        }
    }
}

fn print_tasks_table(tasks: &[&Task]) {
    if tasks.is_empty() {
        println!("No tasks match the current filter.");
        return;
    }

    println!(
        "  {:<14} {:<24} {:<10} {:>7}  Created",
        "ID", "Name", "Status", "Targets"
    );
    println!("  {}", "-".repeat(76));
    for task in tasks {
        println!(
            "  {:<14} {:<24} {:<10} {:>7}  {}",
            truncate(&task.id, 14),
            truncate(&task.name, 24),
            task.status,
            task.target_count,
            task.created_at.format("%Y-%m-%d %H:%M")
        );
    }
}

fn print_deployments_table(rows: &[&TaskDeploymentDetail]) {
    if rows.is_empty() {
        println!("No deployment results.");
        return;
    }

    println!(
        "  {:<16} {:<8} {:<8} {:<18} {:<14} Finished",
        "Target", "OS", "Status", "Auth", "Error"
    );
    println!("  {}", "-".repeat(86));
    for row in rows {
        let error = if row.error_code.is_empty() {
            "-"
        } else {
            row.error_code.as_str()
        };
        println!(
            "  {:<16} {:<8} {:<8} {:<18} {:<14} {}",
            truncate(&row.target_label, 16),
            row.target_os,
            row.status,
            truncate(&row.auth_method, 18),
            truncate(error, 14),
            row.finished_at
        );
        if !row.remediation.is_empty() {
            println!("    -> {}", row.remediation);
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn bar(width: f64, max_len: usize) -> String {
    let len = (width.clamp(0.0, 1.0) * max_len as f64).round() as usize;
    "#".repeat(len)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
