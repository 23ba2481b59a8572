use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;
use deskloop::assistant::Assistant;
use deskloop::domain::{DONE_MARKER, LoopOutcome, LoopReport, Task};
use deskloop::executor::{LocalExecutor, OperationExecutor, ScriptedExecutor};
use deskloop::journal::JsonlJournal;
use deskloop::observer::LogObserver;

fn setup_logging(level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("deskloop")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("deskloop.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let mut builder = env_logger::Builder::new();
    if let Some(level) = level {
        builder.parse_filters(level);
    }
    // RUST_LOG wins over the config file
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Domains => handle_domains_command(config),
        Commands::History { id, limit } => handle_history_command(id.as_deref(), *limit, config),
        command => handle_task_command(command, cli, config).await,
    }
}

fn build_assistant(cli: &Cli, config: &Config) -> Result<Assistant> {
    let executor: Arc<dyn OperationExecutor> = if cli.dry_run {
        println!("{}", "Dry run: no operation touches the system".yellow());
        Arc::new(ScriptedExecutor::always_ok())
    } else {
        Arc::new(LocalExecutor::new(config.executor.clone()))
    };

    let mut assistant = Assistant::standard(
        executor,
        &config.domains,
        config.refiner.clone(),
        config.rate_limit.clone(),
        Arc::new(LogObserver),
    )
    .context("Failed to build assistant")?;

    if config.journal.enabled && !cli.dry_run {
        let journal = JsonlJournal::new(&config.journal.dir).context("Failed to open run journal")?;
        assistant = assistant.with_journal(journal);
    }
    Ok(assistant)
}

async fn handle_task_command(command: &Commands, cli: &Cli, config: &Config) -> Result<()> {
    let (operation, params, description) = command
        .to_request()
        .ok_or_else(|| eyre!("{:?} is not a task command", command))?;

    let task = Task::new(description, operation, params).context("Invalid task")?;
    info!("Submitting task {} ({})", task.id(), task.operation());

    let assistant = build_assistant(cli, config)?;
    let report = assistant.submit(&task).await.context("Task was not run")?;

    print_report(&report, cli.is_verbose());

    if report.succeeded() {
        Ok(())
    } else {
        Err(eyre!("{} did not succeed", task.id()))
    }
}

fn print_report(report: &LoopReport, verbose: bool) {
    if verbose {
        for (attempt, verdict) in report.attempts.iter().zip(&report.verdicts) {
            let mark = if verdict.is_success() { "ok".green() } else { "failed".red() };
            println!("  attempt {} [{}] {}", attempt.index + 1, attempt.params, mark);
        }
        println!();
    }

    for (i, chunk) in report.chunks().iter().enumerate() {
        if chunk.trim_end() == DONE_MARKER {
            print!("{}", chunk.dimmed());
        } else if i == 0 && report.succeeded() {
            print!("{}", chunk.green());
        } else if i == 0 {
            print!("{}", chunk.red());
        } else {
            print!("{}", chunk);
        }
    }
}

fn handle_domains_command(config: &Config) -> Result<()> {
    info!("Listing domains");
    println!("{}", "Domains:".cyan());
    for domain in config.domains.all().context("Invalid domain settings")? {
        let permission = if domain.retry_permission_denied {
            "retries permission-denied"
        } else {
            "stops on permission-denied"
        };
        println!(
            "  {:<12} max {:>2} attempts, {}",
            domain.domain.to_string().bold(),
            domain.max_attempts,
            permission
        );
    }
    Ok(())
}

fn handle_history_command(id: Option<&str>, limit: usize, config: &Config) -> Result<()> {
    info!("Showing history - id: {:?}, limit: {}", id, limit);
    let journal = JsonlJournal::new(&config.journal.dir).context("Failed to open run journal")?;

    if let Some(id) = id {
        let report = journal
            .get(id)
            .context("Failed to read run journal")?
            .ok_or_else(|| eyre!("No journaled run for {}", id))?;
        print_report(&report, true);
        return Ok(());
    }

    let reports = journal.recent(limit).context("Failed to read run journal")?;
    if reports.is_empty() {
        println!("{}", "No runs journaled yet".yellow());
        return Ok(());
    }
    for report in reports {
        let status = match &report.outcome {
            LoopOutcome::Succeeded { .. } => "succeeded".green(),
            LoopOutcome::Exhausted { last_failure, .. } => last_failure.category.as_str().red(),
        };
        println!(
            "{} {} {} {} ({}/{} attempts) {}",
            report.finished_at.format("%Y-%m-%d %H:%M:%S"),
            report.task.id().dimmed(),
            report.task.operation(),
            report.task.target().unwrap_or_default(),
            report.attempt_count(),
            report.max_attempts,
            status
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging
    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
