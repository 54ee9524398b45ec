//! Command implementations for the weather pipeline CLI
//!
//! This module contains the command execution logic, progress reporting,
//! and the final summary printed once the worker pool is idle.

use crate::aggregation::latest_report;
use crate::cli::args::{Args, Commands, IngestArgs, ReportArgs};
use crate::config::PipelineConfig;
use crate::jobs::{JobOrchestrator, JobSummary};
use crate::store::Database;
use anyhow::{Context, Result};
use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Main command runner
///
/// 1. Set up logging and layered configuration
/// 2. Open the store and start the worker pool
/// 3. Submit the requested job and wait until every job has finished
/// 4. Print a summary of what the pool did
pub async fn run(args: Args) -> Result<()> {
    setup_logging(&args)?;
    debug!("Command line arguments: {:?}", args);

    args.validate()?;
    let config = args.apply_to(PipelineConfig::from_env()?);
    config.validate()?;
    debug!("Resolved configuration: {:?}", config);

    let Some(command) = args.command.clone() else {
        return Ok(());
    };

    match command {
        Commands::Report(report_args) => print_latest_report(&config, &report_args),
        Commands::Ingest(ingest_args) => {
            let orchestrator = start_pool(config)?;
            submit_ingestion(&orchestrator, &ingest_args)?;
            finish(&args, &orchestrator).await
        }
        Commands::Aggregate => {
            let orchestrator = start_pool(config)?;
            orchestrator.submit_aggregation()?;
            finish(&args, &orchestrator).await
        }
    }
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wx_pipeline={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

fn start_pool(config: PipelineConfig) -> Result<JobOrchestrator> {
    config
        .prepare_directories()
        .context("Failed to create log and results directories")?;

    let database = Database::open(&config.database_path).with_context(|| {
        format!("Failed to open database {}", config.database_path.display())
    })?;
    info!("Using database {}", config.database_path.display());

    Ok(JobOrchestrator::start(config, database)?)
}

fn submit_ingestion(orchestrator: &JobOrchestrator, ingest_args: &IngestArgs) -> Result<()> {
    if ingest_args.files.is_empty() {
        let data_dir = &orchestrator.config().data_dir;
        info!("No files given, ingesting every station file in {}", data_dir.display());
        orchestrator
            .submit_directory_ingestion(&ingest_args.trigger)
            .with_context(|| format!("Cannot ingest from {}", data_dir.display()))
    } else {
        info!("Ingesting {} station files", ingest_args.files.len());
        orchestrator
            .submit_ingestion(ingest_args.files.clone(), &ingest_args.trigger)
            .context("Cannot submit ingestion")
    }
}

/// Wait for the pool to drain, then report
async fn finish(args: &Args, orchestrator: &JobOrchestrator) -> Result<()> {
    let start_time = Instant::now();

    let spinner = if args.show_progress() {
        Some(create_spinner("Waiting for jobs")?)
    } else {
        None
    };

    let idle = orchestrator.wait_idle();
    tokio::pin!(idle);
    let mut ticker = tokio::time::interval(Duration::from_millis(250));

    loop {
        tokio::select! {
            _ = &mut idle => break,
            _ = ticker.tick() => {
                if let Some(pb) = &spinner {
                    pb.set_message(format!("{} job(s) pending", orchestrator.pending()));
                }
            }
        }
    }

    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }
    orchestrator.shutdown();

    print_summary(&orchestrator.summary(), start_time.elapsed());
    Ok(())
}

fn create_spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn print_summary(summary: &JobSummary, elapsed: Duration) {
    println!("\n{}", "Pipeline run complete".bright_green().bold());
    println!(
        "  {} {} succeeded, {} failed",
        "Ingestion runs:".bright_cyan(),
        summary.ingestions_succeeded,
        summary.ingestions_failed
    );
    println!("  {} {}", "Readings inserted:".bright_cyan(), summary.rows_inserted);
    println!(
        "  {} {} succeeded, {} failed",
        "Aggregation runs:".bright_cyan(),
        summary.aggregations_succeeded,
        summary.aggregations_failed
    );
    println!("  {} {}", "Results written:".bright_cyan(), summary.results_written);
    if let Some(report) = &summary.latest_report {
        println!("  {} {}", "Report:".bright_cyan(), report.display());
    }
    println!("  {} {}", "Elapsed:".bright_cyan(), HumanDuration(elapsed));

    if summary.ingestions_failed + summary.aggregations_failed > 0 {
        println!(
            "{}",
            "Some runs failed, see the run logs for details".bright_yellow()
        );
    }
}

fn print_latest_report(config: &PipelineConfig, report_args: &ReportArgs) -> Result<()> {
    let Some((path, report)) = latest_report(&config.results_dir)
        .with_context(|| format!("Failed to read reports in {}", config.results_dir.display()))?
    else {
        println!(
            "{} {}",
            "No aggregate report found in".bright_yellow(),
            config.results_dir.display()
        );
        return Ok(());
    };

    info!("Latest report: {}", path.display());
    let json = if report_args.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{}", json);
    Ok(())
}
