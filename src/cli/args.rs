//! Command-line argument definitions for the weather pipeline
//!
//! This module defines the CLI interface using the clap derive API. Global
//! flags override the layout and worker count loaded from the environment.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Trigger label recorded by ingestion runs started from the command line
pub const CLI_INGEST_TRIGGER: &str = "cli:ingest";

/// CLI arguments for the weather pipeline
///
/// Ingests daily station weather files into a SQLite store and aggregates
/// them into yearly per-station statistics.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "wx-pipeline",
    version,
    about = "Ingest station weather files and aggregate yearly statistics",
    long_about = "Ingests tab-separated daily station weather files into a SQLite record store, \
                  then computes yearly average temperatures and total precipitation per station. \
                  Each run writes its own process log; every aggregation writes a dated JSON report."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Root directory holding wx_data/, database.db, logs/ and results/
    #[arg(long = "root", value_name = "PATH", global = true)]
    pub root: Option<PathBuf>,

    /// Directory scanned for <station_id>.txt files
    #[arg(long = "data-dir", value_name = "PATH", global = true)]
    pub data_dir: Option<PathBuf>,

    /// SQLite database file
    #[arg(long = "database", value_name = "FILE", global = true)]
    pub database: Option<PathBuf>,

    /// Number of background workers
    #[arg(short = 'j', long = "workers", value_name = "COUNT", global = true)]
    pub workers: Option<usize>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: debug, -vv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help = "Suppress output except errors"
    )]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Ingest station files, then aggregate if anything new was stored
    Ingest(IngestArgs),
    /// Aggregate every stored reading into yearly results
    Aggregate,
    /// Print the latest aggregate report as JSON
    Report(ReportArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct IngestArgs {
    /// Station files to ingest; defaults to every *.txt in the data directory
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Label recorded in the run log describing what requested the run
    #[arg(long = "trigger", value_name = "LABEL", default_value = CLI_INGEST_TRIGGER)]
    pub trigger: String,
}

#[derive(Debug, Clone, Parser)]
pub struct ReportArgs {
    /// Print compact JSON on one line
    #[arg(long = "compact")]
    pub compact: bool,
}

impl Args {
    /// Apply command-line overrides on top of `base`
    pub fn apply_to(&self, base: PipelineConfig) -> PipelineConfig {
        let mut config = match &self.root {
            Some(root) => base.with_root(root),
            None => base,
        };
        if let Some(data_dir) = &self.data_dir {
            config = config.with_data_dir(data_dir);
        }
        if let Some(database) = &self.database {
            config = config.with_database_path(database);
        }
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(PipelineError::configuration(
                "Number of workers must be greater than 0",
            ));
        }

        if let Some(root) = &self.root {
            if !root.is_dir() {
                return Err(PipelineError::configuration(format!(
                    "Root path is not a directory: {}",
                    root.display()
                )));
            }
        }

        Ok(())
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress spinners (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn test_parse_ingest_with_files() {
        let args = Args::try_parse_from([
            "wx-pipeline",
            "ingest",
            "wx_data/USC00110072.txt",
            "wx_data/USC00110187.txt",
            "--workers",
            "2",
        ])
        .unwrap();

        match args.command {
            Some(Commands::Ingest(ingest)) => {
                assert_eq!(ingest.files.len(), 2);
                assert_eq!(ingest.trigger, CLI_INGEST_TRIGGER);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(args.workers, Some(2));
    }

    #[test]
    fn test_parse_ingest_without_files() {
        let args = Args::try_parse_from(["wx-pipeline", "ingest", "--trigger", "batch"]).unwrap();

        match args.command {
            Some(Commands::Ingest(ingest)) => {
                assert!(ingest.files.is_empty());
                assert_eq!(ingest.trigger, "batch");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_overrides_applied_after_root() {
        let args = Args::try_parse_from([
            "wx-pipeline",
            "--root",
            "/srv/wx",
            "--database",
            "/tmp/other.db",
            "aggregate",
        ])
        .unwrap();

        let config = args.apply_to(PipelineConfig::default().with_workers(3));

        assert_eq!(config.data_dir, Path::new("/srv/wx/wx_data"));
        assert_eq!(config.database_path, Path::new("/tmp/other.db"));
        assert_eq!(config.results_dir, Path::new("/srv/wx/results"));
        assert_eq!(config.workers, 3);
    }

    #[test]
    fn test_validation() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_string_lossy().to_string();

        let args = Args::try_parse_from(["wx-pipeline", "--root", &root, "report"]).unwrap();
        assert!(args.validate().is_ok());

        let args = Args::try_parse_from(["wx-pipeline", "-j", "0", "aggregate"]).unwrap();
        assert!(args.validate().unwrap_err().is_configuration());

        let missing = temp_dir.path().join("missing").to_string_lossy().to_string();
        let args = Args::try_parse_from(["wx-pipeline", "--root", &missing, "aggregate"]).unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = Args::try_parse_from(["wx-pipeline", "aggregate"]).unwrap();
        assert_eq!(args.get_log_level(), "info");
        assert!(args.show_progress());

        args.verbose = 1;
        assert_eq!(args.get_log_level(), "debug");

        args.verbose = 2;
        assert_eq!(args.get_log_level(), "trace");

        args.quiet = true;
        assert_eq!(args.get_log_level(), "error");
        assert!(!args.show_progress());
    }
}
