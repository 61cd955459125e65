//! Command-line interface for the audit tool.

use crate::config::AuditConfig;
use crate::error::Result;
use crate::processor::{ReportAccumulator, print_issues};
use crate::report;
use crate::validation::RuleEngine;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Audit LAS/LAZ point cloud deliveries against a data acquisition policy
#[derive(Debug, Clone, Parser)]
#[command(name = "laszy-audit", version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (TOML format)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Summarize files into a report table, resuming earlier runs
    Audit(AuditArgs),
    /// Run the validation checks on an existing report table
    Validate(ValidateArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct AuditArgs {
    /// LAS/LAZ files, summary documents, or directories to walk
    #[arg(value_name = "INPUTS", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory for the report, ledgers and artifacts
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Report table file name
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    pub report_name: Option<String>,

    /// Validate the report once it is written
    #[arg(long)]
    pub validate: bool,

    /// Write a summary document per lidar file under laszy_json/
    #[arg(long = "write-summaries")]
    pub write_summaries: bool,

    /// Ignore ledgers and the existing report
    #[arg(long = "no-resume")]
    pub no_resume: bool,

    /// Number of files summarized concurrently
    #[arg(short = 'j', long = "workers", value_name = "COUNT")]
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Parser)]
pub struct ValidateArgs {
    /// Report table to validate
    #[arg(value_name = "REPORT")]
    pub report: PathBuf,

    /// Output directory for the artifacts (defaults to the report's directory)
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    pub fn show_progress(&self) -> bool {
        !self.quiet && self.verbose > 0
    }
}

impl AuditArgs {
    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply(&self, config: AuditConfig) -> AuditConfig {
        let mut config = config;
        if let Some(dir) = &self.output_dir {
            config = config.with_output_dir(dir);
        }
        if let Some(name) = &self.report_name {
            config = config.with_report_name(name);
        }
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if self.validate {
            config = config.with_validate(true);
        }
        if self.write_summaries {
            config = config.with_write_summaries(true);
        }
        if self.no_resume {
            config = config.with_check_logs(false);
        }
        config
    }
}

/// Install the stderr tracing subscriber
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("laszy_audit={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .init();

    debug!("Logging initialized at level: {}", log_level);
}

fn report_dir(report: &Path) -> PathBuf {
    report
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Run the selected command
pub async fn run(args: Args) -> Result<()> {
    let config = AuditConfig::load(args.config_file.as_deref())?;

    match &args.command {
        Commands::Audit(audit) => {
            let show_progress = !args.quiet && (config.show_progress || args.show_progress());
            let config = audit.apply(config).with_progress(show_progress);
            println!("{}", "Starting LiDAR audit".bright_green().bold());
            println!(
                "  {} {}",
                "Output:".bright_cyan(),
                config.output_dir.display()
            );

            let outcome = ReportAccumulator::with_las_reader(config)
                .run(&audit.inputs)
                .await?;
            if !args.quiet {
                outcome.print_summary();
            }
        }
        Commands::Validate(validate) => {
            let outdir = validate
                .output_dir
                .clone()
                .unwrap_or_else(|| report_dir(&validate.report));
            let engine = RuleEngine::for_today(&config.policy)?;
            let (issues, artifacts) = report::validate_report(&validate.report, &outdir, &engine)?;
            if !args.quiet {
                print_issues(&issues, &artifacts);
            }
        }
    }
    Ok(())
}
