//! Batch audit engine.
//!
//! Turns a batch of input files into one report table: discovery and
//! partitioning, resume reconciliation against the ledgers, concurrent
//! summarization, a single row writer, then ledger commit, exception log and
//! optional validation.

pub mod discovery;
pub mod streaming;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::streaming::{SummarizeOptions, summarize_all};
use self::writer::{CarriedRows, ReportWriter, carry_over};

use crate::adapter::{LasReader, SourceReader};
use crate::config::AuditConfig;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::models::{ExceptionEntry, FileCategory, ProcessingStats};
use crate::report::{self, ValidationArtifacts};
use crate::summary::to_row;
use crate::validation::{IssueReport, RuleEngine};

use colored::*;
use futures::stream::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything a finished run produced
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub stats: ProcessingStats,
    pub exceptions: Vec<ExceptionEntry>,
    pub exception_log: Option<PathBuf>,
    /// Present when validation ran
    pub issues: Option<IssueReport>,
    pub artifacts: ValidationArtifacts,
}

impl BatchOutcome {
    pub fn print_summary(&self) {
        let stats = &self.stats;
        println!("\n{}", "Processing Summary".bright_green().bold());
        println!(
            "  {} {}ms",
            "Time elapsed:".bright_cyan(),
            stats.processing_time_ms.to_string().bright_white()
        );
        println!(
            "  {} {} ({} lidar, {} summaries)",
            "Files processed:".bright_cyan(),
            stats.files_processed().to_string().bright_white(),
            stats.lidar_processed,
            stats.json_processed
        );
        if stats.files_skipped > 0 {
            println!(
                "  {} {} ({} rows reused)",
                "Files skipped:".bright_cyan(),
                stats.files_skipped.to_string().bright_white(),
                stats.rows_reused
            );
        }
        if stats.files_failed > 0 {
            println!(
                "  {} {}",
                "Files failed:".bright_red(),
                stats.files_failed.to_string().bright_red().bold()
            );
        }
        println!(
            "  {} {}",
            "Report:".bright_cyan(),
            stats.report_path.display().to_string().bright_white().bold()
        );
        if let Some(log) = &self.exception_log {
            println!("  {} {}", "Exceptions:".bright_red(), log.display());
        }
        if let Some(issues) = &self.issues {
            print_issues(issues, &self.artifacts);
        }
    }
}

/// Print an issue report with the artifacts written for it
pub fn print_issues(issues: &IssueReport, artifacts: &ValidationArtifacts) {
    println!("\n{}", "Validation Summary".bright_green().bold());
    if issues.is_empty() {
        println!("  {}", "No issues found".bright_white());
        return;
    }
    for (check, count) in issues.iter() {
        println!(
            "  {} {}",
            format!("{}:", check).bright_cyan(),
            count.to_string().bright_red()
        );
    }
    for path in [&artifacts.summary_path, &artifacts.table_path]
        .into_iter()
        .flatten()
    {
        println!("  {} {}", "Wrote".bright_cyan(), path.display());
    }
}

fn create_progress_bar(total: u64, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message("Summarizing files...");
    pb
}

/// Accumulates per-file summaries of a batch into one report table
pub struct ReportAccumulator {
    config: AuditConfig,
    reader: Arc<dyn SourceReader>,
}

impl ReportAccumulator {
    pub fn new(config: AuditConfig, reader: Arc<dyn SourceReader>) -> Self {
        Self { config, reader }
    }

    /// Accumulator decoding lidar files with the `las` reader
    pub fn with_las_reader(config: AuditConfig) -> Self {
        Self::new(config, Arc::new(LasReader::new()))
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Audit a batch of files and directories
    pub async fn run(&self, inputs: &[PathBuf]) -> Result<BatchOutcome> {
        let start_time = Instant::now();
        let outdir = self.config.output_dir.as_path();
        let report_path = self.config.report_path();
        fs::create_dir_all(outdir)?;

        let files = discovery::collect_inputs(inputs)?;
        let mut batch = discovery::partition(&files, outdir)?;
        info!(
            "Found {} lidar files and {} summaries",
            batch.lidar.len(),
            batch.json.len()
        );

        let mut lidar_ledger = Ledger::load(outdir, FileCategory::Lidar);
        let mut json_ledger = Ledger::load(outdir, FileCategory::Json);

        let mut files_skipped = 0;
        let carried = if self.config.check_logs {
            let completed: BTreeSet<String> = lidar_ledger
                .stems()
                .into_iter()
                .chain(json_ledger.stems())
                .collect();
            let carried = carry_over(&report_path, &completed)?;

            // Ledgered files are skipped, unless their row was lost
            for ledger in [&lidar_ledger, &json_ledger] {
                let category = ledger.category();
                let files = batch.files(category);
                let mut keep: HashSet<PathBuf> = ledger.pending(files).into_iter().collect();
                let lost: Vec<PathBuf> = files
                    .iter()
                    .filter(|p| ledger.contains(p) && !carried.contains(p))
                    .cloned()
                    .collect();
                if !lost.is_empty() {
                    warn!(
                        "{} files in {} have no report row and will be summarized again",
                        lost.len(),
                        ledger.path().display()
                    );
                }
                keep.extend(lost);

                let before = files.len();
                batch.retain(category, |path| keep.contains(path));
                files_skipped += before - batch.files(category).len();
            }
            carried
        } else {
            CarriedRows::default()
        };
        if files_skipped > 0 {
            info!("Skipping {} files completed by a previous run", files_skipped);
        }

        let mut writer = ReportWriter::create(&report_path, &carried.lines)?;

        let work: Vec<(PathBuf, FileCategory)> = batch
            .lidar
            .iter()
            .map(|p| (p.clone(), FileCategory::Lidar))
            .chain(batch.json.iter().map(|p| (p.clone(), FileCategory::Json)))
            .collect();
        let progress = create_progress_bar(work.len() as u64, self.config.show_progress);

        let options =
            SummarizeOptions::new(self.reader.clone(), outdir, self.config.write_summaries);
        let mut outcomes = Box::pin(summarize_all(work, options, self.config.workers));

        let mut completed_lidar = Vec::new();
        let mut completed_json = Vec::new();
        let mut written_summaries = Vec::new();
        let mut exceptions = Vec::new();

        while let Some(outcome) = outcomes.next().await {
            progress.inc(1);
            match outcome.result {
                Ok(summary) => {
                    writer.write_row(&to_row(&summary))?;
                    debug!("Wrote row for {}", outcome.path.display());
                    written_summaries.extend(outcome.summary_path);
                    match outcome.category {
                        FileCategory::Lidar => completed_lidar.push(outcome.path),
                        FileCategory::Json => completed_json.push(outcome.path),
                    }
                }
                Err(e) => {
                    warn!("Recording exception for {}", outcome.path.display());
                    exceptions.push(ExceptionEntry {
                        path: outcome.path,
                        detail: e.detail(),
                    });
                }
            }
        }
        progress.finish_with_message("Summarization complete");

        writer.finish()?;
        lidar_ledger.record(&completed_lidar)?;
        // Summaries written this run already have their row
        let json_done: Vec<PathBuf> = completed_json
            .iter()
            .chain(&written_summaries)
            .cloned()
            .collect();
        json_ledger.record(&json_done)?;
        let exception_log = report::write_exception_log(&report_path, &exceptions)?;

        let (issues, artifacts) = if self.config.validate {
            let engine = RuleEngine::for_today(&self.config.policy)?;
            let (issues, artifacts) = report::validate_report(&report_path, outdir, &engine)?;
            (Some(issues), artifacts)
        } else {
            (None, ValidationArtifacts::default())
        };

        let stats = ProcessingStats {
            lidar_processed: completed_lidar.len(),
            json_processed: completed_json.len(),
            files_failed: exceptions.len(),
            files_skipped,
            rows_reused: carried.lines.len(),
            report_path,
            processing_time_ms: start_time.elapsed().as_millis(),
        };
        info!(
            "Audit complete: {} processed, {} failed, {} skipped",
            stats.files_processed(),
            stats.files_failed,
            stats.files_skipped
        );

        Ok(BatchOutcome {
            stats,
            exceptions,
            exception_log,
            issues,
            artifacts,
        })
    }
}
