//! Run artifacts: issue summary, violation table and exception log.

use crate::constants::{EXCEPTIONS_SUFFIX, errors_summary_filename, errors_table_filename};
use crate::error::Result;
use crate::models::ExceptionEntry;
use crate::validation::{self, IssueReport, RuleEngine, ValidationOutcome};
use polars::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Paths of the artifacts written for one validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationArtifacts {
    pub summary_path: Option<PathBuf>,
    pub table_path: Option<PathBuf>,
}

/// `<outdir>/<stem>_errors_summary.json`
pub fn write_issue_summary(outdir: &Path, stem: &str, issues: &IssueReport) -> Result<PathBuf> {
    fs::create_dir_all(outdir)?;
    let path = outdir.join(errors_summary_filename(stem));
    let mut out = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut out, issues)?;
    writeln!(out)?;
    out.flush()?;
    debug!("Wrote issue summary {}", path.display());
    Ok(path)
}

/// `<outdir>/<stem>_errors.csv`
pub fn write_violation_table(outdir: &Path, stem: &str, table: &mut DataFrame) -> Result<PathBuf> {
    fs::create_dir_all(outdir)?;
    let path = outdir.join(errors_table_filename(stem));
    let mut file = File::create(&path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(table)?;
    debug!("Wrote violation table {} ({} rows)", path.display(), table.height());
    Ok(path)
}

/// Write both validation artifacts, or nothing when there are no issues
pub fn write_validation_artifacts(
    outdir: &Path,
    stem: &str,
    outcome: &mut ValidationOutcome,
) -> Result<ValidationArtifacts> {
    if outcome.issues.is_empty() {
        info!("No validation issues found");
        return Ok(ValidationArtifacts::default());
    }
    let summary_path = write_issue_summary(outdir, stem, &outcome.issues)?;
    let table_path = write_violation_table(outdir, stem, &mut outcome.table)?;
    Ok(ValidationArtifacts {
        summary_path: Some(summary_path),
        table_path: Some(table_path),
    })
}

/// Validate a report file and write its artifacts next to `outdir`
///
/// Artifact names derive from the report file stem.
pub fn validate_report(
    report_path: &Path,
    outdir: &Path,
    engine: &RuleEngine,
) -> Result<(IssueReport, ValidationArtifacts)> {
    let df = validation::read_report(report_path)?;
    let mut outcome = engine.validate(&df)?;
    let stem = report_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let artifacts = write_validation_artifacts(outdir, &stem, &mut outcome)?;
    info!(
        "Validated {} rows of {}: {} checks with issues",
        df.height(),
        report_path.display(),
        outcome.issues.len()
    );
    Ok((outcome.issues, artifacts))
}

/// Exception log path for a report: `<report path>_exceptions.log`
pub fn exception_log_path(report_path: &Path) -> PathBuf {
    let mut name = report_path.as_os_str().to_os_string();
    name.push(EXCEPTIONS_SUFFIX);
    PathBuf::from(name)
}

/// Write the exception log; nothing is written for an empty list
pub fn write_exception_log(report_path: &Path, entries: &[ExceptionEntry]) -> Result<Option<PathBuf>> {
    if entries.is_empty() {
        return Ok(None);
    }
    let path = exception_log_path(report_path);
    let mut out = BufWriter::new(File::create(&path)?);
    for entry in entries {
        writeln!(out, "{}", entry.path.display())?;
        writeln!(out, "\t{}", entry.detail)?;
    }
    out.flush()?;
    debug!("Wrote {} exceptions to {}", entries.len(), path.display());
    Ok(Some(path))
}
