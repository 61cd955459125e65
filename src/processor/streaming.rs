//! Concurrent per-file summarization
//!
//! Each input is summarized on the blocking pool with bounded concurrency;
//! outcomes stream back to a single consumer in completion order.

use crate::adapter::SourceReader;
use crate::constants::SUMMARY_DIR_NAME;
use crate::error::{LaszyError, Result};
use crate::models::{CanonicalSummary, FileCategory};
use crate::summary::{self, extract, load_summary_json};
use futures::stream::{self, Stream, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, error, warn};

/// Result of summarizing one input file
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub category: FileCategory,
    pub result: Result<CanonicalSummary>,
    /// Side-channel summary holding this file's summary, when one was written
    pub summary_path: Option<PathBuf>,
}

/// Options shared by every summarization task
#[derive(Clone)]
pub struct SummarizeOptions {
    pub reader: Arc<dyn SourceReader>,
    /// Side-channel directory for lidar summaries, when enabled
    pub summary_dir: Option<PathBuf>,
}

impl SummarizeOptions {
    pub fn new(reader: Arc<dyn SourceReader>, outdir: &Path, write_summaries: bool) -> Self {
        Self {
            reader,
            summary_dir: write_summaries.then(|| outdir.join(SUMMARY_DIR_NAME)),
        }
    }
}

fn summarize_lidar(
    path: &Path,
    options: &SummarizeOptions,
) -> Result<(CanonicalSummary, Option<PathBuf>)> {
    let parsed = options.reader.open(path).inspect_err(|e| {
        debug!("Adapter failed for {}: {}", path.display(), e);
    })?;
    let summary = extract(&parsed).map_err(|source| LaszyError::Extraction {
        path: path.to_path_buf(),
        source,
    })?;

    let summary_path = match &options.summary_dir {
        Some(dir) => match summary::write_summary_json(dir, &summary) {
            Ok(_) => Some(summary::summary_json_path(dir, &summary)),
            Err(e) => {
                warn!("Could not write summary for {}: {}", path.display(), e);
                None
            }
        },
        None => None,
    };
    Ok((summary, summary_path))
}

/// Summarize one file synchronously
pub fn summarize_file(
    path: &Path,
    category: FileCategory,
    options: &SummarizeOptions,
) -> FileOutcome {
    let (result, summary_path) = match category {
        FileCategory::Lidar => match summarize_lidar(path, options) {
            Ok((summary, summary_path)) => (Ok(summary), summary_path),
            Err(e) => (Err(e), None),
        },
        FileCategory::Json => (load_summary_json(path), None),
    };

    if let Err(e) = &result {
        error!("Failed to summarize {}: {}", path.display(), e);
    }

    FileOutcome {
        path: path.to_path_buf(),
        category,
        result,
        summary_path,
    }
}

/// Summarize files concurrently, at most `workers` at a time
pub fn summarize_all(
    files: Vec<(PathBuf, FileCategory)>,
    options: SummarizeOptions,
    workers: usize,
) -> impl Stream<Item = FileOutcome> {
    stream::iter(files)
        .map(move |(path, category)| {
            let options = options.clone();
            async move {
                let task_path = path.clone();
                match task::spawn_blocking(move || summarize_file(&task_path, category, &options))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("Worker failed on {}: {}", path.display(), e);
                        FileOutcome {
                            path,
                            category,
                            result: Err(LaszyError::Worker(e)),
                            summary_path: None,
                        }
                    }
                }
            }
        })
        .buffer_unordered(workers.max(1))
}
