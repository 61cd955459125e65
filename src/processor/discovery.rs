//! Input discovery for audit batches
//!
//! Expands directory inputs, partitions files into primary (LAS/LAZ) and
//! pre-computed (JSON) categories, and folds in the summary side-channel
//! directory left behind by earlier runs.

use crate::constants::SUMMARY_DIR_NAME;
use crate::error::{LaszyError, Result};
use crate::models::FileCategory;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Inputs of one run, split by category
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputBatch {
    pub lidar: Vec<PathBuf>,
    pub json: Vec<PathBuf>,
}

impl InputBatch {
    pub fn len(&self) -> usize {
        self.lidar.len() + self.json.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lidar.is_empty() && self.json.is_empty()
    }

    pub fn files(&self, category: FileCategory) -> &[PathBuf] {
        match category {
            FileCategory::Lidar => &self.lidar,
            FileCategory::Json => &self.json,
        }
    }

    pub fn retain(&mut self, category: FileCategory, keep: impl Fn(&Path) -> bool) {
        let files = match category {
            FileCategory::Lidar => &mut self.lidar,
            FileCategory::Json => &mut self.json,
        };
        files.retain(|f| keep(f));
    }
}

fn stem_of(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().to_string())
}

/// Expand inputs: files are kept as given, directories are walked recursively
///
/// A missing path is an error unless it names a lidar or summary file.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry.map_err(|e| LaszyError::Io(e.into()))?;
                if entry.file_type().is_file()
                    && FileCategory::from_path(entry.path()).is_some()
                {
                    files.push(entry.into_path());
                }
            }
        } else if FileCategory::from_path(path).is_some() {
            // Named files that are gone fail per file, at open
            warn!("Input file does not exist: {}", path.display());
            files.push(path.clone());
        } else {
            return Err(LaszyError::InputNotFound { path: path.clone() });
        }
    }

    debug!("Collected {} input files", files.len());
    Ok(files)
}

/// Split inputs by category and apply the side-channel rules
///
/// Summaries already present in `<outdir>/laszy_json` become JSON inputs, and
/// a lidar file whose stem has a JSON input is not decoded again.
pub fn partition(inputs: &[PathBuf], outdir: &Path) -> Result<InputBatch> {
    let mut batch = InputBatch::default();

    for path in inputs {
        match FileCategory::from_path(path) {
            Some(FileCategory::Lidar) => batch.lidar.push(path.clone()),
            Some(FileCategory::Json) => batch.json.push(path.clone()),
            None => warn!("Ignoring unsupported input: {}", path.display()),
        }
    }

    let side_channel = outdir.join(SUMMARY_DIR_NAME);
    if side_channel.is_dir() {
        let pattern = side_channel.join("*.json");
        let pattern = pattern.to_string_lossy();
        let entries = glob::glob(&pattern).map_err(|e| LaszyError::Configuration {
            message: format!("invalid summary directory pattern: {}", e),
        })?;
        for entry in entries {
            match entry {
                Ok(path) => batch.json.push(path),
                Err(e) => warn!("Skipping unreadable summary: {}", e),
            }
        }
    }

    let mut seen = HashSet::new();
    batch.json.retain(|p| seen.insert(p.clone()));

    let json_stems: HashSet<String> = batch.json.iter().filter_map(|p| stem_of(p)).collect();
    let before = batch.lidar.len();
    batch
        .lidar
        .retain(|p| stem_of(p).is_none_or(|stem| !json_stems.contains(&stem)));
    if batch.lidar.len() != before {
        debug!(
            "{} lidar files already have summaries",
            before - batch.lidar.len()
        );
    }

    Ok(batch)
}
