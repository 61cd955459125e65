//! Resume ledgers of completed input files.
//!
//! One ledger per file category, one path per line. The ledger is the source
//! of truth for what a previous run finished; it only ever grows.

use crate::error::Result;
use crate::models::FileCategory;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    category: FileCategory,
    entries: BTreeSet<String>,
}

impl Ledger {
    /// Load `<outdir>/<category log>`; a missing or unreadable ledger is empty
    pub fn load(outdir: &Path, category: FileCategory) -> Self {
        let path = outdir.join(category.log_name());
        let entries = match fs::read_to_string(&path) {
            Ok(text) => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                warn!("Ignoring unreadable ledger {}: {}", path.display(), e);
                BTreeSet::new()
            }
        };
        debug!("Loaded {} entries from {}", entries.len(), path.display());

        Self {
            path,
            category,
            entries,
        }
    }

    pub fn category(&self) -> FileCategory {
        self.category
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, file: &Path) -> bool {
        self.entries.contains(&entry_key(file))
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// File stems of every recorded entry
    pub fn stems(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter_map(|e| Path::new(e).file_stem())
            .map(|s| s.to_string_lossy().to_string())
            .collect()
    }

    /// Inputs not yet recorded, in their original order
    pub fn pending(&self, files: &[PathBuf]) -> Vec<PathBuf> {
        files
            .iter()
            .filter(|f| !self.contains(f))
            .cloned()
            .collect()
    }

    /// Add newly completed files and persist the union atomically
    pub fn record(&mut self, completed: &[PathBuf]) -> Result<()> {
        if completed.is_empty() {
            return Ok(());
        }
        self.entries.extend(completed.iter().map(|f| entry_key(f)));

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        for entry in &self.entries {
            writeln!(tmp, "{}", entry)?;
        }
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(
            "Recorded {} files in {} ({} total)",
            completed.len(),
            self.path.display(),
            self.entries.len()
        );
        Ok(())
    }
}

fn entry_key(file: &Path) -> String {
    file.to_string_lossy().to_string()
}
