//! Error handling for LiDAR audit operations.
//!
//! Per-file failures (`AdapterError`, `ExtractionError`) are recoverable and
//! end up in the exception log. Everything surfaced as `LaszyError` from the
//! report, ledger or artifact writers is fatal for the run.

use crate::constants::CORRUPT_FILE_MSG;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of the external decode collaborator to hand over a parsed file.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Could not open file: {path} - {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not decode file: {path} - {reason}")]
    Decode { path: PathBuf, reason: String },
}

impl AdapterError {
    /// Text written to the exception log for this failure
    pub fn detail(&self) -> String {
        match self {
            AdapterError::Open { source, .. } => source.to_string(),
            AdapterError::Decode { .. } => CORRUPT_FILE_MSG.to_string(),
        }
    }
}

/// Failure while turning a parsed file into a canonical summary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// The public header itself could not be read
    #[error("{}", CORRUPT_FILE_MSG)]
    PossiblyCorrupt,

    /// Any other failure while computing a summary field
    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum LaszyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file could not be parsed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Extraction failed for file: {path} - {source}")]
    Extraction {
        path: PathBuf,
        #[source]
        source: ExtractionError,
    },

    #[error("Invalid summary file: {path} - {reason}")]
    InvalidSummary { path: PathBuf, reason: String },

    #[error("Input not found at path: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Report not found at path: {path}")]
    ReportNotFound { path: PathBuf },

    #[error("Report is missing column: {column}")]
    MissingColumn { column: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl LaszyError {
    /// Text written to the exception log when this error fails one file
    pub fn detail(&self) -> String {
        match self {
            LaszyError::Adapter(e) => e.detail(),
            LaszyError::Extraction { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LaszyError>;
