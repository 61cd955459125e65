//! LiDAR delivery auditing.
//!
//! Summarizes batches of LAS/LAZ files (or previously written summary
//! documents) into one report table, resumes interrupted batches from
//! per-category ledgers, and validates the table against an acquisition
//! policy.

pub mod adapter;
pub mod cli;
pub mod config;
pub mod constants;
pub mod crs;
pub mod error;
pub mod ledger;
pub mod models;
pub mod processor;
pub mod report;
pub mod summary;
pub mod validation;

pub use adapter::{LasReader, SourceReader};
pub use config::{AuditConfig, ValidationPolicy};
pub use error::{AdapterError, ExtractionError, LaszyError, Result};
pub use models::{CanonicalSummary, ExceptionEntry, FileCategory, ParsedFile, ProcessingStats};
pub use processor::{BatchOutcome, ReportAccumulator};
pub use validation::{IssueReport, RuleEngine, ValidationOutcome};
