//! Configuration management and validation policy.
//!
//! Provides the run configuration for an audit batch and the organizational
//! policy values the rule engine checks against. Both load from TOML and
//! fall back to built-in defaults.

use crate::constants::{
    DEFAULT_CONTRACT_NUMBER_PATTERN, DEFAULT_HORIZONTAL_DATUM, DEFAULT_MIN_FLIGHTLINE,
    DEFAULT_REPORT_NAME, DEFAULT_REQUIRED_GLOBAL_ENCODING, DEFAULT_REQUIRED_POINT_FORMAT,
    DEFAULT_REQUIRED_SCALE, DEFAULT_REQUIRED_VERSION, DEFAULT_SYSTEM_ID_PATTERN,
    DEFAULT_VERTICAL_DATUM, MAX_GPS_WEEK_TIME,
};
use crate::error::{LaszyError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Organizational policy values checked by the rule engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Regex searched for inside the ASCII GUID
    pub contract_number_pattern: String,

    /// Regex the system identifier must match
    pub system_id_pattern: String,

    pub required_version: String,
    pub required_point_format: u8,

    /// Required x/y/z scale factor
    pub required_scale: f64,

    /// Required global encoding bitmask
    pub required_global_encoding: u16,

    pub horizontal_datum: String,
    pub vertical_datum: String,

    /// Lowest valid flightline (point source) id
    pub min_flightline: i64,

    /// Timestamps at or below this are GPS week time
    pub max_week_time: f64,

    /// Enables acquisition-only checks (filename carries the file source id)
    pub acquisition: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            contract_number_pattern: DEFAULT_CONTRACT_NUMBER_PATTERN.to_string(),
            system_id_pattern: DEFAULT_SYSTEM_ID_PATTERN.to_string(),
            required_version: DEFAULT_REQUIRED_VERSION.to_string(),
            required_point_format: DEFAULT_REQUIRED_POINT_FORMAT,
            required_scale: DEFAULT_REQUIRED_SCALE,
            required_global_encoding: DEFAULT_REQUIRED_GLOBAL_ENCODING,
            horizontal_datum: DEFAULT_HORIZONTAL_DATUM.to_string(),
            vertical_datum: DEFAULT_VERTICAL_DATUM.to_string(),
            min_flightline: DEFAULT_MIN_FLIGHTLINE,
            max_week_time: MAX_GPS_WEEK_TIME,
            acquisition: false,
        }
    }
}

impl ValidationPolicy {
    pub fn with_acquisition(mut self, acquisition: bool) -> Self {
        self.acquisition = acquisition;
        self
    }

    pub fn with_contract_number_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.contract_number_pattern = pattern.into();
        self
    }
}

/// Global configuration for an audit run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Directory receiving the report, ledgers and artifacts
    pub output_dir: PathBuf,

    /// Report table file name
    pub report_name: String,

    /// Number of concurrent extraction workers
    pub workers: usize,

    /// Skip files already recorded in the ledgers
    pub check_logs: bool,

    /// Persist each extracted summary as `laszy_json/<stem>.json`
    pub write_summaries: bool,

    /// Run the rule engine after the report is complete
    pub validate: bool,

    /// Show progress bars
    pub show_progress: bool,

    pub policy: ValidationPolicy,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            report_name: DEFAULT_REPORT_NAME.to_string(),
            workers: num_cpus::get(),
            check_logs: true,
            write_summaries: false,
            validate: false,
            show_progress: false,
            policy: ValidationPolicy::default(),
        }
    }
}

impl AuditConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: AuditConfig = toml::from_str(&text)?;
        debug!("Loaded configuration from {}", path.display());
        config.validated()
    }

    /// Load an explicit config file, else the per-user one if present, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config_dir>/laszy-audit/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("laszy-audit").join("config.toml"))
    }

    fn validated(self) -> Result<Self> {
        if self.workers == 0 {
            return Err(LaszyError::Configuration {
                message: "workers must be at least 1".to_string(),
            });
        }
        if self.report_name.trim().is_empty() {
            return Err(LaszyError::Configuration {
                message: "report_name must not be empty".to_string(),
            });
        }
        for pattern in [
            &self.policy.contract_number_pattern,
            &self.policy.system_id_pattern,
        ] {
            regex::Regex::new(pattern).map_err(|e| LaszyError::Configuration {
                message: format!("invalid pattern '{}': {}", pattern, e),
            })?;
        }
        Ok(self)
    }

    /// Full path of the report table
    /// Report file under the output directory, always with a `.csv` extension
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(with_csv_extension(&self.report_name))
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_report_name(mut self, name: impl Into<String>) -> Self {
        self.report_name = with_csv_extension(&name.into());
        self
    }

    /// Create configuration with custom worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_check_logs(mut self, check_logs: bool) -> Self {
        self.check_logs = check_logs;
        self
    }

    pub fn with_write_summaries(mut self, write: bool) -> Self {
        self.write_summaries = write;
        self
    }

    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }
}

fn with_csv_extension(name: &str) -> String {
    if name.ends_with(".csv") {
        name.to_string()
    } else {
        format!("{}.csv", name)
    }
}
