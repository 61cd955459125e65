//! Validation rule engine over the report table.
//!
//! Every check is folded over the table in order. Checks without violations
//! leave no trace; the others add their columns to the violation table and
//! their counts to the issue report. The filename column is always kept.

pub mod policy;
pub mod rules;

pub use policy::{Check, Output};
pub use rules::Rule;

use self::rules::Row;
use crate::config::ValidationPolicy;
use crate::constants::{NOT_APPLICABLE, columns::FILENAME};
use crate::error::{LaszyError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Placeholder shown for a violating cell that is empty
const EMPTY_CELL: &str = "(empty)";

/// Violation counts per check, in check order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueReport {
    counts: Vec<(String, usize)>,
}

impl IssueReport {
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn get(&self, check: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|(name, _)| name == check)
            .map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }

    fn push(&mut self, check: &str, count: usize) {
        self.counts.push((check.to_string(), count));
    }
}

impl Serialize for IssueReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (name, count) in &self.counts {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

/// Result of validating one report table
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Filename plus the columns of violated checks, rows in input order.
    /// Passing cells of violation text columns are null.
    pub table: DataFrame,
    pub issues: IssueReport,
}

/// Read a report table with every column as text
pub fn read_report(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(LaszyError::ReportNotFound {
            path: path.to_path_buf(),
        });
    }
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    debug!("Read report {} ({} rows)", path.display(), df.height());
    Ok(df)
}

fn column_text(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = df.column(name).map_err(|_| LaszyError::MissingColumn {
        column: name.to_string(),
    })?;
    let series = column.as_materialized_series().cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or("").to_string())
        .collect())
}

fn flag_text(violated: bool) -> String {
    if violated { "True" } else { "False" }.to_string()
}

pub struct RuleEngine {
    checks: Vec<Check>,
}

impl RuleEngine {
    pub fn new(policy: &ValidationPolicy, today: NaiveDate) -> Result<Self> {
        Ok(Self {
            checks: policy::checks(policy, today)?,
        })
    }

    /// Engine evaluating dates against the local calendar day
    pub fn for_today(policy: &ValidationPolicy) -> Result<Self> {
        Self::new(policy, chrono::Local::now().date_naive())
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn validate(&self, df: &DataFrame) -> Result<ValidationOutcome> {
        let mut cells: HashMap<String, Vec<String>> = HashMap::new();
        let mut needed = vec![FILENAME];
        needed.extend(self.checks.iter().flat_map(Check::input_columns));
        for name in needed {
            if !cells.contains_key(name) {
                cells.insert(name.to_string(), column_text(df, name)?);
            }
        }

        let height = df.height();
        let mut out: Vec<Column> = vec![Column::new(FILENAME.into(), cells[FILENAME].clone())];
        let mut issues = IssueReport::default();

        for check in &self.checks {
            let values = &cells[check.column];
            let violations: Vec<Option<String>> = (0..height)
                .map(|i| {
                    let value = values[i].as_str();
                    if value == NOT_APPLICABLE {
                        return None;
                    }
                    check
                        .rule
                        .evaluate(value, &Row::new(&cells, i))
                        .map(|v| if v.is_empty() { EMPTY_CELL.to_string() } else { v })
                })
                .collect();

            let count = violations.iter().filter(|v| v.is_some()).count();
            if count == 0 {
                continue;
            }
            debug!("Check {} found {} violations", check.name, count);
            issues.push(check.name, count);

            let flags: Vec<String> = violations.iter().map(|v| flag_text(v.is_some())).collect();

            let text = violations;
            match check.output {
                Output::InPlace => out.push(Column::new(check.column.into(), text)),
                Output::WithCompanion(companion) => {
                    out.push(Column::new(check.column.into(), text));
                    out.push(Column::new(companion.into(), cells[companion].clone()));
                }
                Output::Flag(flag) => out.push(Column::new(flag.into(), flags)),
                Output::InPlaceWithFlag(flag) => {
                    out.push(Column::new(check.column.into(), text));
                    out.push(Column::new(flag.into(), flags));
                }
                Output::Derived => out.push(Column::new(check.name.into(), text)),
            }
        }

        Ok(ValidationOutcome {
            table: DataFrame::new(out)?,
            issues,
        })
    }
}
