//! The ordered set of checks derived from a validation policy.

use super::rules::Rule;
use crate::config::ValidationPolicy;
use crate::constants::columns::FILENAME;
use crate::error::{LaszyError, Result};
use chrono::NaiveDate;
use regex::Regex;

/// How a check's result shows up in the violation table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// The audited column, holding violation text
    InPlace,
    /// In place, plus the original values of a companion column
    WithCompanion(&'static str),
    /// Only a boolean flag column
    Flag(&'static str),
    /// In place, plus a boolean flag column
    InPlaceWithFlag(&'static str),
    /// A new column named after the check, holding violation text
    Derived,
}

/// One named check over one report column
#[derive(Debug, Clone)]
pub struct Check {
    /// Issue key in the summary
    pub name: &'static str,
    pub column: &'static str,
    pub rule: Rule,
    pub output: Output,
}

impl Check {
    fn new(name: &'static str, column: &'static str, rule: Rule) -> Self {
        Self {
            name,
            column,
            rule,
            output: Output::InPlace,
        }
    }

    fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    /// Every column the check reads or copies
    pub fn input_columns(&self) -> Vec<&'static str> {
        let mut cols = vec![self.column];
        cols.extend(self.rule.extra_columns());
        if let Output::WithCompanion(companion) = self.output {
            cols.push(companion);
        }
        cols
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| LaszyError::Configuration {
        message: format!("invalid pattern '{}': {}", pattern, e),
    })
}

/// Checks in evaluation order
pub fn checks(policy: &ValidationPolicy, today: NaiveDate) -> Result<Vec<Check>> {
    let mut checks = vec![
        Check::new(
            "guid_contract_number",
            "guid_asc",
            Rule::Matches {
                pattern: compile(&policy.contract_number_pattern)?,
                missing: "No GUID found",
            },
        ),
        Check::new(
            "system_id_format",
            "system_id",
            Rule::Matches {
                pattern: compile(&policy.system_id_pattern)?,
                missing: "No System ID found",
            },
        ),
        Check::new(
            "version",
            "version",
            Rule::EqualsText(policy.required_version.clone()),
        ),
        Check::new(
            "point_data_format",
            "point_data_format",
            Rule::EqualsNumber(f64::from(policy.required_point_format)),
        ),
    ];

    if policy.acquisition {
        checks.push(
            Check::new(
                "filename_has_correct_source_id",
                "file_source_id",
                Rule::FilenamePrefix {
                    filename_column: FILENAME,
                },
            )
            .with_output(Output::Derived),
        );
    }

    for axis in ["x_scale", "y_scale", "z_scale"] {
        checks.push(Check::new(axis, axis, Rule::EqualsNumber(policy.required_scale)));
    }
    for axis in ["x_offset", "y_offset", "z_offset"] {
        checks.push(Check::new(axis, axis, Rule::WholeNumber));
    }

    checks.extend([
        Check::new(
            "global_encoding_value",
            "global_encoding",
            Rule::EqualsNumber(f64::from(policy.required_global_encoding)),
        ),
        Check::new("wkt_crs_flag", "wkt_crs", Rule::Flag(true)),
        Check::new("gps_time_flag", "gps_standard_time", Rule::Flag(true)),
        Check::new("synthetic_returns_flag", "synthetic_returns", Rule::Flag(false)),
        Check::new(
            "compd_cs",
            "compd_cs",
            Rule::NonEmpty {
                message: "No compound projection",
            },
        ),
        Check::new(
            "vert_datum",
            "vert_datum",
            Rule::EqualsText(policy.vertical_datum.clone()),
        ),
        Check::new(
            "hz_datum",
            "hz_datum",
            Rule::EqualsText(policy.horizontal_datum.clone()),
        ),
        Check::new(
            "vlr_has_wkt_crs",
            "vlr_has_wkt_crs",
            Rule::EitherFlag {
                other: "evlr_has_wkt_crs",
            },
        )
        .with_output(Output::Flag("no_wkt_found")),
        Check::new(
            "points_in_never_classified",
            "classes",
            Rule::ExcludesClass(i64::from(crate::constants::NEVER_CLASSIFIED)),
        ),
        Check::new(
            "invalid_flightline_numbers",
            "flightline_start",
            Rule::AtLeast(policy.min_flightline as f64),
        )
        .with_output(Output::WithCompanion("flightline_end")),
        Check::new(
            "gps_week_time_found",
            "gps_time_min",
            Rule::BeyondWeekTime(policy.max_week_time),
        ),
        Check::new("synthetic_class_flags", "has_synthetic", Rule::Flag(false)),
        Check::new(
            "invalid_dates_found",
            "date_end",
            Rule::NotFutureDate { today },
        )
        .with_output(Output::InPlaceWithFlag("invalid_dates")),
    ]);

    Ok(checks)
}
