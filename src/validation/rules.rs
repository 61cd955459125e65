//! Per-cell validation rules.
//!
//! A rule looks at one report cell (and, for a few rules, sibling cells of
//! the same row) and returns the text to show in the violation table, or
//! `None` when the cell passes.

use crate::constants::GPS_WEEK_TIME_ERR_STR;
use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashMap;

/// Read access to the cells of one report row
pub struct Row<'a> {
    columns: &'a HashMap<String, Vec<String>>,
    index: usize,
}

impl<'a> Row<'a> {
    pub fn new(columns: &'a HashMap<String, Vec<String>>, index: usize) -> Self {
        Self { columns, index }
    }

    /// Cell value; empty when the column is absent
    pub fn get(&self, column: &str) -> &'a str {
        self.columns
            .get(column)
            .and_then(|values| values.get(self.index))
            .map(String::as_str)
            .unwrap_or("")
    }
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

pub fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

/// Integers of a serialized class list such as `[1, 2, 6]`
pub fn parse_classes(value: &str) -> Vec<i64> {
    value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .filter_map(|v| v.trim().parse::<i64>().ok())
        .collect()
}

#[derive(Debug, Clone)]
pub enum Rule {
    /// Regex found in the value; empty value reported with `missing`
    Matches { pattern: Regex, missing: &'static str },
    /// Value must be non-empty
    NonEmpty { message: &'static str },
    EqualsText(String),
    EqualsNumber(f64),
    WholeNumber,
    Flag(bool),
    /// Class list must not contain this class
    ExcludesClass(i64),
    /// Value must be at least this
    AtLeast(f64),
    /// Magnitude must exceed this; smaller timestamps are seconds-of-week
    BeyondWeekTime(f64),
    /// Date must not be the conversion sentinel or later than `today`
    NotFutureDate { today: NaiveDate },
    /// Filename prefix before `_` must be the value
    FilenamePrefix { filename_column: &'static str },
    /// Fails when neither this flag nor the `other` flag is set
    EitherFlag { other: &'static str },
}

impl Rule {
    /// Additional columns this rule reads
    pub fn extra_columns(&self) -> Vec<&'static str> {
        match self {
            Rule::FilenamePrefix { filename_column } => vec![*filename_column],
            Rule::EitherFlag { other } => vec![*other],
            _ => Vec::new(),
        }
    }

    /// Violation text for a failing cell, `None` for a passing one
    pub fn evaluate(&self, value: &str, row: &Row<'_>) -> Option<String> {
        let fail = || Some(value.to_string());

        match self {
            Rule::Matches { pattern, missing } => {
                if value.is_empty() {
                    Some(missing.to_string())
                } else if pattern.is_match(value) {
                    None
                } else {
                    fail()
                }
            }
            Rule::NonEmpty { message } => value.trim().is_empty().then(|| message.to_string()),
            Rule::EqualsText(expected) => (value != expected).then(|| value.to_string()),
            Rule::EqualsNumber(expected) => match parse_number(value) {
                Some(v) if v == *expected => None,
                _ => fail(),
            },
            Rule::WholeNumber => match parse_number(value) {
                Some(v) if v % 1.0 == 0.0 => None,
                _ => fail(),
            },
            Rule::Flag(expected) => match parse_flag(value) {
                Some(v) if v == *expected => None,
                _ => fail(),
            },
            Rule::ExcludesClass(class) => {
                parse_classes(value).contains(class).then(|| value.to_string())
            }
            Rule::AtLeast(min) => match parse_number(value) {
                Some(v) if v >= *min => None,
                _ => fail(),
            },
            Rule::BeyondWeekTime(limit) => match parse_number(value) {
                Some(v) if v.abs() > *limit => None,
                _ => fail(),
            },
            Rule::NotFutureDate { today } => {
                if value == GPS_WEEK_TIME_ERR_STR {
                    return fail();
                }
                let day = value.split_whitespace().next().unwrap_or("");
                match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
                    Ok(date) if date <= *today => None,
                    _ => fail(),
                }
            }
            Rule::FilenamePrefix { filename_column } => {
                let filename = row.get(filename_column);
                let prefix = filename.split('_').next().unwrap_or("");
                (prefix != value.trim())
                    .then(|| "Filename does not contain File Source ID".to_string())
            }
            Rule::EitherFlag { other } => {
                let here = parse_flag(value).unwrap_or(false);
                let there = parse_flag(row.get(other)).unwrap_or(false);
                (!here && !there).then(|| "True".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_row() -> (HashMap<String, Vec<String>>, usize) {
        (HashMap::new(), 0)
    }

    fn eval(rule: &Rule, value: &str) -> Option<String> {
        let (cols, i) = empty_row();
        rule.evaluate(value, &Row::new(&cols, i))
    }

    #[test]
    fn test_pattern_rule() {
        let rule = Rule::Matches {
            pattern: Regex::new(r"\d{4}-\d{3,4}").unwrap(),
            missing: "No GUID found",
        };
        assert_eq!(eval(&rule, ""), Some("No GUID found".to_string()));
        assert_eq!(eval(&rule, "Proj2021-123"), None);
        assert_eq!(eval(&rule, "nothing"), Some("nothing".to_string()));
    }

    #[test]
    fn test_numeric_rules() {
        assert_eq!(eval(&Rule::EqualsNumber(0.01), "0.01"), None);
        assert_eq!(
            eval(&Rule::EqualsNumber(0.01), "0.02"),
            Some("0.02".to_string())
        );
        assert!(eval(&Rule::EqualsNumber(6.0), "six").is_some());

        assert_eq!(eval(&Rule::WholeNumber, "5000"), None);
        assert_eq!(eval(&Rule::WholeNumber, "-12.0"), None);
        assert_eq!(eval(&Rule::WholeNumber, "5000.5"), Some("5000.5".to_string()));

        assert_eq!(eval(&Rule::AtLeast(1.0), "1"), None);
        assert_eq!(eval(&Rule::AtLeast(1.0), "0"), Some("0".to_string()));

        let week = Rule::BeyondWeekTime(604_800.0);
        assert_eq!(eval(&week, "604801"), None);
        assert_eq!(eval(&week, "604800"), Some("604800".to_string()));
        assert_eq!(eval(&week, "-604800"), Some("-604800".to_string()));
        // Adjusted standard time before the 2011 reference is negative
        assert_eq!(eval(&week, "-30000000"), None);
    }

    #[test]
    fn test_flag_rules() {
        assert_eq!(eval(&Rule::Flag(true), "True"), None);
        assert_eq!(eval(&Rule::Flag(true), "false"), Some("false".to_string()));
        assert_eq!(eval(&Rule::Flag(false), "False"), None);
        assert!(eval(&Rule::Flag(false), "maybe").is_some());
    }

    #[test]
    fn test_class_rule() {
        assert_eq!(parse_classes("[0, 1, 2]"), vec![0, 1, 2]);
        assert_eq!(
            eval(&Rule::ExcludesClass(0), "[0, 2]"),
            Some("[0, 2]".to_string())
        );
        assert_eq!(eval(&Rule::ExcludesClass(0), "[1, 2, 10]"), None);
    }

    #[test]
    fn test_date_rule() {
        let rule = Rule::NotFutureDate {
            today: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        };
        assert_eq!(eval(&rule, "2024-06-01 23:59:59"), None);
        assert_eq!(
            eval(&rule, "2024-06-02 00:00:00"),
            Some("2024-06-02 00:00:00".to_string())
        );
        assert_eq!(
            eval(&rule, "GpsDateConversionError"),
            Some("GpsDateConversionError".to_string())
        );
    }

    #[test]
    fn test_row_rules() {
        let mut cols = HashMap::new();
        cols.insert(
            "filename".to_string(),
            vec!["12_tile.laz".to_string(), "13_tile.laz".to_string()],
        );
        cols.insert(
            "evlr_has_wkt_crs".to_string(),
            vec!["False".to_string(), "True".to_string()],
        );

        let prefix = Rule::FilenamePrefix {
            filename_column: "filename",
        };
        assert_eq!(prefix.evaluate("12", &Row::new(&cols, 0)), None);
        assert_eq!(
            prefix.evaluate("12", &Row::new(&cols, 1)),
            Some("Filename does not contain File Source ID".to_string())
        );

        let wkt = Rule::EitherFlag {
            other: "evlr_has_wkt_crs",
        };
        assert_eq!(
            wkt.evaluate("False", &Row::new(&cols, 0)),
            Some("True".to_string())
        );
        assert_eq!(wkt.evaluate("False", &Row::new(&cols, 1)), None);
        assert_eq!(wkt.evaluate("True", &Row::new(&cols, 0)), None);
    }
}
