//! Report table writer
//!
//! A single writer owns the report file for the whole run. It starts from the
//! header (plus any rows carried over from a previous run) and appends one
//! serialized line per summarized file.

use crate::constants::{FIELD_SEPARATOR, columns};
use crate::error::Result;
use crate::summary::to_line;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Split table text into records, honouring quoted line breaks
fn split_records(text: &str) -> Vec<&str> {
    let mut records = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (i, ch) in text.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '\n' if !in_quotes => {
                let record = text[start..i].trim_end_matches('\r');
                if !record.is_empty() {
                    records.push(record);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = text[start..].trim_end_matches('\r');
    if !tail.is_empty() {
        records.push(tail);
    }
    records
}

/// First field of a serialized record, unquoted
fn first_field(record: &str) -> String {
    if let Some(rest) = record.strip_prefix('"') {
        let mut out = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    out.push('"');
                    chars.next();
                } else {
                    break;
                }
            } else {
                out.push(ch);
            }
        }
        out
    } else {
        record
            .split(FIELD_SEPARATOR)
            .next()
            .unwrap_or_default()
            .to_string()
    }
}

fn stem_of(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string())
}

/// Rows of an existing report worth keeping
#[derive(Debug, Default)]
pub struct CarriedRows {
    pub lines: Vec<String>,
    /// Stems of the filenames of the carried rows
    pub stems: BTreeSet<String>,
}

impl CarriedRows {
    /// Whether a row for this input (by file stem) is carried
    pub fn contains(&self, input: &Path) -> bool {
        input
            .file_stem()
            .is_some_and(|s| self.stems.contains(s.to_string_lossy().as_ref()))
    }
}

/// Read an existing report and keep the rows whose file stem is in `completed`
///
/// A missing report or one with a different header carries nothing.
pub fn carry_over(report_path: &Path, completed: &BTreeSet<String>) -> Result<CarriedRows> {
    let text = match fs::read_to_string(report_path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CarriedRows::default()),
        Err(e) => return Err(e.into()),
    };

    let records = split_records(&text);
    let Some((header, rows)) = records.split_first() else {
        return Ok(CarriedRows::default());
    };
    if *header != columns::header_line() {
        warn!(
            "Existing report {} has a different layout; starting a new one",
            report_path.display()
        );
        return Ok(CarriedRows::default());
    }

    let mut carried = CarriedRows::default();
    let mut dropped = 0usize;
    for row in rows {
        let stem = stem_of(&first_field(row));
        if completed.contains(&stem) {
            carried.stems.insert(stem);
            carried.lines.push(row.to_string());
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        warn!(
            "Dropped {} rows of {} not backed by a completed ledger entry",
            dropped,
            report_path.display()
        );
    }
    debug!("Carrying over {} report rows", carried.lines.len());
    Ok(carried)
}

/// Writer for the report table
#[derive(Debug)]
pub struct ReportWriter {
    path: PathBuf,
    out: BufWriter<File>,
    rows_written: usize,
}

impl ReportWriter {
    /// Create (truncate) the report and write the header and carried rows
    pub fn create(path: &Path, carried: &[String]) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "{}", columns::header_line())?;
        for line in carried {
            writeln!(out, "{}", line)?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            out,
            rows_written: 0,
        })
    }

    /// Append one row of cells in report column order
    pub fn write_row(&mut self, cells: &[String]) -> Result<()> {
        writeln!(self.out, "{}", to_line(cells))?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered rows and sync the file to disk
    pub fn finish(mut self) -> Result<usize> {
        self.out.flush()?;
        self.out.get_ref().sync_all()?;
        debug!(
            "Report {} complete with {} new rows",
            self.path.display(),
            self.rows_written
        );
        Ok(self.rows_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(filename: &str) -> Vec<String> {
        let mut cells = vec![filename.to_string()];
        cells.extend((1..columns::all().len()).map(|i| format!("v{}", i)));
        cells
    }

    #[test]
    fn test_split_records_respects_quotes() {
        let text = "h1,h2\na,\"x\ny\"\r\nb,c\n";
        assert_eq!(split_records(text), vec!["h1,h2", "a,\"x\ny\"", "b,c"]);
    }

    #[test]
    fn test_first_field() {
        assert_eq!(first_field("a.laz,1,2"), "a.laz");
        assert_eq!(first_field("\"odd, \"\"name\"\".laz\",1"), "odd, \"name\".laz");
    }

    #[test]
    fn test_write_then_carry_over() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("report.csv");

        let mut writer = ReportWriter::create(&path, &[]).unwrap();
        writer.write_row(&row("a.laz")).unwrap();
        writer.write_row(&row("b.laz")).unwrap();
        writer.write_row(&row("c, d.laz")).unwrap();
        assert_eq!(writer.finish().unwrap(), 3);

        let completed: BTreeSet<String> =
            ["a", "c, d"].iter().map(|s| s.to_string()).collect();
        let carried = carry_over(&path, &completed).unwrap();
        assert_eq!(carried.lines.len(), 2);
        assert!(carried.stems.contains("c, d"));
        assert!(!carried.stems.contains("b"));
        assert!(carried.contains(Path::new("/in/a.las")));
        assert!(carried.contains(Path::new("laszy_json/a.json")));
        assert!(!carried.contains(Path::new("/in/b.laz")));

        let writer = ReportWriter::create(&path, &carried.lines).unwrap();
        writer.finish().unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("filename,guid_asc,"));
    }

    #[test]
    fn test_carry_over_missing_or_foreign_report() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.csv");
        let completed: BTreeSet<String> = ["a"].iter().map(|s| s.to_string()).collect();

        assert!(carry_over(&path, &completed).unwrap().lines.is_empty());

        fs::write(&path, "something,else\na.laz,1\n").unwrap();
        assert!(carry_over(&path, &completed).unwrap().lines.is_empty());
    }
}
