//! End-to-end audit runs through the public API
//!
//! Lidar inputs are small `key=value` text files turned into parsed files by
//! an in-memory reader, so no LAS encoder is needed.

use laszy_audit::constants::{LIDAR_LOG_NAME, NOT_APPLICABLE, columns};
use laszy_audit::models::{ParsedFile, PointRecords, PublicHeader, VariableLengthRecord, Xyz};
use laszy_audit::summary::guid;
use laszy_audit::validation::read_report;
use laszy_audit::{AdapterError, AuditConfig, ReportAccumulator, SourceReader};
use polars::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const WKT: &str = concat!(
    r#"COMPD_CS["NAD83(CSRS) / UTM zone 18N + CGVD2013 height","#,
    r#"PROJCS["NAD83(CSRS) / UTM zone 18N",GEOGCS["NAD83(CSRS)","#,
    r#"DATUM["NAD83_Canadian_Spatial_Reference_System",SPHEROID["GRS 1980",6378137,298.257222101]]],"#,
    r#"PROJECTION["Transverse_Mercator"]],"#,
    r#"VERT_CS["CGVD2013 height",VERT_DATUM["Canadian Geodetic Vertical Datum of 2013",2005]]]"#,
);

/// Builds parsed files from `key=value` lines: `scale`, `format`, `gps`
struct KeyValueReader;

impl SourceReader for KeyValueReader {
    fn open(&self, path: &Path) -> Result<ParsedFile, AdapterError> {
        let text = fs::read_to_string(path).map_err(|source| AdapterError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let fields: HashMap<&str, &str> = text
            .lines()
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.trim(), v.trim()))
            .collect();
        let number = |key: &str, default: f64| {
            fields
                .get(key)
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(default)
        };

        let mut text_guid = [0u8; 16];
        text_guid[..12].copy_from_slice(b"Proj2021-123");
        let scale = number("scale", 0.01);
        let gps = number("gps", 300_000_000.0);

        Ok(ParsedFile {
            path: path.to_path_buf(),
            header: Some(PublicHeader {
                file_source_id: 12,
                global_encoding: 17,
                guid: guid::reorder(&text_guid),
                system_identifier: "RIEGL_VQ1560".to_string(),
                generating_software: "TerraScan".to_string(),
                creation_date: None,
                version_major: 1,
                version_minor: 4,
                point_format: number("format", 6.0) as u8,
                point_count: 3,
                min: Xyz::new(600_000.0, 5_000_000.0, 50.0),
                max: Xyz::new(601_000.0, 5_001_000.0, 90.0),
                scale: Xyz::new(scale, 0.01, 0.01),
                offset: Xyz::new(600_000.0, 5_000_000.0, 0.0),
                evlr_count: 0,
            }),
            vlrs: vec![VariableLengthRecord::new(
                "LASF_Projection",
                2112,
                "OGC WKT",
                WKT.as_bytes().to_vec(),
            )],
            evlrs: vec![],
            points: Some(PointRecords {
                classification: vec![1, 2, 2],
                class_flags: vec![0, 0, 0],
                return_number: vec![1, 1, 2],
                gps_time: vec![gps, gps, gps],
                point_source_id: vec![1, 1, 2],
            }),
        })
    }
}

fn input(temp_dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let dir = temp_dir.path().join("tiles");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn accumulator(out: &Path, validate: bool) -> ReportAccumulator {
    let config = AuditConfig::default()
        .with_output_dir(out)
        .with_workers(3)
        .with_validate(validate);
    ReportAccumulator::new(config, Arc::new(KeyValueReader))
}

/// Report cells of one column keyed by filename
fn report_column(report: &Path, column: &str) -> HashMap<String, String> {
    let df = read_report(report).unwrap();
    let names = df.column("filename").unwrap().as_materialized_series().clone();
    let values = df.column(column).unwrap().as_materialized_series().clone();
    names
        .str()
        .unwrap()
        .into_iter()
        .zip(values.str().unwrap())
        .map(|(n, v)| (n.unwrap_or("").to_string(), v.unwrap_or("").to_string()))
        .collect()
}

#[tokio::test]
async fn test_three_file_batch() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("audit");
    let compliant = input(&temp_dir, "1_compliant.laz", "scale=0.01");
    let coarse = input(&temp_dir, "1_coarse.laz", "scale=0.02");
    let missing = temp_dir.path().join("tiles").join("1_missing.laz");

    let outcome = accumulator(&out, true)
        .run(&[compliant.clone(), coarse.clone(), missing.clone()])
        .await
        .unwrap();

    let report = fs::read_to_string(&outcome.stats.report_path).unwrap();
    assert_eq!(report.lines().count(), 3);
    assert_eq!(report.lines().next().unwrap(), columns::header_line());

    assert_eq!(outcome.exceptions.len(), 1);
    assert_eq!(outcome.exceptions[0].path, missing);
    let log = fs::read_to_string(outcome.exception_log.unwrap()).unwrap();
    assert!(log.starts_with(&format!("{}\n\t", missing.display())));
    assert_eq!(log.lines().count(), 2);

    let issues = outcome.issues.unwrap();
    assert_eq!(serde_json::to_value(&issues).unwrap(), serde_json::json!({ "x_scale": 1 }));

    let table = fs::read_to_string(outcome.artifacts.table_path.unwrap()).unwrap();
    let mut lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.remove(0), "filename,x_scale");
    lines.sort();
    assert_eq!(lines, vec!["1_coarse.laz,0.02", "1_compliant.laz,"]);

    let mut ledger: Vec<String> = fs::read_to_string(out.join(LIDAR_LOG_NAME))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    ledger.sort();
    let mut expected = vec![
        coarse.to_string_lossy().to_string(),
        compliant.to_string_lossy().to_string(),
    ];
    expected.sort();
    assert_eq!(ledger, expected);
}

#[tokio::test]
async fn test_rerun_processes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("audit");
    let inputs = vec![
        input(&temp_dir, "1_a.laz", "scale=0.01"),
        input(&temp_dir, "1_b.laz", "scale=0.01"),
    ];
    let config = AuditConfig::default()
        .with_output_dir(&out)
        .with_write_summaries(true);
    let acc = ReportAccumulator::new(config, Arc::new(KeyValueReader));

    let first = acc.run(&inputs).await.unwrap();
    assert_eq!(first.stats.lidar_processed, 2);

    let second = acc.run(&inputs).await.unwrap();
    assert_eq!(second.stats.lidar_processed, 0);
    assert_eq!(second.stats.json_processed, 0);
    assert_eq!(second.stats.files_skipped, 2);
    assert_eq!(
        fs::read_to_string(&second.stats.report_path)
            .unwrap()
            .lines()
            .count(),
        3
    );
}

#[tokio::test]
async fn test_format_without_class_flags() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("audit");
    let legacy = input(&temp_dir, "1_legacy.laz", "format=1");

    let outcome = accumulator(&out, true).run(&[legacy]).await.unwrap();
    for column in columns::CLASS_FLAGS {
        let cells = report_column(&outcome.stats.report_path, column);
        assert_eq!(cells["1_legacy.laz"], NOT_APPLICABLE);
    }

    let issues = outcome.issues.unwrap();
    assert_eq!(issues.get("point_data_format"), Some(1));
    assert_eq!(issues.get("synthetic_class_flags"), None);
}

#[tokio::test]
async fn test_week_time_boundary() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("audit");
    let week = input(&temp_dir, "1_week.laz", "gps=604800");
    let absolute = input(&temp_dir, "1_absolute.laz", "gps=604801");

    let outcome = accumulator(&out, true).run(&[week, absolute]).await.unwrap();

    let dates = report_column(&outcome.stats.report_path, "date_start");
    assert_eq!(dates["1_week.laz"], "GpsDateConversionError");
    assert_ne!(dates["1_absolute.laz"], "GpsDateConversionError");

    let issues = outcome.issues.unwrap();
    assert_eq!(issues.get("gps_week_time_found"), Some(1));
    assert_eq!(issues.get("invalid_dates_found"), Some(1));

    let table_path = outcome.artifacts.table_path.unwrap();
    let table = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(table_path))
        .unwrap()
        .finish()
        .unwrap();
    let names: Vec<String> = table
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    assert!(names.contains(&"gps_time_min".to_string()));
    assert!(names.contains(&"invalid_dates".to_string()));
    assert!(!names.contains(&"gps_time_max".to_string()));
    assert!(!names.contains(&"x_scale".to_string()));
}
