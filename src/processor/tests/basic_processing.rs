//! Basic processing integration tests

use super::{accumulator, accumulator_with, fixture, report_rows};
use crate::constants::{JSON_LOG_NAME, LIDAR_LOG_NAME, SUMMARY_DIR_NAME, columns};
use std::fs;
use tempfile::TempDir;

#[tokio::test]
async fn test_batch_writes_one_row_per_file() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out");
    let a = fixture(&temp_dir, "12_a.laz", "0.01");
    let b = fixture(&temp_dir, "12_b.laz", "0.02");

    let outcome = accumulator(&out).run(&[a, b]).await.unwrap();

    assert_eq!(outcome.stats.lidar_processed, 2);
    assert_eq!(outcome.stats.json_processed, 0);
    assert_eq!(outcome.stats.files_failed, 0);
    assert_eq!(outcome.stats.report_path, out.join("laszy_report.csv"));
    assert!(outcome.exception_log.is_none());
    assert!(outcome.issues.is_none());

    let text = fs::read_to_string(&outcome.stats.report_path).unwrap();
    assert_eq!(text.lines().next().unwrap(), columns::header_line());

    let mut rows = report_rows(&outcome.stats.report_path);
    rows.sort();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("12_a.laz,Proj2021-123,"));
    assert!(rows[1].starts_with("12_b.laz,Proj2021-123,"));

    let ledger = fs::read_to_string(out.join(LIDAR_LOG_NAME)).unwrap();
    assert_eq!(ledger.lines().count(), 2);
    assert!(!out.join(JSON_LOG_NAME).exists());
}

#[tokio::test]
async fn test_directory_input_is_walked() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out");
    fixture(&temp_dir, "12_a.laz", "0.01");
    fixture(&temp_dir, "12_b.las", "0.01");
    fixture(&temp_dir, "notes.txt", "ignored");

    let outcome = accumulator(&out)
        .run(&[temp_dir.path().join("input")])
        .await
        .unwrap();
    assert_eq!(outcome.stats.lidar_processed, 2);
    assert_eq!(report_rows(&outcome.stats.report_path).len(), 2);
}

#[tokio::test]
async fn test_validation_reports_only_violated_checks() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out");
    let a = fixture(&temp_dir, "12_a.laz", "0.01");
    let b = fixture(&temp_dir, "12_b.laz", "0.02");

    let outcome = accumulator_with(&out, |c| c.with_validate(true))
        .run(&[a, b])
        .await
        .unwrap();

    let issues = outcome.issues.unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues.get("x_scale"), Some(1));

    let summary_path = outcome.artifacts.summary_path.unwrap();
    assert_eq!(summary_path, out.join("laszy_report_errors_summary.json"));
    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(summary_path).unwrap()).unwrap();
    assert_eq!(summary, serde_json::json!({ "x_scale": 1 }));

    let table = fs::read_to_string(outcome.artifacts.table_path.unwrap()).unwrap();
    assert_eq!(table.lines().next(), Some("filename,x_scale"));
    assert!(table.contains("12_b.laz,0.02"));
}

#[tokio::test]
async fn test_report_name_without_extension() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out");
    let a = fixture(&temp_dir, "12_a.laz", "0.02");

    let outcome = accumulator_with(&out, |c| c.with_report_name("batch").with_validate(true))
        .run(&[a])
        .await
        .unwrap();

    assert_eq!(outcome.stats.report_path, out.join("batch.csv"));
    assert_eq!(
        outcome.artifacts.summary_path,
        Some(out.join("batch_errors_summary.json"))
    );
    assert_eq!(outcome.artifacts.table_path, Some(out.join("batch_errors.csv")));
}

#[tokio::test]
async fn test_written_summaries_replace_decoding() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out");
    let a = fixture(&temp_dir, "12_a.laz", "0.01");

    accumulator_with(&out, |c| c.with_write_summaries(true))
        .run(std::slice::from_ref(&a))
        .await
        .unwrap();

    let summary = out.join(SUMMARY_DIR_NAME).join("12_a.json");
    assert!(summary.exists());

    // The lidar file now has a summary, so it is loaded instead of decoded
    let outcome = accumulator_with(&out, |c| c.with_check_logs(false))
        .run(&[a])
        .await
        .unwrap();
    assert_eq!(outcome.stats.lidar_processed, 0);
    assert_eq!(outcome.stats.json_processed, 1);

    let rows = report_rows(&outcome.stats.report_path);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].starts_with("12_a.laz,"));
    assert_eq!(
        fs::read_to_string(out.join(JSON_LOG_NAME)).unwrap().lines().count(),
        1
    );
}

#[tokio::test]
async fn test_precomputed_summary_input() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("out");
    let a = fixture(&temp_dir, "12_a.laz", "0.01");

    // Produce a summary document through a first run
    accumulator_with(&temp_dir.path().join("first"), |c| c.with_write_summaries(true))
        .run(&[a])
        .await
        .unwrap();
    let json = temp_dir
        .path()
        .join("first")
        .join(SUMMARY_DIR_NAME)
        .join("12_a.json");

    let outcome = accumulator(&out).run(&[json]).await.unwrap();
    assert_eq!(outcome.stats.json_processed, 1);
    let rows = report_rows(&outcome.stats.report_path);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].starts_with("12_a.laz,Proj2021-123,"));
}
