//! Integration tests for the processor module
//!
//! Lidar inputs are small text files read by an in-memory `SourceReader`:
//! the file content picks the fixture (a scale factor, or a failure mode).

pub mod basic_processing;

use crate::adapter::SourceReader;
use crate::config::AuditConfig;
use crate::error::AdapterError;
use crate::models::{ParsedFile, PointRecords, PublicHeader, VariableLengthRecord, Xyz};
use crate::processor::ReportAccumulator;
use crate::summary::guid;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const COMPLIANT_WKT: &str = concat!(
    r#"COMPD_CS["NAD83(CSRS) / UTM zone 17N + CGVD2013 height","#,
    r#"PROJCS["NAD83(CSRS) / UTM zone 17N",GEOGCS["NAD83(CSRS)","#,
    r#"DATUM["NAD83_Canadian_Spatial_Reference_System",SPHEROID["GRS 1980",6378137,298.257222101]]],"#,
    r#"PROJECTION["Transverse_Mercator"]],"#,
    r#"VERT_CS["CGVD2013 height",VERT_DATUM["Canadian Geodetic Vertical Datum of 2013",2005]]]"#,
);

/// Stored GUID bytes that render as `Proj2021-123`
pub fn contract_guid() -> [u8; 16] {
    let mut text = [0u8; 16];
    text[..12].copy_from_slice(b"Proj2021-123");
    guid::reorder(&text)
}

/// A parsed file passing every default check, with the given x scale
pub fn compliant_file(path: &Path, x_scale: f64) -> ParsedFile {
    ParsedFile {
        path: path.to_path_buf(),
        header: Some(PublicHeader {
            file_source_id: 12,
            global_encoding: 17,
            guid: contract_guid(),
            system_identifier: "RIEGL_VQ1560".to_string(),
            generating_software: "TerraScan".to_string(),
            creation_date: chrono::NaiveDate::from_ymd_opt(2021, 3, 20),
            version_major: 1,
            version_minor: 4,
            point_format: 6,
            point_count: 2,
            min: Xyz::new(500_000.0, 5_400_000.0, 100.0),
            max: Xyz::new(501_000.0, 5_401_000.0, 200.0),
            scale: Xyz::new(x_scale, 0.01, 0.01),
            offset: Xyz::new(500_000.0, 5_400_000.0, 0.0),
            evlr_count: 0,
        }),
        vlrs: vec![VariableLengthRecord::new(
            "LASF_Projection",
            2112,
            "OGC WKT",
            COMPLIANT_WKT.as_bytes().to_vec(),
        )],
        evlrs: vec![],
        points: Some(PointRecords {
            classification: vec![1, 2],
            class_flags: vec![0, 0],
            return_number: vec![1, 1],
            gps_time: vec![300_000_000.0, 300_000_100.0],
            point_source_id: vec![3, 9],
        }),
    }
}

/// Reader deciding the outcome from the file content
#[derive(Debug, Default)]
pub struct MockReader;

impl SourceReader for MockReader {
    fn open(&self, path: &Path) -> Result<ParsedFile, AdapterError> {
        let text = fs::read_to_string(path).map_err(|source| AdapterError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        match text.trim() {
            "denied" => Err(AdapterError::Open {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
            }),
            "corrupt" => Err(AdapterError::Decode {
                path: path.to_path_buf(),
                reason: "bad laszip chunk table".to_string(),
            }),
            "headerless" => Ok(ParsedFile {
                path: path.to_path_buf(),
                header: None,
                vlrs: vec![],
                evlrs: vec![],
                points: None,
            }),
            scale => Ok(compliant_file(path, scale.parse().unwrap_or(0.01))),
        }
    }
}

/// Write a fixture file under `<temp>/input`
pub fn fixture(temp_dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let dir = temp_dir.path().join("input");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

pub fn accumulator(output_dir: &Path) -> ReportAccumulator {
    accumulator_with(output_dir, |config| config)
}

pub fn accumulator_with(
    output_dir: &Path,
    configure: impl FnOnce(AuditConfig) -> AuditConfig,
) -> ReportAccumulator {
    let config = AuditConfig::default()
        .with_output_dir(output_dir)
        .with_workers(2);
    ReportAccumulator::new(configure(config), Arc::new(MockReader))
}

/// Data lines of the report, header excluded
pub fn report_rows(report: &Path) -> Vec<String> {
    fs::read_to_string(report)
        .unwrap()
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}
