//! Core data structures for LiDAR auditing.
//!
//! Defines the parsed-file handle handed over by the decode adapter, the
//! canonical per-file summary (and its persisted nested form), file
//! categories and run statistics.

use crate::constants::{JSON_LOG_NAME, LIDAR_LOG_NAME};
use crate::crs::CrsDescription;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// =============================================================================
// Parsed File Handle
// =============================================================================

/// Per-axis triplet as stored in the public header
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Xyz {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Public header block fields exposed by the decode adapter
#[derive(Debug, Clone, PartialEq)]
pub struct PublicHeader {
    pub file_source_id: u16,
    pub global_encoding: u16,
    /// GUID bytes in conventional UUID order, before display reordering
    pub guid: [u8; 16],
    pub system_identifier: String,
    pub generating_software: String,
    pub creation_date: Option<NaiveDate>,
    pub version_major: u8,
    pub version_minor: u8,
    pub point_format: u8,
    pub point_count: u64,
    pub min: Xyz,
    pub max: Xyz,
    pub scale: Xyz,
    pub offset: Xyz,
    pub evlr_count: u32,
}

/// Header-supplementary record (VLR or EVLR)
#[derive(Debug, Clone, PartialEq)]
pub struct VariableLengthRecord {
    pub user_id: String,
    pub record_id: u16,
    pub description: String,
    pub data: Vec<u8>,
}

impl VariableLengthRecord {
    pub fn new(
        user_id: impl Into<String>,
        record_id: u16,
        description: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            record_id,
            description: description.into(),
            data,
        }
    }
}

/// Per-point arrays, all of equal length
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointRecords {
    pub classification: Vec<u8>,
    /// Classification flag bits (see `constants::class_flags`)
    pub class_flags: Vec<u8>,
    pub return_number: Vec<u8>,
    pub gps_time: Vec<f64>,
    pub point_source_id: Vec<u16>,
}

impl PointRecords {
    pub fn len(&self) -> usize {
        self.classification.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classification.is_empty()
    }
}

/// Parsed-file handle produced by a `SourceReader`
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub path: PathBuf,
    /// `None` when the public header itself could not be read
    pub header: Option<PublicHeader>,
    pub vlrs: Vec<VariableLengthRecord>,
    pub evlrs: Vec<VariableLengthRecord>,
    /// `None` when point data was not loaded
    pub points: Option<PointRecords>,
}

impl ParsedFile {
    /// Base name of the source file
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

// =============================================================================
// Canonical Summary
// =============================================================================

/// Decoded global encoding bit field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalEncoding {
    pub global_encoding: u16,
    pub gps_standard_time: bool,
    pub waveform_internal_packets: bool,
    pub waveform_external_packets: bool,
    pub synthetic_returns: bool,
    pub wkt_crs: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicHeaderSummary {
    pub global_encoding: GlobalEncoding,
    pub guid_asc: String,
    pub guid_hex: String,
    pub file_source_id: u16,
    pub system_id: String,
    pub generating_software: String,
    pub creation_date: String,
    pub version: String,
    pub point_data_format: u8,
    pub point_count: u64,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
    pub x_scale: f64,
    pub y_scale: f64,
    pub z_scale: f64,
    pub x_offset: f64,
    pub y_offset: f64,
    pub z_offset: f64,
}

/// One record of a primary or extension collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordSummary {
    pub index: usize,
    pub user_id: Option<String>,
    pub record_id: Option<u16>,
    pub record_length: Option<usize>,
    pub description: String,
    /// Payload as text, when it decodes as text
    pub record_data: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VlrSummary {
    pub vlr_count: usize,
    pub vlr_has_wkt_crs: bool,
    pub vlr_has_geotiff_crs: bool,
    #[serde(default)]
    pub records: Option<Vec<RecordSummary>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvlrSummary {
    pub evlr_count: usize,
    pub evlr_has_wkt_crs: bool,
    pub evlr_has_geotiff_crs: bool,
    #[serde(default)]
    pub records: Option<Vec<RecordSummary>>,
}

/// "Is this flag set on at least one point"
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassFlags {
    pub has_synthetic: bool,
    pub has_keypoint: bool,
    pub has_withheld: bool,
    pub has_overlap: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointRecordSummary {
    pub classes: Vec<u8>,
    pub gps_time_min: f64,
    pub gps_time_max: f64,
    pub date_start: String,
    pub date_end: String,
    pub flightline_start: u16,
    pub flightline_end: u16,
    /// `None` for point formats without classification flags
    pub class_flags: Option<ClassFlags>,
}

/// Canonical flat record for one audited file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSummary {
    pub filename: String,
    pub public_header_block: PublicHeaderSummary,
    pub crs: CrsDescription,
    pub vlrs: VlrSummary,
    /// `None` when point data was not loaded
    pub point_records: Option<PointRecordSummary>,
    pub evlrs: EvlrSummary,
    pub rgb_encoding: bool,
    pub wkt_bbox: String,
}

// =============================================================================
// Batch Types
// =============================================================================

/// Input file category; each category has its own ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    /// Raw LAS/LAZ file decoded through the adapter
    Lidar,
    /// Pre-computed structured summary
    Json,
}

impl FileCategory {
    /// Detect the category from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "las" | "laz" => Some(FileCategory::Lidar),
            "json" => Some(FileCategory::Json),
            _ => None,
        }
    }

    /// Ledger file name for this category
    pub fn log_name(&self) -> &'static str {
        match self {
            FileCategory::Lidar => LIDAR_LOG_NAME,
            FileCategory::Json => JSON_LOG_NAME,
        }
    }
}

/// A file that could not be summarized
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionEntry {
    pub path: PathBuf,
    pub detail: String,
}

/// Processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub lidar_processed: usize,
    pub json_processed: usize,
    pub files_failed: usize,
    pub files_skipped: usize,
    pub rows_reused: usize,
    pub report_path: PathBuf,
    pub processing_time_ms: u128,
}

impl ProcessingStats {
    pub fn files_processed(&self) -> usize {
        self.lidar_processed + self.json_processed
    }
}
