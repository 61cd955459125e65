//! Summary extraction: parsed file to canonical summary.
//!
//! `extract` is pure; the side-channel helpers at the bottom persist and
//! reload summaries as JSON documents under `laszy_json/`.

pub mod guid;
pub mod points;
pub mod records;
pub mod row;

pub use row::{to_line, to_row};

use crate::constants::{global_encoding, is_rgb_format};
use crate::crs::CrsDescription;
use crate::error::{ExtractionError, LaszyError, Result};
use crate::models::{
    CanonicalSummary, EvlrSummary, GlobalEncoding, ParsedFile, PublicHeader, PublicHeaderSummary,
    VlrSummary,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Decode the global encoding bit field
pub fn decode_global_encoding(value: u16) -> GlobalEncoding {
    GlobalEncoding {
        global_encoding: value,
        gps_standard_time: value & global_encoding::GPS_STANDARD_TIME != 0,
        waveform_internal_packets: value & global_encoding::WAVEFORM_INTERNAL != 0,
        waveform_external_packets: value & global_encoding::WAVEFORM_EXTERNAL != 0,
        synthetic_returns: value & global_encoding::SYNTHETIC_RETURNS != 0,
        wkt_crs: value & global_encoding::WKT_CRS != 0,
    }
}

/// Decimal places in the textual form of a scale factor
pub fn decimal_places(scale: f64) -> std::result::Result<u32, ExtractionError> {
    if !scale.is_finite() || scale == 0.0 {
        return Err(ExtractionError::Other(format!(
            "invalid scale factor: {}",
            scale
        )));
    }
    let text = scale.to_string();
    Ok(text.split_once('.').map_or(0, |(_, frac)| frac.len() as u32))
}

pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// `POLYGON((xmin ymin, xmin ymax, xmax ymax, xmax ymin, xmin ymin))`
pub fn wkt_bbox(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> String {
    let ll = format!("{} {}", x_min, y_min);
    let ul = format!("{} {}", x_min, y_max);
    let ur = format!("{} {}", x_max, y_max);
    let lr = format!("{} {}", x_max, y_min);
    format!("POLYGON(({}, {}, {}, {}, {}))", ll, ul, ur, lr, ll)
}

fn summarize_header(
    header: &PublicHeader,
) -> std::result::Result<PublicHeaderSummary, ExtractionError> {
    let x_places = decimal_places(header.scale.x)?;
    let y_places = decimal_places(header.scale.y)?;
    let z_places = decimal_places(header.scale.z)?;

    Ok(PublicHeaderSummary {
        global_encoding: decode_global_encoding(header.global_encoding),
        guid_asc: guid::guid_ascii(&header.guid),
        guid_hex: guid::guid_hex(&header.guid),
        file_source_id: header.file_source_id,
        system_id: header.system_identifier.trim_end_matches('\0').to_string(),
        generating_software: header.generating_software.trim_end_matches('\0').to_string(),
        creation_date: header
            .creation_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        version: format!("{}.{}", header.version_major, header.version_minor),
        point_data_format: header.point_format,
        point_count: header.point_count,
        x_min: round_to(header.min.x, x_places),
        x_max: round_to(header.max.x, x_places),
        y_min: round_to(header.min.y, y_places),
        y_max: round_to(header.max.y, y_places),
        z_min: round_to(header.min.z, z_places),
        z_max: round_to(header.max.z, z_places),
        x_scale: header.scale.x,
        y_scale: header.scale.y,
        z_scale: header.scale.z,
        x_offset: round_to(header.offset.x, x_places),
        y_offset: round_to(header.offset.y, y_places),
        z_offset: round_to(header.offset.z, z_places),
    })
}

/// Build the canonical summary of a parsed file
pub fn extract(file: &ParsedFile) -> std::result::Result<CanonicalSummary, ExtractionError> {
    let header = file
        .header
        .as_ref()
        .ok_or(ExtractionError::PossiblyCorrupt)?;

    let public_header_block = summarize_header(header)?;

    let point_records = match &file.points {
        Some(points) if header.point_count > 0 => {
            points::summarize_points(points, header.point_format)?
        }
        _ => None,
    };

    let crs = records::find_wkt(&file.vlrs, &file.evlrs)
        .map(|wkt| CrsDescription::from_wkt(&wkt))
        .unwrap_or_default();

    let wkt_bbox = wkt_bbox(
        public_header_block.x_min,
        public_header_block.y_min,
        public_header_block.x_max,
        public_header_block.y_max,
    );

    Ok(CanonicalSummary {
        filename: file.file_name(),
        public_header_block,
        crs,
        vlrs: VlrSummary {
            vlr_count: file.vlrs.len(),
            vlr_has_wkt_crs: records::has_wkt_crs(&file.vlrs),
            vlr_has_geotiff_crs: records::has_geotiff_crs(&file.vlrs),
            records: records::summarize_collection(&file.vlrs),
        },
        point_records,
        evlrs: EvlrSummary {
            evlr_count: header.evlr_count as usize,
            evlr_has_wkt_crs: records::has_wkt_crs(&file.evlrs),
            evlr_has_geotiff_crs: records::has_geotiff_crs(&file.evlrs),
            records: records::summarize_collection(&file.evlrs),
        },
        rgb_encoding: is_rgb_format(header.point_format),
        wkt_bbox,
    })
}

fn file_stem(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string())
}

/// `<dir>/<stem>.json` for a summary
pub fn summary_json_path(dir: &Path, summary: &CanonicalSummary) -> PathBuf {
    dir.join(format!("{}.json", file_stem(&summary.filename)))
}

/// Write `<dir>/<stem>.json` unless it already exists; returns the path if written
pub fn write_summary_json(dir: &Path, summary: &CanonicalSummary) -> Result<Option<PathBuf>> {
    fs::create_dir_all(dir)?;
    let path = summary_json_path(dir, summary);
    if path.exists() {
        debug!("Summary already present: {}", path.display());
        return Ok(None);
    }

    let json = serde_json::to_string_pretty(summary)?;
    fs::write(&path, json)?;
    debug!("Wrote summary {}", path.display());
    Ok(Some(path))
}

/// Load a pre-computed summary document
pub fn load_summary_json(path: &Path) -> Result<CanonicalSummary> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| LaszyError::InvalidSummary {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
