//! Flattening of a canonical summary into one report row.

use crate::constants::{FIELD_SEPARATOR, NOT_APPLICABLE, columns};
use crate::models::CanonicalSummary;

fn flag(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

fn na(count: usize) -> impl Iterator<Item = String> {
    std::iter::repeat_n(NOT_APPLICABLE.to_string(), count)
}

/// Row cells in report column order
pub fn to_row(summary: &CanonicalSummary) -> Vec<String> {
    let hdr = &summary.public_header_block;
    let ge = &hdr.global_encoding;

    let mut row = Vec::with_capacity(columns::all().len());
    row.push(summary.filename.clone());

    row.extend([
        hdr.guid_asc.clone(),
        hdr.guid_hex.clone(),
        hdr.file_source_id.to_string(),
        hdr.system_id.clone(),
        hdr.generating_software.clone(),
        hdr.creation_date.clone(),
        hdr.version.clone(),
        hdr.point_data_format.to_string(),
        hdr.point_count.to_string(),
    ]);
    row.extend(
        [
            hdr.x_min, hdr.x_max, hdr.y_min, hdr.y_max, hdr.z_min, hdr.z_max, hdr.x_scale,
            hdr.y_scale, hdr.z_scale, hdr.x_offset, hdr.y_offset, hdr.z_offset,
        ]
        .iter()
        .map(f64::to_string),
    );

    row.push(ge.global_encoding.to_string());
    row.extend(
        [
            ge.gps_standard_time,
            ge.waveform_internal_packets,
            ge.waveform_external_packets,
            ge.synthetic_returns,
            ge.wkt_crs,
        ]
        .into_iter()
        .map(flag),
    );

    row.extend(summary.crs.values().iter().map(|v| v.to_string()));

    row.push(summary.vlrs.vlr_count.to_string());
    row.push(flag(summary.vlrs.vlr_has_wkt_crs));
    row.push(flag(summary.vlrs.vlr_has_geotiff_crs));

    match &summary.point_records {
        Some(points) => {
            let classes: Vec<String> = points.classes.iter().map(u8::to_string).collect();
            row.extend([
                format!("[{}]", classes.join(", ")),
                points.gps_time_min.to_string(),
                points.gps_time_max.to_string(),
                points.date_start.clone(),
                points.date_end.clone(),
                points.flightline_start.to_string(),
                points.flightline_end.to_string(),
            ]);
            match &points.class_flags {
                Some(flags) => row.extend(
                    [
                        flags.has_synthetic,
                        flags.has_keypoint,
                        flags.has_withheld,
                        flags.has_overlap,
                    ]
                    .into_iter()
                    .map(flag),
                ),
                None => row.extend(na(columns::CLASS_FLAGS.len())),
            }
        }
        None => row.extend(na(columns::POINT_RECORDS.len() + columns::CLASS_FLAGS.len())),
    }

    row.push(summary.evlrs.evlr_count.to_string());
    row.push(flag(summary.evlrs.evlr_has_wkt_crs));
    row.push(flag(summary.evlrs.evlr_has_geotiff_crs));

    row.push(flag(summary.rgb_encoding));
    row.push(summary.wkt_bbox.clone());
    row
}

/// Quote a cell containing the separator, a quote or a line break
pub fn quote_field(value: &str) -> String {
    if value.contains([FIELD_SEPARATOR, '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One serialized table line, without the trailing newline
pub fn to_line(cells: &[String]) -> String {
    cells
        .iter()
        .map(|c| quote_field(c))
        .collect::<Vec<_>>()
        .join(&FIELD_SEPARATOR.to_string())
}
