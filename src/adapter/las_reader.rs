//! `SourceReader` backed by the `las` crate (LAZ through its `laz` feature).

use super::SourceReader;
use crate::constants::class_flags;
use crate::error::AdapterError;
use crate::models::{ParsedFile, PointRecords, PublicHeader, VariableLengthRecord, Xyz};
use las::{Read, Reader};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Reads LAS/LAZ files from disk
#[derive(Debug, Clone, Default)]
pub struct LasReader;

impl LasReader {
    pub fn new() -> Self {
        Self
    }
}

fn decode_error(path: &Path, reason: impl ToString) -> AdapterError {
    AdapterError::Decode {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn convert_vlr(vlr: &las::Vlr) -> VariableLengthRecord {
    VariableLengthRecord::new(
        vlr.user_id.clone(),
        vlr.record_id,
        vlr.description.clone(),
        vlr.data.clone(),
    )
}

fn convert_header(path: &Path, header: &las::Header) -> Result<PublicHeader, AdapterError> {
    let raw = header.clone().into_raw().map_err(|e| decode_error(path, e))?;
    let point_format = header
        .point_format()
        .to_u8()
        .map_err(|e| decode_error(path, e))?;
    let version = header.version();
    let bounds = header.bounds();
    let transforms = header.transforms();

    Ok(PublicHeader {
        file_source_id: header.file_source_id(),
        global_encoding: raw.global_encoding,
        guid: *uuid::Uuid::from_bytes_le(raw.guid).as_bytes(),
        system_identifier: header.system_identifier().to_string(),
        generating_software: header.generating_software().to_string(),
        creation_date: header.date(),
        version_major: version.major,
        version_minor: version.minor,
        point_format,
        point_count: header.number_of_points(),
        min: Xyz::new(bounds.min.x, bounds.min.y, bounds.min.z),
        max: Xyz::new(bounds.max.x, bounds.max.y, bounds.max.z),
        scale: Xyz::new(transforms.x.scale, transforms.y.scale, transforms.z.scale),
        offset: Xyz::new(transforms.x.offset, transforms.y.offset, transforms.z.offset),
        evlr_count: header.evlrs().len() as u32,
    })
}

fn read_points(path: &Path, reader: &mut Reader) -> Result<PointRecords, AdapterError> {
    let capacity = reader.header().number_of_points() as usize;
    let mut records = PointRecords {
        classification: Vec::with_capacity(capacity),
        class_flags: Vec::with_capacity(capacity),
        return_number: Vec::with_capacity(capacity),
        gps_time: Vec::with_capacity(capacity),
        point_source_id: Vec::with_capacity(capacity),
    };

    for point in reader.points() {
        let point = point.map_err(|e| decode_error(path, e))?;

        let mut flags = 0u8;
        if point.is_synthetic {
            flags |= class_flags::SYNTHETIC;
        }
        if point.is_key_point {
            flags |= class_flags::KEYPOINT;
        }
        if point.is_withheld {
            flags |= class_flags::WITHHELD;
        }
        if point.is_overlap {
            flags |= class_flags::OVERLAP;
        }

        records.classification.push(u8::from(point.classification));
        records.class_flags.push(flags);
        records.return_number.push(point.return_number);
        records.gps_time.push(point.gps_time.unwrap_or(0.0));
        records.point_source_id.push(point.point_source_id);
    }

    Ok(records)
}

impl SourceReader for LasReader {
    fn open(&self, path: &Path) -> Result<ParsedFile, AdapterError> {
        let file = File::open(path).map_err(|source| AdapterError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut reader =
            Reader::new(BufReader::new(file)).map_err(|e| decode_error(path, e))?;
        let header = convert_header(path, reader.header())?;
        let vlrs = reader.header().vlrs().iter().map(convert_vlr).collect();
        let evlrs = reader.header().evlrs().iter().map(convert_vlr).collect();

        let points = Some(read_points(path, &mut reader)?);

        debug!(
            "Decoded {} (format {}, {} points)",
            path.display(),
            header.point_format,
            header.point_count
        );

        Ok(ParsedFile {
            path: path.to_path_buf(),
            header: Some(header),
            vlrs,
            evlrs,
            points,
        })
    }
}
