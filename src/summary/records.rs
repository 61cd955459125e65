//! Summaries of the VLR and EVLR collections.

use crate::constants::records::{
    COPC_HIERARCHY_RECORD_ID, COPC_INFO_RECORD_ID, COPC_USER_ID, GEOTIFF_RECORD_IDS,
    PROJECTION_USER_ID, WKT_RECORD_ID,
};
use crate::models::{RecordSummary, VariableLengthRecord};

/// How a record's payload is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Ordinary record with an opaque payload
    Standard,
    /// COPC info record; payload reported as empty
    CopcInfo,
    /// COPC hierarchy page; identity and size are not reported
    CopcHierarchy,
}

impl RecordKind {
    pub fn of(record: &VariableLengthRecord) -> Self {
        if record.user_id.trim_end_matches('\0') != COPC_USER_ID {
            return RecordKind::Standard;
        }
        match record.record_id {
            COPC_INFO_RECORD_ID => RecordKind::CopcInfo,
            COPC_HIERARCHY_RECORD_ID => RecordKind::CopcHierarchy,
            _ => RecordKind::Standard,
        }
    }

    /// Payload bytes as reported for this kind
    pub fn payload<'a>(&self, record: &'a VariableLengthRecord) -> Option<&'a [u8]> {
        match self {
            RecordKind::Standard => Some(record.data.as_slice()),
            RecordKind::CopcInfo => Some(&[][..]),
            RecordKind::CopcHierarchy => None,
        }
    }

    pub fn summarize(&self, index: usize, record: &VariableLengthRecord) -> RecordSummary {
        let payload = self.payload(record);
        let identity = !matches!(self, RecordKind::CopcHierarchy);

        RecordSummary {
            index,
            user_id: identity.then(|| clean_text(&record.user_id)),
            record_id: identity.then_some(record.record_id),
            record_length: payload.map(<[u8]>::len),
            description: clean_text(&record.description),
            record_data: payload
                .filter(|p| !p.is_empty())
                .and_then(|p| std::str::from_utf8(p).ok())
                .map(clean_text),
        }
    }
}

fn clean_text(text: &str) -> String {
    text.trim_end_matches('\0').to_string()
}

fn is_projection(record: &VariableLengthRecord) -> bool {
    record.user_id.trim_end_matches('\0') == PROJECTION_USER_ID
}

pub fn is_wkt_record(record: &VariableLengthRecord) -> bool {
    is_projection(record) && record.record_id == WKT_RECORD_ID
}

pub fn is_geotiff_record(record: &VariableLengthRecord) -> bool {
    is_projection(record) && GEOTIFF_RECORD_IDS.contains(&record.record_id)
}

pub fn has_wkt_crs(records: &[VariableLengthRecord]) -> bool {
    records.iter().any(is_wkt_record)
}

pub fn has_geotiff_crs(records: &[VariableLengthRecord]) -> bool {
    records.iter().any(is_geotiff_record)
}

/// WKT text of the first WKT record, VLRs before EVLRs
pub fn find_wkt(vlrs: &[VariableLengthRecord], evlrs: &[VariableLengthRecord]) -> Option<String> {
    vlrs.iter()
        .chain(evlrs.iter())
        .find(|r| is_wkt_record(r))
        .map(|r| String::from_utf8_lossy(&r.data).trim_end_matches('\0').to_string())
}

/// Per-record summaries, numbered from 1; `None` for an empty collection
pub fn summarize_collection(records: &[VariableLengthRecord]) -> Option<Vec<RecordSummary>> {
    if records.is_empty() {
        return None;
    }
    Some(
        records
            .iter()
            .enumerate()
            .map(|(i, record)| RecordKind::of(record).summarize(i + 1, record))
            .collect(),
    )
}
