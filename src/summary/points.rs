//! Point-record statistics and GPS time handling.

use crate::constants::{
    ADJUSTED_STANDARD_GPS_OFFSET, GPS_EPOCH_UNIX, GPS_UTC_LEAP_SECONDS, GPS_WEEK_TIME_ERR_STR,
    MAX_GPS_WEEK_TIME, POINT_DATE_FORMAT, class_flags, has_class_flags,
};
use crate::error::ExtractionError;
use crate::models::{ClassFlags, PointRecordSummary, PointRecords};
use chrono::DateTime;
use std::collections::BTreeSet;

/// Whether a timestamp is seconds-of-week rather than adjusted standard time
pub fn is_week_time(gps_time: f64) -> bool {
    gps_time.abs() <= MAX_GPS_WEEK_TIME
}

/// Adjusted standard GPS time to a UTC calendar string
pub fn gps_to_date(gps_time: f64) -> Option<String> {
    let gps_seconds = gps_time + ADJUSTED_STANDARD_GPS_OFFSET;
    let unix = gps_seconds.floor() as i64 + GPS_EPOCH_UNIX - GPS_UTC_LEAP_SECONDS;
    DateTime::from_timestamp(unix, 0).map(|dt| dt.format(POINT_DATE_FORMAT).to_string())
}

/// Date string for a timestamp, or the week-time sentinel
pub fn date_field(gps_time: f64) -> String {
    if is_week_time(gps_time) {
        return GPS_WEEK_TIME_ERR_STR.to_string();
    }
    gps_to_date(gps_time).unwrap_or_else(|| GPS_WEEK_TIME_ERR_STR.to_string())
}

/// "Set on at least one point" for each classification flag
pub fn class_flags_present(flags: &[u8]) -> ClassFlags {
    let any = flags.iter().fold(0u8, |acc, f| acc | f);
    ClassFlags {
        has_synthetic: any & class_flags::SYNTHETIC != 0,
        has_keypoint: any & class_flags::KEYPOINT != 0,
        has_withheld: any & class_flags::WITHHELD != 0,
        has_overlap: any & class_flags::OVERLAP != 0,
    }
}

fn min_max<T: Copy + PartialOrd>(values: &[T]) -> Option<(T, T)> {
    let first = *values.first()?;
    Some(values.iter().fold((first, first), |(lo, hi), &v| {
        (
            if v < lo { v } else { lo },
            if v > hi { v } else { hi },
        )
    }))
}

/// Statistics over the point arrays; `None` when there are no points
pub fn summarize_points(
    points: &PointRecords,
    point_format: u8,
) -> Result<Option<PointRecordSummary>, ExtractionError> {
    let n = points.len();
    let lengths = [
        points.class_flags.len(),
        points.return_number.len(),
        points.gps_time.len(),
        points.point_source_id.len(),
    ];
    if lengths.iter().any(|&len| len != n) {
        return Err(ExtractionError::Other(format!(
            "point arrays have unequal lengths ({} classifications vs {:?})",
            n, lengths
        )));
    }

    let Some((gps_min, gps_max)) = min_max(&points.gps_time) else {
        return Ok(None);
    };
    if !gps_min.is_finite() || !gps_max.is_finite() {
        return Err(ExtractionError::Other(
            "non-finite GPS time in point records".to_string(),
        ));
    }
    let (fl_min, fl_max) = min_max(&points.point_source_id).unwrap_or((0, 0));

    let classes: BTreeSet<u8> = points.classification.iter().copied().collect();

    Ok(Some(PointRecordSummary {
        classes: classes.into_iter().collect(),
        gps_time_min: gps_min,
        gps_time_max: gps_max,
        date_start: date_field(gps_min),
        date_end: date_field(gps_max),
        flightline_start: fl_min,
        flightline_end: fl_max,
        class_flags: has_class_flags(point_format).then(|| class_flags_present(&points.class_flags)),
    }))
}
