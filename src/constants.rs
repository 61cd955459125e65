//! Application constants for the LiDAR audit tool
//!
//! Sentinel strings, ASPRS record constants, artifact file names, default
//! policy values and the fixed column layout of the report table.

// =============================================================================
// Sentinel Values
// =============================================================================

/// Exception-log text for files whose header could not be decoded
pub const CORRUPT_FILE_MSG: &str = "POSSIBLE CORRUPT FILE (Failed to decompress)";

/// Date field value when GPS timestamps are encoded as week time
pub const GPS_WEEK_TIME_ERR_STR: &str = "GpsDateConversionError";

/// ASCII GUID value when the identifier bytes are not valid text
pub const UNICODE_DECODE_ERROR: &str = "UnicodeDecodeError";

/// Cell value for fields that do not apply to a file
pub const NOT_APPLICABLE: &str = "N/A";

// =============================================================================
// GPS Time
// =============================================================================

/// Number of seconds in a GPS week; timestamps at or below this are week time
pub const MAX_GPS_WEEK_TIME: f64 = 604_800.0;

/// Offset subtracted from GPS seconds to form adjusted standard GPS time
pub const ADJUSTED_STANDARD_GPS_OFFSET: f64 = 1_000_000_000.0;

/// Unix timestamp of the GPS epoch (1980-01-06T00:00:00Z)
pub const GPS_EPOCH_UNIX: i64 = 315_964_800;

/// GPS-UTC leap second offset in effect since 2017-01-01
pub const GPS_UTC_LEAP_SECONDS: i64 = 18;

/// Output format for point dates
pub const POINT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// ASPRS Constants
// =============================================================================

/// Global encoding bit positions (LAS 1.4 R15, table 5)
pub mod global_encoding {
    pub const GPS_STANDARD_TIME: u16 = 1 << 0;
    pub const WAVEFORM_INTERNAL: u16 = 1 << 1;
    pub const WAVEFORM_EXTERNAL: u16 = 1 << 2;
    pub const SYNTHETIC_RETURNS: u16 = 1 << 3;
    pub const WKT_CRS: u16 = 1 << 4;
}

/// Classification flag bits for point formats 6-10
pub mod class_flags {
    pub const SYNTHETIC: u8 = 0b0001;
    pub const KEYPOINT: u8 = 0b0010;
    pub const WITHHELD: u8 = 0b0100;
    pub const OVERLAP: u8 = 0b1000;
}

/// Point formats carrying classification flags
pub const CLASS_FLAG_FORMATS: std::ops::RangeInclusive<u8> = 6..=10;

/// Point formats carrying RGB fields
pub const RGB_FORMATS: &[u8] = &[2, 3, 5, 7, 8, 10];

/// The "created, never classified" class code
pub const NEVER_CLASSIFIED: u8 = 0;

/// Record identifiers used for CRS and COPC detection
pub mod records {
    pub const PROJECTION_USER_ID: &str = "LASF_Projection";
    pub const WKT_RECORD_ID: u16 = 2112;
    pub const GEOTIFF_RECORD_IDS: &[u16] = &[34735, 34736, 34737];

    pub const COPC_USER_ID: &str = "copc";
    pub const COPC_INFO_RECORD_ID: u16 = 1;
    pub const COPC_HIERARCHY_RECORD_ID: u16 = 1000;
}

// =============================================================================
// File Names
// =============================================================================

/// Default report table name
pub const DEFAULT_REPORT_NAME: &str = "laszy_report.csv";

/// Ledger of completed primary (LAS/LAZ) files
pub const LIDAR_LOG_NAME: &str = "lidar_completed.log";

/// Ledger of completed pre-computed summary files
pub const JSON_LOG_NAME: &str = "json_completed.log";

/// Sub-directory holding summary side-channel files
pub const SUMMARY_DIR_NAME: &str = "laszy_json";

/// Report table field separator
pub const FIELD_SEPARATOR: char = ',';

/// Suffix of the issue summary artifact
pub const ERRORS_SUMMARY_SUFFIX: &str = "_errors_summary.json";

/// Suffix of the violation table artifact
pub const ERRORS_TABLE_SUFFIX: &str = "_errors.csv";

/// Suffix appended to the report path for the exception log
pub const EXCEPTIONS_SUFFIX: &str = "_exceptions.log";

// =============================================================================
// Policy Defaults
// =============================================================================

/// Contract number expected inside the ASCII GUID
pub const DEFAULT_CONTRACT_NUMBER_PATTERN: &str = r"\d{4}-\d{3,4}";

/// Production system identifier format
pub const DEFAULT_SYSTEM_ID_PATTERN: &str = r"^[A-Za-z0-9]+[-_][A-Za-z0-9]+";

pub const DEFAULT_REQUIRED_VERSION: &str = "1.4";
pub const DEFAULT_REQUIRED_POINT_FORMAT: u8 = 6;
pub const DEFAULT_REQUIRED_SCALE: f64 = 0.01;

/// GPS standard time + WKT CRS
pub const DEFAULT_REQUIRED_GLOBAL_ENCODING: u16 = 17;

pub const DEFAULT_HORIZONTAL_DATUM: &str = "NAD83_Canadian_Spatial_Reference_System";
pub const DEFAULT_VERTICAL_DATUM: &str = "Canadian Geodetic Vertical Datum of 2013";
pub const DEFAULT_MIN_FLIGHTLINE: i64 = 1;

// =============================================================================
// Report Columns
// =============================================================================

/// Report table column names
pub mod columns {
    pub const FILENAME: &str = "filename";

    pub const PUB_HDR: &[&str] = &[
        "guid_asc",
        "guid_hex",
        "file_source_id",
        "system_id",
        "generating_software",
        "creation_date",
        "version",
        "point_data_format",
        "point_count",
        "x_min",
        "x_max",
        "y_min",
        "y_max",
        "z_min",
        "z_max",
        "x_scale",
        "y_scale",
        "z_scale",
        "x_offset",
        "y_offset",
        "z_offset",
    ];

    pub const GLOBAL_ENCODING: &[&str] = &[
        "global_encoding",
        "gps_standard_time",
        "waveform_internal_packets",
        "waveform_external_packets",
        "synthetic_returns",
        "wkt_crs",
    ];

    pub const CRS: &[&str] = &[
        "projection",
        "vert_datum",
        "compd_cs",
        "spheroid",
        "hz_datum",
        "vert_cs",
        "proj_cs",
        "geog_cs",
    ];

    pub const VLR_HDR: &[&str] = &["vlr_count", "vlr_has_wkt_crs", "vlr_has_geotiff_crs"];

    pub const POINT_RECORDS: &[&str] = &[
        "classes",
        "gps_time_min",
        "gps_time_max",
        "date_start",
        "date_end",
        "flightline_start",
        "flightline_end",
    ];

    pub const CLASS_FLAGS: &[&str] = &["has_synthetic", "has_keypoint", "has_withheld", "has_overlap"];

    pub const EVLR_HDR: &[&str] = &["evlr_count", "evlr_has_wkt_crs", "evlr_has_geotiff_crs"];

    pub const RGB_ENCODING: &str = "rgb_encoding";
    pub const WKT_BBOX: &str = "wkt_bbox";

    /// All report columns in output order
    pub fn all() -> Vec<&'static str> {
        let mut out = vec![FILENAME];
        out.extend_from_slice(PUB_HDR);
        out.extend_from_slice(GLOBAL_ENCODING);
        out.extend_from_slice(CRS);
        out.extend_from_slice(VLR_HDR);
        out.extend_from_slice(POINT_RECORDS);
        out.extend_from_slice(CLASS_FLAGS);
        out.extend_from_slice(EVLR_HDR);
        out.push(RGB_ENCODING);
        out.push(WKT_BBOX);
        out
    }

    /// Header line of the report table
    pub fn header_line() -> String {
        all().join(",")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Whether a point format carries classification flags
pub fn has_class_flags(point_format: u8) -> bool {
    CLASS_FLAG_FORMATS.contains(&point_format)
}

/// Whether a point format carries RGB fields
pub fn is_rgb_format(point_format: u8) -> bool {
    RGB_FORMATS.contains(&point_format)
}

/// Name of the issue summary artifact for a report file stem
pub fn errors_summary_filename(report_stem: &str) -> String {
    format!("{}{}", report_stem, ERRORS_SUMMARY_SUFFIX)
}

/// Name of the violation table artifact for a report file stem
pub fn errors_table_filename(report_stem: &str) -> String {
    format!("{}{}", report_stem, ERRORS_TABLE_SUFFIX)
}
