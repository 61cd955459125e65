//! Coordinate reference system description from WKT.
//!
//! Pulls the named components out of an OGC WKT string (WKT1 keywords, with
//! the WKT2 equivalents accepted) without building a full CRS model.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Named CRS components; empty strings when absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrsDescription {
    pub projection: String,
    pub vert_datum: String,
    pub compd_cs: String,
    pub spheroid: String,
    pub hz_datum: String,
    pub vert_cs: String,
    pub proj_cs: String,
    pub geog_cs: String,
}

fn keyword(alternatives: &str) -> Regex {
    // `\b` keeps DATUM from matching inside VERT_DATUM
    Regex::new(&format!(r#"\b(?:{})\s*[\[(]\s*"([^"]*)""#, alternatives))
        .unwrap_or_else(|e| panic!("invalid built-in WKT pattern {}: {}", alternatives, e))
}

static PROJECTION: LazyLock<Regex> = LazyLock::new(|| keyword("PROJECTION|METHOD"));
static VERT_DATUM: LazyLock<Regex> = LazyLock::new(|| keyword("VERT_DATUM|VDATUM|VERTICALDATUM"));
static COMPD_CS: LazyLock<Regex> = LazyLock::new(|| keyword("COMPD_CS|COMPOUNDCRS"));
static SPHEROID: LazyLock<Regex> = LazyLock::new(|| keyword("SPHEROID|ELLIPSOID"));
static HZ_DATUM: LazyLock<Regex> = LazyLock::new(|| keyword("DATUM|GEODETICDATUM"));
static VERT_CS: LazyLock<Regex> = LazyLock::new(|| keyword("VERT_CS|VERTCRS|VERTICALCRS"));
static PROJ_CS: LazyLock<Regex> = LazyLock::new(|| keyword("PROJCS|PROJCRS|PROJECTEDCRS"));
static GEOG_CS: LazyLock<Regex> =
    LazyLock::new(|| keyword("GEOGCS|GEOGCRS|BASEGEOGCRS|GEOGRAPHICCRS"));

fn first_name(re: &Regex, wkt: &str) -> String {
    re.captures(wkt)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

impl CrsDescription {
    /// Describe a WKT string; an empty or unparseable string yields all-empty fields
    pub fn from_wkt(wkt: &str) -> Self {
        let wkt = wkt.trim_end_matches('\0');
        if wkt.trim().is_empty() {
            return Self::default();
        }

        Self {
            projection: first_name(&PROJECTION, wkt),
            vert_datum: first_name(&VERT_DATUM, wkt),
            compd_cs: first_name(&COMPD_CS, wkt),
            spheroid: first_name(&SPHEROID, wkt),
            hz_datum: first_name(&HZ_DATUM, wkt),
            vert_cs: first_name(&VERT_CS, wkt),
            proj_cs: first_name(&PROJ_CS, wkt),
            geog_cs: first_name(&GEOG_CS, wkt),
        }
    }

    /// Field values in report column order
    pub fn values(&self) -> [&str; 8] {
        [
            &self.projection,
            &self.vert_datum,
            &self.compd_cs,
            &self.spheroid,
            &self.hz_datum,
            &self.vert_cs,
            &self.proj_cs,
            &self.geog_cs,
        ]
    }
}
