//! Seam between the audit core and the binary LAS/LAZ decoder.
//!
//! The core only ever sees a `ParsedFile`; anything that can produce one
//! (the `las`-backed reader, or an in-memory double in tests) implements
//! `SourceReader`.

pub mod las_reader;

pub use las_reader::LasReader;

use crate::error::AdapterError;
use crate::models::ParsedFile;
use std::path::Path;

/// Opens a lidar file and hands over its decoded contents
pub trait SourceReader: Send + Sync {
    fn open(&self, path: &Path) -> Result<ParsedFile, AdapterError>;
}
