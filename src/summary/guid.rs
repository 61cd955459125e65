//! Project GUID presentation.
//!
//! Producers store the contract number as text inside the GUID, with the
//! bytes of the fourth group and the head of the fifth group swapped. The
//! reordering below undoes that so both renderings read naturally.

use crate::constants::UNICODE_DECODE_ERROR;

/// Swap bytes 8/9 and 10/11; applying it twice restores the input
pub fn reorder(guid: &[u8; 16]) -> [u8; 16] {
    let mut out = *guid;
    out.swap(8, 9);
    out.swap(10, 11);
    out
}

/// Lowercase hyphenated hex of the reordered bytes (8-4-4-4-12)
pub fn guid_hex(guid: &[u8; 16]) -> String {
    let b = reorder(guid);
    let hex: String = b.iter().map(|byte| format!("{:02x}", byte)).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Reordered bytes read as UTF-8 with NUL padding removed
pub fn guid_ascii(guid: &[u8; 16]) -> String {
    let b = reorder(guid);
    match std::str::from_utf8(&b) {
        Ok(text) => text.replace('\0', ""),
        Err(_) => UNICODE_DECODE_ERROR.to_string(),
    }
}
