//! Formatting helpers shared by the XML projection and diagnostics.

mod numfmt;

pub use numfmt::{format_general, DOUBLE_PRECISION, SINGLE_PRECISION};

use crate::Result;

/// Converts a `usize` to `u32` for record serialization.
///
/// # Errors
///
/// Returns an error if `value` exceeds `u32::MAX`.
pub fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| malformed_error!("Value {value} exceeds u32::MAX"))
}

/// Format bytes as upper-case hex pairs joined by `", "` (e.g. `"DB, 0A, 7F"`).
#[must_use]
pub fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format an IL offset the way symbol dumps show it (`0x1a`).
#[must_use]
pub fn hex_offset(offset: u32) -> String {
    format!("0x{offset:x}")
}

/// Decode a string of hex digit pairs into bytes.
///
/// Digit case is irrelevant. Returns `None` for an odd number of digits or any
/// character that is not a hex digit.
#[must_use]
pub fn parse_hex_bytes(text: &str) -> Option<Vec<u8>> {
    let digits = text.as_bytes();
    if digits.len() % 2 != 0 {
        return None;
    }

    digits
        .chunks(2)
        .map(|pair| {
            let high = char::from(pair[0]).to_digit(16)?;
            let low = char::from(pair[1]).to_digit(16)?;
            u8::try_from(high * 16 + low).ok()
        })
        .collect()
}

/// Number of UTF-16 code units needed to encode `text`.
#[must_use]
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}
