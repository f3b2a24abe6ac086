//! Lowercase hex rendering used in `+CRSM` payloads

use std::fmt::Write;

/// Append one byte as two lowercase hex digits
pub fn push_byte(out: &mut String, byte: u8) {
    // Writing to a String cannot fail
    let _ = write!(out, "{:02x}", byte);
}

/// Append every byte of `data` as lowercase hex
pub fn push_bytes(out: &mut String, data: &[u8]) {
    out.reserve(data.len() * 2);
    for &b in data {
        push_byte(out, b);
    }
}

/// Encode `data` as a lowercase hex string
pub fn encode_lower(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    push_bytes(&mut out, data);
    out
}

/// Decode a hex string (either case) into bytes
///
/// Returns `None` on odd length or a non-hex character.
pub fn decode(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    text.as_bytes()
        .chunks(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16)?;
            let lo = (pair[1] as char).to_digit(16)?;
            Some((hi * 16 + lo) as u8)
        })
        .collect()
}
