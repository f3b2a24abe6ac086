//! `+CRSM:` response rendering
//!
//! Every successful answer carries the two status words returned by the
//! card and, for commands that produce data, the payload as lowercase hex:
//!
//! ```text
//! +CRSM: 144,0,416e64726f6964ff...
//! +CRSM: 148,4
//! ```

use std::fmt;

use crate::hex;

/// Marker that starts every restricted SIM access answer
pub const RESPONSE_MARKER: &str = "+CRSM: ";

/// SW1/SW2 status word pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusWord {
    pub sw1: u8,
    pub sw2: u8,
}

impl StatusWord {
    /// Normal ending of the command (0x90 0x00)
    pub const OK: StatusWord = StatusWord::new(0x90, 0x00);
    /// File ID not found (0x94 0x04)
    pub const FILE_NOT_FOUND: StatusWord = StatusWord::new(0x94, 0x04);
    /// Access condition not fulfilled, CHV verification required (0x98 0x04)
    pub const ACCESS_CONDITION_NOT_FULFILLED: StatusWord = StatusWord::new(0x98, 0x04);

    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self { sw1, sw2 }
    }

    /// Returns true for a normal ending
    pub fn is_success(&self) -> bool {
        self.sw1 == 0x90
    }
}

/// A rendered-on-demand `+CRSM:` answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrsmResponse {
    pub status: StatusWord,
    /// Payload as it goes on the wire (hex digits)
    pub payload: Option<String>,
}

impl CrsmResponse {
    /// Answer carrying only status words
    pub fn status(status: StatusWord) -> Self {
        Self {
            status,
            payload: None,
        }
    }

    /// Answer carrying `data` encoded as hex
    pub fn with_payload(status: StatusWord, data: &[u8]) -> Self {
        Self {
            status,
            payload: Some(hex::encode_lower(data)),
        }
    }

    /// Answer carrying a payload that is already hex text
    pub fn with_hex(status: StatusWord, payload: impl Into<String>) -> Self {
        Self {
            status,
            payload: Some(payload.into()),
        }
    }
}

impl fmt::Display for CrsmResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{},{}", RESPONSE_MARKER, self.status.sw1, self.status.sw2)?;
        if let Some(payload) = &self.payload {
            write!(f, ",{}", payload)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_with_payload() {
        let resp = CrsmResponse::with_payload(StatusWord::OK, &[0x02, 0x33]);
        assert_eq!(resp.to_string(), "+CRSM: 144,0,0233");
    }

    #[test]
    fn test_render_status_only() {
        let resp = CrsmResponse::status(StatusWord::FILE_NOT_FOUND);
        assert_eq!(resp.to_string(), "+CRSM: 148,4");

        let resp = CrsmResponse::status(StatusWord::ACCESS_CONDITION_NOT_FULFILLED);
        assert_eq!(resp.to_string(), "+CRSM: 152,4");
    }

    #[test]
    fn test_is_success() {
        assert!(StatusWord::OK.is_success());
        assert!(!StatusWord::FILE_NOT_FOUND.is_success());
    }
}
