//! Dialing-number records (EF-ADN layout, TS 31.102 4.4.2.3)
//!
//! MSISDN and mailbox dialing numbers share one record layout:
//!
//! ```text
//! [alpha identifier: X bytes, 0xff padded]
//! [length of BCD number incl. TON/NPI] [TON/NPI]
//! [dialing number: 10 bytes swapped-nibble BCD, 0xf padded]
//! [capability/configuration id] [extension record id]
//! ```
//!
//! Digits are packed two per byte with the first digit in the low nibble,
//! so "15555215554" becomes `51 55 25 51 55 f4`.

use crate::error::ParseError;

/// Bytes reserved for the dialing number itself
pub const NUMBER_BYTES: usize = 10;

/// Bytes that follow the alpha identifier
pub const RECORD_TAIL: usize = 2 + NUMBER_BYTES + 2;

/// Type of number "unknown", ISDN numbering plan
pub const TON_NPI_UNKNOWN: u8 = 0x81;

/// Type of number "international", ISDN numbering plan
pub const TON_NPI_INTERNATIONAL: u8 = 0x91;

/// A phone number with its alpha tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialingNumber {
    /// Alpha identifier shown to the user (may be empty)
    pub alpha: String,
    /// Digits 0-9, `*` and `#`
    pub number: String,
    /// Type of number / numbering plan byte
    pub ton_npi: u8,
}

impl DialingNumber {
    pub fn new(alpha: impl Into<String>, number: impl Into<String>, ton_npi: u8) -> Self {
        Self {
            alpha: alpha.into(),
            number: number.into(),
            ton_npi,
        }
    }

    /// Encode as one record whose alpha identifier occupies `alpha_len` bytes
    ///
    /// Characters outside printable ASCII are stored as `?`.
    pub fn encode_record(&self, alpha_len: usize) -> Result<Vec<u8>, ParseError> {
        if self.alpha.chars().count() > alpha_len {
            return Err(ParseError::TooLong {
                what: "alpha identifier",
                len: self.alpha.chars().count(),
                max: alpha_len,
            });
        }

        let mut record = Vec::with_capacity(alpha_len + RECORD_TAIL);
        record.extend(self.alpha.chars().map(|c| {
            if c.is_ascii_graphic() || c == ' ' {
                c as u8
            } else {
                b'?'
            }
        }));
        record.resize(alpha_len, 0xff);

        if self.number.is_empty() {
            record.resize(alpha_len + RECORD_TAIL, 0xff);
            return Ok(record);
        }

        let bcd = encode_bcd(&self.number)?;
        if bcd.len() > NUMBER_BYTES {
            return Err(ParseError::TooLong {
                what: "dialing number",
                len: self.number.len(),
                max: NUMBER_BYTES * 2,
            });
        }

        record.push(bcd.len() as u8 + 1);
        record.push(self.ton_npi);
        record.extend_from_slice(&bcd);
        record.resize(alpha_len + 2 + NUMBER_BYTES, 0xff);
        // Capability/configuration and extension ids: not used
        record.extend_from_slice(&[0xff, 0xff]);
        Ok(record)
    }
}

/// Pack dialing digits into swapped-nibble BCD, padding an odd count with 0xf
pub fn encode_bcd(digits: &str) -> Result<Vec<u8>, ParseError> {
    let nibbles = digits
        .chars()
        .map(|c| match c {
            '0'..='9' => Ok(c as u8 - b'0'),
            '*' => Ok(0x0a),
            '#' => Ok(0x0b),
            other => Err(ParseError::InvalidDigit(other)),
        })
        .collect::<Result<Vec<u8>, _>>()?;

    Ok(nibbles
        .chunks(2)
        .map(|pair| {
            let low = pair[0];
            let high = pair.get(1).copied().unwrap_or(0x0f);
            (high << 4) | low
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::encode_lower;

    #[test]
    fn test_encode_bcd_odd_length() {
        assert_eq!(
            encode_lower(&encode_bcd("15555215554").unwrap()),
            "5155255155f4"
        );
    }

    #[test]
    fn test_encode_bcd_even_length() {
        assert_eq!(encode_bcd("1234").unwrap(), vec![0x21, 0x43]);
    }

    #[test]
    fn test_encode_bcd_rejects_letters() {
        assert_eq!(encode_bcd("12a"), Err(ParseError::InvalidDigit('a')));
    }

    #[test]
    fn test_mailbox_record() {
        let mbdn = DialingNumber::new("Voicemail", "15552175049", TON_NPI_INTERNATIONAL);
        let record = mbdn.encode_record(18).unwrap();
        assert_eq!(record.len(), 32);
        assert_eq!(
            encode_lower(&record),
            "566f6963656d61696cffffffffffffffffff07915155125740f9ffffffffffff"
        );
    }

    #[test]
    fn test_empty_number_is_all_padding() {
        let record = DialingNumber::new("", "", TON_NPI_UNKNOWN)
            .encode_record(4)
            .unwrap();
        assert_eq!(record, vec![0xff; 4 + RECORD_TAIL]);
    }

    #[test]
    fn test_alpha_too_long() {
        let err = DialingNumber::new("Voicemail", "1", TON_NPI_UNKNOWN)
            .encode_record(4)
            .unwrap_err();
        assert!(matches!(err, ParseError::TooLong { max: 4, .. }));
    }

    #[test]
    fn test_number_too_long() {
        let err = DialingNumber::new("", "1".repeat(21), TON_NPI_UNKNOWN)
            .encode_record(0)
            .unwrap_err();
        assert!(matches!(err, ParseError::TooLong { what: "dialing number", .. }));
    }
}
