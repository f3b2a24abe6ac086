//! `+CRSM` command representation
//!
//! A restricted SIM access command carries five decimal fields:
//!
//! ```text
//! +CRSM=<command>,<fileid>,<P1>,<P2>,<P3>
//! ```
//!
//! `command` is the TS 51.011 instruction byte (176 = READ BINARY, ...),
//! `fileid` the 16-bit EF identifier, and P1..P3 the instruction
//! parameters (offset or record number, mode, length).

use std::fmt;

use crate::error::ParseError;
use crate::EncodeCommand;

/// Marker that starts every restricted SIM access request
pub const COMMAND_MARKER: &str = "+CRSM=";

/// Instruction codes accepted in the `command` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SimCommandCode {
    /// Read a transparent EF
    ReadBinary = 176,
    /// Read one record of a linear fixed or cyclic EF
    ReadRecord = 178,
    /// Fetch the file descriptor of an EF
    GetResponse = 192,
    /// Write a transparent EF
    UpdateBinary = 214,
    /// Write one record of a linear fixed or cyclic EF
    UpdateRecord = 220,
    /// Card status
    Status = 242,
}

impl SimCommandCode {
    /// Returns a human-readable name for the instruction
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadBinary => "READ BINARY",
            Self::ReadRecord => "READ RECORD",
            Self::GetResponse => "GET RESPONSE",
            Self::UpdateBinary => "UPDATE BINARY",
            Self::UpdateRecord => "UPDATE RECORD",
            Self::Status => "STATUS",
        }
    }

    /// Returns true for instructions that return file contents
    pub fn is_read(&self) -> bool {
        matches!(self, Self::ReadBinary | Self::ReadRecord)
    }
}

impl TryFrom<u16> for SimCommandCode {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            176 => Ok(Self::ReadBinary),
            178 => Ok(Self::ReadRecord),
            192 => Ok(Self::GetResponse),
            214 => Ok(Self::UpdateBinary),
            220 => Ok(Self::UpdateRecord),
            242 => Ok(Self::Status),
            other => Err(other),
        }
    }
}

/// A parsed `+CRSM=` request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CrsmCommand {
    /// Raw instruction code (may be one we don't know)
    pub command: u16,
    /// Elementary file identifier
    pub file_id: u16,
    /// P1: offset high byte or record number
    pub p1: u8,
    /// P2: offset low byte or record mode
    pub p2: u8,
    /// P3: length of the expected answer
    pub p3: u8,
}

impl CrsmCommand {
    /// Create a command from its fields
    pub fn new(command: SimCommandCode, file_id: u16, p1: u8, p2: u8, p3: u8) -> Self {
        Self {
            command: command as u16,
            file_id,
            p1,
            p2,
            p3,
        }
    }

    /// Parse the text of a request, including its `+CRSM=` marker
    ///
    /// Each field may be surrounded by spaces; anything else that is not a
    /// decimal number fitting the field width is rejected.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let params = text
            .strip_prefix(COMMAND_MARKER)
            .ok_or_else(|| ParseError::MissingMarker(text.to_string()))?;

        let fields: Vec<&str> = params.split(',').map(str::trim).collect();
        if fields.len() != 5 {
            return Err(ParseError::FieldCount {
                found: fields.len(),
            });
        }

        Ok(Self {
            command: parse_field(fields[0], "command")?,
            file_id: parse_field(fields[1], "file id")?,
            p1: parse_field(fields[2], "P1")?,
            p2: parse_field(fields[3], "P2")?,
            p3: parse_field(fields[4], "P3")?,
        })
    }

    /// The instruction, if it is one we recognize
    pub fn code(&self) -> Option<SimCommandCode> {
        SimCommandCode::try_from(self.command).ok()
    }

    /// Byte offset for READ BINARY (P1 is the high byte, P2 the low byte)
    pub fn offset(&self) -> usize {
        (usize::from(self.p1) << 8) | usize::from(self.p2)
    }
}

impl fmt::Display for CrsmCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{},{},{},{},{}",
            COMMAND_MARKER, self.command, self.file_id, self.p1, self.p2, self.p3
        )
    }
}

impl EncodeCommand for CrsmCommand {
    fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

fn parse_field<T: std::str::FromStr>(value: &str, field: &'static str) -> Result<T, ParseError> {
    // `u8::from_str` accepts a leading '+', the wire format does not
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidNumber {
            field,
            value: value.to_string(),
        });
    }
    value.parse::<T>().map_err(|_| ParseError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}
