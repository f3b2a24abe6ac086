//! Error types for the emulated SIM card

use sim_protocol::{CrsmResponse, ParseError, StatusWord};
use thiserror::Error;

use crate::file::FileKind;

/// Reply for commands that match nothing
pub const REPLY_BAD_COMMAND: &str = "ERROR: BAD COMMAND";
/// Reply when a descriptor cannot be produced
pub const REPLY_INTERNAL_ERROR: &str = "ERROR: INTERNAL SIM ERROR";
/// Reply when a read asks for more bytes than the file holds
pub const REPLY_LENGTH_TOO_LONG: &str = "ERROR: BINARY LENGTH IS TOO LONG";
/// Reply for instruction codes that are not served
pub const REPLY_UNSUPPORTED: &str = "ERROR: UNSUPPORTED SIM COMMAND";
/// Reply for text that is not a well-formed `+CRSM=` command
pub const REPLY_MALFORMED: &str = "ERROR: MALFORMED SIM COMMAND";

/// Errors that can occur while answering a SIM command
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Command text does not have the expected marker or shape
    #[error("malformed command: {0}")]
    Malformed(#[from] ParseError),

    /// Parameters are well-formed but not valid for the instruction
    #[error("invalid parameters for {instruction}: P1={p1} P2={p2} P3={p3}")]
    InvalidParameters {
        instruction: &'static str,
        p1: u8,
        p2: u8,
        p3: u8,
    },

    /// Instruction code is recognized by shape but not served
    #[error("unsupported command code: {0}")]
    UnsupportedCommand(u16),

    /// Record access is not served for this file
    #[error("record access unsupported for file 0x{0:04x}")]
    RecordAccessUnsupported(u16),

    /// No file or canned answer for this query
    #[error("no answer for {0:?}")]
    NotFound(String),

    /// Record number is zero or past the last record
    #[error("record {record} not found in file 0x{file_id:04x}")]
    RecordNotFound { file_id: u16, record: u8 },

    /// Read extends past the end of the file
    #[error("read of {requested} bytes exceeds file size {available}")]
    LengthTooLong { requested: usize, available: usize },

    /// The file kind has no EF descriptor
    #[error("cannot encode descriptor for {0:?}")]
    Encoding(FileKind),

    /// File needs PIN verification and the card is locked
    #[error("access condition not fulfilled for file 0x{0:04x}")]
    AccessDenied(u16),

    /// Catalog contains the same file id twice
    #[error("duplicate file id: 0x{0:04x}")]
    DuplicateFile(u16),
}

impl SimError {
    /// The reply sent back to the host for this error
    ///
    /// Everything is an `ERROR: ...` line except [`SimError::AccessDenied`],
    /// which a real card reports with status words.
    pub fn reply(&self) -> String {
        let line = match self {
            SimError::Malformed(_) | SimError::InvalidParameters { .. } => REPLY_MALFORMED,
            SimError::UnsupportedCommand(_) | SimError::RecordAccessUnsupported(_) => {
                REPLY_UNSUPPORTED
            }
            SimError::NotFound(_) | SimError::RecordNotFound { .. } => REPLY_BAD_COMMAND,
            SimError::LengthTooLong { .. } => REPLY_LENGTH_TOO_LONG,
            SimError::Encoding(_) | SimError::DuplicateFile(_) => REPLY_INTERNAL_ERROR,
            SimError::AccessDenied(_) => {
                return CrsmResponse::status(StatusWord::ACCESS_CONDITION_NOT_FULFILLED)
                    .to_string();
            }
        };
        line.to_string()
    }
}

/// Errors from administrative changes to the card
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CardError {
    /// Secret is empty or contains something other than decimal digits
    #[error("invalid {what}: must be 1 to {max} decimal digits")]
    InvalidSecret { what: &'static str, max: usize },

    /// The card is blocked for good
    #[error("card is absent")]
    Absent,
}
