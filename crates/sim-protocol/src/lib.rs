//! Restricted SIM Access Protocol Library
//!
//! This crate provides parsing and encoding for the `AT+CRSM` command
//! dialect that host software uses to read elementary files (EFs) from a
//! GSM/UMTS SIM card:
//!
//! - **Commands**: `+CRSM=<command>,<fileid>,<P1>,<P2>,<P3>` with decimal fields
//! - **Responses**: `+CRSM: <sw1>,<sw2>[,<hex payload>]`
//! - **Records**: dialing-number records with swapped-nibble BCD digits
//!
//! # Architecture
//!
//! The crate knows nothing about card state. It provides:
//! - A streaming line codec that extracts AT command lines from a byte stream
//! - A strict parser from command text to [`CrsmCommand`]
//! - Response rendering with the TS 51.011 status words
//!
//! # Example
//!
//! ```rust
//! use sim_protocol::{CrsmCommand, CrsmResponse, SimCommandCode, StatusWord};
//!
//! let cmd = CrsmCommand::parse("+CRSM=176,28589,0,0,4").unwrap();
//! assert_eq!(cmd.code(), Some(SimCommandCode::ReadBinary));
//! assert_eq!(cmd.file_id, 0x6fad);
//!
//! let resp = CrsmResponse::with_payload(StatusWord::OK, &[0x00, 0x00, 0x00, 0x03]);
//! assert_eq!(resp.to_string(), "+CRSM: 144,0,00000003");
//! ```

pub mod codec;
pub mod command;
pub mod dialing;
pub mod error;
pub mod hex;
pub mod response;

pub use codec::AtLineCodec;
pub use command::{CrsmCommand, SimCommandCode, COMMAND_MARKER};
pub use dialing::DialingNumber;
pub use error::ParseError;
pub use response::{CrsmResponse, StatusWord, RESPONSE_MARKER};

/// Trait for codecs that can parse incoming data streams
pub trait ProtocolCodec {
    /// The command type produced by this codec
    type Command;

    /// Push raw bytes into the codec's buffer
    fn push_bytes(&mut self, data: &[u8]);

    /// Try to extract the next complete command from the buffer
    fn next_command(&mut self) -> Option<Self::Command>;

    /// Try to extract the next complete command along with its raw bytes
    ///
    /// The raw bytes include the line terminator, for tracing what the host
    /// actually sent.
    fn next_command_with_bytes(&mut self) -> Option<(Self::Command, Vec<u8>)>;

    /// Clear the internal buffer
    fn clear(&mut self);
}

/// Trait for commands that can be encoded to their wire text
pub trait EncodeCommand {
    /// Encode this command to its wire format
    fn encode(&self) -> Vec<u8>;
}
