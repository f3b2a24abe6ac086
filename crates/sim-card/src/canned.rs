//! Precomputed `+CRSM` answers
//!
//! The table is matched against the full command text, byte for byte, in
//! order. Every entry answers with fixed status words and a fixed hex
//! payload, except the subscriber number read whose digits depend on the
//! emulator instance port.

use sim_protocol::dialing::TON_NPI_UNKNOWN;
use sim_protocol::{
    hex, CrsmCommand, CrsmResponse, DialingNumber, ParseError, SimCommandCode, StatusWord,
    COMMAND_MARKER,
};
use tracing::debug;

use crate::card::SimCard;
use crate::descriptor::{read_requires_pin, ACCESS_BYTE_OFFSET};
use crate::dispatch::{IoMode, SimIo};
use crate::error::SimError;
use crate::file::FileKind;

/// Alpha identifier length of the subscriber number record
pub const MSISDN_ALPHA_LEN: usize = 18;

/// Fixed leading digits of every emulated phone number
const MSISDN_PREFIX: &str = "1555521";

/// What an entry answers with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedPayload {
    /// Status words only
    Empty,
    /// Literal hex text, sent as is
    Hex(&'static str),
    /// Subscriber number record built from the identity port
    SubscriberNumber,
}

/// One row of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CannedEntry {
    pub command: &'static str,
    pub status: StatusWord,
    pub payload: CannedPayload,
}

const fn ok(command: &'static str, hex: &'static str) -> CannedEntry {
    CannedEntry {
        command,
        status: StatusWord::OK,
        payload: CannedPayload::Hex(hex),
    }
}

static STANDARD_ENTRIES: &[CannedEntry] = &[
    // CPHS network operator name
    ok("+CRSM=192,28436,0,0,15", "000000146f1404001aa0aa01020000"),
    ok("+CRSM=176,28436,0,0,20", "416e64726f6964ffffffffffffffffffffffffff"),
    // CPHS voice message waiting flag
    ok("+CRSM=192,28433,0,0,15", "000000016f11040011a0aa01020000"),
    ok("+CRSM=176,28433,0,0,1", "55"),
    // ICCID
    ok("+CRSM=192,12258,0,0,15", "0000000a2fe204000fa0aa01020000"),
    ok("+CRSM=176,12258,0,0,10", "98101430121181157002"),
    // CPHS call forwarding flags
    ok("+CRSM=192,28435,0,0,15", "000000016f13040011a0aa01020000"),
    ok("+CRSM=176,28435,0,0,1", "55"),
    // SIM service table
    ok("+CRSM=192,28472,0,0,15", "0000000f6f3804001aa0aa01020000"),
    ok("+CRSM=176,28472,0,0,15", "ff30ffff3f003c03000c0000f03f00"),
    // Mailbox identifier
    ok("+CRSM=192,28617,0,0,15", "000000086fc9040011a0aa01020104"),
    ok("+CRSM=178,28617,1,4,4", "01000000"),
    // Message waiting indication status
    ok("+CRSM=192,28618,0,0,15", "0000000a6fca040011a0aa01020105"),
    ok("+CRSM=178,28618,1,4,5", "0000000000"),
    // Administrative data
    ok("+CRSM=192,28589,0,0,15", "000000046fad04000aa0aa01020000"),
    ok("+CRSM=176,28589,0,0,4", "00000003"),
    // Image instances and the image itself
    ok("+CRSM=192,20256,1,4,10", "000000644f20040000000005020114"),
    ok("+CRSM=178,20256,1,4,20", "010808214f0200000016ffffffffffffffffffff"),
    ok(
        "+CRSM=176,20226,0,0,22",
        "080802030016AAAA800285428142814281528002AAAAFF000000FF000000FF",
    ),
    ok("+CRSM=176,20226,0,22,9", "0808ff03a59999a5c3ff"),
    // CPHS information
    ok("+CRSM=192,28438,0,0,15", "000000026f1604001aa0aa01020000"),
    ok("+CRSM=176,28438,0,0,2", "0233"),
    // Service provider name
    ok("+CRSM=192,28486,0,0,15", "000000116f4604000aa0aa01020000"),
    ok("+CRSM=176,28486,0,0,17", "01416e64726f6964ffffffffffffffffff"),
    // Service provider display information: not present
    CannedEntry {
        command: "+CRSM=192,28621,0,0,15",
        status: StatusWord::FILE_NOT_FOUND,
        payload: CannedPayload::Empty,
    },
    // PLMN network name
    ok("+CRSM=192,28613,0,0,15", "000000f06fc504000aa0aa01020118"),
    ok(
        "+CRSM=178,28613,1,4,24",
        "43058441aa890affffffffffffffffffffffffffffffffff",
    ),
    // Subscriber number
    ok("+CRSM=192,28480,0,0,15", "000000806f40040011a0aa01020120"),
    CannedEntry {
        command: "+CRSM=178,28480,1,4,32",
        status: StatusWord::OK,
        payload: CannedPayload::SubscriberNumber,
    },
    // Mailbox dialing number
    ok("+CRSM=192,28615,0,0,15", "000000406fc7040011a0aa01020120"),
    ok(
        "+CRSM=178,28615,1,4,32",
        "566f6963656d61696cffffffffffffffffff07915155125740f9ffffffffffff",
    ),
];

/// Phone number reported by the emulator instance listening on `port`
///
/// The last four digits are the port, modulo 10000, zero padded.
pub fn subscriber_number(port: u16) -> String {
    format!("{MSISDN_PREFIX}{:04}", port % 10000)
}

/// EF-MSISDN record 1 for the emulator instance listening on `port`
pub fn subscriber_number_record(port: u16) -> Result<Vec<u8>, SimError> {
    DialingNumber::new("", subscriber_number(port), TON_NPI_UNKNOWN)
        .encode_record(MSISDN_ALPHA_LEN)
        .map_err(|_| SimError::Encoding(FileKind::LinearFixed))
}

/// Ordered table of exact-match answers
#[derive(Debug, Clone, Copy)]
pub struct CannedTable {
    entries: &'static [CannedEntry],
}

impl Default for CannedTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl CannedTable {
    /// A table over `entries`, matched in order
    pub fn new(entries: &'static [CannedEntry]) -> Self {
        Self { entries }
    }

    /// The built-in table of the emulated card
    pub fn standard() -> Self {
        Self::new(STANDARD_ENTRIES)
    }

    /// All entries, in match order
    pub fn entries(&self) -> &'static [CannedEntry] {
        self.entries
    }

    /// Find the first entry whose command is exactly `command`
    pub fn find(&self, command: &str) -> Option<&'static CannedEntry> {
        self.entries.iter().find(|entry| entry.command == command)
    }

    /// Returns true if the GET RESPONSE entry for `file_id` advertises
    /// PIN-protected reads
    ///
    /// Files without a descriptor entry are treated as unprotected.
    pub fn read_needs_pin(&self, file_id: u16) -> bool {
        self.entries
            .iter()
            .filter(|entry| {
                CrsmCommand::parse(entry.command).is_ok_and(|cmd| {
                    cmd.code() == Some(SimCommandCode::GetResponse) && cmd.file_id == file_id
                })
            })
            .filter_map(|entry| match entry.payload {
                CannedPayload::Hex(text) => hex::decode(text),
                _ => None,
            })
            .filter_map(|desc| desc.get(ACCESS_BYTE_OFFSET).copied())
            .any(read_requires_pin)
    }

    /// Answer `command` for the card on `identity_port`
    ///
    /// Anything that is not a table command, including near misses in
    /// case or spacing, is [`SimError::NotFound`].
    pub fn lookup(&self, command: &str, identity_port: u16) -> Result<CrsmResponse, SimError> {
        let entry = self
            .find(command)
            .ok_or_else(|| SimError::NotFound(command.to_string()))?;
        let response = match entry.payload {
            CannedPayload::Empty => CrsmResponse::status(entry.status),
            CannedPayload::Hex(hex) => CrsmResponse::with_hex(entry.status, hex),
            CannedPayload::SubscriberNumber => {
                let record = subscriber_number_record(identity_port)?;
                CrsmResponse::with_payload(entry.status, &record)
            }
        };
        Ok(response)
    }
}

impl SimIo for CannedTable {
    fn respond(&self, card: &SimCard, command: &str) -> Result<CrsmResponse, SimError> {
        if !command.starts_with(COMMAND_MARKER) {
            return Err(ParseError::MissingMarker(command.to_string()).into());
        }
        let response = self.lookup(command, card.identity_port());
        if let Err(err) = &response {
            debug!("Canned lookup failed: {}", err);
        }
        response
    }

    fn mode(&self) -> IoMode {
        IoMode::Canned
    }
}
