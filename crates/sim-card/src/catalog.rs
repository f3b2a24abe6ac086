//! Elementary file catalog
//!
//! The catalog is built once and never changes. File ids are unique.

use std::collections::BTreeMap;

use crate::error::SimError;
use crate::file::{ElementaryFile, FileFlags};

/// CPHS network operator name
pub const EF_SPN_CPHS: u16 = 0x6f14;
/// CPHS voice message waiting flags
pub const EF_VOICE_MAIL_CPHS: u16 = 0x6f11;
/// ICC identification
pub const EF_ICCID: u16 = 0x2fe2;
/// CPHS call forwarding flags
pub const EF_CFF_CPHS: u16 = 0x6f13;
/// Administrative data
pub const EF_AD: u16 = 0x6fad;
/// SIM service table
pub const EF_SST: u16 = 0x6f38;
/// CPHS information
pub const EF_INFO_CPHS: u16 = 0x6f16;
/// Service provider name
pub const EF_SPN: u16 = 0x6f46;
/// Mailbox identifier
pub const EF_MBI: u16 = 0x6fc9;
/// Subscriber number (served from the canned table only)
pub const EF_MSISDN: u16 = 0x6f40;

/// Immutable set of files, keyed by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EfCatalog {
    files: BTreeMap<u16, ElementaryFile>,
}

impl EfCatalog {
    /// Build a catalog, rejecting duplicate ids
    pub fn new(files: impl IntoIterator<Item = ElementaryFile>) -> Result<Self, SimError> {
        let mut map = BTreeMap::new();
        for file in files {
            let id = file.id();
            if map.insert(id, file).is_some() {
                return Err(SimError::DuplicateFile(id));
            }
        }
        Ok(Self { files: map })
    }

    /// The built-in files of the emulated card
    pub fn standard() -> Self {
        let files = standard_files()
            .into_iter()
            .map(|file| (file.id(), file))
            .collect();
        Self { files }
    }

    /// Look up a file by id
    pub fn get(&self, id: u16) -> Option<&ElementaryFile> {
        self.files.get(&id)
    }

    /// Iterate over files in id order
    pub fn iter(&self) -> impl Iterator<Item = &ElementaryFile> {
        self.files.values()
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if the catalog has no files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// "Android" padded with 0xff to `len` bytes, optionally after a prefix byte
fn android_name(prefix: Option<u8>, len: usize) -> Vec<u8> {
    let mut name: Vec<u8> = prefix.into_iter().collect();
    name.extend_from_slice(b"Android");
    name.resize(len, 0xff);
    name
}

fn standard_files() -> Vec<ElementaryFile> {
    let ro = FileFlags::READ_ONLY;
    let pin = FileFlags::NEED_PIN;

    vec![
        ElementaryFile::transparent(EF_SPN_CPHS, ro | pin, android_name(None, 20)),
        // Line 1 and line 2: no messages waiting
        ElementaryFile::transparent(EF_VOICE_MAIL_CPHS, pin, [0x55u8]),
        // 89014103211118518720
        ElementaryFile::transparent(
            EF_ICCID,
            ro,
            [0x98u8, 0x10, 0x14, 0x30, 0x12, 0x11, 0x81, 0x15, 0x70, 0x02],
        ),
        // Line 1 and line 2: not forwarded
        ElementaryFile::transparent(EF_CFF_CPHS, pin, [0x55u8]),
        // Normal operation, 3-digit MNC
        ElementaryFile::transparent(EF_AD, ro, [0x00u8, 0x00, 0x00, 0x03]),
        ElementaryFile::transparent(
            EF_SST,
            ro | pin,
            [
                0xffu8, 0x30, 0xff, 0xff, 0x3f, 0x00, 0x3c, 0x03, 0x00, 0x0c, 0x00, 0x00, 0xf0,
                0x3f, 0x00,
            ],
        ),
        // Phase 2, CSP and information numbers activated
        ElementaryFile::transparent(EF_INFO_CPHS, ro | pin, [0x02u8, 0x33]),
        // Display condition 1
        ElementaryFile::transparent(EF_SPN, ro, android_name(Some(0x01), 17)),
        // Voicemail uses MBDN record 1; the second profile has no mailbox
        ElementaryFile::linear(EF_MBI, pin, 4, [[0x01u8, 0x00, 0x00, 0x00], [0x00; 4]]),
    ]
}
