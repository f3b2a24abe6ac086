//! SIM file model
//!
//! Only elementary files carry data. Master and dedicated files (MF/DF)
//! exist so that directory entries can be described, but they have no
//! EF descriptor.

use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// File category and, for EFs, structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    /// Master file (root directory)
    Master,
    /// Dedicated file (directory)
    Dedicated,
    /// Transparent EF: one opaque byte blob
    Transparent,
    /// Linear fixed EF: numbered records of equal length
    LinearFixed,
    /// Cyclic EF: linear fixed records written round-robin
    Cyclic,
}

impl FileKind {
    /// Returns true for the three elementary file structures
    pub fn is_elementary(&self) -> bool {
        matches!(self, Self::Transparent | Self::LinearFixed | Self::Cyclic)
    }

    /// Returns true for record-structured EFs
    pub fn has_records(&self) -> bool {
        matches!(self, Self::LinearFixed | Self::Cyclic)
    }
}

/// Access flags of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FileFlags(u8);

impl FileFlags {
    /// No restrictions
    pub const NONE: FileFlags = FileFlags(0);
    /// Host may not update the file
    pub const READ_ONLY: FileFlags = FileFlags(1 << 0);
    /// Reading requires CHV1 (PIN) verification
    pub const NEED_PIN: FileFlags = FileFlags(1 << 1);

    /// Returns true if every flag in `other` is set
    pub fn contains(&self, other: FileFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bit value
    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl BitOr for FileFlags {
    type Output = FileFlags;

    fn bitor(self, rhs: FileFlags) -> FileFlags {
        FileFlags(self.0 | rhs.0)
    }
}

/// A catalog entry: one file and its contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementaryFile {
    kind: FileKind,
    id: u16,
    flags: FileFlags,
    /// Record length for record-structured EFs, 0 otherwise
    record_len: u8,
    /// Transparent data, or all records back to back
    data: Vec<u8>,
}

impl ElementaryFile {
    /// Create a transparent EF
    pub fn transparent(id: u16, flags: FileFlags, data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: FileKind::Transparent,
            id,
            flags,
            record_len: 0,
            data: data.into(),
        }
    }

    /// Create a linear fixed EF
    ///
    /// Each record is padded with 0xff or cut to `record_len`; at most 255
    /// records are kept.
    pub fn linear<I, R>(id: u16, flags: FileFlags, record_len: u8, records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[u8]>,
    {
        Self::with_records(FileKind::LinearFixed, id, flags, record_len, records)
    }

    /// Create a cyclic EF
    pub fn cyclic<I, R>(id: u16, flags: FileFlags, record_len: u8, records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[u8]>,
    {
        Self::with_records(FileKind::Cyclic, id, flags, record_len, records)
    }

    /// Create a directory entry (MF or DF)
    pub fn directory(kind: FileKind, id: u16) -> Self {
        Self {
            kind,
            id,
            flags: FileFlags::NONE,
            record_len: 0,
            data: Vec::new(),
        }
    }

    fn with_records<I, R>(kind: FileKind, id: u16, flags: FileFlags, record_len: u8, records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[u8]>,
    {
        let len = usize::from(record_len);
        let mut data = Vec::new();
        for record in records.into_iter().take(usize::from(u8::MAX)) {
            let record = record.as_ref();
            let keep = record.len().min(len);
            data.extend_from_slice(&record[..keep]);
            data.resize(data.len() + (len - keep), 0xff);
        }
        Self {
            kind,
            id,
            flags,
            record_len,
            data,
        }
    }

    /// Get the file identifier
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Get the file kind
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// Get the access flags
    pub fn flags(&self) -> FileFlags {
        self.flags
    }

    /// Returns true if reading requires the PIN
    pub fn needs_pin(&self) -> bool {
        self.flags.contains(FileFlags::NEED_PIN)
    }

    /// Record length, 0 for transparent files and directories
    pub fn record_len(&self) -> u8 {
        self.record_len
    }

    /// Number of records, 0 for transparent files and directories
    pub fn record_count(&self) -> usize {
        match self.record_len {
            0 => 0,
            len => self.data.len() / usize::from(len),
        }
    }

    /// Declared file size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// File contents (records back to back for record files)
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let flags = FileFlags::READ_ONLY | FileFlags::NEED_PIN;
        assert!(flags.contains(FileFlags::READ_ONLY));
        assert!(flags.contains(FileFlags::NEED_PIN));
        assert!(!FileFlags::READ_ONLY.contains(FileFlags::NEED_PIN));
        assert!(FileFlags::NONE.contains(FileFlags::NONE));
        assert_eq!(flags.bits(), 0x03);
    }

    #[test]
    fn test_linear_pads_and_cuts_records() {
        let file = ElementaryFile::linear(
            0x6fc9,
            FileFlags::NEED_PIN,
            4,
            [&[0x01u8][..], &[0x00u8, 0x00, 0x00, 0x00, 0x99][..]],
        );
        assert_eq!(file.record_count(), 2);
        assert_eq!(file.size(), 8);
        assert_eq!(file.data(), &[0x01, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_transparent() {
        let file = ElementaryFile::transparent(0x2fe2, FileFlags::READ_ONLY, vec![0x98, 0x10]);
        assert_eq!(file.kind(), FileKind::Transparent);
        assert_eq!(file.size(), 2);
        assert_eq!(file.record_len(), 0);
        assert_eq!(file.record_count(), 0);
        assert!(!file.needs_pin());
    }

    #[test]
    fn test_directory_is_not_elementary() {
        let mf = ElementaryFile::directory(FileKind::Master, 0x3f00);
        assert!(!mf.kind().is_elementary());
        assert_eq!(mf.size(), 0);
    }
}
