//! EF descriptors and payload reads
//!
//! The answer to GET RESPONSE on an elementary file is a fixed 15-byte
//! block (TS 51.011 9.2.1):
//!
//! | Byte  | Content                                     |
//! |-------|---------------------------------------------|
//! | 1-2   | RFU, zero                                   |
//! | 3-4   | File size (big-endian)                      |
//! | 5-6   | File id (big-endian)                        |
//! | 7     | Type of file: EF (0x04)                     |
//! | 8     | RFU (cyclic INCREASE bit not supported)     |
//! | 9-11  | Access conditions                           |
//! | 12    | File status: not invalidated                |
//! | 13    | Length of the following data (2)            |
//! | 14    | Structure: transparent, linear or cyclic    |
//! | 15    | Record length, 0 for transparent files      |

use crate::error::SimError;
use crate::file::{ElementaryFile, FileFlags, FileKind};

/// Size of an EF descriptor
pub const DESCRIPTOR_LEN: usize = 15;

/// Type-of-file byte for elementary files
pub const FILE_TYPE_EF: u8 = 0x04;

/// Access byte 9: read-only, PIN required
pub const ACCESS_READ_ONLY_PIN: u8 = 0x1a;
/// Access byte 9: read-only, always readable
pub const ACCESS_READ_ONLY: u8 = 0x0a;
/// Access byte 9: read-write, PIN required
pub const ACCESS_PIN: u8 = 0x11;
/// Access byte 9: read-write, always readable
pub const ACCESS_FREE: u8 = 0x00;

/// Offset of the READ/UPDATE access byte within a descriptor
pub const ACCESS_BYTE_OFFSET: usize = 8;

/// Access level CHV1, found in the READ nibble of PIN-protected files
const ACCESS_LEVEL_CHV1: u8 = 0x1;

/// Access bytes 10-11 (INVALIDATE/REHABILITATE conditions)
const ACCESS_FILLER: [u8; 2] = [0xa0, 0xaa];

/// File status: bit 1 set means "not invalidated"
const FILE_STATUS_VALID: u8 = 0x01;

/// Structure byte values
const STRUCTURE_TRANSPARENT: u8 = 0x00;
const STRUCTURE_LINEAR: u8 = 0x01;
const STRUCTURE_CYCLIC: u8 = 0x03;

/// Access condition byte for a flag combination
pub fn access_condition(flags: FileFlags) -> u8 {
    match (
        flags.contains(FileFlags::READ_ONLY),
        flags.contains(FileFlags::NEED_PIN),
    ) {
        (true, true) => ACCESS_READ_ONLY_PIN,
        (true, false) => ACCESS_READ_ONLY,
        (false, true) => ACCESS_PIN,
        (false, false) => ACCESS_FREE,
    }
}

/// Returns true if an access byte requires the PIN to read
pub fn read_requires_pin(access: u8) -> bool {
    access >> 4 == ACCESS_LEVEL_CHV1
}

/// Build the GET RESPONSE descriptor of an elementary file
///
/// Directories and files too large for the 16-bit size field cannot be
/// described.
pub fn encode_descriptor(file: &ElementaryFile) -> Result<[u8; DESCRIPTOR_LEN], SimError> {
    let structure = match file.kind() {
        FileKind::Transparent => STRUCTURE_TRANSPARENT,
        FileKind::LinearFixed => STRUCTURE_LINEAR,
        FileKind::Cyclic => STRUCTURE_CYCLIC,
        kind @ (FileKind::Master | FileKind::Dedicated) => return Err(SimError::Encoding(kind)),
    };
    let size = u16::try_from(file.size()).map_err(|_| SimError::Encoding(file.kind()))?;

    let mut out = [0u8; DESCRIPTOR_LEN];
    out[2..4].copy_from_slice(&size.to_be_bytes());
    out[4..6].copy_from_slice(&file.id().to_be_bytes());
    out[6] = FILE_TYPE_EF;
    out[ACCESS_BYTE_OFFSET] = access_condition(file.flags());
    out[9..11].copy_from_slice(&ACCESS_FILLER);
    out[11] = FILE_STATUS_VALID;
    out[12] = 2;
    out[13] = structure;
    out[14] = file.record_len();
    Ok(out)
}

/// Read `length` bytes of the file starting at `offset`
///
/// Fails when the read would run past the declared file size; the data is
/// never truncated or padded.
pub fn read_range(file: &ElementaryFile, offset: usize, length: usize) -> Result<&[u8], SimError> {
    let end = offset.checked_add(length).filter(|&end| end <= file.size());
    match end {
        Some(end) => Ok(&file.data()[offset..end]),
        None => Err(SimError::LengthTooLong {
            requested: length,
            available: file.size().saturating_sub(offset),
        }),
    }
}

/// Read `length` bytes of record `record` (1-based) of a record file
pub fn read_record(file: &ElementaryFile, record: u8, length: usize) -> Result<&[u8], SimError> {
    if !file.kind().has_records() {
        return Err(SimError::RecordAccessUnsupported(file.id()));
    }
    let index = usize::from(record);
    if index == 0 || index > file.record_count() {
        return Err(SimError::RecordNotFound {
            file_id: file.id(),
            record,
        });
    }
    let record_len = usize::from(file.record_len());
    if length > record_len {
        return Err(SimError::LengthTooLong {
            requested: length,
            available: record_len,
        });
    }
    let start = (index - 1) * record_len;
    Ok(&file.data()[start..start + length])
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_protocol::hex::encode_lower;

    fn spn_cphs() -> ElementaryFile {
        let mut data = b"Android".to_vec();
        data.resize(20, 0xff);
        ElementaryFile::transparent(0x6f14, FileFlags::READ_ONLY | FileFlags::NEED_PIN, data)
    }

    #[test]
    fn test_transparent_descriptor() {
        let desc = encode_descriptor(&spn_cphs()).unwrap();
        assert_eq!(encode_lower(&desc), "000000146f1404001aa0aa01020000");
    }

    #[test]
    fn test_linear_descriptor() {
        let file = ElementaryFile::linear(0x6fca, FileFlags::NEED_PIN, 5, [[0u8; 5], [0u8; 5]]);
        let desc = encode_descriptor(&file).unwrap();
        assert_eq!(encode_lower(&desc), "0000000a6fca040011a0aa01020105");
    }

    #[test]
    fn test_cyclic_descriptor() {
        let file = ElementaryFile::cyclic(0x6f39, FileFlags::NONE, 3, [[1u8; 3], [2u8; 3], [3u8; 3]]);
        let desc = encode_descriptor(&file).unwrap();
        assert_eq!(encode_lower(&desc), "000000096f39040000a0aa01020303");
    }

    #[test]
    fn test_access_conditions() {
        assert_eq!(access_condition(FileFlags::READ_ONLY | FileFlags::NEED_PIN), 0x1a);
        assert_eq!(access_condition(FileFlags::READ_ONLY), 0x0a);
        assert_eq!(access_condition(FileFlags::NEED_PIN), 0x11);
        assert_eq!(access_condition(FileFlags::NONE), 0x00);
    }

    #[test]
    fn test_read_requires_pin() {
        for flags in [FileFlags::NONE, FileFlags::READ_ONLY, FileFlags::NEED_PIN] {
            assert_eq!(
                read_requires_pin(access_condition(flags)),
                flags.contains(FileFlags::NEED_PIN)
            );
        }
        assert!(read_requires_pin(ACCESS_READ_ONLY_PIN));
        // ICCID as described by the canned table
        assert!(!read_requires_pin(0x0f));
    }

    #[test]
    fn test_directory_cannot_be_encoded() {
        let df = ElementaryFile::directory(FileKind::Dedicated, 0x7f20);
        assert_eq!(
            encode_descriptor(&df),
            Err(SimError::Encoding(FileKind::Dedicated))
        );
    }

    #[test]
    fn test_oversized_file_cannot_be_encoded() {
        let file = ElementaryFile::transparent(0x4f02, FileFlags::NONE, vec![0u8; 70_000]);
        assert_eq!(
            encode_descriptor(&file),
            Err(SimError::Encoding(FileKind::Transparent))
        );
    }

    #[test]
    fn test_read_range() {
        let file = spn_cphs();
        assert_eq!(read_range(&file, 0, 7).unwrap(), b"Android");
        assert_eq!(read_range(&file, 0, 20).unwrap().len(), 20);
        assert_eq!(read_range(&file, 18, 2).unwrap(), &[0xff, 0xff]);
        assert_eq!(read_range(&file, 0, 0).unwrap(), b"");
    }

    #[test]
    fn test_read_range_too_long() {
        let file = spn_cphs();
        assert_eq!(
            read_range(&file, 0, 25),
            Err(SimError::LengthTooLong {
                requested: 25,
                available: 20
            })
        );
        assert!(read_range(&file, 19, 2).is_err());
        assert!(read_range(&file, usize::MAX, 2).is_err());
    }

    #[test]
    fn test_read_record() {
        let file = ElementaryFile::linear(0x6fc9, FileFlags::NEED_PIN, 4, [[1u8, 0, 0, 0], [0u8; 4]]);
        assert_eq!(read_record(&file, 1, 4).unwrap(), &[1, 0, 0, 0]);
        assert_eq!(read_record(&file, 2, 2).unwrap(), &[0, 0]);
        assert_eq!(
            read_record(&file, 3, 4),
            Err(SimError::RecordNotFound {
                file_id: 0x6fc9,
                record: 3
            })
        );
        assert!(matches!(
            read_record(&file, 1, 5),
            Err(SimError::LengthTooLong { .. })
        ));
        assert_eq!(
            read_record(&spn_cphs(), 1, 1),
            Err(SimError::RecordAccessUnsupported(0x6f14))
        );
    }
}
