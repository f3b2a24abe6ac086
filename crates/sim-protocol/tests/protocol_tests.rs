//! Integration tests for the restricted SIM access protocol
//!
//! These tests cover the wire layer end to end:
//! - Command text parsing and encoding
//! - Dialing-number BCD packing
//! - Line extraction from an arbitrarily chunked byte stream

use sim_protocol::dialing::{encode_bcd, RECORD_TAIL, TON_NPI_UNKNOWN};
use sim_protocol::{AtLineCodec, CrsmCommand, DialingNumber, EncodeCommand, ProtocolCodec};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    /// Unpack swapped-nibble BCD back into digit text, stopping at filler
    pub fn unpack_bcd(bytes: &[u8]) -> String {
        bytes
            .iter()
            .flat_map(|&b| [b & 0x0f, b >> 4])
            .take_while(|&nibble| nibble != 0x0f)
            .map(|nibble| match nibble {
                0x0a => '*',
                0x0b => '#',
                digit => char::from(b'0' + digit),
            })
            .collect()
    }

    /// Feed `data` to a fresh codec in pieces of `chunk` bytes
    pub fn feed_chunked(data: &[u8], chunk: usize) -> Vec<String> {
        let mut codec = AtLineCodec::new();
        let mut lines = Vec::new();
        for piece in data.chunks(chunk.max(1)) {
            codec.push_bytes(piece);
            while let Some(line) = codec.next_command() {
                lines.push(line);
            }
        }
        lines
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn any_command() -> impl Strategy<Value = CrsmCommand> {
        (any::<u16>(), any::<u16>(), any::<u8>(), any::<u8>(), any::<u8>()).prop_map(
            |(command, file_id, p1, p2, p3)| CrsmCommand {
                command,
                file_id,
                p1,
                p2,
                p3,
            },
        )
    }

    fn dialing_digits() -> impl Strategy<Value = String> {
        "[0-9*#]{0,20}"
    }

    proptest! {
        #[test]
        fn encoded_commands_parse_back(cmd in any_command()) {
            let text = String::from_utf8(cmd.encode()).unwrap();
            prop_assert_eq!(CrsmCommand::parse(&text), Ok(cmd));
        }

        #[test]
        fn spaces_around_fields_are_ignored(cmd in any_command(), pad in 0usize..3) {
            let spaces = " ".repeat(pad);
            let text = format!(
                "+CRSM={spaces}{}{spaces},{spaces}{},{},{}{spaces},{}",
                cmd.command, cmd.file_id, cmd.p1, cmd.p2, cmd.p3
            );
            prop_assert_eq!(CrsmCommand::parse(&text), Ok(cmd));
        }

        #[test]
        fn oversized_p3_is_rejected(p3 in 256u32..100_000) {
            let text = format!("+CRSM=176,28589,0,0,{p3}");
            prop_assert!(CrsmCommand::parse(&text).is_err());
        }

        #[test]
        fn bcd_packs_two_digits_per_byte(digits in dialing_digits()) {
            let packed = encode_bcd(&digits).unwrap();
            prop_assert_eq!(packed.len(), digits.len().div_ceil(2));
            prop_assert_eq!(helpers::unpack_bcd(&packed), digits.clone());
            if digits.len() % 2 == 1 {
                prop_assert_eq!(packed.last().map(|b| b >> 4), Some(0x0f));
            }
        }

        #[test]
        fn dialing_records_have_fixed_length(digits in dialing_digits(), alpha_len in 0usize..32) {
            let record = DialingNumber::new("", digits, TON_NPI_UNKNOWN)
                .encode_record(alpha_len)
                .unwrap();
            prop_assert_eq!(record.len(), alpha_len + RECORD_TAIL);
        }

        #[test]
        fn chunking_does_not_change_lines(
            bodies in prop::collection::vec("\\+CRSM=[0-9,]{1,20}", 1..5),
            chunk in 1usize..16,
        ) {
            let stream: String = bodies.iter().map(|body| format!("AT{body}\r\n")).collect();
            prop_assert_eq!(helpers::feed_chunked(stream.as_bytes(), chunk), bodies);
        }
    }
}
