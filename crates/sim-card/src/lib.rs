//! Emulated SIM Card Library
//!
//! This crate emulates the command-response behavior of a GSM/UMTS SIM card
//! for a device emulator. It includes:
//!
//! - **SimCard**: the PIN/PUK lock state machine
//! - **SimDispatcher**: answers `+CRSM` restricted SIM access commands,
//!   either from a canned table or from an elementary file catalog
//! - **run_modem_task**: an async actor that serves a card over a byte stream
//!
//! # Lock states
//!
//! A card is `READY`, waiting for its PIN (`SIM PIN`), waiting for its PUK
//! (`SIM PUK`), or `ABSENT`. Three wrong PINs ask for the PUK; six wrong
//! PUKs lose the card for good.
//!
//! # Example
//!
//! ```rust
//! use sim_card::{IoMode, SimCard, SimDispatcher, SimStatus};
//!
//! let mut card = SimCard::new(5554);
//! let dispatcher = SimDispatcher::new(IoMode::Canned);
//!
//! // Administrative data
//! assert_eq!(
//!     dispatcher.process(&card, "+CRSM=176,28589,0,0,4"),
//!     "+CRSM: 144,0,00000003"
//! );
//!
//! // Lock the card and unlock it again
//! card.set_status(SimStatus::Pin).unwrap();
//! assert!(!card.check_pin("1234"));
//! assert!(card.check_pin("0000"));
//! assert!(card.is_ready());
//! ```

pub mod canned;
pub mod card;
pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod file;
pub mod modem_task;
pub mod rfkill;

pub use canned::CannedTable;
pub use card::{SimCard, SimStatus, MAX_PIN_RETRIES, MAX_PUK_RETRIES, PIN_SIZE, PUK_SIZE};
pub use catalog::EfCatalog;
pub use config::SimCardConfig;
pub use descriptor::{encode_descriptor, read_range, read_record};
pub use dispatch::{IoMode, SimDispatcher, SimIo, StructuredFiles};
pub use error::{CardError, SimError};
pub use file::{ElementaryFile, FileFlags, FileKind};
pub use modem_task::{run_modem_task, CardStatusEvent, ModemCommand};
pub use rfkill::{RadioBlockControl, RadioBlockMask, RadioType, SoftRadioBlock};
