//! `+CRSM` command dispatch
//!
//! Two answering strategies exist, selected at runtime by [`IoMode`]:
//!
//! - [`CannedTable`]: exact-match lookup of precomputed answers (default)
//! - [`StructuredFiles`]: parses the command and answers GET RESPONSE and
//!   READ BINARY from an [`EfCatalog`], falling back to the canned table
//!   for anything the catalog does not hold
//!
//! [`SimDispatcher`] wraps the chosen strategy and turns every outcome,
//! success or error, into the reply line sent back to the host.

use serde::{Deserialize, Serialize};
use sim_protocol::{CrsmCommand, CrsmResponse, SimCommandCode, StatusWord};
use tracing::{debug, warn};

use crate::canned::CannedTable;
use crate::card::SimCard;
use crate::catalog::EfCatalog;
use crate::config::SimCardConfig;
use crate::descriptor::{encode_descriptor, read_range, DESCRIPTOR_LEN};
use crate::error::SimError;

/// How `+CRSM` commands are answered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IoMode {
    /// Exact-match lookup in the canned table
    #[default]
    Canned,
    /// Descriptors and reads computed from the file catalog
    Structured,
}

impl IoMode {
    /// Returns a human-readable name for the mode
    pub fn name(&self) -> &'static str {
        match self {
            IoMode::Canned => "canned",
            IoMode::Structured => "structured",
        }
    }
}

/// A strategy for answering restricted SIM access commands
pub trait SimIo: Send + Sync {
    /// Answer one command for `card`
    fn respond(&self, card: &SimCard, command: &str) -> Result<CrsmResponse, SimError>;

    /// The mode this strategy implements
    fn mode(&self) -> IoMode;
}

/// Answers computed from an elementary file catalog
#[derive(Debug, Clone)]
pub struct StructuredFiles {
    catalog: EfCatalog,
    fallback: CannedTable,
}

impl StructuredFiles {
    pub fn new(catalog: EfCatalog) -> Self {
        Self {
            catalog,
            fallback: CannedTable::standard(),
        }
    }

    /// Structured answers over the built-in catalog
    pub fn standard() -> Self {
        Self::new(EfCatalog::standard())
    }

    pub fn catalog(&self) -> &EfCatalog {
        &self.catalog
    }

    fn get_response(&self, cmd: &CrsmCommand) -> Option<Result<CrsmResponse, SimError>> {
        let file = self.catalog.get(cmd.file_id)?;
        if (cmd.p1, cmd.p2, usize::from(cmd.p3)) != (0, 0, DESCRIPTOR_LEN) {
            return Some(Err(SimError::InvalidParameters {
                instruction: SimCommandCode::GetResponse.name(),
                p1: cmd.p1,
                p2: cmd.p2,
                p3: cmd.p3,
            }));
        }
        Some(encode_descriptor(file).map(|desc| CrsmResponse::with_payload(StatusWord::OK, &desc)))
    }

    fn read_binary(&self, cmd: &CrsmCommand) -> Option<Result<CrsmResponse, SimError>> {
        let file = self.catalog.get(cmd.file_id)?;
        Some(
            read_range(file, cmd.offset(), usize::from(cmd.p3))
                .map(|data| CrsmResponse::with_payload(StatusWord::OK, data)),
        )
    }
}

impl Default for StructuredFiles {
    fn default() -> Self {
        Self::standard()
    }
}

impl SimIo for StructuredFiles {
    fn respond(&self, card: &SimCard, command: &str) -> Result<CrsmResponse, SimError> {
        let cmd = CrsmCommand::parse(command)?;
        let port = card.identity_port();

        match cmd.code() {
            Some(SimCommandCode::GetResponse) => self
                .get_response(&cmd)
                .unwrap_or_else(|| self.fallback.lookup(command, port)),
            Some(SimCommandCode::ReadBinary) => self
                .read_binary(&cmd)
                .unwrap_or_else(|| self.fallback.lookup(command, port)),
            Some(SimCommandCode::ReadRecord) => {
                self.fallback
                    .lookup(command, port)
                    .map_err(|err| match err {
                        SimError::NotFound(_) => SimError::RecordAccessUnsupported(cmd.file_id),
                        other => other,
                    })
            }
            _ => Err(SimError::UnsupportedCommand(cmd.command)),
        }
    }

    fn mode(&self) -> IoMode {
        IoMode::Structured
    }
}

/// Answers host commands for one card
///
/// The dispatcher holds no card state: each call reads the card it is
/// handed and returns a freshly built reply.
pub struct SimDispatcher {
    io: Box<dyn SimIo>,
    /// Files consulted for PIN enforcement
    catalog: EfCatalog,
    /// Descriptors consulted for files the catalog does not hold
    descriptors: CannedTable,
    enforce_pin: bool,
}

impl SimDispatcher {
    /// Create a dispatcher using the built-in catalog and canned table
    pub fn new(mode: IoMode) -> Self {
        let io: Box<dyn SimIo> = match mode {
            IoMode::Canned => Box::new(CannedTable::standard()),
            IoMode::Structured => Box::new(StructuredFiles::standard()),
        };
        Self {
            io,
            catalog: EfCatalog::standard(),
            descriptors: CannedTable::standard(),
            enforce_pin: false,
        }
    }

    /// Create a dispatcher as described by `config`
    pub fn from_config(config: &SimCardConfig) -> Self {
        Self::new(config.io_mode).with_enforcement(config.enforce_pin)
    }

    /// Create a structured-mode dispatcher over a custom catalog
    pub fn with_catalog(catalog: EfCatalog) -> Self {
        Self {
            io: Box::new(StructuredFiles::new(catalog.clone())),
            catalog,
            descriptors: CannedTable::standard(),
            enforce_pin: false,
        }
    }

    /// Enable or disable refusing PIN-protected reads on a locked card
    pub fn with_enforcement(mut self, enforce_pin: bool) -> Self {
        self.enforce_pin = enforce_pin;
        self
    }

    pub fn mode(&self) -> IoMode {
        self.io.mode()
    }

    pub fn enforces_pin(&self) -> bool {
        self.enforce_pin
    }

    /// Answer one command, keeping errors typed
    pub fn respond(&self, card: &SimCard, command: &str) -> Result<CrsmResponse, SimError> {
        self.check_access(card, command)?;
        self.io.respond(card, command)
    }

    /// Answer one command with the exact line to send to the host
    ///
    /// Never fails: errors become their `ERROR: ...` reply.
    pub fn process(&self, card: &SimCard, command: &str) -> String {
        match self.respond(card, command) {
            Ok(response) => {
                debug!("SIM command {:?} answered {}", command, response);
                response.to_string()
            }
            Err(err @ SimError::AccessDenied(_)) => {
                warn!("SIM command {:?} refused: {}", command, err);
                err.reply()
            }
            Err(err) => {
                debug!("SIM command {:?} failed: {}", command, err);
                err.reply()
            }
        }
    }

    /// Refuse reads of PIN-protected files while the card is locked
    ///
    /// Catalogued files are judged by their flags, all others by the
    /// access byte of their canned descriptor. Unparseable commands pass
    /// through so the strategy reports them.
    fn check_access(&self, card: &SimCard, command: &str) -> Result<(), SimError> {
        if !self.enforce_pin || card.is_ready() {
            return Ok(());
        }
        let Ok(cmd) = CrsmCommand::parse(command) else {
            return Ok(());
        };
        let is_read = cmd.code().is_some_and(|code| code.is_read());
        let protected = match self.catalog.get(cmd.file_id) {
            Some(file) => file.needs_pin(),
            None => self.descriptors.read_needs_pin(cmd.file_id),
        };
        if is_read && protected {
            return Err(SimError::AccessDenied(cmd.file_id));
        }
        Ok(())
    }
}

impl Default for SimDispatcher {
    fn default() -> Self {
        Self::new(IoMode::default())
    }
}

impl std::fmt::Debug for SimDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimDispatcher")
            .field("mode", &self.io.mode())
            .field("files", &self.catalog.len())
            .field("enforce_pin", &self.enforce_pin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::SimStatus;
    use crate::error::{
        REPLY_BAD_COMMAND, REPLY_LENGTH_TOO_LONG, REPLY_MALFORMED, REPLY_UNSUPPORTED,
    };
    use crate::file::{ElementaryFile, FileFlags, FileKind};

    fn locked_card() -> SimCard {
        let mut card = SimCard::default();
        card.set_status(SimStatus::Pin).unwrap();
        card
    }

    #[test]
    fn test_canned_mode() {
        let dispatcher = SimDispatcher::default();
        let card = SimCard::default();
        assert_eq!(dispatcher.mode(), IoMode::Canned);
        assert_eq!(
            dispatcher.process(&card, "+CRSM=176,28433,0,0,1"),
            "+CRSM: 144,0,55"
        );
        assert_eq!(
            dispatcher.process(&card, "+CRSM=176,28433,0,0,2"),
            REPLY_BAD_COMMAND
        );
        assert_eq!(dispatcher.process(&card, "CRSM=176"), REPLY_MALFORMED);
    }

    #[test]
    fn test_structured_get_response() {
        let dispatcher = SimDispatcher::new(IoMode::Structured);
        let card = SimCard::default();
        assert_eq!(
            dispatcher.process(&card, "+CRSM=192,28436,0,0,15"),
            "+CRSM: 144,0,000000146f1404001aa0aa01020000"
        );
        assert_eq!(
            dispatcher.process(&card, "+CRSM=192,28436,0,0,14"),
            REPLY_MALFORMED
        );
    }

    #[test]
    fn test_structured_read_binary() {
        let dispatcher = SimDispatcher::new(IoMode::Structured);
        let card = SimCard::default();
        assert_eq!(
            dispatcher.process(&card, "+CRSM=176,28436,0,0,7"),
            "+CRSM: 144,0,416e64726f6964"
        );
        assert_eq!(
            dispatcher.process(&card, "+CRSM=176,28436,0,2,3"),
            "+CRSM: 144,0,64726f"
        );
        assert_eq!(
            dispatcher.process(&card, "+CRSM=176,28436,0,0,25"),
            REPLY_LENGTH_TOO_LONG
        );
    }

    #[test]
    fn test_structured_falls_back_to_canned() {
        let dispatcher = SimDispatcher::new(IoMode::Structured);
        let card = SimCard::new(5554);
        // Not in the catalog
        assert_eq!(
            dispatcher.process(&card, "+CRSM=192,28480,0,0,15"),
            "+CRSM: 144,0,000000806f40040011a0aa01020120"
        );
        assert_eq!(
            dispatcher.process(&card, "+CRSM=178,28480,1,4,32"),
            "+CRSM: 144,0,ffffffffffffffffffffffffffffffffffff07815155255155f4ffffffffffff"
        );
        assert_eq!(
            dispatcher.process(&card, "+CRSM=192,4660,0,0,15"),
            REPLY_BAD_COMMAND
        );
    }

    #[test]
    fn test_structured_unsupported() {
        let dispatcher = SimDispatcher::new(IoMode::Structured);
        let card = SimCard::default();
        assert_eq!(
            dispatcher.process(&card, "+CRSM=178,28436,1,4,4"),
            REPLY_UNSUPPORTED
        );
        assert_eq!(
            dispatcher.process(&card, "+CRSM=214,28436,0,0,1"),
            REPLY_UNSUPPORTED
        );
        assert_eq!(
            dispatcher.process(&card, "+CRSM=99,28436,0,0,1"),
            REPLY_UNSUPPORTED
        );
        assert_eq!(
            dispatcher.process(&card, "+CRSM=176,28436,0,0"),
            REPLY_MALFORMED
        );
    }

    #[test]
    fn test_encoding_failure_is_internal_error() {
        let catalog =
            EfCatalog::new([ElementaryFile::directory(FileKind::Dedicated, 0x7f20)]).unwrap();
        let dispatcher = SimDispatcher::with_catalog(catalog);
        let card = SimCard::default();
        assert_eq!(
            dispatcher.process(&card, "+CRSM=192,32544,0,0,15"),
            "ERROR: INTERNAL SIM ERROR"
        );
    }

    #[test]
    fn test_enforcement_off_by_default() {
        let dispatcher = SimDispatcher::default();
        assert!(!dispatcher.enforces_pin());
        assert_eq!(
            dispatcher.process(&locked_card(), "+CRSM=176,28436,0,0,20"),
            "+CRSM: 144,0,416e64726f6964ffffffffffffffffffffffffff"
        );
    }

    #[test]
    fn test_enforcement_refuses_protected_reads() {
        let dispatcher = SimDispatcher::default().with_enforcement(true);
        let card = locked_card();
        assert_eq!(
            dispatcher.process(&card, "+CRSM=176,28436,0,0,20"),
            "+CRSM: 152,4"
        );
        assert_eq!(
            dispatcher.process(&card, "+CRSM=178,28617,1,4,4"),
            "+CRSM: 152,4"
        );
        // Protected by their descriptors only
        for command in [
            "+CRSM=178,28480,1,4,32",
            "+CRSM=178,28615,1,4,32",
            "+CRSM=178,28618,1,4,5",
        ] {
            assert_eq!(dispatcher.process(&card, command), "+CRSM: 152,4", "{command}");
        }
        // Descriptors and unprotected files are still served
        assert_eq!(
            dispatcher.process(&card, "+CRSM=192,28436,0,0,15"),
            "+CRSM: 144,0,000000146f1404001aa0aa01020000"
        );
        assert_eq!(
            dispatcher.process(&card, "+CRSM=176,28589,0,0,4"),
            "+CRSM: 144,0,00000003"
        );
        // Unlocked card reads normally
        assert_eq!(
            dispatcher.process(&SimCard::default(), "+CRSM=176,28433,0,0,1"),
            "+CRSM: 144,0,55"
        );
    }

    #[test]
    fn test_from_config() {
        let config = SimCardConfig {
            io_mode: IoMode::Structured,
            enforce_pin: true,
            ..Default::default()
        };
        let dispatcher = SimDispatcher::from_config(&config);
        assert_eq!(dispatcher.mode(), IoMode::Structured);
        assert!(dispatcher.enforces_pin());
    }

    #[test]
    fn test_custom_catalog() {
        let catalog = EfCatalog::new([ElementaryFile::transparent(
            0x6f07,
            FileFlags::READ_ONLY | FileFlags::NEED_PIN,
            vec![0x08, 0x29, 0x10, 0x10],
        )])
        .unwrap();
        let dispatcher = SimDispatcher::with_catalog(catalog).with_enforcement(true);
        assert_eq!(
            dispatcher.process(&SimCard::default(), "+CRSM=176,28423,0,0,4"),
            "+CRSM: 144,0,08291010"
        );
        assert_eq!(
            dispatcher.process(&locked_card(), "+CRSM=176,28423,0,0,4"),
            "+CRSM: 152,4"
        );
    }

    #[test]
    fn test_io_mode_names() {
        assert_eq!(IoMode::Canned.name(), "canned");
        assert_eq!(IoMode::Structured.name(), "structured");
    }
}
