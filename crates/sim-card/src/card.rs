//! Card state and the PIN/PUK unlock state machine
//!
//! ```text
//!          3 wrong PINs           6 wrong PUKs
//!   PIN ─────────────────▶ PUK ─────────────────▶ ABSENT
//!    │                      │
//!    │ correct PIN          │ correct PUK + new PIN
//!    ▼                      │
//!  READY ◀──────────────────┘
//! ```
//!
//! ABSENT models a physically blocked card: nothing leads out of it.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SimCardConfig;
use crate::error::CardError;

/// Nominal PIN length in digits
pub const PIN_SIZE: usize = 4;
/// Nominal PUK length in digits
pub const PUK_SIZE: usize = 8;
/// Wrong PINs that block the card
pub const MAX_PIN_RETRIES: u32 = 3;
/// Wrong PUKs that kill the card
pub const MAX_PUK_RETRIES: u32 = 6;

/// Lock status of the card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SimStatus {
    /// No usable card (terminal)
    Absent,
    /// Unlocked
    #[default]
    Ready,
    /// Waiting for the PIN
    Pin,
    /// PIN blocked, waiting for the PUK
    Puk,
}

impl SimStatus {
    /// Returns a human-readable name for the status
    pub fn name(&self) -> &'static str {
        match self {
            SimStatus::Absent => "ABSENT",
            SimStatus::Ready => "READY",
            SimStatus::Pin => "SIM PIN",
            SimStatus::Puk => "SIM PUK",
        }
    }
}

/// A numeric secret of at most `N` digits
///
/// Longer input is cut to the first `N` digits; empty input or anything
/// that is not a decimal digit is rejected.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret<const N: usize> {
    digits: String,
}

/// Card PIN (CHV1)
pub type Pin = Secret<PIN_SIZE>;
/// Card PUK (unblock CHV1)
pub type Puk = Secret<PUK_SIZE>;

impl<const N: usize> Secret<N> {
    /// Validate and store `value`, naming it `what` in errors
    pub fn parse(value: &str, what: &'static str) -> Result<Self, CardError> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CardError::InvalidSecret { what, max: N });
        }
        // All ASCII, so byte and char boundaries agree
        let digits = value[..value.len().min(N)].to_string();
        Ok(Self { digits })
    }

    /// The stored digits
    pub fn as_str(&self) -> &str {
        &self.digits
    }

    /// Exact comparison against a candidate (no truncation of the candidate)
    pub fn matches(&self, candidate: &str) -> bool {
        self.digits == candidate
    }
}

impl<const N: usize> fmt::Debug for Secret<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

/// One emulated SIM card
#[derive(Debug, Clone)]
pub struct SimCard {
    status: SimStatus,
    pin: Pin,
    puk: Puk,
    /// Failed attempts in the current PIN or PUK phase
    pin_retries: u32,
    /// Emulator instance port, feeds the subscriber number
    identity_port: u16,
}

impl SimCard {
    /// Create a ready card with the default PIN 0000 and PUK 12345678
    pub fn new(identity_port: u16) -> Self {
        Self {
            status: SimStatus::Ready,
            pin: Secret {
                digits: "0000".to_string(),
            },
            puk: Secret {
                digits: "12345678".to_string(),
            },
            pin_retries: 0,
            identity_port,
        }
    }

    /// Create a card from configuration
    pub fn from_config(config: &SimCardConfig) -> Result<Self, CardError> {
        Ok(Self {
            status: config.initial_status,
            pin: Pin::parse(&config.pin, "PIN")?,
            puk: Puk::parse(&config.puk, "PUK")?,
            pin_retries: 0,
            identity_port: config.identity_port,
        })
    }

    /// Get the lock status
    pub fn status(&self) -> SimStatus {
        self.status
    }

    /// Returns true when the card is unlocked
    pub fn is_ready(&self) -> bool {
        self.status == SimStatus::Ready
    }

    /// Force the lock status (administrative)
    ///
    /// An absent card stays absent. Entering a new status clears the retry
    /// counter so each phase starts with its full allowance.
    pub fn set_status(&mut self, status: SimStatus) -> Result<(), CardError> {
        if self.status == SimStatus::Absent && status != SimStatus::Absent {
            return Err(CardError::Absent);
        }
        if self.status != status {
            debug!("SIM status forced: {} -> {}", self.status.name(), status.name());
            self.status = status;
            self.pin_retries = 0;
        }
        Ok(())
    }

    /// Get the emulator instance port
    pub fn identity_port(&self) -> u16 {
        self.identity_port
    }

    /// Get the current PIN
    pub fn pin(&self) -> &str {
        self.pin.as_str()
    }

    /// Get the current PUK
    pub fn puk(&self) -> &str {
        self.puk.as_str()
    }

    /// Failed attempts in the current phase
    pub fn pin_retries(&self) -> u32 {
        self.pin_retries
    }

    /// PIN attempts left before the card asks for the PUK
    pub fn remaining_pin_attempts(&self) -> u32 {
        match self.status {
            SimStatus::Pin => MAX_PIN_RETRIES.saturating_sub(self.pin_retries),
            SimStatus::Ready => MAX_PIN_RETRIES,
            SimStatus::Puk | SimStatus::Absent => 0,
        }
    }

    /// PUK attempts left before the card is lost
    pub fn remaining_puk_attempts(&self) -> u32 {
        match self.status {
            SimStatus::Puk => MAX_PUK_RETRIES.saturating_sub(self.pin_retries),
            SimStatus::Absent => 0,
            SimStatus::Ready | SimStatus::Pin => MAX_PUK_RETRIES,
        }
    }

    /// Replace the PIN (administrative); status is unchanged
    pub fn set_pin(&mut self, pin: &str) -> Result<(), CardError> {
        self.pin = Pin::parse(pin, "PIN")?;
        self.pin_retries = 0;
        Ok(())
    }

    /// Replace the PUK (administrative); status is unchanged
    pub fn set_puk(&mut self, puk: &str) -> Result<(), CardError> {
        self.puk = Puk::parse(puk, "PUK")?;
        self.pin_retries = 0;
        Ok(())
    }

    /// Verify a PIN
    ///
    /// Only meaningful while the card is waiting for its PIN or already
    /// unlocked. Wrong guesses on an unlocked card are not counted.
    pub fn check_pin(&mut self, candidate: &str) -> bool {
        if !matches!(self.status, SimStatus::Pin | SimStatus::Ready) {
            debug!("PIN check refused in status {}", self.status.name());
            return false;
        }

        if self.pin.matches(candidate) {
            if self.status != SimStatus::Ready {
                info!("PIN accepted, SIM unlocked");
            }
            self.status = SimStatus::Ready;
            self.pin_retries = 0;
            return true;
        }

        if self.status != SimStatus::Ready {
            self.pin_retries += 1;
            debug!(
                "Wrong PIN, {} attempt(s) left",
                self.remaining_pin_attempts()
            );
            if self.pin_retries >= MAX_PIN_RETRIES {
                warn!("PIN blocked after {} failures, PUK required", MAX_PIN_RETRIES);
                self.status = SimStatus::Puk;
                self.pin_retries = 0;
            }
        }
        false
    }

    /// Unblock with the PUK and install `new_pin`
    ///
    /// A malformed `new_pin` is refused before the PUK is looked at, so it
    /// does not cost an attempt.
    pub fn check_puk(&mut self, candidate_puk: &str, new_pin: &str) -> bool {
        if self.status != SimStatus::Puk {
            debug!("PUK check refused in status {}", self.status.name());
            return false;
        }

        let new_pin = match Pin::parse(new_pin, "PIN") {
            Ok(pin) => pin,
            Err(e) => {
                debug!("PUK check refused: {}", e);
                return false;
            }
        };

        if self.puk.matches(candidate_puk) {
            info!("PUK accepted, PIN replaced and SIM unlocked");
            self.pin = new_pin;
            self.status = SimStatus::Ready;
            self.pin_retries = 0;
            return true;
        }

        self.pin_retries += 1;
        if self.pin_retries >= MAX_PUK_RETRIES {
            warn!("PUK blocked after {} failures, SIM is now absent", MAX_PUK_RETRIES);
            self.status = SimStatus::Absent;
        } else {
            debug!(
                "Wrong PUK, {} attempt(s) left",
                self.remaining_puk_attempts()
            );
        }
        false
    }
}

impl Default for SimCard {
    fn default() -> Self {
        Self::new(SimCardConfig::default().identity_port)
    }
}
