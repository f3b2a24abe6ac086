//! Card configuration

use serde::{Deserialize, Serialize};

use crate::card::SimStatus;
use crate::dispatch::IoMode;

/// Configuration for creating an emulated card and its dispatcher
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimCardConfig {
    /// Emulator instance port; its last four digits end the phone number
    pub identity_port: u16,
    /// Initial PIN
    pub pin: String,
    /// Initial PUK
    pub puk: String,
    /// Lock status at power-on
    #[serde(default)]
    pub initial_status: SimStatus,
    /// How `+CRSM` commands are answered
    #[serde(default)]
    pub io_mode: IoMode,
    /// Refuse PIN-protected file reads while the card is locked
    #[serde(default)]
    pub enforce_pin: bool,
}

impl Default for SimCardConfig {
    fn default() -> Self {
        Self {
            identity_port: 5554,
            pin: "0000".to_string(),
            puk: "12345678".to_string(),
            initial_status: SimStatus::Ready,
            io_mode: IoMode::Canned,
            enforce_pin: false,
        }
    }
}
