//! Radio kill-switch interface
//!
//! The host that embeds a card usually also owns the device's radio block
//! switches. The card never consults them; this module only defines the
//! shape of that collaborator and an in-memory implementation for hosts
//! and tests that have no real switch.

use std::fmt;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Radio types, numbered by their bit position in a [`RadioBlockMask`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RadioType {
    /// Wireless LAN
    Wlan = 0,
    Bluetooth = 1,
    /// Ultra-wideband
    Uwb = 2,
    Wimax = 3,
    /// Mobile broadband
    Wwan = 4,
}

impl RadioType {
    /// All radio types in bit order
    pub const ALL: [RadioType; 5] = [
        RadioType::Wlan,
        RadioType::Bluetooth,
        RadioType::Uwb,
        RadioType::Wimax,
        RadioType::Wwan,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RadioType::Wlan => "WLAN",
            RadioType::Bluetooth => "Bluetooth",
            RadioType::Uwb => "UWB",
            RadioType::Wimax => "WiMAX",
            RadioType::Wwan => "WWAN",
        }
    }
}

/// Set of blocked radios, one bit per [`RadioType`]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RadioBlockMask(pub u32);

impl RadioBlockMask {
    pub const NONE: RadioBlockMask = RadioBlockMask(0);

    /// Mask with only `radio` set
    pub const fn bit(radio: RadioType) -> Self {
        RadioBlockMask(1 << radio as u32)
    }

    /// Every known radio blocked
    pub fn all() -> Self {
        RadioType::ALL
            .iter()
            .fold(Self::NONE, |mask, &radio| mask | Self::bit(radio))
    }

    pub fn contains(&self, radio: RadioType) -> bool {
        self.0 & Self::bit(radio).0 != 0
    }

    pub fn insert(&mut self, radio: RadioType) {
        self.0 |= Self::bit(radio).0;
    }

    pub fn remove(&mut self, radio: RadioType) {
        self.0 &= !Self::bit(radio).0;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Blocked radios, in bit order (unknown bits are skipped)
    pub fn radios(&self) -> impl Iterator<Item = RadioType> + '_ {
        RadioType::ALL
            .into_iter()
            .filter(move |radio| self.contains(*radio))
    }
}

impl BitOr for RadioBlockMask {
    type Output = RadioBlockMask;

    fn bitor(self, rhs: RadioBlockMask) -> RadioBlockMask {
        RadioBlockMask(self.0 | rhs.0)
    }
}

impl From<RadioType> for RadioBlockMask {
    fn from(radio: RadioType) -> Self {
        Self::bit(radio)
    }
}

impl fmt::Debug for RadioBlockMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RadioBlockMask({:#07b})", self.0)
    }
}

/// Access to the radio block switches of the host device
pub trait RadioBlockControl {
    /// Radios currently blocked for any reason
    fn get_blocking(&self) -> RadioBlockMask;

    /// Radios blocked by the hardware switch
    fn get_hardware_block(&self) -> RadioBlockMask;

    /// Set the radios blocked by the hardware switch
    fn set_hardware_block(&mut self, mask: RadioBlockMask);
}

/// In-memory block switches
///
/// Blocking is the union of the soft block (set by software) and the
/// hardware block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoftRadioBlock {
    soft: RadioBlockMask,
    hardware: RadioBlockMask,
}

impl SoftRadioBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn soft_block(&self) -> RadioBlockMask {
        self.soft
    }

    pub fn set_soft_block(&mut self, mask: RadioBlockMask) {
        debug!("Soft radio block set to {:?}", mask);
        self.soft = mask;
    }

    /// Returns true if `radio` is blocked for any reason
    pub fn is_blocked(&self, radio: RadioType) -> bool {
        self.get_blocking().contains(radio)
    }
}

impl RadioBlockControl for SoftRadioBlock {
    fn get_blocking(&self) -> RadioBlockMask {
        self.soft | self.hardware
    }

    fn get_hardware_block(&self) -> RadioBlockMask {
        self.hardware
    }

    fn set_hardware_block(&mut self, mask: RadioBlockMask) {
        debug!("Hardware radio block set to {:?}", mask);
        self.hardware = mask;
    }
}
