//! Application settings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sim_card::SimCardConfig;
use tracing::{debug, warn};

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Serial port the host modem channel is attached to
    pub port: String,
    /// Baud rate
    #[serde(default = "default_baud")]
    pub baud_rate: u32,
    /// Emulated card
    #[serde(default)]
    pub card: SimCardConfig,
}

fn default_baud() -> u32 {
    115200
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: "/dev/ttyS0".to_string(),
            baud_rate: default_baud(),
            card: SimCardConfig::default(),
        }
    }
}

impl Settings {
    /// Get the XDG config directory for sim-modem
    /// Uses $XDG_CONFIG_HOME/sim-modem on Linux/macOS, falls back to ~/.config/sim-modem
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("sim-modem"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("sim-modem"))
    }

    /// Get the default settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from `path`, or from the default location
    ///
    /// A missing or unreadable file yields the defaults.
    pub fn load(path: Option<&Path>) -> Self {
        match path.map(Path::to_path_buf).or_else(Self::settings_path) {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No settings path, using defaults");
                Self::default()
            }
        }
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                debug!("No settings at {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring invalid settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
