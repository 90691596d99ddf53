//! Popup window and bridge defaults.

use std::time::Duration;

use pipdock_protocols::PositionPreset;
use serde::{Deserialize, Serialize};

/// Defaults applied when an open request leaves a field out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopupConfig {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    /// One of `bottom-right`, `top-right`, `bottom-left`, `top-left`.
    #[serde(default = "default_position")]
    pub position: String,

    /// Playback volume in [0, 1].
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// How long to wait for the popup tab to finish loading before injecting anyway.
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            position: default_position(),
            volume: default_volume(),
            load_timeout_ms: default_load_timeout_ms(),
        }
    }
}

impl PopupConfig {
    pub fn position_preset(&self) -> PositionPreset {
        PositionPreset::parse_or_default(Some(&self.position))
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

fn default_width() -> u32 {
    640
}

fn default_height() -> u32 {
    360
}

fn default_position() -> String {
    PositionPreset::BottomRight.as_str().to_string()
}

fn default_volume() -> f64 {
    0.8
}

fn default_load_timeout_ms() -> u64 {
    15_000
}

/// Messaging bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// How long the page side waits for `BridgeReady` before giving up.
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: default_ready_timeout_ms(),
        }
    }
}

impl BridgeConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

fn default_ready_timeout_ms() -> u64 {
    3_000
}
