//! Window, tab, and session types shared between the controller and hosts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Platform, PositionPreset, WindowGeometry};

/// Host window identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub i64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host tab identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub String);

impl TabId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of the detached window session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    #[default]
    Closed,
    Opening,
    Loading,
    Injecting,
    ActivatingPip,
    Active,
    Minimizing,
    Closing,
}

impl SessionState {
    /// States in which an operation is still running against the window.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            SessionState::Opening
                | SessionState::Loading
                | SessionState::Injecting
                | SessionState::Minimizing
                | SessionState::Closing
        )
    }
}

/// Window state the controller asks the host for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowState {
    Normal,
    Minimized,
}

/// Load status of a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TabStatus {
    Loading,
    Complete,
}

/// Parameters for creating the popup window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateWindowRequest {
    pub url: String,
    pub geometry: WindowGeometry,
    pub focused: bool,
}

/// What the host reports back after creating a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedWindow {
    pub window_id: WindowId,
    /// First tab of the window, if the host reported one.
    pub tab_id: Option<TabId>,
}

/// Session metadata delivered to the detached page (pipeline step 4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub position: PositionPreset,
    /// Playback volume in [0, 1].
    pub volume: f64,
    pub platform: Platform,
    pub timestamp: DateTime<Utc>,
}

/// One viewing-history record handed to the external history store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub added_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_states() {
        assert!(SessionState::Opening.is_in_flight());
        assert!(SessionState::Injecting.is_in_flight());
        assert!(!SessionState::Active.is_in_flight());
        assert!(!SessionState::Closed.is_in_flight());
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let metadata = SessionMetadata {
            position: PositionPreset::TopLeft,
            volume: 0.5,
            platform: Platform::Facebook,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["position"], "top-left");
        assert_eq!(json["platform"], "facebook");
        assert_eq!(json["volume"], 0.5);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_session_state_serialize() {
        let json = serde_json::to_string(&SessionState::ActivatingPip).unwrap();
        assert_eq!(json, "\"activatingPip\"");
    }
}
