//! The single detached window session.

use chrono::{DateTime, Utc};
use pipdock_protocols::{
    Platform, PositionPreset, SessionMetadata, SessionState, TabId, WindowGeometry, WindowId,
};
use tracing::debug;

/// The one popup window the controller tracks. At most one exists at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct DetachedWindowSession {
    pub window_id: WindowId,
    pub tab_id: Option<TabId>,
    pub geometry: WindowGeometry,
    pub position: PositionPreset,
    pub volume: f64,
    pub platform: Platform,
    pub opened_at: DateTime<Utc>,
    state: SessionState,
}

impl DetachedWindowSession {
    pub fn new(
        window_id: WindowId,
        tab_id: Option<TabId>,
        geometry: WindowGeometry,
        position: PositionPreset,
        volume: f64,
        platform: Platform,
    ) -> Self {
        Self {
            window_id,
            tab_id,
            geometry,
            position,
            volume,
            platform,
            opened_at: Utc::now(),
            state: SessionState::Opening,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transition(&mut self, to: SessionState) {
        debug!("Session {}: {:?} -> {:?}", self.window_id, self.state, to);
        self.state = to;
    }

    /// Metadata handed to the page in injection step 4.
    pub fn metadata(&self) -> SessionMetadata {
        SessionMetadata {
            position: self.position,
            volume: self.volume,
            platform: self.platform,
            timestamp: self.opened_at,
        }
    }
}
