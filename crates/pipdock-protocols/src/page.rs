//! Page-side host access used by the page orchestrator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HostResult;
use crate::types::{DomSnapshot, ElementHandle};

/// What the page host should collect when taking a [`DomSnapshot`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRequest {
    /// Candidate selectors in priority order.
    pub selectors: Vec<String>,
    /// Containers that mark a video as the page's primary video.
    #[serde(default)]
    pub primary_containers: Vec<String>,
    /// Markers that flag a container as an ad preview.
    #[serde(default)]
    pub ad_preview_markers: Vec<String>,
    /// Attribute carrying the platform's native video id.
    #[serde(default)]
    pub native_id_attribute: Option<String>,
}

/// Selectors used to detect an in-stream ad.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdMarkers {
    pub player_selector: String,
    /// Any of these classes on the player means an ad is showing.
    pub player_ad_classes: Vec<String>,
    pub ad_module_selector: String,
    pub ad_text_selector: String,
}

/// Result of probing the page with [`AdMarkers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdStatus {
    pub player_has_ad_class: bool,
    pub ad_module_visible: bool,
    pub ad_text_visible: bool,
}

impl AdStatus {
    pub fn is_ad_playing(&self) -> bool {
        self.player_has_ad_class || self.ad_module_visible || self.ad_text_visible
    }
}

/// Playhead and duration of a media element, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaTiming {
    /// `None` when the duration is not a finite number (e.g. live streams).
    pub duration: Option<f64>,
    pub current_time: f64,
}

/// Event raised by the detached page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PageEvent {
    Seeking { handle: ElementHandle },
    Seeked { handle: ElementHandle },
    VolumeChanged { handle: ElementHandle, muted: bool },
    /// The element left Picture-in-Picture.
    PipExited { handle: ElementHandle },
    /// The element's box changed size.
    Resized { handle: ElementHandle },
    /// The document subtree changed.
    Mutated,
    /// Dock control: retry activation.
    ManualActivate,
    /// Dock control: skip the current ad.
    ManualSkip,
    /// Dock control: minimize the detached window.
    MinimizeRequest,
}

/// Live access to one detached page.
#[async_trait]
pub trait PageHost: Send + Sync {
    async fn snapshot(&self, request: &SnapshotRequest) -> HostResult<DomSnapshot>;

    /// Whether the element is currently seeking.
    async fn is_seeking(&self, handle: &ElementHandle) -> HostResult<bool>;

    /// Show native controls, unmute, and apply `volume`.
    async fn prepare_playback(&self, handle: &ElementHandle, volume: f64) -> HostResult<()>;

    /// Ask for exclusive Picture-in-Picture on the element.
    async fn request_picture_in_picture(&self, handle: &ElementHandle) -> HostResult<()>;

    async fn unmute(&self, handle: &ElementHandle) -> HostResult<()>;

    async fn ad_status(&self, markers: &AdMarkers) -> HostResult<AdStatus>;

    /// Click the first visible element matching one of `selectors`, in order.
    /// Returns the selector that matched.
    async fn click_first_visible(&self, selectors: &[String]) -> HostResult<Option<String>>;

    /// Timing of the first element matched by `selectors`.
    async fn media_timing(&self, selectors: &[String]) -> HostResult<Option<MediaTiming>>;

    async fn seek(&self, selectors: &[String], time: f64) -> HostResult<()>;

    /// Show a short status message in the page's dock.
    async fn notify(&self, message: &str) -> HostResult<()>;
}
