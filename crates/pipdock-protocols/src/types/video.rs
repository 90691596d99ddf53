//! Video candidates and DOM snapshots.

use serde::{Deserialize, Serialize};

use super::{Rect, Viewport};

/// Opaque identity of an element inside the detached page.
///
/// Minted by the page host; only meaningful for the page that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computed-style visibility of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleFlags {
    pub display_none: bool,
    pub visibility_hidden: bool,
    pub opacity_zero: bool,
}

impl StyleFlags {
    pub fn is_visible(&self) -> bool {
        !(self.display_none || self.visibility_hidden || self.opacity_zero)
    }
}

/// One ancestor collected while walking up from a video element.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AncestorInfo {
    /// Lower-case tag name.
    pub tag: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub class: String,
}

impl AncestorInfo {
    /// Whether the lower-cased id or class contains `needle`.
    pub fn id_or_class_contains(&self, needle: &str) -> bool {
        self.id.to_ascii_lowercase().contains(needle)
            || self.class.to_ascii_lowercase().contains(needle)
    }
}

/// Where the element's media comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    /// A fetchable network URL.
    Network,
    /// `blob:`, `data:`, or `mediasource:` URL that only lives in the page.
    Ephemeral,
    #[default]
    None,
}

impl SourceKind {
    pub fn classify(src: Option<&str>) -> Self {
        match src.map(str::trim) {
            None | Some("") => SourceKind::None,
            Some(s) if s.starts_with("blob:") || s.starts_with("data:") || s.starts_with("mediasource:") => {
                SourceKind::Ephemeral
            }
            Some(_) => SourceKind::Network,
        }
    }
}

/// The element's immediate container (nearest `div` ancestor).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInfo {
    /// Rendered width (`offsetWidth`).
    pub width: f64,
    /// Contains one of the platform's ad-preview markers.
    pub has_ad_preview: bool,
}

/// A video element under evaluation. Recomputed from the live page on every scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCandidate {
    pub handle: ElementHandle,
    pub rect: Rect,
    /// Decoded frame width (`videoWidth`).
    pub natural_width: u32,
    /// Decoded frame height (`videoHeight`).
    pub natural_height: u32,
    pub paused: bool,
    pub muted: bool,
    /// HTML media `readyState` (0-4).
    pub ready_state: u8,
    #[serde(default)]
    pub style: StyleFlags,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub class: String,
    /// Ancestors from the parent upwards, at most 20.
    #[serde(default)]
    pub ancestors: Vec<AncestorInfo>,
    #[serde(default)]
    pub container: Option<ContainerInfo>,
    #[serde(default)]
    pub in_primary_container: bool,
    #[serde(default)]
    pub has_native_id: bool,
    #[serde(default)]
    pub pip_disabled: bool,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub source: SourceKind,
}

impl VideoCandidate {
    /// Maximum ancestor depth walked for context tags.
    pub const MAX_ANCESTORS: usize = 20;

    /// Decoded pixel area.
    pub fn pixel_area(&self) -> f64 {
        self.natural_width as f64 * self.natural_height as f64
    }

    /// First frame available (`HAVE_CURRENT_DATA` or better).
    pub fn has_first_frame(&self) -> bool {
        self.ready_state >= 2
    }
}

/// Candidates matched by one selector, in DOM order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectorMatches {
    pub selector: String,
    pub candidates: Vec<VideoCandidate>,
}

/// Point-in-time view of the document used by the scorer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DomSnapshot {
    pub viewport: Viewport,
    /// One entry per requested selector, in priority order.
    pub groups: Vec<SelectorMatches>,
}

impl DomSnapshot {
    pub fn find(&self, handle: &ElementHandle) -> Option<&VideoCandidate> {
        self.groups
            .iter()
            .flat_map(|g| g.candidates.iter())
            .find(|c| &c.handle == handle)
    }
}
