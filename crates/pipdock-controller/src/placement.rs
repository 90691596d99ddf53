//! Popup size clamping, corner placement, and URL tagging.

use pipdock_protocols::{PipdockError, PositionPreset, WindowGeometry, WorkArea};
use url::Url;

pub const MIN_WIDTH: u32 = 200;
pub const MAX_WIDTH: u32 = 2000;
pub const MIN_HEIGHT: u32 = 150;
pub const MAX_HEIGHT: u32 = 1500;

pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 360;
pub const DEFAULT_VOLUME: f64 = 0.8;

/// Gap between the popup and the work-area edges it is anchored to.
pub const EDGE_MARGIN: i32 = 16;

/// Query parameter appended to the popup URL.
pub const DETACHED_PARAM: (&str, &str) = ("pipdock", "1");

/// `window.name` the page sees when running detached.
pub const WINDOW_NAME_SENTINEL: &str = "pipdock-detached";

/// Popup defaults used when a request leaves fields out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopupDefaults {
    pub width: u32,
    pub height: u32,
    pub position: PositionPreset,
    pub volume: f64,
}

impl Default for PopupDefaults {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            position: PositionPreset::BottomRight,
            volume: DEFAULT_VOLUME,
        }
    }
}

/// Substitute `default` for missing, non-finite, or non-positive input, then clamp.
pub fn clamp_dimension(value: Option<f64>, default: u32, min: u32, max: u32) -> u32 {
    let value = value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.round())
        .unwrap_or(default as f64);
    (value as u32).clamp(min, max)
}

pub fn normalize_size(width: Option<f64>, height: Option<f64>, defaults: &PopupDefaults) -> (u32, u32) {
    (
        clamp_dimension(width, defaults.width, MIN_WIDTH, MAX_WIDTH),
        clamp_dimension(height, defaults.height, MIN_HEIGHT, MAX_HEIGHT),
    )
}

/// Volume in [0, 1]. Values in (1, 100] are read as percentages.
pub fn normalize_volume(volume: Option<f64>, default: f64) -> f64 {
    match volume.filter(|v| v.is_finite()) {
        None => default.clamp(0.0, 1.0),
        Some(v) if v > 1.0 && v <= 100.0 => v / 100.0,
        Some(v) => v.clamp(0.0, 1.0),
    }
}

/// Anchor a `width` x `height` popup to the preset's corner of `area`.
///
/// The result never starts left of or above the work-area origin, even when
/// the popup is larger than the area.
pub fn compute_geometry(area: &WorkArea, width: u32, height: u32, preset: PositionPreset) -> WindowGeometry {
    let w = width as i32;
    let h = height as i32;

    let left = if preset.is_left() {
        area.left + EDGE_MARGIN
    } else {
        area.right() - w - EDGE_MARGIN
    };
    let top = if preset.is_top() {
        area.top + EDGE_MARGIN
    } else {
        area.bottom() - h - EDGE_MARGIN
    };

    WindowGeometry {
        width,
        height,
        left: left.max(area.left),
        top: top.max(area.top),
    }
}

/// Parse and check an open request URL. Only absolute http(s) URLs are accepted.
pub fn validate_url(raw: Option<&str>) -> Result<Url, PipdockError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PipdockError::Validation("Missing URL".to_string()))?;

    let url = Url::parse(raw)
        .map_err(|e| PipdockError::Validation(format!("Invalid URL '{}': {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PipdockError::Validation(format!(
            "Unsupported URL scheme '{}'",
            other
        ))),
    }
}

/// Append the detached sentinel parameter unless it is already present.
pub fn tag_url(url: &Url) -> Url {
    let (key, value) = DETACHED_PARAM;
    let mut tagged = url.clone();
    if !url.query_pairs().any(|(k, v)| k == key && v == value) {
        tagged.query_pairs_mut().append_pair(key, value);
    }
    tagged
}
