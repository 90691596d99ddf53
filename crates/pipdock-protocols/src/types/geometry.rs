//! Geometry: element rectangles, viewport, display work area, window placement.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rectangle in CSS pixels, relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width * 0.5
    }

    pub fn center_y(&self) -> f64 {
        self.top + self.height * 0.5
    }

    /// True when no part of the rectangle overlaps the viewport.
    pub fn is_outside(&self, viewport: &Viewport) -> bool {
        self.bottom() < 0.0
            || self.top > viewport.height
            || self.right() < 0.0
            || self.left > viewport.width
    }
}

/// Visible viewport size (`innerWidth` x `innerHeight`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Usable region of the primary display, excluding taskbars and docks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkArea {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl WorkArea {
    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }
}

/// Final popup window bounds in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub width: u32,
    pub height: u32,
    pub left: i32,
    pub top: i32,
}

/// Corner of the work area the popup is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PositionPreset {
    #[default]
    BottomRight,
    TopRight,
    BottomLeft,
    TopLeft,
}

impl PositionPreset {
    pub const ALL: [PositionPreset; 4] = [
        PositionPreset::BottomRight,
        PositionPreset::TopRight,
        PositionPreset::BottomLeft,
        PositionPreset::TopLeft,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PositionPreset::BottomRight => "bottom-right",
            PositionPreset::TopRight => "top-right",
            PositionPreset::BottomLeft => "bottom-left",
            PositionPreset::TopLeft => "top-left",
        }
    }

    pub fn is_left(&self) -> bool {
        matches!(self, PositionPreset::BottomLeft | PositionPreset::TopLeft)
    }

    pub fn is_top(&self) -> bool {
        matches!(self, PositionPreset::TopRight | PositionPreset::TopLeft)
    }

    /// Parse a preset, falling back to bottom-right for anything unrecognized.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for PositionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PositionPreset::ALL
            .into_iter()
            .find(|preset| preset.as_str() == s.trim())
            .ok_or_else(|| format!("unknown position preset: {}", s))
    }
}

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod tests;
