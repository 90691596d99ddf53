//! Ad and interstitial filter.
//!
//! Rejected candidates are never scored.

use std::fmt;

use pipdock_protocols::{VideoCandidate, Viewport};

use crate::profiles::PlatformProfile;

/// Smallest rendered width or height of an eligible video.
pub const MIN_RENDERED_SIZE: f64 = 50.0;

/// Id/class substrings that mark an element as advertising.
pub const AD_VOCABULARY: [&str; 4] = ["ad", "advertisement", "sponsor", "promoted"];

/// Why a candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    /// `readyState == 0`, no metadata loaded yet.
    NoMetadata,
    PipDisabled,
    /// `display:none`, `visibility:hidden`, or zero opacity.
    Hidden,
    Undersized { width: f64, height: f64 },
    OffScreen,
    AdPreviewContainer,
    NarrowContainer { width: f64 },
    AdVocabulary(&'static str),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NoMetadata => write!(f, "no metadata"),
            RejectReason::PipDisabled => write!(f, "picture-in-picture disabled"),
            RejectReason::Hidden => write!(f, "hidden"),
            RejectReason::Undersized { width, height } => {
                write!(f, "undersized ({}x{})", width, height)
            }
            RejectReason::OffScreen => write!(f, "off-screen"),
            RejectReason::AdPreviewContainer => write!(f, "inside an ad preview"),
            RejectReason::NarrowContainer { width } => {
                write!(f, "container too narrow ({}px)", width)
            }
            RejectReason::AdVocabulary(word) => write!(f, "id/class contains '{}'", word),
        }
    }
}

/// Classify a candidate. `Ok(())` means eligible.
pub fn check(
    candidate: &VideoCandidate,
    viewport: &Viewport,
    profile: &PlatformProfile,
) -> Result<(), RejectReason> {
    if candidate.ready_state == 0 {
        return Err(RejectReason::NoMetadata);
    }
    if candidate.pip_disabled {
        return Err(RejectReason::PipDisabled);
    }
    if !candidate.style.is_visible() {
        return Err(RejectReason::Hidden);
    }

    let rect = &candidate.rect;
    if rect.width < MIN_RENDERED_SIZE || rect.height < MIN_RENDERED_SIZE {
        return Err(RejectReason::Undersized {
            width: rect.width,
            height: rect.height,
        });
    }
    if rect.is_outside(viewport) {
        return Err(RejectReason::OffScreen);
    }

    if let (Some(rule), Some(container)) = (profile.container_ad_rule, candidate.container) {
        if container.has_ad_preview {
            return Err(RejectReason::AdPreviewContainer);
        }
        if container.width < rule.min_width {
            return Err(RejectReason::NarrowContainer {
                width: container.width,
            });
        }
    }

    let id = candidate.id.to_ascii_lowercase();
    let class = candidate.class.to_ascii_lowercase();
    if let Some(word) = AD_VOCABULARY
        .into_iter()
        .find(|word| id.contains(*word) || class.contains(*word))
    {
        return Err(RejectReason::AdVocabulary(word));
    }

    Ok(())
}

pub fn is_eligible(candidate: &VideoCandidate, viewport: &Viewport, profile: &PlatformProfile) -> bool {
    check(candidate, viewport, profile).is_ok()
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
