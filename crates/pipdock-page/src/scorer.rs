//! Video candidate scoring and selection.

use std::time::Duration;

use pipdock_protocols::{DomSnapshot, VideoCandidate, Viewport};
use tokio::time::Instant;
use tracing::debug;

use crate::filter;
use crate::profiles::PlatformProfile;

const MAIN_LANDMARK_BONUS: f64 = 500.0;
const ARTICLE_BONUS: f64 = 300.0;
const MAIN_NAME_BONUS: f64 = 200.0;
const CONTENT_NAME_BONUS: f64 = 150.0;
const SIDE_CONTENT_PENALTY: f64 = 500.0;
const PLAYING_BONUS: f64 = 200.0;
const PRIMARY_CONTAINER_BONUS: f64 = 1000.0;
const NATIVE_ID_BONUS: f64 = 500.0;
const MEDIA_CDN_BONUS: f64 = 100.0;
const CENTER_WEIGHT: f64 = 1000.0;

/// Minimum time between two scorer evaluations.
pub const MIN_RESCAN_INTERVAL: Duration = Duration::from_secs(2);

/// The winning candidate of a selection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub candidate: VideoCandidate,
    pub score: f64,
    /// Selector that matched the candidate.
    pub selector: String,
}

/// Score one eligible candidate.
pub fn score(candidate: &VideoCandidate, viewport: &Viewport, profile: &PlatformProfile) -> f64 {
    let mut score = candidate.pixel_area() / 1000.0;
    score += center_score(candidate, viewport);

    for ancestor in candidate.ancestors.iter().take(VideoCandidate::MAX_ANCESTORS) {
        if ancestor.tag == "main" || ancestor.role.as_deref() == Some("main") {
            score += MAIN_LANDMARK_BONUS;
        }
        if ancestor.tag == "article" {
            score += ARTICLE_BONUS;
        }
        if ancestor.id_or_class_contains("main") {
            score += MAIN_NAME_BONUS;
        }
        if ancestor.id_or_class_contains("content") {
            score += CONTENT_NAME_BONUS;
        }
        if ["sidebar", "suggestion", "related"]
            .iter()
            .any(|word| ancestor.id_or_class_contains(word))
        {
            score -= SIDE_CONTENT_PENALTY;
        }
    }

    if !candidate.paused {
        score += PLAYING_BONUS;
    }
    if candidate.in_primary_container {
        score += PRIMARY_CONTAINER_BONUS;
    }
    if candidate.has_native_id {
        score += NATIVE_ID_BONUS;
    }
    if let Some(src) = candidate.src.as_deref() {
        if profile.media_cdn.iter().any(|cdn| src.contains(cdn)) {
            score += MEDIA_CDN_BONUS;
        }
    }

    score
}

/// 0..=1000, linear in the distance between the element and viewport centers,
/// normalized by the center-to-corner distance.
fn center_score(candidate: &VideoCandidate, viewport: &Viewport) -> f64 {
    let cx = viewport.width / 2.0;
    let cy = viewport.height / 2.0;
    let max_distance = (cx * cx + cy * cy).sqrt();
    if max_distance <= 0.0 {
        return 0.0;
    }
    let dx = candidate.rect.center_x() - cx;
    let dy = candidate.rect.center_y() - cy;
    let distance = (dx * dx + dy * dy).sqrt();
    (1.0 - distance / max_distance).max(0.0) * CENTER_WEIGHT
}

/// Pick the best candidate of the first selector group with any eligible element.
///
/// Lower-priority groups are never consulted once a higher one yields a
/// candidate. Ties keep the earlier element.
pub fn select(snapshot: &DomSnapshot, profile: &PlatformProfile) -> Option<ScoreResult> {
    for group in &snapshot.groups {
        let mut best: Option<ScoreResult> = None;

        for candidate in &group.candidates {
            if let Err(reason) = filter::check(candidate, &snapshot.viewport, profile) {
                debug!("Rejected {} from '{}': {}", candidate.handle, group.selector, reason);
                continue;
            }
            let value = score(candidate, &snapshot.viewport, profile);
            if best.as_ref().is_none_or(|b| value > b.score) {
                best = Some(ScoreResult {
                    candidate: candidate.clone(),
                    score: value,
                    selector: group.selector.clone(),
                });
            }
        }

        if let Some(result) = best {
            debug!(
                "Selected {} via '{}' (score {:.1})",
                result.candidate.handle, result.selector, result.score
            );
            return Some(result);
        }
    }
    None
}

/// Limits scorer evaluations to one per interval.
#[derive(Debug)]
pub struct RescanThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl RescanThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_RESCAN_INTERVAL),
            last: None,
        }
    }

    /// Claim an evaluation slot.
    ///
    /// Returns `Err(next)` with the earliest instant the next evaluation may run
    /// when called too soon; the caller coalesces into a single deferred rescan.
    pub fn try_acquire(&mut self) -> Result<(), Instant> {
        let now = Instant::now();
        match self.last {
            Some(last) if now < last + self.interval => Err(last + self.interval),
            _ => {
                self.last = Some(now);
                Ok(())
            }
        }
    }
}

impl Default for RescanThrottle {
    fn default() -> Self {
        Self::new(MIN_RESCAN_INTERVAL)
    }
}

#[cfg(test)]
#[path = "scorer_tests.rs"]
mod tests;
