//! In-stream ad skipping.
//!
//! Periodic ticks and manual triggers share one cooldown, so two triggers
//! inside the cooldown window produce at most one click-or-seek.

use std::sync::Arc;
use std::time::Duration;

use pipdock_protocols::{AdMarkers, PageHost};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::profiles::AdSkipProfile;

/// Period of the background ad check.
pub const AD_CHECK_PERIOD: Duration = Duration::from_secs(2);
/// Minimum time between two skip actions.
pub const SKIP_COOLDOWN: Duration = Duration::from_millis(2000);
/// How long a manual trigger pauses the periodic check.
pub const MANUAL_SUPPRESSION: Duration = Duration::from_millis(2000);

/// Seek target offset from the end of an ad.
const SEEK_END_OFFSET: f64 = 0.5;
/// No seek when the playhead is already this close to the target.
const SEEK_TOLERANCE: f64 = 1.0;

/// Last-skip timestamp plus cooldown.
#[derive(Debug, Clone)]
pub struct AdSkipState {
    last_skip: Option<Instant>,
    cooldown: Duration,
}

impl Default for AdSkipState {
    fn default() -> Self {
        Self {
            last_skip: None,
            cooldown: SKIP_COOLDOWN,
        }
    }
}

impl AdSkipState {
    pub fn ready(&self) -> bool {
        self.last_skip
            .is_none_or(|at| at.elapsed() >= self.cooldown)
    }

    pub fn record(&mut self) {
        self.last_skip = Some(Instant::now());
    }
}

/// What a skip attempt did.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipAction {
    Clicked(String),
    Seeked(f64),
}

pub struct AdSkipMonitor {
    host: Arc<dyn PageHost>,
    profile: &'static AdSkipProfile,
    markers: AdMarkers,
    skip_selectors: Vec<String>,
    video_selectors: Vec<String>,
    state: AdSkipState,
    suppressed_until: Option<Instant>,
}

impl AdSkipMonitor {
    pub fn new(host: Arc<dyn PageHost>, profile: &'static AdSkipProfile) -> Self {
        Self {
            host,
            profile,
            markers: profile.markers(),
            skip_selectors: profile.skip_selectors(),
            video_selectors: profile.video_selectors(),
            state: AdSkipState::default(),
            suppressed_until: None,
        }
    }

    pub fn state(&self) -> &AdSkipState {
        &self.state
    }

    /// Periodic check. Acts only when an ad is detected.
    pub async fn tick(&mut self) -> Option<SkipAction> {
        if self
            .suppressed_until
            .is_some_and(|until| Instant::now() < until)
        {
            return None;
        }
        if !self.ad_playing().await {
            return None;
        }
        self.skip().await
    }

    /// Dock-triggered skip. Tries the skip controls even before an ad is
    /// detected and pauses the periodic check while it runs.
    pub async fn trigger_manual(&mut self) -> Option<SkipAction> {
        self.suppressed_until = Some(Instant::now() + MANUAL_SUPPRESSION);
        let action = self.skip().await;
        if action.is_none() {
            debug!("Manual ad skip found nothing to do");
        }
        action
    }

    async fn ad_playing(&self) -> bool {
        match self.host.ad_status(&self.markers).await {
            Ok(status) => status.is_ad_playing(),
            Err(e) => {
                debug!("Ad status probe failed: {}", e);
                false
            }
        }
    }

    async fn skip(&mut self) -> Option<SkipAction> {
        if !self.state.ready() {
            debug!("Ad skip on cooldown");
            return None;
        }

        match self.host.click_first_visible(&self.skip_selectors).await {
            Ok(Some(selector)) => {
                self.state.record();
                info!("Clicked ad skip control '{}'", selector);
                return Some(SkipAction::Clicked(selector));
            }
            Ok(None) => {}
            Err(e) => warn!("Skip control click failed: {}", e),
        }

        if !self.ad_playing().await {
            return None;
        }
        self.seek_past_ad().await
    }

    async fn seek_past_ad(&mut self) -> Option<SkipAction> {
        let timing = match self.host.media_timing(&self.video_selectors).await {
            Ok(Some(timing)) => timing,
            Ok(None) => return None,
            Err(e) => {
                debug!("Media timing probe failed: {}", e);
                return None;
            }
        };

        let duration = timing
            .duration
            .filter(|d| d.is_finite() && *d > 0.0 && *d < self.profile.max_seek_duration)?;
        let target = (duration - SEEK_END_OFFSET).max(0.0);
        if (timing.current_time - target).abs() <= SEEK_TOLERANCE {
            return None;
        }

        match self.host.seek(&self.video_selectors, target).await {
            Ok(()) => {
                self.state.record();
                info!("Fast-forwarded ad to {:.1}s of {:.1}s", target, duration);
                Some(SkipAction::Seeked(target))
            }
            Err(e) => {
                warn!("Ad seek failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "ad_skip_tests.rs"]
mod tests;
