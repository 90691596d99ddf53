//! Picture-in-Picture activation sequencer.
//!
//! One sequencer drives one detached page:
//!
//! ```text
//! Idle -> Searching -> Found -> Preparing -> Guarding -> Activating -> Active | Failed
//! Active -(PiP exit)-> Idle
//! ```
//!
//! The sequencer is the only writer of the active PiP target. All methods take
//! `&self` so the orchestrator can feed page events in while an activation run
//! is suspended.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use pipdock_protocols::{ElementHandle, MinimizeRequester, PageHost, PipdockError};
use tokio::sync::watch;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use crate::profiles::PlatformProfile;
use crate::scorer::{self, ScoreResult};

/// A seek within this window before activation triggers the guard delay.
pub const SEEK_GUARD_WINDOW: Duration = Duration::from_millis(500);
/// Extra wait applied by the guard.
pub const SEEK_GUARD_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequencerState {
    #[default]
    Idle,
    Searching,
    Found,
    Preparing,
    Guarding,
    Activating,
    Active,
    Failed,
}

#[derive(Debug, Default)]
struct SeekInner {
    seeking: bool,
    last_seek: Option<Instant>,
}

/// Seek activity observed on the tracked element.
#[derive(Debug, Default)]
pub struct SeekTracker {
    inner: Mutex<SeekInner>,
}

impl SeekTracker {
    pub fn on_seeking(&self) {
        let mut inner = self.inner.lock();
        inner.seeking = true;
        inner.last_seek = Some(Instant::now());
    }

    pub fn on_seeked(&self) {
        self.inner.lock().seeking = false;
    }

    pub fn is_seeking(&self) -> bool {
        self.inner.lock().seeking
    }

    pub fn seeked_recently(&self) -> bool {
        self.inner
            .lock()
            .last_seek
            .is_some_and(|at| at.elapsed() < SEEK_GUARD_WINDOW)
    }
}

pub struct Sequencer {
    host: Arc<dyn PageHost>,
    minimize: Arc<dyn MinimizeRequester>,
    profile: &'static PlatformProfile,
    volume: f64,
    state: watch::Sender<SequencerState>,
    active: watch::Sender<Option<ElementHandle>>,
    candidate: Mutex<Option<ElementHandle>>,
    seek: SeekTracker,
    manual_retry_used: AtomicBool,
}

impl Sequencer {
    pub fn new(
        host: Arc<dyn PageHost>,
        minimize: Arc<dyn MinimizeRequester>,
        profile: &'static PlatformProfile,
        volume: f64,
    ) -> Self {
        Self {
            host,
            minimize,
            profile,
            volume,
            state: watch::channel(SequencerState::Idle).0,
            active: watch::channel(None).0,
            candidate: Mutex::new(None),
            seek: SeekTracker::default(),
            manual_retry_used: AtomicBool::new(false),
        }
    }

    pub fn profile(&self) -> &'static PlatformProfile {
        self.profile
    }

    pub fn state(&self) -> SequencerState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SequencerState> {
        self.state.subscribe()
    }

    /// Element currently in Picture-in-Picture.
    pub fn active_target(&self) -> Option<ElementHandle> {
        self.active.borrow().clone()
    }

    pub fn subscribe_active(&self) -> watch::Receiver<Option<ElementHandle>> {
        self.active.subscribe()
    }

    /// Last candidate found by a search or a rescan.
    pub fn candidate(&self) -> Option<ElementHandle> {
        self.candidate.lock().clone()
    }

    pub fn seek_tracker(&self) -> &SeekTracker {
        &self.seek
    }

    fn set_state(&self, state: SequencerState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!("Sequencer {:?} -> {:?}", previous, state);
        }
    }

    fn is_tracked(&self, handle: &ElementHandle) -> bool {
        self.candidate.lock().as_ref() == Some(handle)
            || self.active.borrow().as_ref() == Some(handle)
    }

    /// Search for a candidate, then activate it.
    pub async fn run(&self) -> Result<ElementHandle, PipdockError> {
        let Some(found) = self.search().await else {
            return Err(PipdockError::Activation(format!(
                "No eligible video found after {} attempts",
                self.profile.max_retries
            )));
        };
        let handle = found.candidate.handle;
        self.activate(&handle).await?;
        Ok(handle)
    }

    /// Poll the scorer until a decoding candidate appears or retries run out.
    pub async fn search(&self) -> Option<ScoreResult> {
        self.set_state(SequencerState::Searching);
        sleep(self.profile.initial_delay).await;

        let request = self.profile.snapshot_request();
        let attempts = self.profile.max_retries;
        for attempt in 1..=attempts {
            match self.host.snapshot(&request).await {
                Ok(snapshot) => match scorer::select(&snapshot, self.profile) {
                    Some(result) if result.candidate.has_first_frame() => {
                        info!(
                            "Found video {} on attempt {}/{}",
                            result.candidate.handle, attempt, attempts
                        );
                        *self.candidate.lock() = Some(result.candidate.handle.clone());
                        self.set_state(SequencerState::Found);
                        return Some(result);
                    }
                    Some(result) => debug!(
                        "Video {} not decoding yet (readyState {})",
                        result.candidate.handle, result.candidate.ready_state
                    ),
                    None => debug!("No eligible video on attempt {}/{}", attempt, attempts),
                },
                Err(e) => warn!("Snapshot failed on attempt {}/{}: {}", attempt, attempts, e),
            }

            if attempt < attempts {
                sleep(self.profile.retry_interval).await;
            }
        }

        warn!("Video search exhausted {} attempts", attempts);
        self.set_state(SequencerState::Failed);
        None
    }

    /// Prepare, guard, and put `handle` into Picture-in-Picture.
    pub async fn activate(&self, handle: &ElementHandle) -> Result<(), PipdockError> {
        *self.candidate.lock() = Some(handle.clone());

        self.set_state(SequencerState::Preparing);
        if let Err(e) = self.host.prepare_playback(handle, self.volume).await {
            warn!("Failed to prepare playback on {}: {}", handle, e);
        }

        self.set_state(SequencerState::Guarding);
        self.guard_seek(handle).await;

        self.set_state(SequencerState::Activating);
        match self.host.request_picture_in_picture(handle).await {
            Ok(()) => {
                self.active.send_replace(Some(handle.clone()));
                self.set_state(SequencerState::Active);
                info!("Picture-in-Picture active on {}", handle);

                let reply = self.minimize.request_minimize().await;
                if !reply.ok {
                    warn!(
                        "Minimize request failed: {}",
                        reply.error.unwrap_or_else(|| "unknown error".to_string())
                    );
                }
                Ok(())
            }
            Err(e) => {
                // A failed switch leaves the previous target in PiP.
                if self.active_target().is_some() {
                    self.set_state(SequencerState::Active);
                } else {
                    self.set_state(SequencerState::Failed);
                }
                error!("Picture-in-Picture request on {} failed: {}", handle, e);
                Err(PipdockError::Activation(e.to_string()))
            }
        }
    }

    async fn guard_seek(&self, handle: &ElementHandle) {
        let seeking = self.seek.is_seeking()
            || self.host.is_seeking(handle).await.unwrap_or(false);
        if seeking || self.seek.seeked_recently() {
            debug!("Seek in progress on {}, delaying activation", handle);
            sleep(SEEK_GUARD_DELAY).await;
        }
    }

    pub fn on_seeking(&self, handle: &ElementHandle) {
        if self.is_tracked(handle) {
            self.seek.on_seeking();
        }
    }

    pub fn on_seeked(&self, handle: &ElementHandle) {
        if self.is_tracked(handle) {
            self.seek.on_seeked();
        }
    }

    /// PiP exit on the active target clears it and returns to Idle.
    /// Returns whether the event applied.
    pub fn on_pip_exited(&self, handle: &ElementHandle) -> bool {
        if self.active.borrow().as_ref() != Some(handle) {
            return false;
        }
        self.active.send_replace(None);
        self.set_state(SequencerState::Idle);
        info!("Picture-in-Picture exited on {}", handle);
        true
    }

    /// Re-unmute the active target when the host mutes it outside a seek.
    pub async fn on_volume_changed(&self, handle: &ElementHandle, muted: bool) {
        if !muted || self.seek.is_seeking() || self.active.borrow().as_ref() != Some(handle) {
            return;
        }
        debug!("Active target {} was muted, unmuting", handle);
        if let Err(e) = self.host.unmute(handle).await {
            warn!("Failed to unmute {}: {}", handle, e);
        }
    }

    /// Whether the dock's activate control may start a run now.
    pub fn manual_activation_allowed(&self) -> bool {
        match self.state() {
            SequencerState::Failed => !self.manual_retry_used.load(Ordering::SeqCst),
            SequencerState::Idle => self.candidate().is_some(),
            _ => false,
        }
    }

    /// Activate from the dock. After a failure this may be used once.
    pub async fn manual_activate(&self) -> Result<ElementHandle, PipdockError> {
        match self.state() {
            SequencerState::Failed => {
                if self.manual_retry_used.swap(true, Ordering::SeqCst) {
                    return Err(PipdockError::Activation(
                        "Manual retry already used".to_string(),
                    ));
                }
            }
            SequencerState::Idle => {}
            other => {
                return Err(PipdockError::Activation(format!(
                    "Cannot activate while {:?}",
                    other
                )));
            }
        }

        match self.candidate() {
            Some(handle) => {
                self.activate(&handle).await?;
                Ok(handle)
            }
            None => self.run().await,
        }
    }

    /// After the active element resized, look for a different winner.
    pub async fn rescan_after_resize(&self) -> Option<ElementHandle> {
        if !self.profile.rescan_on_resize || self.state() != SequencerState::Active {
            return None;
        }
        let active = self.active_target()?;
        let winner = self.select_now().await?;
        let ready = winner.candidate.has_first_frame();
        let handle = winner.candidate.handle;
        if handle != active && ready {
            info!("Video {} now outscores active {}", handle, active);
            Some(handle)
        } else {
            None
        }
    }

    /// Whether a mutation rescan would evaluate anything: no target is active
    /// and no activation is in flight.
    pub fn accepts_candidate_refresh(&self) -> bool {
        self.active_target().is_none()
            && matches!(self.state(), SequencerState::Idle | SequencerState::Failed)
    }

    /// Refresh the remembered candidate after a DOM mutation.
    pub async fn refresh_candidate(&self) -> Option<ElementHandle> {
        if !self.accepts_candidate_refresh() {
            return None;
        }
        let winner = self.select_now().await?;
        if !winner.candidate.has_first_frame() {
            return None;
        }
        let handle = winner.candidate.handle;
        *self.candidate.lock() = Some(handle.clone());
        debug!("Candidate refreshed to {}", handle);
        Some(handle)
    }

    async fn select_now(&self) -> Option<ScoreResult> {
        match self.host.snapshot(&self.profile.snapshot_request()).await {
            Ok(snapshot) => scorer::select(&snapshot, self.profile),
            Err(e) => {
                debug!("Rescan snapshot failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "sequencer_tests.rs"]
mod tests;
