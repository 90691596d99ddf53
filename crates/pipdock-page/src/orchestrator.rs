//! Page orchestrator: one task per detached page.
//!
//! Starts the activation run immediately and then multiplexes page events,
//! the ad-skip period, deferred rescans, and the in-flight activation. Ends
//! when the page event stream closes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::future::OptionFuture;
use pipdock_protocols::{
    ElementHandle, MinimizeRequester, PageEvent, PageHost, PipdockError, SessionMetadata,
};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};
use tracing::{debug, info, warn};

use crate::ad_skip::{AD_CHECK_PERIOD, AdSkipMonitor};
use crate::profiles::PlatformProfile;
use crate::scorer::RescanThrottle;
use crate::sequencer::Sequencer;

type Activation = Pin<Box<dyn Future<Output = Result<ElementHandle, PipdockError>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RescanKind {
    /// Refresh the remembered candidate while nothing is active.
    Mutation,
    /// Look for a better winner than the active element.
    Resize,
}

/// At most one deferred rescan; a resize outranks a mutation.
#[derive(Debug, Clone, Copy)]
struct PendingRescan {
    at: Instant,
    kind: RescanKind,
}

pub struct PageOrchestrator {
    host: Arc<dyn PageHost>,
    minimize: Arc<dyn MinimizeRequester>,
    sequencer: Arc<Sequencer>,
    ad_skip: Option<AdSkipMonitor>,
    throttle: RescanThrottle,
}

impl PageOrchestrator {
    pub fn new(
        host: Arc<dyn PageHost>,
        minimize: Arc<dyn MinimizeRequester>,
        metadata: &SessionMetadata,
    ) -> Self {
        let profile = PlatformProfile::for_platform(metadata.platform);
        let volume = metadata.volume.clamp(0.0, 1.0);
        let sequencer = Arc::new(Sequencer::new(
            host.clone(),
            minimize.clone(),
            profile,
            volume,
        ));
        let ad_skip = profile
            .ad_skip
            .as_ref()
            .map(|ad_profile| AdSkipMonitor::new(host.clone(), ad_profile));

        Self {
            host,
            minimize,
            sequencer,
            ad_skip,
            throttle: RescanThrottle::default(),
        }
    }

    pub fn sequencer(&self) -> Arc<Sequencer> {
        self.sequencer.clone()
    }

    /// Drive the page until `events` closes.
    pub async fn run(mut self, mut events: mpsc::Receiver<PageEvent>) {
        let platform = self.sequencer.profile().platform;
        info!("Page orchestrator started ({})", platform);

        let mut activation: Option<Activation> = Some(self.start_run());
        let mut pending_rescan: Option<PendingRescan> = None;
        let mut ad_ticks = interval_at(Instant::now() + AD_CHECK_PERIOD, AD_CHECK_PERIOD);
        ad_ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    self.handle_event(event, &mut activation, &mut pending_rescan).await;
                }
                Some(result) = OptionFuture::from(activation.as_mut()), if activation.is_some() => {
                    activation = None;
                    self.on_activation_finished(result).await;
                }
                _ = ad_ticks.tick(), if self.ad_skip.is_some() => {
                    if let Some(monitor) = self.ad_skip.as_mut() {
                        monitor.tick().await;
                    }
                }
                _ = sleep_until(pending_rescan.map_or_else(Instant::now, |p| p.at)), if pending_rescan.is_some() => {
                    if let Some(due) = pending_rescan.take() {
                        self.rescan(due.kind, &mut activation, &mut pending_rescan).await;
                    }
                }
            }
        }

        info!("Page orchestrator stopped ({})", platform);
    }

    fn start_run(&self) -> Activation {
        let sequencer = self.sequencer.clone();
        Box::pin(async move { sequencer.run().await })
    }

    fn start_manual(&self) -> Activation {
        let sequencer = self.sequencer.clone();
        Box::pin(async move { sequencer.manual_activate().await })
    }

    fn start_switch(&self, handle: ElementHandle) -> Activation {
        let sequencer = self.sequencer.clone();
        Box::pin(async move {
            sequencer.activate(&handle).await?;
            Ok(handle)
        })
    }

    async fn handle_event(
        &mut self,
        event: PageEvent,
        activation: &mut Option<Activation>,
        pending_rescan: &mut Option<PendingRescan>,
    ) {
        match event {
            PageEvent::Seeking { handle } => self.sequencer.on_seeking(&handle),
            PageEvent::Seeked { handle } => self.sequencer.on_seeked(&handle),
            PageEvent::VolumeChanged { handle, muted } => {
                self.sequencer.on_volume_changed(&handle, muted).await;
            }
            PageEvent::PipExited { handle } => {
                if self.sequencer.on_pip_exited(&handle) {
                    self.notify("Picture-in-Picture closed").await;
                }
            }
            PageEvent::Resized { handle } => {
                if activation.is_some() || self.sequencer.active_target().as_ref() != Some(&handle) {
                    return;
                }
                self.rescan(RescanKind::Resize, activation, pending_rescan).await;
            }
            PageEvent::Mutated => {
                if pending_rescan.is_some() {
                    return;
                }
                self.rescan(RescanKind::Mutation, activation, pending_rescan).await;
            }
            PageEvent::ManualActivate => {
                if activation.is_some() {
                    debug!("Activation already running, ignoring manual request");
                } else if self.sequencer.manual_activation_allowed() {
                    *activation = Some(self.start_manual());
                } else {
                    debug!("Manual activation not available in {:?}", self.sequencer.state());
                }
            }
            PageEvent::ManualSkip => match self.ad_skip.as_mut() {
                Some(monitor) => {
                    monitor.trigger_manual().await;
                }
                None => debug!("Ad skip not supported on this platform"),
            },
            PageEvent::MinimizeRequest => {
                let reply = self.minimize.request_minimize().await;
                if !reply.ok {
                    warn!(
                        "Minimize request failed: {}",
                        reply.error.unwrap_or_else(|| "unknown error".to_string())
                    );
                }
            }
        }
    }

    /// Run a rescan now if the throttle allows, otherwise coalesce it into the
    /// single deferred rescan.
    async fn rescan(
        &mut self,
        kind: RescanKind,
        activation: &mut Option<Activation>,
        pending_rescan: &mut Option<PendingRescan>,
    ) {
        // a mutation rescan that would not evaluate must not spend a slot
        if kind == RescanKind::Mutation && !self.sequencer.accepts_candidate_refresh() {
            return;
        }
        if let Err(at) = self.throttle.try_acquire() {
            let kind = match pending_rescan.take() {
                Some(PendingRescan {
                    kind: RescanKind::Resize,
                    ..
                }) => RescanKind::Resize,
                _ => kind,
            };
            debug!("{:?} rescan deferred", kind);
            *pending_rescan = Some(PendingRescan { at, kind });
            return;
        }

        match kind {
            RescanKind::Mutation => {
                self.sequencer.refresh_candidate().await;
            }
            RescanKind::Resize => {
                if activation.is_some() {
                    return;
                }
                if let Some(next) = self.sequencer.rescan_after_resize().await {
                    *activation = Some(self.start_switch(next));
                }
            }
        }
    }

    async fn on_activation_finished(&self, result: Result<ElementHandle, PipdockError>) {
        match result {
            Ok(handle) => {
                debug!("Activation finished on {}", handle);
                self.notify("Picture-in-Picture active").await;
            }
            Err(e) => {
                warn!("Activation failed: {}", e);
                self.notify("Picture-in-Picture failed, use retry").await;
            }
        }
    }

    async fn notify(&self, message: &str) {
        if let Err(e) = self.host.notify(message).await {
            debug!("Dock notification failed: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
