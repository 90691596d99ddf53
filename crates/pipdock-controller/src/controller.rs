//! Popup window controller: owns the single detached window session.
//!
//! Every operation holds the session lock from start to finish, so no
//! operation ever observes another one mid-transition.

use std::sync::Arc;
use std::time::Duration;

use pipdock_config::Config;
use pipdock_protocols::{
    CreateWindowRequest, HostError, InjectionService, OpenRequest, Platform, PipdockError,
    PositionPreset, SessionState, TabId, TabService, TabStatus, WindowId, WindowState,
    WindowingService,
};
use tokio::sync::{Mutex, watch};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::pipeline::{self, OpenPath};
use crate::placement::{self, PopupDefaults};
use crate::session::DetachedWindowSession;

/// Controller tuning derived from the `[popup]` and `[bridge]` config sections.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub defaults: PopupDefaults,
    /// Upper bound on waiting for the popup tab to finish loading.
    pub load_timeout: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            defaults: PopupDefaults::default(),
            load_timeout: Duration::from_secs(15),
        }
    }
}

impl ControllerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            defaults: PopupDefaults {
                width: config.popup.width,
                height: config.popup.height,
                position: config.popup.position_preset(),
                volume: config.popup.volume,
            },
            load_timeout: config.popup.load_timeout(),
        }
    }
}

/// Host services the controller drives.
#[derive(Clone)]
pub struct HostServices {
    pub windowing: Arc<dyn WindowingService>,
    pub tabs: Arc<dyn TabService>,
    pub injection: Arc<dyn InjectionService>,
}

pub struct PopupWindowController {
    hosts: HostServices,
    settings: ControllerSettings,
    session: Mutex<Option<DetachedWindowSession>>,
    state_tx: watch::Sender<SessionState>,
}

impl PopupWindowController {
    pub fn new(hosts: HostServices, settings: ControllerSettings) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Closed);
        Self {
            hosts,
            settings,
            session: Mutex::new(None),
            state_tx,
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Last published session state. Does not wait for the session lock.
    pub fn session_state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Snapshot of the tracked session.
    pub async fn session(&self) -> Option<DetachedWindowSession> {
        self.session.lock().await.clone()
    }

    /// Open `request.url` in a new popup, replacing any existing session.
    pub async fn open(&self, request: OpenRequest, path: OpenPath) -> Result<WindowId, PipdockError> {
        let url = placement::validate_url(request.url.as_deref())?;

        let mut guard = self.session.lock().await;
        self.close_locked(&mut guard).await;

        let defaults = &self.settings.defaults;
        let platform = match path {
            OpenPath::Primary => Platform::Youtube,
            OpenPath::Generic => request
                .platform_hint
                .unwrap_or_else(|| Platform::detect(url.as_str())),
        };
        let position = request
            .position
            .as_deref()
            .map(|p| PositionPreset::parse_or_default(Some(p)))
            .unwrap_or(defaults.position);
        let volume = placement::normalize_volume(request.volume, defaults.volume);
        let (width, height) = placement::normalize_size(request.width, request.height, defaults);

        let area = self.hosts.windowing.primary_work_area().await?;
        let geometry = placement::compute_geometry(&area, width, height, position);
        let tagged = placement::tag_url(&url);

        info!(
            "Opening detached window for {} ({}, {}x{} at {},{})",
            url, platform, geometry.width, geometry.height, geometry.left, geometry.top
        );
        self.publish(SessionState::Opening);

        let created = match self
            .hosts
            .windowing
            .create_popup(&CreateWindowRequest {
                url: tagged.to_string(),
                geometry,
                focused: true,
            })
            .await
        {
            Ok(created) => created,
            Err(e) => {
                error!("Failed to create popup window: {}", e);
                self.publish(SessionState::Closed);
                return Err(e.into());
            }
        };

        let window_id = created.window_id;
        let mut session = DetachedWindowSession::new(
            window_id,
            created.tab_id.clone(),
            geometry,
            position,
            volume,
            platform,
        );
        session.transition(SessionState::Loading);
        self.publish(SessionState::Loading);
        let metadata = session.metadata();
        let session = guard.insert(session);

        let Some(tab) = created.tab_id else {
            error!("Popup window {} reported no tab", window_id);
            return Err(HostError::Operation(format!("window {} has no tab", window_id)).into());
        };

        self.wait_for_load(&tab).await;

        session.transition(SessionState::Injecting);
        self.publish(SessionState::Injecting);
        pipeline::run(self.hosts.injection.as_ref(), &tab, &metadata, path).await?;

        session.transition(SessionState::ActivatingPip);
        self.publish(SessionState::ActivatingPip);
        info!("Detached window {} ready, activating Picture-in-Picture", window_id);
        Ok(window_id)
    }

    /// Remove the tracked window. Never fails.
    pub async fn close(&self) {
        let mut guard = self.session.lock().await;
        self.close_locked(&mut guard).await;
    }

    /// Minimize the tracked window. No session is a no-op success.
    pub async fn minimize(&self) -> Result<(), PipdockError> {
        let mut guard = self.session.lock().await;
        let Some(session) = guard.as_mut() else {
            debug!("Minimize requested with no detached window");
            return Ok(());
        };

        let previous = session.state();
        session.transition(SessionState::Minimizing);
        self.publish(SessionState::Minimizing);
        let result = self
            .hosts
            .windowing
            .set_window_state(session.window_id, WindowState::Minimized)
            .await;

        let (next, outcome) = match result {
            Ok(()) => {
                debug!("Minimized detached window {}", session.window_id);
                (SessionState::Active, Ok(()))
            }
            Err(e) if e.is_not_found() => {
                warn!("Detached window {} already gone: {}", session.window_id, e);
                (SessionState::Active, Ok(()))
            }
            Err(e) => {
                error!("Failed to minimize window {}: {}", session.window_id, e);
                (previous, Err(e.into()))
            }
        };
        session.transition(next);
        self.publish(next);
        outcome
    }

    /// The host reports `window` was removed, e.g. closed by the user.
    pub async fn on_window_removed(&self, window: WindowId) {
        let mut guard = self.session.lock().await;
        if guard.as_ref().is_some_and(|s| s.window_id == window) {
            *guard = None;
            self.publish(SessionState::Closed);
            info!("Detached window {} closed externally", window);
        }
    }

    async fn close_locked(&self, guard: &mut Option<DetachedWindowSession>) {
        let Some(mut session) = guard.take() else {
            return;
        };

        session.transition(SessionState::Closing);
        self.publish(SessionState::Closing);
        let result = self.hosts.windowing.remove_window(session.window_id).await;
        self.publish(SessionState::Closed);

        match result {
            Ok(()) => info!("Closed detached window {}", session.window_id),
            Err(e) if e.is_not_found() => {
                warn!("Detached window {} already gone: {}", session.window_id, e)
            }
            Err(e) => error!("Failed to remove window {}: {}", session.window_id, e),
        }
    }

    /// Wait for the tab to finish loading, giving up after the load timeout.
    async fn wait_for_load(&self, tab: &TabId) {
        match self.hosts.tabs.status(tab).await {
            Ok(Some(TabStatus::Complete)) => return,
            Ok(None) => {
                debug!("Tab {} no longer exists, treating as loaded", tab);
                return;
            }
            Ok(Some(TabStatus::Loading)) => {}
            Err(e) => {
                warn!("Could not read status of tab {}: {}", tab, e);
                return;
            }
        }

        match timeout(self.settings.load_timeout, self.hosts.tabs.wait_for_complete(tab)).await {
            Ok(Ok(())) => debug!("Tab {} finished loading", tab),
            Ok(Err(e)) if e.is_not_found() => debug!("Tab {} went away while loading", tab),
            Ok(Err(e)) => warn!("Waiting for tab {} failed, injecting anyway: {}", tab, e),
            Err(_) => warn!(
                "Tab {} still loading after {:?}, injecting anyway",
                tab, self.settings.load_timeout
            ),
        }
    }

    fn publish(&self, state: SessionState) {
        self.state_tx.send_replace(state);
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
