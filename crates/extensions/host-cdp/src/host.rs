//! Window, tab, and injection services over one browser connection.
//!
//! A detached popup is a page target opened in its own browser window. The
//! target id doubles as the [`TabId`]; the browser window id is the
//! [`WindowId`].

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use pipdock_config::BrowserConfig;
use pipdock_controller::BridgeClient;
use pipdock_protocols::{
    CreateWindowRequest, CreatedWindow, HostError, HostResult, InjectionService,
    MinimizeRequester, SessionMetadata, TabId, TabService, TabStatus, WindowId, WindowState,
    WindowingService, WorkArea,
};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cdp::{
    CdpClient, CdpError, CdpWindowState, DocumentState, PageSession, ScreenArea, WindowBounds,
};
use crate::runtime::PageRuntime;
use crate::scripts;

const REMOVED_QUEUE: usize = 16;

/// Connection settings for [`CdpHost`].
#[derive(Debug, Clone)]
pub struct CdpHostConfig {
    /// HTTP debugging endpoint or browser WebSocket URL.
    pub endpoint: String,
    pub request_timeout: Duration,
}

impl CdpHostConfig {
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            request_timeout: config.request_timeout(),
        }
    }
}

struct Tracked {
    window_id: WindowId,
    /// URL the popup was opened with.
    url: String,
    session: Arc<PageSession>,
    runtime: Option<PageRuntime>,
    bridge_task: Option<JoinHandle<()>>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        if let Some(task) = self.bridge_task.take() {
            task.abort();
        }
    }
}

/// Browser-backed host services for the popup window controller.
pub struct CdpHost {
    client: CdpClient,
    bridge: BridgeClient,
    /// Detached pages by target id.
    pages: RwLock<HashMap<String, Tracked>>,
}

impl CdpHost {
    pub async fn connect(config: &CdpHostConfig, bridge: BridgeClient) -> Result<Arc<Self>, CdpError> {
        let client = CdpClient::connect(&config.endpoint, config.request_timeout).await?;
        info!("Connected to browser at {}", client.browser_ws_url());
        Ok(Arc::new(Self {
            client,
            bridge,
            pages: RwLock::new(HashMap::new()),
        }))
    }

    /// Windows of detached pages closed outside the controller (user closed
    /// the popup, browser crashed the tab).
    pub async fn watch_removed_windows(self: &Arc<Self>) -> Result<mpsc::Receiver<WindowId>, CdpError> {
        let events = self.client.browser_events();
        self.client.discover_targets().await?;

        let (tx, rx) = mpsc::channel(REMOVED_QUEUE);
        tokio::spawn(watch_targets(Arc::downgrade(self), events, tx));
        Ok(rx)
    }

    fn session(&self, tab: &TabId) -> Option<Arc<PageSession>> {
        self.pages
            .read()
            .get(tab.as_str())
            .map(|tracked| tracked.session.clone())
    }

    fn page(&self, tab: &TabId) -> Option<(Arc<PageSession>, String)> {
        self.pages
            .read()
            .get(tab.as_str())
            .map(|tracked| (tracked.session.clone(), tracked.url.clone()))
    }

    fn require_session(&self, tab: &TabId) -> HostResult<Arc<PageSession>> {
        self.session(tab)
            .ok_or_else(|| HostError::NotFound(format!("no tab with id {}", tab)))
    }

    fn forget(&self, target_id: &str) -> Option<WindowId> {
        self.pages
            .write()
            .remove(target_id)
            .map(|tracked| tracked.window_id)
    }

    async fn read_screen(session: &PageSession) -> Result<WorkArea, CdpError> {
        let value = session.evaluate(scripts::SCREEN_AREA).await?;
        let area: ScreenArea = serde_json::from_value(value)?;
        Ok(WorkArea {
            left: area.avail_left.round() as i32,
            top: area.avail_top.round() as i32,
            width: area.avail_width.round() as i32,
            height: area.avail_height.round() as i32,
        })
    }

    /// A fresh target reports the initial `about:blank` as complete before it
    /// navigates; that document does not count.
    async fn ready_state(session: &PageSession, url: &str) -> Result<TabStatus, CdpError> {
        let value = session.evaluate(scripts::DOCUMENT_STATE).await?;
        let document: DocumentState = serde_json::from_value(value)?;
        Ok(if document.is_loaded(url) {
            TabStatus::Complete
        } else {
            debug!("Page at {} is {}", document.href, document.ready_state);
            TabStatus::Loading
        })
    }
}

async fn watch_targets(
    host: Weak<CdpHost>,
    mut events: broadcast::Receiver<crate::cdp::CdpEvent>,
    tx: mpsc::Sender<WindowId>,
) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Dropped {} browser events", skipped);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };
        if event.method != "Target.targetDestroyed" {
            continue;
        }
        let Some(target_id) = event.param_str("targetId") else {
            continue;
        };
        let Some(host) = host.upgrade() else {
            break;
        };
        if let Some(window_id) = host.forget(target_id) {
            debug!("Detached page {} went away (window {})", target_id, window_id);
            if tx.send(window_id).await.is_err() {
                break;
            }
        }
    }
    debug!("Target watcher stopped");
}

#[async_trait]
impl WindowingService for CdpHost {
    async fn primary_work_area(&self) -> HostResult<WorkArea> {
        let tracked = self
            .pages
            .read()
            .values()
            .next()
            .map(|tracked| tracked.session.clone());
        if let Some(session) = tracked {
            return Ok(Self::read_screen(&session).await?);
        }

        // measure from any open page
        let targets = self.client.get_targets().await?;
        let page = targets
            .iter()
            .find(|t| t.target_type == "page")
            .ok_or_else(|| HostError::Unavailable("no page target to measure the screen".to_string()))?;
        let session = self.client.attach(&page.target_id).await?;
        let area = Self::read_screen(&session).await;
        if let Err(e) = self.client.detach(&session).await {
            debug!("Failed to detach from {}: {}", page.target_id, e);
        }
        Ok(area?)
    }

    async fn create_popup(&self, request: &CreateWindowRequest) -> HostResult<CreatedWindow> {
        let geometry = request.geometry;
        let bounds = WindowBounds {
            left: Some(geometry.left),
            top: Some(geometry.top),
            width: Some(geometry.width),
            height: Some(geometry.height),
            window_state: None,
        };

        let target_id = self
            .client
            .create_window(&request.url, &bounds, !request.focused)
            .await?;
        let window_id = self.client.window_for_target(&target_id).await?;

        // createTarget treats the geometry as a hint
        if let Err(e) = self.client.set_window_bounds(window_id, &bounds).await {
            warn!("Failed to place window {}: {}", window_id, e);
        }
        if request.focused {
            if let Err(e) = self.client.activate_target(&target_id).await {
                warn!("Failed to focus window {}: {}", window_id, e);
            }
        }

        let session = Arc::new(self.client.attach(&target_id).await?);
        let window_id = WindowId(window_id);
        self.pages.write().insert(
            target_id.clone(),
            Tracked {
                window_id,
                url: request.url.clone(),
                session,
                runtime: None,
                bridge_task: None,
            },
        );

        debug!("Opened window {} with page {}", window_id, target_id);
        Ok(CreatedWindow {
            window_id,
            tab_id: Some(TabId::new(target_id)),
        })
    }

    async fn set_window_state(&self, window: WindowId, state: WindowState) -> HostResult<()> {
        let state = match state {
            WindowState::Normal => CdpWindowState::Normal,
            WindowState::Minimized => CdpWindowState::Minimized,
        };
        self.client
            .set_window_bounds(window.0, &WindowBounds::state(state))
            .await?;
        Ok(())
    }

    async fn remove_window(&self, window: WindowId) -> HostResult<()> {
        let target_id = self
            .pages
            .read()
            .iter()
            .find(|(_, tracked)| tracked.window_id == window)
            .map(|(target_id, _)| target_id.clone())
            .ok_or_else(|| HostError::NotFound(format!("no window with id {}", window)))?;

        let result = self.client.close_target(&target_id).await;
        self.forget(&target_id);
        result?;
        Ok(())
    }
}

#[async_trait]
impl TabService for CdpHost {
    async fn status(&self, tab: &TabId) -> HostResult<Option<TabStatus>> {
        let Some((session, url)) = self.page(tab) else {
            return Ok(None);
        };
        Ok(Some(Self::ready_state(&session, &url).await?))
    }

    async fn wait_for_complete(&self, tab: &TabId) -> HostResult<()> {
        let (session, url) = self
            .page(tab)
            .ok_or_else(|| HostError::NotFound(format!("no tab with id {}", tab)))?;
        let mut events = session.subscribe();

        if Self::ready_state(&session, &url).await? == TabStatus::Complete {
            return Ok(());
        }

        loop {
            match events.recv().await {
                // the initial document may fire its own load
                Ok(event) if event.method == "Page.loadEventFired" => {
                    if Self::ready_state(&session, &url).await? == TabStatus::Complete {
                        return Ok(());
                    }
                }
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(CdpError::SessionClosed.into());
                }
            }
        }
    }
}

#[async_trait]
impl InjectionService for CdpHost {
    async fn mark_window(&self, tab: &TabId, sentinel: &str) -> HostResult<()> {
        let session = self.require_session(tab)?;
        session.evaluate(&scripts::mark_window(sentinel)).await?;
        Ok(())
    }

    async fn insert_stylesheet(&self, tab: &TabId) -> HostResult<()> {
        let session = self.require_session(tab)?;
        session.evaluate(&scripts::insert_stylesheet()).await?;
        Ok(())
    }

    async fn inject_bridge(&self, tab: &TabId) -> HostResult<()> {
        let session = self.require_session(tab)?;
        session.add_binding(scripts::BINDING_NAME).await?;
        session.evaluate(scripts::bridge()).await?;

        let bridge = self.bridge.clone();
        let page = session.clone();
        let task = tokio::spawn(async move {
            let script = match bridge.wait_ready().await {
                Ok(()) => scripts::bridge_ready(),
                Err(e) => {
                    warn!("Minimize bridge unavailable: {}", e);
                    scripts::bridge_unavailable(&e.to_string())
                }
            };
            if let Err(e) = page.evaluate(&script).await {
                debug!("Failed to report bridge state to page: {}", e);
            }
        });

        if let Some(tracked) = self.pages.write().get_mut(tab.as_str()) {
            if let Some(previous) = tracked.bridge_task.replace(task) {
                previous.abort();
            }
        }
        Ok(())
    }

    async fn deliver_metadata(&self, tab: &TabId, metadata: &SessionMetadata) -> HostResult<()> {
        let session = self.require_session(tab)?;
        session.evaluate(&scripts::deliver_metadata(metadata)).await?;
        Ok(())
    }

    async fn inject_main_script(&self, tab: &TabId, metadata: &SessionMetadata) -> HostResult<()> {
        let session = self.require_session(tab)?;
        session.evaluate(scripts::page_main()).await?;

        let minimize: Arc<dyn MinimizeRequester> = Arc::new(self.bridge.clone());
        let runtime = PageRuntime::start(session, minimize, metadata);
        match self.pages.write().get_mut(tab.as_str()) {
            Some(tracked) => tracked.runtime = Some(runtime),
            None => return Err(HostError::NotFound(format!("no tab with id {}", tab))),
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
