//! Host services the popup window controller depends on.
//!
//! Each trait wraps one host capability. Implementations live in extensions
//! (see `pipdock-host-cdp`); tests substitute recording fakes.

use async_trait::async_trait;

use crate::error::HostResult;
use crate::types::{
    CreateWindowRequest, CreatedWindow, HistoryEntry, Reply, SessionMetadata, TabId, TabStatus,
    WindowId, WindowState, WorkArea,
};

/// Window creation, update, and removal.
#[async_trait]
pub trait WindowingService: Send + Sync {
    /// Usable area of the primary display.
    async fn primary_work_area(&self) -> HostResult<WorkArea>;

    /// Create a focused, minimal-chrome popup window.
    async fn create_popup(&self, request: &CreateWindowRequest) -> HostResult<CreatedWindow>;

    async fn set_window_state(&self, window: WindowId, state: WindowState) -> HostResult<()>;

    /// Remove a window. A window that no longer exists yields `HostError::NotFound`.
    async fn remove_window(&self, window: WindowId) -> HostResult<()>;
}

/// Tab status queries.
#[async_trait]
pub trait TabService: Send + Sync {
    /// Current load status, or `None` if the tab no longer exists.
    async fn status(&self, tab: &TabId) -> HostResult<Option<TabStatus>>;

    /// Resolve once the tab reports load-complete. Callers bound this with a timeout.
    async fn wait_for_complete(&self, tab: &TabId) -> HostResult<()>;
}

/// The five injection pipeline steps, run in order by the controller.
#[async_trait]
pub trait InjectionService: Send + Sync {
    /// Set `window.name` in the page to `sentinel`.
    async fn mark_window(&self, tab: &TabId, sentinel: &str) -> HostResult<()>;

    /// Insert the minimal-UI stylesheet.
    async fn insert_stylesheet(&self, tab: &TabId) -> HostResult<()>;

    /// Inject the page-side bridge script.
    async fn inject_bridge(&self, tab: &TabId) -> HostResult<()>;

    async fn deliver_metadata(&self, tab: &TabId, metadata: &SessionMetadata) -> HostResult<()>;

    /// Inject the main page script and start the page orchestrator for `tab`.
    async fn inject_main_script(&self, tab: &TabId, metadata: &SessionMetadata)
    -> HostResult<()>;
}

/// Viewing-history persistence.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn record(&self, entry: HistoryEntry) -> HostResult<()>;

    /// Stored entries, newest first.
    async fn entries(&self) -> HostResult<Vec<HistoryEntry>>;
}

/// Page-side handle for asking the controller to minimize the detached window.
///
/// Never fails: every failure is folded into `Reply { ok: false, .. }`.
#[async_trait]
pub trait MinimizeRequester: Send + Sync {
    async fn request_minimize(&self) -> Reply;
}
