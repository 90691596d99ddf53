//! Application state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use pipdock_controller::{PopupWindowController, RouterHandle};
use pipdock_protocols::HistoryStore;

/// Application state shared across handlers.
pub struct AppState {
    pub router: RouterHandle,
    pub controller: Arc<PopupWindowController>,
    pub history: Arc<dyn HistoryStore>,
    start_time: Instant,
    request_count: AtomicU64,
}

impl AppState {
    pub fn new(
        router: RouterHandle,
        controller: Arc<PopupWindowController>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            router,
            controller,
            history,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn increment_requests(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }
}
