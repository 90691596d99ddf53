//! In-memory viewing history.

use std::collections::VecDeque;

use async_trait::async_trait;
use pipdock_protocols::{HistoryEntry, HistoryStore, HostResult};
use tokio::sync::RwLock;

/// Entries kept before the oldest is dropped.
pub const MAX_HISTORY_ENTRIES: usize = 30;

/// Newest-first history, one entry per page URL.
pub struct InMemoryHistory {
    entries: RwLock<VecDeque<HistoryEntry>>,
    capacity: usize,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_ENTRIES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    async fn record(&self, entry: HistoryEntry) -> HostResult<()> {
        let mut entries = self.entries.write().await;
        entries.retain(|e| e.url != entry.url);
        entries.push_front(entry);
        entries.truncate(self.capacity);
        Ok(())
    }

    async fn entries(&self) -> HostResult<Vec<HistoryEntry>> {
        Ok(self.entries.read().await.iter().cloned().collect())
    }
}
