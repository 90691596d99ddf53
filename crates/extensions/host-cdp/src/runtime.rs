//! Per-page runtime: binding events in, page orchestrator out.

use std::sync::Arc;

use pipdock_page::PageOrchestrator;
use pipdock_protocols::{MinimizeRequester, PageEvent, SessionMetadata};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cdp::{CdpEvent, PageSession};
use crate::page_host::CdpPageHost;
use crate::scripts::BINDING_NAME;

const EVENT_QUEUE: usize = 64;

/// Orchestrator task for one detached page. Dropping it stops the orchestrator.
pub struct PageRuntime {
    pump: JoinHandle<()>,
}

impl PageRuntime {
    pub fn start(
        session: Arc<PageSession>,
        minimize: Arc<dyn MinimizeRequester>,
        metadata: &SessionMetadata,
    ) -> Self {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE);
        let pump = tokio::spawn(pump_events(session.subscribe(), tx));

        let host = Arc::new(CdpPageHost::new(session));
        let orchestrator = PageOrchestrator::new(host, minimize, metadata);
        tokio::spawn(orchestrator.run(rx));

        Self { pump }
    }
}

impl Drop for PageRuntime {
    fn drop(&mut self) {
        // closing the event queue ends the orchestrator
        self.pump.abort();
    }
}

/// Decode a page event raised through the binding.
pub fn parse_binding_event(event: &CdpEvent) -> Option<PageEvent> {
    if event.method != "Runtime.bindingCalled" || event.param_str("name") != Some(BINDING_NAME) {
        return None;
    }
    let payload = event.param_str("payload")?;
    match serde_json::from_str(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Ignoring malformed page event {}: {}", payload, e);
            None
        }
    }
}

async fn pump_events(mut cdp_events: broadcast::Receiver<CdpEvent>, tx: mpsc::Sender<PageEvent>) {
    loop {
        match cdp_events.recv().await {
            Ok(event) => {
                if let Some(page_event) = parse_binding_event(&event) {
                    if tx.send(page_event).await.is_err() {
                        break;
                    }
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Dropped {} page events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    debug!("Page event pump stopped");
}
