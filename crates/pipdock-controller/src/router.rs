//! Message router: a single worker that applies controller requests one at a time.

use std::sync::Arc;

use chrono::Utc;
use pipdock_protocols::{
    ControllerRequest, HistoryEntry, HistoryRequest, HistoryStore, PipdockError, Reply,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::controller::PopupWindowController;
use crate::pipeline::OpenPath;

/// Default depth of the request queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

struct Envelope {
    request: ControllerRequest,
    reply: oneshot::Sender<Reply>,
}

pub struct Router {
    controller: Arc<PopupWindowController>,
    history: Arc<dyn HistoryStore>,
}

impl Router {
    pub fn new(controller: Arc<PopupWindowController>, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            controller,
            history,
        }
    }

    /// Start the worker. It stops once every [`RouterHandle`] is dropped.
    pub fn spawn(self, capacity: usize) -> (RouterHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(self.run(rx));
        (RouterHandle { tx }, task)
    }

    async fn run(self, mut rx: mpsc::Receiver<Envelope>) {
        info!("Message router started");
        while let Some(Envelope { request, reply }) = rx.recv().await {
            let response = self.handle(request).await;
            if reply.send(response).is_err() {
                debug!("Requester went away before the reply");
            }
        }
        info!("Message router stopped");
    }

    /// Apply one request and fold the outcome into a [`Reply`].
    pub async fn handle(&self, request: ControllerRequest) -> Reply {
        let kind = request.kind();
        debug!("Handling {}", kind);

        let reply: Reply = match request {
            ControllerRequest::OpenDetached(open) => self
                .controller
                .open(open, OpenPath::Primary)
                .await
                .map(|_| ())
                .into(),
            ControllerRequest::OpenGenericDetached(open) => self
                .controller
                .open(open, OpenPath::Generic)
                .await
                .map(|_| ())
                .into(),
            ControllerRequest::CloseDetached => {
                self.controller.close().await;
                Reply::ok()
            }
            ControllerRequest::MinimizeDetached => self.controller.minimize().await.into(),
            ControllerRequest::RecordHistory(entry) => self.record_history(entry).await.into(),
        };

        if let Some(error) = &reply.error {
            warn!("{} failed: {}", kind, error);
        }
        reply
    }

    async fn record_history(&self, request: HistoryRequest) -> Result<(), PipdockError> {
        let url = request
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| PipdockError::Validation("Missing URL".to_string()))?;

        self.history
            .record(HistoryEntry {
                url,
                video_url: request.video_url,
                title: request.title,
                thumbnail: request.thumbnail,
                added_at: Utc::now(),
            })
            .await?;
        Ok(())
    }
}

/// Cloneable sender side of the router queue.
#[derive(Clone)]
pub struct RouterHandle {
    tx: mpsc::Sender<Envelope>,
}

impl RouterHandle {
    /// Queue `request` and wait for its reply. Never fails.
    pub async fn send(&self, request: ControllerRequest) -> Reply {
        let (reply_tx, reply_rx) = oneshot::channel();
        let envelope = Envelope {
            request,
            reply: reply_tx,
        };
        if self.tx.send(envelope).await.is_err() {
            return Reply::error("Message router is not running");
        }
        reply_rx
            .await
            .unwrap_or_else(|_| Reply::error("Message router dropped the request"))
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
