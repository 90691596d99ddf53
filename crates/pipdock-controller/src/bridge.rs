//! Messaging bridge between a detached page and the controller.
//!
//! The page side holds a [`BridgeClient`] and may only ask for one thing:
//! minimize the detached window. The [`BridgeServer`] forwards each request
//! to the router and announces readiness once it is listening.

use std::time::Duration;

use async_trait::async_trait;
use pipdock_protocols::{ControllerRequest, MinimizeRequester, PipdockError, Reply};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tracing::{debug, info};

use crate::router::RouterHandle;

/// Create a connected client/server pair.
pub fn channel(ready_timeout: Duration) -> (BridgeClient, BridgeServer) {
    let (tx, rx) = mpsc::channel(16);
    let (ready_tx, ready_rx) = watch::channel(false);
    (
        BridgeClient {
            tx,
            ready: ready_rx,
            ready_timeout,
        },
        BridgeServer {
            rx,
            ready: ready_tx,
        },
    )
}

/// Page-side end of the bridge.
#[derive(Clone)]
pub struct BridgeClient {
    tx: mpsc::Sender<oneshot::Sender<Reply>>,
    ready: watch::Receiver<bool>,
    ready_timeout: Duration,
}

impl BridgeClient {
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Wait up to the ready timeout for `BridgeReady`.
    pub async fn wait_ready(&self) -> Result<(), PipdockError> {
        let mut ready = self.ready.clone();
        match timeout(self.ready_timeout, ready.wait_for(|r| *r)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(PipdockError::BridgeUnavailable(
                "bridge closed before it became ready".to_string(),
            )),
            Err(_) => Err(PipdockError::BridgeUnavailable(format!(
                "no BridgeReady within {:?}",
                self.ready_timeout
            ))),
        }
    }

    async fn minimize(&self) -> Result<Reply, PipdockError> {
        self.wait_ready().await?;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(reply_tx)
            .await
            .map_err(|_| PipdockError::BridgeUnavailable("controller side is gone".to_string()))?;
        reply_rx.await.map_err(|_| {
            PipdockError::BridgeUnavailable("controller dropped the request".to_string())
        })
    }
}

#[async_trait]
impl MinimizeRequester for BridgeClient {
    async fn request_minimize(&self) -> Reply {
        self.minimize()
            .await
            .unwrap_or_else(|e| Reply::error(e.to_string()))
    }
}

/// Controller-side end of the bridge.
pub struct BridgeServer {
    rx: mpsc::Receiver<oneshot::Sender<Reply>>,
    ready: watch::Sender<bool>,
}

impl BridgeServer {
    /// Announce readiness and relay minimize requests until every client is gone.
    pub async fn serve(mut self, router: RouterHandle) {
        self.ready.send_replace(true);
        info!("Bridge ready");

        while let Some(reply_tx) = self.rx.recv().await {
            let reply = router.send(ControllerRequest::MinimizeDetached).await;
            if reply_tx.send(reply).is_err() {
                debug!("Bridge client went away before the reply");
            }
        }
        debug!("Bridge closed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::controller::{ControllerSettings, PopupWindowController};
    use crate::history::InMemoryHistory;
    use crate::pipeline::OpenPath;
    use crate::router::{DEFAULT_QUEUE_CAPACITY, Router};
    use crate::test_support::{Hosts, WindowCall};
    use pipdock_protocols::{OpenRequest, WindowState};

    fn router(hosts: &Hosts) -> (Arc<PopupWindowController>, RouterHandle) {
        let controller = Arc::new(PopupWindowController::new(
            hosts.services(),
            ControllerSettings::default(),
        ));
        let router = Router::new(controller.clone(), Arc::new(InMemoryHistory::new()));
        let (handle, _task) = router.spawn(DEFAULT_QUEUE_CAPACITY);
        (controller, handle)
    }

    #[tokio::test]
    async fn test_minimize_round_trip() {
        let hosts = Hosts::new();
        let (controller, handle) = router(&hosts);
        let window = controller
            .open(
                OpenRequest {
                    url: Some("https://vimeo.com/1".to_string()),
                    ..Default::default()
                },
                OpenPath::Generic,
            )
            .await
            .unwrap();

        let (client, server) = channel(Duration::from_secs(3));
        tokio::spawn(server.serve(handle));

        assert_eq!(client.request_minimize().await, Reply::ok());
        assert!(client.is_ready());
        assert!(
            hosts
                .windowing
                .calls()
                .contains(&WindowCall::SetState(window, WindowState::Minimized))
        );
    }

    #[tokio::test]
    async fn test_minimize_without_window_is_ok() {
        let hosts = Hosts::new();
        let (_controller, handle) = router(&hosts);
        let (client, server) = channel(Duration::from_secs(3));
        tokio::spawn(server.serve(handle));

        assert_eq!(client.request_minimize().await, Reply::ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_ready_reports_unavailable() {
        let (client, _server) = channel(Duration::from_secs(3));

        let reply = client.request_minimize().await;
        assert!(!reply.ok);
        assert!(reply.error.unwrap().contains("Bridge unavailable"));
    }

    #[tokio::test]
    async fn test_dropped_server_reports_unavailable() {
        let (client, server) = channel(Duration::from_secs(3));
        drop(server);

        let reply = client.request_minimize().await;
        assert!(!reply.ok);
        assert!(reply.error.unwrap().contains("closed before"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_ready_within_timeout() {
        let hosts = Hosts::new();
        let (_controller, handle) = router(&hosts);
        let (client, server) = channel(Duration::from_secs(3));

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            server.serve(handle).await;
        });

        assert_eq!(client.request_minimize().await, Reply::ok());
    }

    #[tokio::test]
    async fn test_stopped_router_folds_into_reply() {
        let hosts = Hosts::new();
        let controller = Arc::new(PopupWindowController::new(
            hosts.services(),
            ControllerSettings::default(),
        ));
        let (handle, task) = Router::new(controller, Arc::new(InMemoryHistory::new()))
            .spawn(DEFAULT_QUEUE_CAPACITY);
        task.abort();
        let _ = task.await;

        let (client, server) = channel(Duration::from_secs(3));
        tokio::spawn(server.serve(handle));

        let reply = client.request_minimize().await;
        assert!(!reply.ok);
    }
}
