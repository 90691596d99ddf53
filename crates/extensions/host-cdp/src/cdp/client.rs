//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use super::error::CdpError;
use super::protocol::{
    BrowserVersion, CdpEvent, CdpRequest, CdpResponse, TargetInfo, WindowBounds,
};
use super::session::PageSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Events buffered per session before slow subscribers start lagging.
const EVENT_BUFFER: usize = 256;

/// Request/response plumbing shared by the client and every page session.
pub(crate) struct Transport {
    ws_tx: tokio::sync::Mutex<WsSink>,
    request_id: AtomicU64,
    pending: Mutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>,
    /// Event fan-out by session id. The empty id carries browser-level events.
    channels: RwLock<HashMap<String, broadcast::Sender<CdpEvent>>>,
    request_timeout: Duration,
}

impl Transport {
    /// Send a CDP command and wait for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(|s| s.to_string()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    /// Sender for `session_id`, created on first use.
    pub(crate) fn channel(&self, session_id: &str) -> broadcast::Sender<CdpEvent> {
        if let Some(tx) = self.channels.read().get(session_id) {
            return tx.clone();
        }
        self.channels
            .write()
            .entry(session_id.to_string())
            .or_insert_with(|| broadcast::channel(EVENT_BUFFER).0)
            .clone()
    }

    pub(crate) fn remove_channel(&self, session_id: &str) {
        self.channels.write().remove(session_id);
    }

    fn dispatch(&self, response: CdpResponse) {
        if let Some(id) = response.id {
            let Some(tx) = self.pending.lock().remove(&id) else {
                return;
            };
            let result = match response.error {
                Some(error) => Err(CdpError::Protocol {
                    code: error.code,
                    message: error.message,
                }),
                None => Ok(response.result.unwrap_or(Value::Null)),
            };
            let _ = tx.send(result);
        } else if let Some((session_id, event)) = CdpEvent::from_response(response) {
            if let Some(tx) = self.channels.read().get(&session_id) {
                // no subscribers is fine
                let _ = tx.send(event);
            }
        }
    }

    /// Fail every in-flight request and close all event channels.
    fn shutdown(&self) {
        for (_, tx) in self.pending.lock().drain() {
            let _ = tx.send(Err(CdpError::SessionClosed));
        }
        self.channels.write().clear();
    }
}

/// CDP client connected to the browser endpoint.
pub struct CdpClient {
    transport: Arc<Transport>,
    browser_ws_url: String,
    _recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to the browser.
    ///
    /// `endpoint` is either the HTTP debugging endpoint (`http://localhost:9222`),
    /// resolved through `/json/version`, or a browser WebSocket URL used as is.
    pub async fn connect(endpoint: &str, request_timeout: Duration) -> Result<Self, CdpError> {
        let browser_ws_url = resolve_ws_url(endpoint).await?;

        let (ws_stream, _) = tokio_tungstenite::connect_async(&browser_ws_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let transport = Arc::new(Transport {
            ws_tx: tokio::sync::Mutex::new(ws_sink),
            request_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            channels: RwLock::new(HashMap::new()),
            request_timeout,
        });
        // browser-level events
        transport.channel("");

        let recv_task = tokio::spawn(Self::receive_loop(ws_source, transport.clone()));

        debug!("CDP client connected to {}", browser_ws_url);

        Ok(Self {
            transport,
            browser_ws_url,
            _recv_task: recv_task,
        })
    }

    async fn receive_loop(mut ws_source: WsSource, transport: Arc<Transport>) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text.as_str());
                    match serde_json::from_str::<CdpResponse>(text.as_str()) {
                        Ok(resp) => transport.dispatch(resp),
                        Err(e) => warn!("Failed to parse CDP message: {}", e),
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket closed");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
        transport.shutdown();
    }

    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport.call(method, params, None).await
    }

    pub fn browser_ws_url(&self) -> &str {
        &self.browser_ws_url
    }

    /// Subscribe to browser-level events (target lifecycle).
    pub fn browser_events(&self) -> broadcast::Receiver<CdpEvent> {
        self.transport.channel("").subscribe()
    }

    // ========================================================================
    // Target Management
    // ========================================================================

    /// Turn on `Target.targetCreated`/`targetDestroyed` events.
    pub async fn discover_targets(&self) -> Result<(), CdpError> {
        self.call("Target.setDiscoverTargets", Some(json!({"discover": true})))
            .await?;
        Ok(())
    }

    pub async fn get_targets(&self) -> Result<Vec<TargetInfo>, CdpError> {
        let result = self.call("Target.getTargets", None).await?;
        let targets: Vec<TargetInfo> = serde_json::from_value(result["targetInfos"].clone())?;
        Ok(targets)
    }

    /// Open `url` in a new browser window. Returns the new target id.
    pub async fn create_window(
        &self,
        url: &str,
        bounds: &WindowBounds,
        background: bool,
    ) -> Result<String, CdpError> {
        let mut params = json!({
            "url": url,
            "newWindow": true,
            "background": background,
        });
        for key in ["left", "top", "width", "height"] {
            if let Some(v) = serde_json::to_value(bounds)?.get(key) {
                params[key] = v.clone();
            }
        }

        let result = self.call("Target.createTarget", Some(params)).await?;
        result["targetId"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CdpError::InvalidResponse("Missing targetId".to_string()))
    }

    pub async fn window_for_target(&self, target_id: &str) -> Result<i64, CdpError> {
        let result = self
            .call(
                "Browser.getWindowForTarget",
                Some(json!({"targetId": target_id})),
            )
            .await?;
        result["windowId"]
            .as_i64()
            .ok_or_else(|| CdpError::InvalidResponse("Missing windowId".to_string()))
    }

    pub async fn set_window_bounds(&self, window_id: i64, bounds: &WindowBounds) -> Result<(), CdpError> {
        self.call(
            "Browser.setWindowBounds",
            Some(json!({"windowId": window_id, "bounds": bounds})),
        )
        .await?;
        Ok(())
    }

    pub async fn activate_target(&self, target_id: &str) -> Result<(), CdpError> {
        self.call("Target.activateTarget", Some(json!({"targetId": target_id})))
            .await?;
        Ok(())
    }

    pub async fn close_target(&self, target_id: &str) -> Result<(), CdpError> {
        self.call("Target.closeTarget", Some(json!({"targetId": target_id})))
            .await?;
        Ok(())
    }

    /// Attach a flat session to a target and enable the domains pages need.
    pub async fn attach(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        let session = PageSession::new(target_id.to_string(), session_id, self.transport.clone());
        session.enable_domains().await?;
        Ok(session)
    }

    pub async fn detach(&self, session: &PageSession) -> Result<(), CdpError> {
        self.transport.remove_channel(session.session_id());
        self.call(
            "Target.detachFromTarget",
            Some(json!({"sessionId": session.session_id()})),
        )
        .await?;
        Ok(())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self._recv_task.abort();
    }
}

/// Resolve the browser WebSocket URL for `endpoint`.
async fn resolve_ws_url(endpoint: &str) -> Result<String, CdpError> {
    let endpoint = endpoint.trim_end_matches('/');
    let parsed = url::Url::parse(endpoint)?;
    if matches!(parsed.scheme(), "ws" | "wss") {
        return Ok(endpoint.to_string());
    }

    let version_url = format!("{}/json/version", endpoint);
    debug!("Fetching browser version from {}", version_url);

    let version: BrowserVersion = reqwest::get(&version_url)
        .await
        .map_err(|e| CdpError::BrowserNotAvailable(format!("{}: {}", endpoint, e)))?
        .json()
        .await
        .map_err(|e| CdpError::BrowserNotAvailable(format!("{}: {}", endpoint, e)))?;

    debug!("Found browser: {}", version.browser);
    Ok(version.web_socket_debugger_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ws_endpoint_used_as_is() {
        let url = resolve_ws_url("ws://127.0.0.1:9222/devtools/browser/abc/")
            .await
            .unwrap();
        assert_eq!(url, "ws://127.0.0.1:9222/devtools/browser/abc");
    }

    #[tokio::test]
    async fn test_invalid_endpoint() {
        assert!(matches!(
            resolve_ws_url("not a url").await,
            Err(CdpError::ConnectionFailed(_))
        ));
    }
}
