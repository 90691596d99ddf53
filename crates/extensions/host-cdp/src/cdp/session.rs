//! Flat CDP session attached to one page target.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::broadcast;
use tracing::debug;

use super::client::Transport;
use super::error::CdpError;
use super::protocol::CdpEvent;

/// A page target reached over the browser connection with `flatten: true`.
pub struct PageSession {
    target_id: String,
    session_id: String,
    transport: Arc<Transport>,
    events: broadcast::Sender<CdpEvent>,
}

impl PageSession {
    pub(crate) fn new(target_id: String, session_id: String, transport: Arc<Transport>) -> Self {
        let events = transport.channel(&session_id);
        Self {
            target_id,
            session_id,
            transport,
            events,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Events raised by this page. Subscribe before triggering what you wait for.
    pub fn subscribe(&self) -> broadcast::Receiver<CdpEvent> {
        self.events.subscribe()
    }

    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport
            .call(method, params, Some(&self.session_id))
            .await
    }

    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("Runtime.enable", None).await?;
        debug!("Attached to target {}", self.target_id);
        Ok(())
    }

    /// Evaluate an expression and return its value, awaiting promises.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        self.evaluate_inner(expression, false).await
    }

    /// Evaluate as if triggered by a user gesture. Picture-in-Picture needs one.
    pub async fn evaluate_with_gesture(&self, expression: &str) -> Result<Value, CdpError> {
        self.evaluate_inner(expression, true).await
    }

    async fn evaluate_inner(&self, expression: &str, user_gesture: bool) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                    "userGesture": user_gesture
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let message = exception
                .get("exception")
                .and_then(|e| e.get("description"))
                .and_then(Value::as_str)
                .or_else(|| exception.get("text").and_then(Value::as_str))
                .unwrap_or("Unknown error");
            return Err(CdpError::JavaScript(message.to_string()));
        }

        Ok(result
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Expose `name` as a page function that raises `Runtime.bindingCalled`.
    pub async fn add_binding(&self, name: &str) -> Result<(), CdpError> {
        self.call("Runtime.addBinding", Some(json!({"name": name})))
            .await?;
        Ok(())
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        self.transport.remove_channel(&self.session_id);
    }
}
