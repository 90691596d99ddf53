//! CDP protocol types and message definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// CDP request message.
#[derive(Debug, Serialize)]
pub struct CdpRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Any message received from the browser: a command response or an event.
#[derive(Debug, Deserialize)]
pub struct CdpResponse {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<CdpErrorResponse>,
    pub method: Option<String>,
    pub params: Option<Value>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP error in response.
#[derive(Debug, Deserialize)]
pub struct CdpErrorResponse {
    pub code: i64,
    pub message: String,
    pub data: Option<String>,
}

/// A protocol event, fanned out to subscribers of its session.
#[derive(Debug, Clone, PartialEq)]
pub struct CdpEvent {
    pub method: String,
    pub params: Value,
}

impl CdpEvent {
    /// Split an event message off a raw response. Command responses yield `None`.
    pub fn from_response(response: CdpResponse) -> Option<(String, CdpEvent)> {
        let method = response.method?;
        Some((
            response.session_id.unwrap_or_default(),
            CdpEvent {
                method,
                params: response.params.unwrap_or(Value::Null),
            },
        ))
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }
}

/// Target info from CDP.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub target_id: String,
    #[serde(rename = "type")]
    pub target_type: String,
    pub title: String,
    pub url: String,
    pub attached: Option<bool>,
    pub browser_context_id: Option<String>,
}

/// Browser version info.
///
/// Note: Chrome returns PascalCase field names for this endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(rename = "Protocol-Version")]
    pub protocol_version: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

/// Window state accepted by `Browser.setWindowBounds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CdpWindowState {
    Normal,
    Minimized,
    Maximized,
    Fullscreen,
}

/// `Browser.Bounds`. Geometry and a non-normal state cannot be combined in one call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowBounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_state: Option<CdpWindowState>,
}

impl WindowBounds {
    pub fn state(state: CdpWindowState) -> Self {
        Self {
            window_state: Some(state),
            ..Default::default()
        }
    }
}

/// `screen.avail*` as read from a page.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenArea {
    pub avail_left: f64,
    pub avail_top: f64,
    pub avail_width: f64,
    pub avail_height: f64,
}

/// `document.readyState` and `location.href` as read from a page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    pub ready_state: String,
    pub href: String,
}

impl DocumentState {
    /// Fully loaded, and no longer the initial `about:blank` document a new
    /// target reports before it navigates to `requested`.
    pub fn is_loaded(&self, requested: &str) -> bool {
        self.ready_state == "complete" && (self.href != "about:blank" || requested == "about:blank")
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
