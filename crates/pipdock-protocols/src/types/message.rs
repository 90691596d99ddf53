//! Request/response messages accepted by the popup window controller.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::Platform;
use crate::error::PipdockError;

/// Inbound controller request. Encoded as `{"type": "...", ...fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControllerRequest {
    /// Detach a video from the primary long-form platform.
    OpenDetached(OpenRequest),
    /// Detach a video from any other platform.
    OpenGenericDetached(OpenRequest),
    CloseDetached,
    MinimizeDetached,
    RecordHistory(HistoryRequest),
}

impl ControllerRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            ControllerRequest::OpenDetached(_) => "OpenDetached",
            ControllerRequest::OpenGenericDetached(_) => "OpenGenericDetached",
            ControllerRequest::CloseDetached => "CloseDetached",
            ControllerRequest::MinimizeDetached => "MinimizeDetached",
            ControllerRequest::RecordHistory(_) => "RecordHistory",
        }
    }
}

/// Fields of an open request. Everything except `url` falls back to the
/// configured popup defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "platform")]
    pub platform_hint: Option<Platform>,
    /// Non-numeric input deserializes to `None`.
    #[serde(default, deserialize_with = "lenient_number")]
    pub width: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub height: Option<f64>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub volume: Option<f64>,
}

/// Fields of a history record request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Uniform `{ok, error?}` result for every cross-boundary call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    pub fn ok() -> Self {
        Self { ok: true, error: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
        }
    }
}

impl<E: Into<PipdockError>> From<Result<(), E>> for Reply {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Reply::ok(),
            Err(e) => {
                let err: PipdockError = e.into();
                Reply::error(err.to_string())
            }
        }
    }
}

/// Accept numbers and numeric strings; anything else becomes `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    })
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
