//! [`PageHost`] over a CDP page session.

use std::sync::Arc;

use async_trait::async_trait;
use pipdock_protocols::{
    AdMarkers, AdStatus, DomSnapshot, ElementHandle, HostError, HostResult, MediaTiming,
    PageHost, SnapshotRequest,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::cdp::{CdpError, PageSession};
use crate::scripts;

/// Drives the helpers installed by the main page script.
pub struct CdpPageHost {
    session: Arc<PageSession>,
}

#[derive(Debug, Deserialize)]
struct PipOutcome {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl CdpPageHost {
    pub fn new(session: Arc<PageSession>) -> Self {
        Self { session }
    }

    async fn call<T: DeserializeOwned>(&self, name: &str, args: &[Value]) -> HostResult<T> {
        let value = self
            .session
            .evaluate(&scripts::helper_call(name, args))
            .await?;
        decode(name, value)
    }

    async fn call_unit(&self, name: &str, args: &[Value]) -> HostResult<()> {
        self.session
            .evaluate(&scripts::helper_call(name, args))
            .await?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(name: &str, value: Value) -> HostResult<T> {
    serde_json::from_value(value).map_err(|e| {
        HostError::from(CdpError::InvalidResponse(format!("{}: {}", name, e)))
    })
}

#[async_trait]
impl PageHost for CdpPageHost {
    async fn snapshot(&self, request: &SnapshotRequest) -> HostResult<DomSnapshot> {
        self.call("snapshot", &[json!(request)]).await
    }

    async fn is_seeking(&self, handle: &ElementHandle) -> HostResult<bool> {
        self.call("isSeeking", &[json!(handle)]).await
    }

    async fn prepare_playback(&self, handle: &ElementHandle, volume: f64) -> HostResult<()> {
        self.call_unit("prepare", &[json!(handle), json!(volume)])
            .await
    }

    async fn request_picture_in_picture(&self, handle: &ElementHandle) -> HostResult<()> {
        let value = self
            .session
            .evaluate_with_gesture(&scripts::helper_call("requestPip", &[json!(handle)]))
            .await?;
        let outcome: PipOutcome = decode("requestPip", value)?;
        if outcome.ok {
            Ok(())
        } else {
            Err(HostError::from_host_message(
                outcome
                    .error
                    .unwrap_or_else(|| "Picture-in-Picture request rejected".to_string()),
            ))
        }
    }

    async fn unmute(&self, handle: &ElementHandle) -> HostResult<()> {
        self.call_unit("unmute", &[json!(handle)]).await
    }

    async fn ad_status(&self, markers: &AdMarkers) -> HostResult<AdStatus> {
        self.call("adStatus", &[json!(markers)]).await
    }

    async fn click_first_visible(&self, selectors: &[String]) -> HostResult<Option<String>> {
        self.call("clickFirstVisible", &[json!(selectors)]).await
    }

    async fn media_timing(&self, selectors: &[String]) -> HostResult<Option<MediaTiming>> {
        self.call("mediaTiming", &[json!(selectors)]).await
    }

    async fn seek(&self, selectors: &[String], time: f64) -> HostResult<()> {
        self.call_unit("seek", &[json!(selectors), json!(time)])
            .await
    }

    async fn notify(&self, message: &str) -> HostResult<()> {
        self.call_unit("notify", &[json!(message)]).await
    }
}
