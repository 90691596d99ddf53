//! Candidate builders and a recording page host for tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pipdock_protocols::{
    AdMarkers, AdStatus, AncestorInfo, DomSnapshot, ElementHandle, HostError, HostResult,
    MediaTiming, MinimizeRequester, PageHost, Rect, Reply, SelectorMatches, SnapshotRequest,
    SourceKind, StyleFlags, VideoCandidate, Viewport,
};
use tokio::time::Instant;

/// A visible, decoding, 640x360 candidate centered in the default viewport.
pub fn candidate(handle: &str) -> VideoCandidate {
    VideoCandidate {
        handle: ElementHandle::new(handle),
        rect: Rect::new(320.0, 180.0, 640.0, 360.0),
        natural_width: 1280,
        natural_height: 720,
        paused: false,
        muted: false,
        ready_state: 4,
        style: StyleFlags::default(),
        id: String::new(),
        class: String::new(),
        ancestors: Vec::new(),
        container: None,
        in_primary_container: false,
        has_native_id: false,
        pip_disabled: false,
        src: None,
        source: SourceKind::None,
    }
}

pub fn ancestor(tag: &str, id: &str, class: &str) -> AncestorInfo {
    AncestorInfo {
        tag: tag.to_string(),
        role: None,
        id: id.to_string(),
        class: class.to_string(),
    }
}

/// Snapshot with one group per `(selector, candidates)` pair.
pub fn snapshot(groups: Vec<(&str, Vec<VideoCandidate>)>) -> DomSnapshot {
    DomSnapshot {
        viewport: Viewport::default(),
        groups: groups
            .into_iter()
            .map(|(selector, candidates)| SelectorMatches {
                selector: selector.to_string(),
                candidates,
            })
            .collect(),
    }
}

/// One recorded call into [`FakePageHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Snapshot,
    IsSeeking(String),
    Prepare(String, f64),
    RequestPip(String, Instant),
    Unmute(String),
    AdStatus,
    Click(Option<String>),
    MediaTiming,
    Seek(f64),
    Notify(String),
}

#[derive(Default)]
struct FakeState {
    /// Served in order; the last one repeats.
    snapshots: VecDeque<DomSnapshot>,
    pip_failures: VecDeque<HostError>,
    seeking: bool,
    ad_status: AdStatus,
    visible_skip: Option<String>,
    timing: Option<MediaTiming>,
    calls: Vec<Call>,
}

/// Scriptable [`PageHost`] that records every call.
#[derive(Default)]
pub struct FakePageHost {
    state: Mutex<FakeState>,
}

impl FakePageHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_snapshot(&self, snapshot: DomSnapshot) {
        self.state.lock().snapshots.push_back(snapshot);
    }

    /// Serve only `snapshot` from now on.
    pub fn set_snapshot(&self, snapshot: DomSnapshot) {
        let mut state = self.state.lock();
        state.snapshots.clear();
        state.snapshots.push_back(snapshot);
    }

    pub fn fail_next_pip(&self, error: HostError) {
        self.state.lock().pip_failures.push_back(error);
    }

    pub fn set_seeking(&self, seeking: bool) {
        self.state.lock().seeking = seeking;
    }

    pub fn set_ad_status(&self, status: AdStatus) {
        self.state.lock().ad_status = status;
    }

    pub fn set_visible_skip(&self, selector: Option<&str>) {
        self.state.lock().visible_skip = selector.map(str::to_string);
    }

    pub fn set_timing(&self, timing: Option<MediaTiming>) {
        self.state.lock().timing = timing;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn pip_requests(&self) -> Vec<(String, Instant)> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::RequestPip(handle, at) => Some((handle.clone(), *at)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }
}

#[async_trait]
impl PageHost for FakePageHost {
    async fn snapshot(&self, _request: &SnapshotRequest) -> HostResult<DomSnapshot> {
        let mut state = self.state.lock();
        state.calls.push(Call::Snapshot);
        let snapshot = if state.snapshots.len() > 1 {
            state.snapshots.pop_front()
        } else {
            state.snapshots.front().cloned()
        };
        Ok(snapshot.unwrap_or_default())
    }

    async fn is_seeking(&self, handle: &ElementHandle) -> HostResult<bool> {
        let mut state = self.state.lock();
        state.calls.push(Call::IsSeeking(handle.to_string()));
        Ok(state.seeking)
    }

    async fn prepare_playback(&self, handle: &ElementHandle, volume: f64) -> HostResult<()> {
        self.record(Call::Prepare(handle.to_string(), volume));
        Ok(())
    }

    async fn request_picture_in_picture(&self, handle: &ElementHandle) -> HostResult<()> {
        let mut state = self.state.lock();
        state
            .calls
            .push(Call::RequestPip(handle.to_string(), Instant::now()));
        match state.pip_failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn unmute(&self, handle: &ElementHandle) -> HostResult<()> {
        self.record(Call::Unmute(handle.to_string()));
        Ok(())
    }

    async fn ad_status(&self, _markers: &AdMarkers) -> HostResult<AdStatus> {
        let mut state = self.state.lock();
        state.calls.push(Call::AdStatus);
        Ok(state.ad_status)
    }

    async fn click_first_visible(&self, selectors: &[String]) -> HostResult<Option<String>> {
        let mut state = self.state.lock();
        let clicked = state
            .visible_skip
            .clone()
            .filter(|visible| selectors.contains(visible));
        state.calls.push(Call::Click(clicked.clone()));
        Ok(clicked)
    }

    async fn media_timing(&self, _selectors: &[String]) -> HostResult<Option<MediaTiming>> {
        let mut state = self.state.lock();
        state.calls.push(Call::MediaTiming);
        Ok(state.timing)
    }

    async fn seek(&self, _selectors: &[String], time: f64) -> HostResult<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::Seek(time));
        if let Some(timing) = state.timing.as_mut() {
            timing.current_time = time;
        }
        Ok(())
    }

    async fn notify(&self, message: &str) -> HostResult<()> {
        self.record(Call::Notify(message.to_string()));
        Ok(())
    }
}

/// Minimize requester that counts requests and answers with a fixed reply.
pub struct FakeMinimizer {
    reply: Reply,
    requests: Mutex<usize>,
}

impl FakeMinimizer {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(0),
        })
    }

    pub fn requests(&self) -> usize {
        *self.requests.lock()
    }
}

#[async_trait]
impl MinimizeRequester for FakeMinimizer {
    async fn request_minimize(&self) -> Reply {
        *self.requests.lock() += 1;
        self.reply.clone()
    }
}
