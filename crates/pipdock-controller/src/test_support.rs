//! Recording host fakes for controller tests.

use std::mem::{Discriminant, discriminant};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use pipdock_protocols::{
    CreateWindowRequest, CreatedWindow, HostError, HostResult, InjectionService, Platform,
    PositionPreset, SessionMetadata, TabId, TabService, TabStatus, WindowId, WindowState,
    WindowingService, WorkArea,
};

use crate::controller::HostServices;

pub fn metadata() -> SessionMetadata {
    SessionMetadata {
        position: PositionPreset::BottomRight,
        volume: 0.8,
        platform: Platform::Generic,
        timestamp: Utc::now(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WindowCall {
    WorkArea,
    Create(CreateWindowRequest),
    SetState(WindowId, WindowState),
    Remove(WindowId),
}

struct WindowingState {
    area: WorkArea,
    next_id: i64,
    with_tab: bool,
    remove_error: Option<HostError>,
    set_state_error: Option<HostError>,
    calls: Vec<WindowCall>,
}

/// Windowing fake that hands out increasing window ids.
pub struct FakeWindowing {
    state: Mutex<WindowingState>,
}

impl FakeWindowing {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(WindowingState {
                area: WorkArea {
                    left: 0,
                    top: 0,
                    width: 1920,
                    height: 1080,
                },
                next_id: 1,
                with_tab: true,
                remove_error: None,
                set_state_error: None,
                calls: Vec::new(),
            }),
        })
    }

    pub fn without_tab(&self) {
        self.state.lock().with_tab = false;
    }

    pub fn fail_remove(&self, error: HostError) {
        self.state.lock().remove_error = Some(error);
    }

    pub fn fail_set_state(&self, error: HostError) {
        self.state.lock().set_state_error = Some(error);
    }

    pub fn calls(&self) -> Vec<WindowCall> {
        self.state.lock().calls.clone()
    }

    pub fn creates(&self) -> Vec<CreateWindowRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                WindowCall::Create(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn removed(&self) -> Vec<WindowId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                WindowCall::Remove(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl WindowingService for FakeWindowing {
    async fn primary_work_area(&self) -> HostResult<WorkArea> {
        let mut state = self.state.lock();
        state.calls.push(WindowCall::WorkArea);
        Ok(state.area)
    }

    async fn create_popup(&self, request: &CreateWindowRequest) -> HostResult<CreatedWindow> {
        let mut state = self.state.lock();
        state.calls.push(WindowCall::Create(request.clone()));
        let id = state.next_id;
        state.next_id += 1;
        Ok(CreatedWindow {
            window_id: WindowId(id),
            tab_id: state.with_tab.then(|| TabId::new(format!("tab-{}", id))),
        })
    }

    async fn set_window_state(&self, window: WindowId, window_state: WindowState) -> HostResult<()> {
        let mut state = self.state.lock();
        state.calls.push(WindowCall::SetState(window, window_state));
        match state.set_state_error.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn remove_window(&self, window: WindowId) -> HostResult<()> {
        let mut state = self.state.lock();
        state.calls.push(WindowCall::Remove(window));
        match state.remove_error.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// How [`FakeTabs::wait_for_complete`] behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadBehavior {
    Completes,
    Hangs,
}

/// Tab fake with a fixed status.
pub struct FakeTabs {
    status: Mutex<HostResult<Option<TabStatus>>>,
    load: Mutex<LoadBehavior>,
    waits: Mutex<usize>,
}

impl FakeTabs {
    pub fn new(status: Option<TabStatus>, load: LoadBehavior) -> Arc<Self> {
        Arc::new(Self {
            status: Mutex::new(Ok(status)),
            load: Mutex::new(load),
            waits: Mutex::new(0),
        })
    }

    pub fn waits(&self) -> usize {
        *self.waits.lock()
    }
}

#[async_trait]
impl TabService for FakeTabs {
    async fn status(&self, _tab: &TabId) -> HostResult<Option<TabStatus>> {
        self.status.lock().clone()
    }

    async fn wait_for_complete(&self, _tab: &TabId) -> HostResult<()> {
        *self.waits.lock() += 1;
        let load = *self.load.lock();
        match load {
            LoadBehavior::Completes => Ok(()),
            LoadBehavior::Hangs => std::future::pending().await,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InjectionStep {
    MarkWindow(String),
    Stylesheet,
    Bridge,
    Metadata,
    MainScript,
}

#[derive(Default)]
struct InjectionState {
    steps: Vec<InjectionStep>,
    failures: Vec<(Discriminant<InjectionStep>, HostError)>,
}

/// Injection fake recording each step. Failures are keyed by step kind.
#[derive(Default)]
pub struct FakeInjection {
    state: Mutex<InjectionState>,
}

impl FakeInjection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, step: InjectionStep, error: HostError) {
        self.state.lock().failures.push((discriminant(&step), error));
    }

    pub fn steps(&self) -> Vec<InjectionStep> {
        self.state.lock().steps.clone()
    }

    fn record(&self, step: InjectionStep) -> HostResult<()> {
        let mut state = self.state.lock();
        let kind = discriminant(&step);
        state.steps.push(step);
        match state.failures.iter().find(|(k, _)| *k == kind) {
            Some((_, e)) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl InjectionService for FakeInjection {
    async fn mark_window(&self, _tab: &TabId, sentinel: &str) -> HostResult<()> {
        self.record(InjectionStep::MarkWindow(sentinel.to_string()))
    }

    async fn insert_stylesheet(&self, _tab: &TabId) -> HostResult<()> {
        self.record(InjectionStep::Stylesheet)
    }

    async fn inject_bridge(&self, _tab: &TabId) -> HostResult<()> {
        self.record(InjectionStep::Bridge)
    }

    async fn deliver_metadata(&self, _tab: &TabId, _metadata: &SessionMetadata) -> HostResult<()> {
        self.record(InjectionStep::Metadata)
    }

    async fn inject_main_script(&self, _tab: &TabId, _metadata: &SessionMetadata) -> HostResult<()> {
        self.record(InjectionStep::MainScript)
    }
}

/// Fakes bundled together with the [`HostServices`] built from them.
pub struct Hosts {
    pub windowing: Arc<FakeWindowing>,
    pub tabs: Arc<FakeTabs>,
    pub injection: Arc<FakeInjection>,
}

impl Hosts {
    pub fn new() -> Self {
        Self::with_tabs(FakeTabs::new(Some(TabStatus::Complete), LoadBehavior::Completes))
    }

    pub fn with_tabs(tabs: Arc<FakeTabs>) -> Self {
        Self {
            windowing: FakeWindowing::new(),
            tabs,
            injection: FakeInjection::new(),
        }
    }

    pub fn services(&self) -> HostServices {
        HostServices {
            windowing: self.windowing.clone(),
            tabs: self.tabs.clone(),
            injection: self.injection.clone(),
        }
    }
}
