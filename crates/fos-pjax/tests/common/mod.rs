//! Shared test host
//!
//! An in-memory browser: containers are plain strings, the transport and
//! timers only record what they were asked to do.

#![allow(dead_code)]

use fos_pjax::{
    AbortReason, BrowserHistory, DocumentHost, HeadMeta, IdSequence, NativeSubmission,
    NavigationState, Notification, Pjax, PjaxConfig, PjaxError, RawResponse, RequestDescriptor,
    ScriptTag, TimerId, Timers, Transport, TransportHandle, Url,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub const HOME: &str = "https://example.com/";
pub const HOME_CONTENT: &str = "<p>home</p>";

/// Install a log subscriber once; `RUST_LOG=fos_pjax=debug` to see it
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// History operation performed by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryOp {
    Push(String),
    Replace(String),
}

pub struct FakeHost {
    pub location: Url,
    pub containers: HashMap<String, String>,
    pub title: String,
    pub head_meta: HeadMeta,
    pub layout_version: Option<String>,
    pub history_supported: bool,
    pub entry: Option<NavigationState>,
    pub history: Vec<HistoryOp>,
    pub fetches: Vec<RequestDescriptor>,
    pub aborts: Vec<(TransportHandle, AbortReason)>,
    pub timers_set: Vec<(TimerId, u64)>,
    pub timers_cleared: Vec<TimerId>,
    pub hard_loads: Vec<String>,
    pub reloads: usize,
    pub native: Vec<NativeSubmission>,
    pub scrolls: Vec<f64>,
    pub present_scripts: Vec<String>,
    pub loaded_scripts: Vec<String>,
    pub meta_diffs: Vec<HeadMeta>,
    pub layouts: Vec<String>,
    pub anchors: HashMap<String, f64>,
    /// Next fetch fails synchronously with this error
    pub refuse_fetch: Option<PjaxError>,
    next_handle: u64,
    next_timer: u64,
}

impl FakeHost {
    pub fn new() -> Self {
        let mut containers = HashMap::new();
        containers.insert("#main".to_string(), HOME_CONTENT.to_string());

        Self {
            location: Url::parse(HOME).unwrap(),
            containers,
            title: "Home".to_string(),
            head_meta: HeadMeta::new(),
            layout_version: None,
            history_supported: true,
            entry: None,
            history: Vec::new(),
            fetches: Vec::new(),
            aborts: Vec::new(),
            timers_set: Vec::new(),
            timers_cleared: Vec::new(),
            hard_loads: Vec::new(),
            reloads: 0,
            native: Vec::new(),
            scrolls: Vec::new(),
            present_scripts: Vec::new(),
            loaded_scripts: Vec::new(),
            meta_diffs: Vec::new(),
            layouts: Vec::new(),
            anchors: HashMap::new(),
            refuse_fetch: None,
            next_handle: 1,
            next_timer: 1,
        }
    }

    pub fn content(&self, selector: &str) -> &str {
        self.containers.get(selector).map(String::as_str).unwrap_or_default()
    }

    pub fn last_fetch(&self) -> &RequestDescriptor {
        self.fetches.last().expect("no fetch recorded")
    }

    pub fn last_timer(&self) -> TimerId {
        self.timers_set.last().expect("no timer armed").0
    }

    pub fn pushes(&self) -> usize {
        self.history.iter().filter(|op| matches!(op, HistoryOp::Push(_))).count()
    }
}

impl Transport for FakeHost {
    fn fetch(&mut self, request: &RequestDescriptor) -> Result<TransportHandle, PjaxError> {
        if let Some(error) = self.refuse_fetch.take() {
            return Err(error);
        }
        self.fetches.push(request.clone());
        let handle = TransportHandle(self.next_handle);
        self.next_handle += 1;
        Ok(handle)
    }

    fn abort(&mut self, handle: TransportHandle, reason: AbortReason) {
        self.aborts.push((handle, reason));
    }
}

impl Timers for FakeHost {
    fn set_timeout(&mut self, delay_ms: u64) -> TimerId {
        let timer = TimerId(self.next_timer);
        self.next_timer += 1;
        self.timers_set.push((timer, delay_ms));
        timer
    }

    fn clear_timeout(&mut self, timer: TimerId) {
        self.timers_cleared.push(timer);
    }
}

impl DocumentHost for FakeHost {
    type Snapshot = String;

    fn has_container(&self, selector: &str) -> bool {
        self.containers.contains_key(selector)
    }

    fn capture(&self, selector: &str) -> String {
        self.content(selector).to_string()
    }

    fn restore(&mut self, selector: &str, snapshot: String) {
        self.containers.insert(selector.to_string(), snapshot);
    }

    fn apply_content(&mut self, selector: &str, html: &str) {
        self.containers.insert(selector.to_string(), html.to_string());
    }

    fn apply_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn apply_meta_diff(&mut self, meta: &HeadMeta) {
        self.meta_diffs.push(meta.clone());
    }

    fn scroll_to(&mut self, y: f64) {
        self.scrolls.push(y);
    }

    fn anchor_offset(&self, anchor: &str) -> Option<f64> {
        self.anchors.get(anchor).copied()
    }

    fn has_script(&self, src: &str) -> bool {
        self.present_scripts.iter().any(|s| s == src)
    }

    fn load_script(&mut self, script: &ScriptTag) {
        self.present_scripts.push(script.src.clone());
        self.loaded_scripts.push(script.src.clone());
    }

    fn force_layout(&mut self, selector: &str) -> f64 {
        self.layouts.push(selector.to_string());
        self.content(selector).len() as f64
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn head_meta(&self) -> HeadMeta {
        self.head_meta.clone()
    }

    fn layout_version(&self) -> Option<String> {
        self.layout_version.clone()
    }
}

impl BrowserHistory for FakeHost {
    fn supports_history(&self) -> bool {
        self.history_supported
    }

    fn location(&self) -> Url {
        self.location.clone()
    }

    fn push_entry(&mut self, state: &NavigationState, _title: &str, url: &str) {
        self.history.push(HistoryOp::Push(url.to_string()));
        self.entry = Some(state.clone());
        self.location = self.location.join(url).unwrap();
    }

    fn replace_entry(&mut self, state: Option<&NavigationState>, _title: &str, url: &str) {
        self.history.push(HistoryOp::Replace(url.to_string()));
        self.entry = state.cloned();
        self.location = self.location.join(url).unwrap();
    }

    fn current_entry(&self) -> Option<NavigationState> {
        self.entry.clone()
    }

    fn location_replace(&mut self, url: &str) {
        self.hard_loads.push(url.to_string());
    }

    fn location_reload(&mut self) {
        self.reloads += 1;
    }

    fn submit_native(&mut self, submission: &NativeSubmission) {
        self.native.push(submission.clone());
    }
}

fn frozen_clock() -> u64 {
    1_000
}

/// Inactive engine over a fresh host with predictable ids
pub fn inactive_engine() -> Pjax<FakeHost> {
    init_tracing();
    Pjax::with_ids(PjaxConfig::default(), FakeHost::new(), IdSequence::with_clock(frozen_clock))
}

/// Active engine at the home page
pub fn engine() -> Pjax<FakeHost> {
    let mut pjax = inactive_engine();
    pjax.activate().unwrap();
    pjax
}

/// Record event names as they are emitted
pub fn record(pjax: &mut Pjax<FakeHost>) -> Rc<RefCell<Vec<String>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    pjax.subscribe(move |n: &mut Notification| log.borrow_mut().push(n.event.name().to_string()));
    seen
}

/// Veto every event with this name
pub fn veto(pjax: &mut Pjax<FakeHost>, name: &'static str) {
    pjax.subscribe(move |n: &mut Notification| {
        if n.event.name() == name {
            n.prevent_default();
        }
    });
}

pub fn ok(body: &str) -> RawResponse {
    RawResponse::new(200, body)
}
