//! Host Collaborators
//!
//! The engine never touches the network, timers, DOM or browser history
//! directly. A host (browser shell, test harness) provides them through
//! these traits and reports asynchronous results back to the engine.

use crate::config::Method;
use crate::extract::ScriptTag;
use crate::meta::HeadMeta;
use crate::request::RequestDescriptor;
use crate::state::NavigationState;
use crate::PjaxError;
use url::Url;

/// Handle of an in-flight fetch, chosen by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportHandle(pub u64);

/// Handle of an armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Why the engine gave up on a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// A newer navigation took its place
    Superseded,
    /// The client-side timer fired
    Timeout,
    /// Explicit abort or engine teardown
    Cancelled,
}

/// Network access
pub trait Transport {
    /// Start a fetch. Its outcome is reported through
    /// `Pjax::complete_request` or `Pjax::fail_request`.
    fn fetch(&mut self, request: &RequestDescriptor) -> Result<TransportHandle, PjaxError>;

    /// Stop a fetch; no result is expected afterwards
    fn abort(&mut self, handle: TransportHandle, reason: AbortReason);
}

/// One-shot timers, reported through `Pjax::fire_timer`
pub trait Timers {
    fn set_timeout(&mut self, delay_ms: u64) -> TimerId;
    fn clear_timeout(&mut self, timer: TimerId);
}

/// Document access
pub trait DocumentHost {
    /// Opaque copy of a container's rendered content
    type Snapshot;

    /// Whether `selector` resolves to an element
    fn has_container(&self, selector: &str) -> bool;

    /// Clone the current content of a container
    fn capture(&self, selector: &str) -> Self::Snapshot;

    /// Put a previously captured snapshot back
    fn restore(&mut self, selector: &str, snapshot: Self::Snapshot);

    /// Replace a container's content with fetched HTML
    fn apply_content(&mut self, selector: &str, html: &str);

    fn apply_title(&mut self, title: &str);

    /// Replace head tags group by group
    fn apply_meta_diff(&mut self, meta: &HeadMeta);

    fn scroll_to(&mut self, y: f64);

    /// Vertical offset of the element with this id or name
    fn anchor_offset(&self, anchor: &str) -> Option<f64>;

    /// Whether a script with this source is already in the document
    fn has_script(&self, src: &str) -> bool;

    /// Insert and run an external script
    fn load_script(&mut self, script: &ScriptTag);

    /// Read the rendered height of a container, forcing layout
    fn force_layout(&mut self, selector: &str) -> f64;

    fn title(&self) -> String;

    fn head_meta(&self) -> HeadMeta;

    /// Layout version announced by the document itself
    fn layout_version(&self) -> Option<String> {
        None
    }
}

/// Session history and location
pub trait BrowserHistory {
    /// `pushState`/`replaceState` are available
    fn supports_history(&self) -> bool {
        true
    }

    /// Current document location
    fn location(&self) -> Url;

    fn push_entry(&mut self, state: &NavigationState, title: &str, url: &str);

    fn replace_entry(&mut self, state: Option<&NavigationState>, title: &str, url: &str);

    /// State stored in the current history entry
    fn current_entry(&self) -> Option<NavigationState>;

    /// Full navigation replacing the current entry
    fn location_replace(&mut self, url: &str);

    fn location_reload(&mut self);

    /// Ordinary form submission, used when partial loads are unavailable
    fn submit_native(&mut self, submission: &NativeSubmission);
}

/// Everything the engine needs from its host
pub trait Host: Transport + Timers + DocumentHost + BrowserHistory {}

impl<T: Transport + Timers + DocumentHost + BrowserHistory> Host for T {}

/// Plain form submission replacing a partial load
#[derive(Debug, Clone, PartialEq)]
pub struct NativeSubmission {
    /// `GET` or `POST`; other verbs travel in a `_method` field
    pub method: Method,
    pub action: String,
    pub fields: Vec<(String, String)>,
}

impl NativeSubmission {
    pub fn new(method: Method, action: &str, data: &[(String, String)]) -> Self {
        let mut fields = Vec::with_capacity(data.len() + 1);
        let wire_method = match method {
            Method::Get => Method::Get,
            Method::Post => Method::Post,
            other => {
                fields.push(("_method".to_string(), other.as_str().to_ascii_lowercase()));
                Method::Post
            }
        };
        fields.extend(data.iter().cloned());

        Self {
            method: wire_method,
            action: action.to_string(),
            fields,
        }
    }
}
