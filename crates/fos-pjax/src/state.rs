//! Navigation State
//!
//! The logical position of the user in session history, and the manager
//! that owns the current one.

use crate::host::BrowserHistory;
use crate::meta::HeadMeta;
use crate::PjaxError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// State identifier; larger ids were issued later
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub u64);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One navigation point, as persisted in the browser's history slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub id: StateId,
    /// Canonical URL, tracking parameter stripped
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<HeadMeta>,
    /// Selector of the region this state renders into
    pub container: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
    /// Timeout in effect when the state was created
    pub timeout: u64,
}

impl NavigationState {
    /// JSON form stored in the history entry
    pub fn to_json(&self) -> Result<String, PjaxError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PjaxError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether this entry was written by the engine
    pub fn is_pjax(&self) -> bool {
        !self.container.is_empty()
    }
}

/// How a committed state reaches the browser history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// New entry
    Push,
    /// Overwrite the current entry
    Replace,
    /// The browser already shows this entry
    Restore,
}

/// Monotonic id source
///
/// Ids follow the wall clock in milliseconds so they stay ordered across
/// page loads; calls within the same millisecond are bumped by one.
pub struct IdSequence {
    last: u64,
    clock: fn() -> u64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::with_clock(wall_clock_ms)
    }

    pub fn with_clock(clock: fn() -> u64) -> Self {
        Self { last: 0, clock }
    }

    /// Next id, greater than every id issued or observed so far
    pub fn next_id(&mut self) -> StateId {
        let id = (self.clock)().max(self.last.saturating_add(1));
        self.last = id;
        StateId(id)
    }

    /// Account for an id issued elsewhere (a previous page load)
    pub fn observe(&mut self, id: StateId) {
        self.last = self.last.max(id.0);
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// What the document looks like before the engine first touches it
#[derive(Debug, Clone)]
pub struct DocumentSeed {
    pub url: String,
    pub title: String,
    pub meta: HeadMeta,
    pub container: String,
    pub fragment: Option<String>,
    pub timeout: u64,
}

/// Owner of the current navigation state
#[derive(Default)]
pub struct StateManager {
    current: Option<NavigationState>,
    ids: IdSequence,
}

impl StateManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: IdSequence) -> Self {
        Self { current: None, ids }
    }

    /// Current state, if the engine has been used yet
    pub fn current(&self) -> Option<&NavigationState> {
        self.current.as_ref()
    }

    pub fn new_id(&mut self) -> StateId {
        self.ids.next_id()
    }

    /// Take over a state persisted by an earlier page load
    pub fn adopt(&mut self, state: NavigationState) {
        tracing::debug!("Adopting persisted state {} for {}", state.id, state.url);
        self.ids.observe(state.id);
        self.current = Some(state);
    }

    /// Seed the current state from the live document; no-op once seeded.
    ///
    /// Returns whether a state was created.
    pub fn initialize<B: BrowserHistory + ?Sized>(
        &mut self,
        seed: DocumentSeed,
        history: &mut B,
    ) -> bool {
        if self.current.is_some() {
            return false;
        }

        let state = NavigationState {
            id: self.new_id(),
            url: seed.url,
            title: seed.title,
            meta: (!seed.meta.is_empty()).then_some(seed.meta),
            container: seed.container,
            fragment: seed.fragment,
            timeout: seed.timeout,
        };
        tracing::debug!("Initial state {} for {}", state.id, state.url);
        history.replace_entry(Some(&state), &state.title, &state.url);
        self.current = Some(state);
        true
    }

    /// Make `state` current and record it in the browser history
    pub fn commit<B: BrowserHistory + ?Sized>(
        &mut self,
        state: NavigationState,
        mode: CommitMode,
        history: &mut B,
    ) {
        self.ids.observe(state.id);
        match mode {
            CommitMode::Push => history.push_entry(&state, &state.title, &state.url),
            CommitMode::Replace => history.replace_entry(Some(&state), &state.title, &state.url),
            CommitMode::Restore => {}
        }
        tracing::debug!("Committed state {} ({:?}) {}", state.id, mode, state.url);
        self.current = Some(state);
    }

    /// Forget the current state
    pub fn clear(&mut self) {
        self.current = None;
    }
}
