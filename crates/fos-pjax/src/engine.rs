//! Engine - Session context
//!
//! One `Pjax` value per page. It owns the configuration, the host
//! collaborators, the current navigation state, the history cache and the
//! single pending request. Navigation entry points live in `request`,
//! `popstate` and `trigger`.

use crate::cache::HistoryCache;
use crate::config::{PjaxConfig, ResolvedOptions};
use crate::events::{EventBus, Notification, PjaxEvent, SubscriptionId};
use crate::host::{AbortReason, Host};
use crate::locator;
use crate::request::{PendingRequest, Phase};
use crate::state::{DocumentSeed, IdSequence, NavigationState, StateManager};
use crate::PjaxError;
use url::Url;

/// Activation state of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Created or torn down; triggers fall through to native navigation
    Inactive,
    /// Partial loads enabled
    Active,
    /// The browser lacks the history API; triggers fall through
    Unsupported,
}

/// Partial page navigation engine
pub struct Pjax<H: Host> {
    pub(crate) config: PjaxConfig,
    pub(crate) host: H,
    pub(crate) mode: Mode,
    pub(crate) states: StateManager,
    pub(crate) cache: HistoryCache<H::Snapshot>,
    pub(crate) pending: Option<PendingRequest>,
    pub(crate) phase: Phase,
    pub(crate) events: EventBus,
    /// Layout version learned from responses
    pub(crate) known_version: Option<String>,
    pub(crate) initial_url: Option<Url>,
    /// No traversal or navigation has happened since activation
    pub(crate) initial_pop: bool,
}

impl<H: Host> Pjax<H> {
    /// Create an inactive engine
    pub fn new(config: PjaxConfig, host: H) -> Self {
        Self::with_ids(config, host, IdSequence::new())
    }

    /// Create an inactive engine with a custom id source
    pub fn with_ids(config: PjaxConfig, host: H, ids: IdSequence) -> Self {
        let cache = HistoryCache::new(config.max_cache_length);
        Self {
            config,
            host,
            mode: Mode::Inactive,
            states: StateManager::with_ids(ids),
            cache,
            pending: None,
            phase: Phase::Idle,
            events: EventBus::new(),
            known_version: None,
            initial_url: None,
            initial_pop: false,
        }
    }

    /// Enable partial loads.
    ///
    /// Adopts a state persisted by an earlier load of this page. Without
    /// history support the engine stays in pass-through mode and
    /// `UnsupportedEnvironment` is returned.
    pub fn activate(&mut self) -> Result<(), PjaxError> {
        if self.mode == Mode::Active {
            return Ok(());
        }
        if !self.host.supports_history() {
            tracing::warn!("History API unavailable, pjax disabled");
            self.mode = Mode::Unsupported;
            return Err(PjaxError::UnsupportedEnvironment);
        }

        let location = self.host.location();
        tracing::info!("pjax enabled at {}", location);
        if let Some(state) = self.host.current_entry().filter(NavigationState::is_pjax) {
            self.states.adopt(state);
        }
        self.initial_url = Some(location);
        self.initial_pop = true;
        self.mode = Mode::Active;
        Ok(())
    }

    /// Disable partial loads and drop all session state
    pub fn teardown(&mut self) {
        self.cancel_pending(AbortReason::Cancelled);
        self.cache.clear();
        self.states.clear();
        self.known_version = None;
        self.phase = Phase::Idle;
        self.mode = Mode::Inactive;
        tracing::info!("pjax disabled");
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.mode == Mode::Active
    }

    pub fn config(&self) -> &PjaxConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn current_state(&self) -> Option<&NavigationState> {
        self.states.current()
    }

    pub fn cache(&self) -> &HistoryCache<H::Snapshot> {
        &self.cache
    }

    /// Phase of the most recent request
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Layout version remembered from an earlier response
    pub fn known_version(&self) -> Option<&str> {
        self.known_version.as_deref()
    }

    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&mut Notification) + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub(crate) fn emit(&mut self, event: PjaxEvent, options: Option<&ResolvedOptions>) -> bool {
        self.events.emit(Notification::new(event, options))
    }

    /// Abandon the in-place update and load `url` normally
    pub(crate) fn hard_load(&mut self, url: &str) {
        tracing::info!("Falling back to full load of {}", url);
        self.host.location_replace(url);
    }

    /// Detach the pending request so its completion is ignored
    pub(crate) fn cancel_pending(&mut self, reason: AbortReason) {
        if let Some(pending) = self.pending.take() {
            tracing::debug!("Cancelling request {:?} ({:?})", pending.handle, reason);
            self.host.abort(pending.handle, reason);
            if let Some(timer) = pending.timer {
                self.host.clear_timeout(timer);
            }
        }
    }

    /// Seed the current state from the live document on first use
    pub(crate) fn ensure_initial_state(&mut self, options: &ResolvedOptions) {
        if self.states.current().is_some() {
            return;
        }
        let seed = DocumentSeed {
            url: locator::strip_tracking(&self.host.location()).to_string(),
            title: self.host.title(),
            meta: self.host.head_meta(),
            container: options.container.clone(),
            fragment: options.fragment.clone(),
            timeout: options.timeout_ms,
        };
        self.states.initialize(seed, &mut self.host);
    }
}
