//! History Traversal
//!
//! Reconciles back/forward notifications from the browser with the engine.
//! Cached snapshots are restored in place; anything else is re-fetched
//! under the id of the entry being visited.

use crate::cache::Direction;
use crate::config::{Method, ResolvedOptions, Scroll};
use crate::engine::Pjax;
use crate::events::PjaxEvent;
use crate::host::{AbortReason, Host};
use crate::locator;
use crate::request::NavigateOutcome;
use crate::state::{CommitMode, NavigationState, StateId};
use crate::PjaxError;

/// What a history traversal led to
#[derive(Debug, Clone, PartialEq)]
pub enum PopstateOutcome {
    /// Not an engine entry, or the initial notification for the first page
    Ignored,
    /// Container missing; the whole page was reloaded
    Reloaded,
    /// Restored from the cache without the network
    Restored(StateId),
    /// Not cached; fetched again
    Refetched(NavigateOutcome),
}

impl<H: Host> Pjax<H> {
    /// Handle a history traversal carrying `state`
    pub fn popstate(
        &mut self,
        state: Option<NavigationState>,
    ) -> Result<PopstateOutcome, PjaxError> {
        let initial = std::mem::replace(&mut self.initial_pop, false);

        if !self.is_active() {
            return Ok(PopstateOutcome::Ignored);
        }
        let Some(state) = state.filter(NavigationState::is_pjax) else {
            return Ok(PopstateOutcome::Ignored);
        };
        let initial_url = self.initial_url.as_ref();
        if initial && initial_url.is_some_and(|url| url.as_str() == state.url) {
            tracing::debug!("Ignoring initial popstate for {}", state.url);
            return Ok(PopstateOutcome::Ignored);
        }

        if !self.host.has_container(&state.container) {
            let href = self.host.location().to_string();
            tracing::warn!("Container {} missing on popstate, reloading", state.container);
            self.hard_load(&href);
            return Ok(PopstateOutcome::Reloaded);
        }

        let location = self.host.location();
        let options = ResolvedOptions {
            url: locator::resolve(&location, &state.url)?,
            container: state.container.clone(),
            fragment: state.fragment.clone(),
            method: Method::Get,
            data: Vec::new(),
            push: false,
            replace: false,
            timeout_ms: state.timeout,
            scroll_to: Scroll::Keep,
            version: self.config.version.clone(),
            id: Some(state.id),
        };

        // A late response would overwrite whatever this entry shows
        self.cancel_pending(AbortReason::Superseded);

        let (direction, snapshot) = match self.states.current().map(|s| s.id) {
            Some(current) => {
                let direction = Direction::between(current, state.id);
                let leaving = self.host.capture(&state.container);
                let snapshot = match self.cache.pop(direction, current, leaving) {
                    Some((id, snapshot)) if id == state.id => Some(snapshot),
                    _ => self.cache.take(state.id),
                };
                (Some(direction), snapshot)
            }
            None => (None, self.cache.take(state.id)),
        };

        tracing::debug!(
            "popstate to {} ({:?}), cached: {}",
            state.url,
            direction,
            snapshot.is_some()
        );
        self.emit(
            PjaxEvent::Popstate {
                state: Box::new(state.clone()),
                direction,
            },
            Some(&options),
        );

        let container = state.container.clone();
        let outcome = match snapshot {
            Some(snapshot) => {
                let id = state.id;
                self.emit(PjaxEvent::Start, Some(&options));
                if !state.title.is_empty() {
                    self.host.apply_title(&state.title);
                }
                self.host.restore(&state.container, snapshot);
                if let Some(meta) = &state.meta {
                    self.host.apply_meta_diff(meta);
                }
                self.states.commit(state, CommitMode::Restore, &mut self.host);
                self.emit(PjaxEvent::End, Some(&options));
                PopstateOutcome::Restored(id)
            }
            None => PopstateOutcome::Refetched(self.start(options)?),
        };

        self.host.force_layout(&container);
        Ok(outcome)
    }
}
