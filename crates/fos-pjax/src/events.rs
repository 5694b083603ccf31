//! Lifecycle Notifications
//!
//! Typed events emitted while a navigation runs. Some kinds can be vetoed
//! by an observer with [`Notification::prevent_default`].

use crate::cache::Direction;
use crate::config::ResolvedOptions;
use crate::state::{NavigationState, StateId};
use crate::PjaxError;

/// Event kinds
#[derive(Debug, Clone, PartialEq)]
pub enum PjaxEvent {
    /// A link click is about to be handled; veto keeps the native click
    Click { url: String },
    /// A handled link click started a navigation
    Clicked { url: String },
    /// A navigation is starting; veto cancels it
    Start,
    /// The request is about to go out; veto drops it unsent
    BeforeSend { url: String },
    /// The request went out
    Send,
    /// The client timer fired; veto lets the request keep running
    Timeout,
    /// The request finished, whatever the outcome
    Complete { status: Option<u16> },
    /// Content was spliced in
    Success { state: StateId },
    /// Something went wrong; veto suppresses the full-page fallback
    Error { error: PjaxError },
    /// Last event of every request
    End,
    /// History traversal is being handled
    Popstate { state: Box<NavigationState>, direction: Option<Direction> },
}

impl PjaxEvent {
    pub fn is_cancelable(&self) -> bool {
        matches!(
            self,
            PjaxEvent::Click { .. }
                | PjaxEvent::Start
                | PjaxEvent::BeforeSend { .. }
                | PjaxEvent::Timeout
                | PjaxEvent::Error { .. }
        )
    }

    /// Event name, as in `pjax:<name>`
    pub fn name(&self) -> &'static str {
        match self {
            PjaxEvent::Click { .. } => "click",
            PjaxEvent::Clicked { .. } => "clicked",
            PjaxEvent::Start => "start",
            PjaxEvent::BeforeSend { .. } => "beforeSend",
            PjaxEvent::Send => "send",
            PjaxEvent::Timeout => "timeout",
            PjaxEvent::Complete { .. } => "complete",
            PjaxEvent::Success { .. } => "success",
            PjaxEvent::Error { .. } => "error",
            PjaxEvent::End => "end",
            PjaxEvent::Popstate { .. } => "popstate",
        }
    }
}

/// An event as seen by observers
#[derive(Debug, Clone)]
pub struct Notification {
    pub event: PjaxEvent,
    /// Options of the acting request
    pub options: Option<ResolvedOptions>,
    default_prevented: bool,
}

impl Notification {
    pub fn new(event: PjaxEvent, options: Option<&ResolvedOptions>) -> Self {
        Self {
            event,
            options: options.cloned(),
            default_prevented: false,
        }
    }

    /// Veto the default action; ignored for non-cancelable kinds
    pub fn prevent_default(&mut self) {
        if self.event.is_cancelable() {
            self.default_prevented = true;
        }
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Observer registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&mut Notification)>;

/// Dispatches notifications to observers in subscription order
#[derive(Default)]
pub struct EventBus {
    observers: Vec<(SubscriptionId, Observer)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&mut Notification) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns whether the observer was registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(i, _)| *i != id);
        self.observers.len() != before
    }

    /// Deliver to every observer; `true` unless an observer vetoed
    pub fn emit(&mut self, mut notification: Notification) -> bool {
        tracing::trace!("pjax:{}", notification.event.name());
        for (_, observer) in self.observers.iter_mut() {
            observer(&mut notification);
        }
        !notification.is_default_prevented()
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}
