//! fOS Pjax
//!
//! Partial page navigation. Link clicks and form submissions fetch only a
//! container's content and splice it into the live document, while the
//! browser history keeps behaving as if whole pages were loaded. Back and
//! forward replay cached snapshots without touching the network.
//!
//! The engine is driven by its host: it asks the host to fetch, arm timers
//! and mutate the document, and the host reports results back through
//! [`Pjax::complete_request`], [`Pjax::fail_request`], [`Pjax::fire_timer`]
//! and [`Pjax::popstate`].

mod cache;
mod config;
mod engine;
mod error;
mod events;
mod extract;
mod host;
mod locator;
mod meta;
mod popstate;
mod request;
mod state;
mod trigger;

pub use cache::{CacheStats, Direction, HistoryCache};
pub use config::{Method, NavigateOptions, PjaxConfig, ResolvedOptions, Scroll, VersionProvider};
pub use engine::{Mode, Pjax};
pub use error::PjaxError;
pub use events::{EventBus, Notification, PjaxEvent, SubscriptionId};
pub use extract::{
    canonical_url, document_meta, extract_page, find_version, ExtractedPage, RawResponse, ScriptTag,
    HEADER_CONTAINER, HEADER_URL, HEADER_VERSION,
};
pub use host::{
    AbortReason, BrowserHistory, DocumentHost, Host, NativeSubmission, TimerId, Timers, Transport,
    TransportHandle,
};
pub use locator::{strip_tracking, PJAX_PARAM};
pub use meta::{HeadMeta, MetaDescriptor};
pub use popstate::PopstateOutcome;
pub use request::{
    CompletionOutcome, NavigateOutcome, Phase, RequestDescriptor, TransportFailure, HEADER_PJAX,
};
pub use state::{CommitMode, DocumentSeed, IdSequence, NavigationState, StateId, StateManager};
pub use trigger::{ClickOutcome, FormSubmission, IgnoreReason, LinkClick, Modifiers, PRIMARY_BUTTON};
pub use url::Url;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
