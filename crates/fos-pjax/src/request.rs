//! Request Lifecycle
//!
//! Builds the wire request for a navigation and drives it through start,
//! send, completion and the fallback rules. At most one request is pending;
//! starting another detaches the first so its late result is dropped.

use crate::config::{Method, NavigateOptions, ResolvedOptions, Scroll};
use crate::engine::Pjax;
use crate::events::PjaxEvent;
use crate::extract::{self, RawResponse, HEADER_CONTAINER, HEADER_VERSION};
use crate::host::{AbortReason, Host, NativeSubmission, TimerId, TransportHandle};
use crate::locator::{self, PJAX_PARAM};
use crate::state::{CommitMode, NavigationState, StateId};
use crate::PjaxError;
use url::form_urlencoded;
use url::Url;

/// Header announcing a partial request
pub const HEADER_PJAX: &str = "X-PJAX";

/// A request ready for the transport
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    /// Target URL, tracking parameter included, fragment removed
    pub url: Url,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    /// Urlencoded form body for non read-only methods
    pub body: Option<Vec<u8>>,
    pub container: String,
    pub fragment: Option<String>,
}

impl RequestDescriptor {
    /// Build the request for a navigation.
    ///
    /// Read-only methods carry the data and the `_pjax` marker in the query
    /// string; other methods send them as a form body.
    pub fn build(options: &ResolvedOptions) -> Self {
        let mut url = locator::without_fragment(&options.url);
        let mut headers = vec![
            (HEADER_PJAX.to_string(), options.container.clone()),
            (HEADER_CONTAINER.to_string(), options.container.clone()),
        ];

        let body = if options.method.is_idempotent() {
            {
                let mut query = url.query_pairs_mut();
                for (key, value) in &options.data {
                    query.append_pair(key, value);
                }
                query.append_pair(PJAX_PARAM, &options.container);
            }
            None
        } else {
            let mut form = form_urlencoded::Serializer::new(String::new());
            for (key, value) in &options.data {
                form.append_pair(key, value);
            }
            form.append_pair(PJAX_PARAM, &options.container);
            headers.push((
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded; charset=UTF-8".to_string(),
            ));
            Some(form.finish().into_bytes())
        };

        Self {
            url,
            method: options.method,
            headers,
            body,
            container: options.container.clone(),
            fragment: options.fragment.clone(),
        }
    }

    /// Header value, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        extract::find_header(&self.headers, name)
    }
}

/// Where the most recent request stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Starting,
    InFlight,
    Succeeded,
    Failed,
    TimedOut,
    Aborted,
}

/// The request the engine is waiting on
#[derive(Debug)]
pub(crate) struct PendingRequest {
    pub(crate) handle: TransportHandle,
    pub(crate) timer: Option<TimerId>,
    pub(crate) options: ResolvedOptions,
    pub(crate) descriptor: RequestDescriptor,
}

/// How a transport failed to produce a response
#[derive(Debug, Clone, PartialEq)]
pub enum TransportFailure {
    /// Connection or protocol error
    Network(String),
    /// Aborted by the transport or the user agent
    Aborted,
}

/// Result of starting a navigation
#[derive(Debug, Clone, PartialEq)]
pub enum NavigateOutcome {
    /// Request handed to the transport
    Sent(TransportHandle),
    /// An observer vetoed the start
    Prevented,
    /// Engine inactive; handed to native navigation
    PassThrough,
    /// The transport refused the request synchronously
    Completed(CompletionOutcome),
}

/// Result of a transport or timer callback
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// Not the pending request
    Ignored,
    /// New content is in place
    Spliced(StateId),
    /// Gave up and asked for a full load of `url`
    HardLoad { url: String, error: PjaxError },
    /// Failed without a full load
    Failed(PjaxError),
    /// Timeout vetoed; still waiting on the transport
    Continuing,
}

impl<H: Host> Pjax<H> {
    /// Navigate to a URL, loading only the container.
    ///
    /// Validation errors are returned before anything is mutated. When the
    /// engine is inactive the navigation becomes a native submission.
    pub fn navigate(&mut self, options: NavigateOptions) -> Result<NavigateOutcome, PjaxError> {
        if !self.is_active() {
            return self.pass_through(options);
        }
        let resolved = self.prepare(options)?;
        self.start(resolved)
    }

    /// Merge and validate options against the live document
    pub(crate) fn prepare(&self, options: NavigateOptions) -> Result<ResolvedOptions, PjaxError> {
        let location = self.host.location();
        let resolved = self.config.resolve(&location, options)?;
        if !self.host.has_container(&resolved.container) {
            return Err(PjaxError::missing_container(&resolved.container));
        }
        Ok(resolved)
    }

    pub(crate) fn pass_through(
        &mut self,
        options: NavigateOptions,
    ) -> Result<NavigateOutcome, PjaxError> {
        let location = self.host.location();
        let action = match &options.url {
            Some(href) => locator::resolve(&location, href)?,
            None => location,
        };
        let method = options.method.unwrap_or(self.config.method);
        let submission = NativeSubmission::new(method, action.as_str(), &options.data);
        tracing::debug!(
            "pjax inactive, native {} {}",
            submission.method.as_str(),
            submission.action
        );
        self.host.submit_native(&submission);
        Ok(NavigateOutcome::PassThrough)
    }

    /// Run a validated navigation
    pub(crate) fn start(&mut self, options: ResolvedOptions) -> Result<NavigateOutcome, PjaxError> {
        self.ensure_initial_state(&options);
        let descriptor = RequestDescriptor::build(&options);

        if !self.emit(PjaxEvent::Start, Some(&options)) {
            tracing::debug!("Navigation to {} prevented", options.url);
            return Ok(NavigateOutcome::Prevented);
        }
        self.cancel_pending(AbortReason::Superseded);
        self.initial_pop = false;

        let before_send = PjaxEvent::BeforeSend { url: descriptor.url.to_string() };
        if !self.emit(before_send, Some(&options)) {
            tracing::debug!("Request for {} dropped before sending", options.url);
            return Ok(NavigateOutcome::Prevented);
        }
        self.phase = Phase::Starting;

        tracing::info!("pjax {} {}", descriptor.method.as_str(), descriptor.url);
        let handle = match self.host.fetch(&descriptor) {
            Ok(handle) => handle,
            Err(error) => {
                let outcome = self.finish_failure(options, descriptor, error, &[], None);
                return Ok(NavigateOutcome::Completed(outcome));
            }
        };

        let timer = options.effective_timeout().map(|ms| self.host.set_timeout(ms));
        self.emit(PjaxEvent::Send, Some(&options));
        self.phase = Phase::InFlight;
        self.pending = Some(PendingRequest {
            handle,
            timer,
            options,
            descriptor,
        });
        Ok(NavigateOutcome::Sent(handle))
    }

    /// Deliver a response for `handle`
    pub fn complete_request(
        &mut self,
        handle: TransportHandle,
        response: RawResponse,
    ) -> CompletionOutcome {
        let Some(pending) = self.take_pending(handle) else {
            tracing::debug!("Ignoring response for stale request {:?}", handle);
            return CompletionOutcome::Ignored;
        };

        if !response.is_success() {
            let error = PjaxError::Network {
                status: Some(response.status),
                message: format!("unexpected status for {}", pending.descriptor.url),
            };
            return self.finish_failure(
                pending.options,
                pending.descriptor,
                error,
                &response.headers,
                Some(response.status),
            );
        }

        self.finish_success(pending.options, pending.descriptor, response)
    }

    /// Deliver a transport failure for `handle`
    pub fn fail_request(
        &mut self,
        handle: TransportHandle,
        failure: TransportFailure,
    ) -> CompletionOutcome {
        let Some(pending) = self.take_pending(handle) else {
            tracing::debug!("Ignoring failure for stale request {:?}", handle);
            return CompletionOutcome::Ignored;
        };

        let error = match failure {
            TransportFailure::Network(message) => PjaxError::Network { status: None, message },
            TransportFailure::Aborted => PjaxError::Aborted,
        };
        self.finish_failure(pending.options, pending.descriptor, error, &[], None)
    }

    /// Deliver an expired timer
    pub fn fire_timer(&mut self, timer: TimerId) -> CompletionOutcome {
        let Some(options) = self
            .pending
            .as_ref()
            .filter(|p| p.timer == Some(timer))
            .map(|p| p.options.clone())
        else {
            tracing::debug!("Ignoring stale timer {:?}", timer);
            return CompletionOutcome::Ignored;
        };

        if !self.emit(PjaxEvent::Timeout, Some(&options)) {
            tracing::debug!("Timeout vetoed for {}", options.url);
            if let Some(pending) = self.pending.as_mut() {
                pending.timer = None;
            }
            return CompletionOutcome::Continuing;
        }

        let Some(pending) = self.pending.take() else {
            return CompletionOutcome::Ignored;
        };
        self.host.abort(pending.handle, AbortReason::Timeout);
        let error = PjaxError::Timeout { after_ms: options.timeout_ms };
        self.finish_failure(pending.options, pending.descriptor, error, &[], None)
    }

    /// Abort the pending request, if any, without a full-load fallback
    pub fn abort_pending(&mut self) -> CompletionOutcome {
        let Some(pending) = self.pending.take() else {
            return CompletionOutcome::Ignored;
        };
        self.host.abort(pending.handle, AbortReason::Cancelled);
        if let Some(timer) = pending.timer {
            self.host.clear_timeout(timer);
        }
        self.finish_failure(pending.options, pending.descriptor, PjaxError::Aborted, &[], None)
    }

    fn take_pending(&mut self, handle: TransportHandle) -> Option<PendingRequest> {
        if self.pending.as_ref().is_some_and(|p| p.handle == handle) {
            let pending = self.pending.take()?;
            if let Some(timer) = pending.timer {
                self.host.clear_timeout(timer);
            }
            Some(pending)
        } else {
            None
        }
    }

    fn finish_success(
        &mut self,
        options: ResolvedOptions,
        descriptor: RequestDescriptor,
        response: RawResponse,
    ) -> CompletionOutcome {
        let status = Some(response.status);
        let page = extract::extract_page(&response, &descriptor.url, options.fragment.as_deref());

        let current_version = self
            .known_version
            .clone()
            .or_else(|| options.version.resolve(&self.host));
        let latest_version = response.header(HEADER_VERSION).map(str::to_string);

        if let (Some(known), Some(received)) = (&current_version, &latest_version) {
            if known != received {
                let error = PjaxError::StaleLayout {
                    known: known.clone(),
                    received: received.clone(),
                };
                return self.abandon(&options, error, page.url.as_str(), status);
            }
        }

        let Some(content) = page.content.as_deref() else {
            let error = PjaxError::EmptyResponse { url: page.url.to_string() };
            return self.abandon(&options, error, page.url.as_str(), status);
        };

        if current_version.is_none() {
            if let Some(version) = latest_version {
                tracing::debug!("Learned layout version {}", version);
                self.known_version = Some(version);
            }
        }

        let state = NavigationState {
            id: options.id.unwrap_or_else(|| self.states.new_id()),
            url: page.url.to_string(),
            title: page.title.clone().unwrap_or_default(),
            meta: page.meta.clone(),
            container: options.container.clone(),
            fragment: options.fragment.clone(),
            timeout: options.timeout_ms,
        };
        let id = state.id;

        let mode = if options.pushes() {
            if let Some(leaving) = self.states.current().map(|s| s.id) {
                let snapshot = self.host.capture(&options.container);
                self.cache.push(leaving, snapshot);
            }
            CommitMode::Push
        } else if options.replace {
            CommitMode::Replace
        } else {
            CommitMode::Restore
        };
        self.states.commit(state, mode, &mut self.host);

        if let Some(title) = &page.title {
            self.host.apply_title(title);
        }
        if let Some(meta) = &page.meta {
            self.host.apply_meta_diff(meta);
        }
        self.host.apply_content(&options.container, content);
        for script in &page.scripts {
            if !self.host.has_script(&script.src) {
                self.host.load_script(script);
            }
        }
        if let Scroll::To(y) = options.scroll_to {
            self.host.scroll_to(y);
        }

        if let Some(anchor) = locator::anchor(&options.url) {
            let mut url = page.url.clone();
            url.set_fragment(Some(anchor));
            if let Some(mut state) = self.states.current().cloned() {
                state.url = url.to_string();
                self.states.commit(state, CommitMode::Replace, &mut self.host);
            }
            if let Some(y) = self.host.anchor_offset(anchor) {
                self.host.scroll_to(y);
            }
        }

        tracing::info!("pjax loaded {} into {}", page.url, options.container);
        self.phase = Phase::Succeeded;
        self.emit(PjaxEvent::Success { state: id }, Some(&options));
        self.finish(&options, status);
        CompletionOutcome::Spliced(id)
    }

    /// Report a response that cannot be spliced and load it in full
    fn abandon(
        &mut self,
        options: &ResolvedOptions,
        error: PjaxError,
        url: &str,
        status: Option<u16>,
    ) -> CompletionOutcome {
        tracing::warn!("pjax response unusable: {}", error);
        self.phase = Phase::Failed;
        let outcome = if self.emit(PjaxEvent::Error { error: error.clone() }, Some(options)) {
            self.hard_load(url);
            CompletionOutcome::HardLoad { url: url.to_string(), error }
        } else {
            CompletionOutcome::Failed(error)
        };
        self.finish(options, status);
        outcome
    }

    fn finish_failure(
        &mut self,
        options: ResolvedOptions,
        descriptor: RequestDescriptor,
        error: PjaxError,
        headers: &[(String, String)],
        status: Option<u16>,
    ) -> CompletionOutcome {
        tracing::warn!("pjax request to {} failed: {}", descriptor.url, error);
        self.phase = match error {
            PjaxError::Timeout { .. } => Phase::TimedOut,
            PjaxError::Aborted => Phase::Aborted,
            _ => Phase::Failed,
        };

        let url = extract::canonical_url(headers, &descriptor.url).to_string();
        let allowed = self.emit(PjaxEvent::Error { error: error.clone() }, Some(&options));
        let outcome = if allowed && error.falls_back() && options.method.is_idempotent() {
            self.hard_load(&url);
            CompletionOutcome::HardLoad { url, error }
        } else {
            CompletionOutcome::Failed(error)
        };
        self.finish(&options, status);
        outcome
    }

    fn finish(&mut self, options: &ResolvedOptions, status: Option<u16>) {
        self.emit(PjaxEvent::Complete { status }, Some(options));
        self.emit(PjaxEvent::End, Some(options));
    }
}
