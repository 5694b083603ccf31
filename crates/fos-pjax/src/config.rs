//! Pjax Configuration
//!
//! Engine-wide defaults and the per-navigation options merged over them.

use crate::host::DocumentHost;
use crate::state::StateId;
use crate::PjaxError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::rc::Rc;
use url::Url;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Patch => "PATCH",
        }
    }

    /// Parse a form `method` attribute; unknown verbs are rejected
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            "HEAD" => Some(Method::Head),
            "PATCH" => Some(Method::Patch),
            _ => None,
        }
    }

    /// Read-only requests may be timed out and replayed as a full load
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Method::Get | Method::Head)
    }
}

/// Scroll behaviour after a splice
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scroll {
    /// Scroll the window to this vertical offset
    To(f64),
    /// Leave the scroll position alone
    Keep,
}

/// Source of the client's layout version
#[derive(Clone, Default)]
pub enum VersionProvider {
    /// Read `<meta http-equiv="X-PJAX-VERSION">` from the live document
    #[default]
    Document,
    Static(String),
    Supplier(Rc<dyn Fn() -> Option<String>>),
    Disabled,
}

impl VersionProvider {
    pub fn supplier(f: impl Fn() -> Option<String> + 'static) -> Self {
        VersionProvider::Supplier(Rc::new(f))
    }

    /// Current version, if any
    pub fn resolve<D: DocumentHost + ?Sized>(&self, document: &D) -> Option<String> {
        let version = match self {
            VersionProvider::Document => document.layout_version(),
            VersionProvider::Static(version) => Some(version.clone()),
            VersionProvider::Supplier(f) => f(),
            VersionProvider::Disabled => None,
        };
        version.filter(|v| !v.is_empty())
    }
}

impl PartialEq for VersionProvider {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (VersionProvider::Document, VersionProvider::Document) => true,
            (VersionProvider::Static(a), VersionProvider::Static(b)) => a == b,
            (VersionProvider::Supplier(a), VersionProvider::Supplier(b)) => Rc::ptr_eq(a, b),
            (VersionProvider::Disabled, VersionProvider::Disabled) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for VersionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionProvider::Document => write!(f, "Document"),
            VersionProvider::Static(v) => f.debug_tuple("Static").field(v).finish(),
            VersionProvider::Supplier(_) => write!(f, "Supplier(..)"),
            VersionProvider::Disabled => write!(f, "Disabled"),
        }
    }
}

impl<'de> Deserialize<'de> for VersionProvider {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<String>::deserialize(deserializer)? {
            Some(version) => VersionProvider::Static(version),
            None => VersionProvider::Disabled,
        })
    }
}

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PjaxConfig {
    /// Client-side timeout for read-only requests (0 disables it)
    pub timeout_ms: u64,
    /// Push a new history entry on success
    pub push: bool,
    /// Replace the current history entry instead
    pub replace: bool,
    /// Default request method
    pub method: Method,
    /// Scroll target after a splice
    #[serde(deserialize_with = "deserialize_scroll")]
    pub scroll_to: Scroll,
    /// Bound on each directional cache stack
    pub max_cache_length: usize,
    /// Layout version source
    pub version: VersionProvider,
}

impl Default for PjaxConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 3000,
            push: true,
            replace: false,
            method: Method::Get,
            scroll_to: Scroll::To(0.0),
            max_cache_length: 20,
            version: VersionProvider::Document,
        }
    }
}

impl PjaxConfig {
    /// Load a configuration from JSON; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self, PjaxError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Merge per-call options over these defaults
    pub fn resolve(
        &self,
        base: &Url,
        options: NavigateOptions,
    ) -> Result<ResolvedOptions, PjaxError> {
        let url = match &options.url {
            Some(href) => crate::locator::resolve(base, href)?,
            None => base.clone(),
        };
        let container = options
            .container
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| PjaxError::Validation("no pjax container given".into()))?;

        Ok(ResolvedOptions {
            url,
            container,
            fragment: options.fragment.filter(|f| !f.trim().is_empty()),
            method: options.method.unwrap_or(self.method),
            data: options.data,
            push: options.push.unwrap_or(self.push),
            replace: options.replace.unwrap_or(self.replace),
            timeout_ms: options.timeout_ms.unwrap_or(self.timeout_ms),
            scroll_to: options.scroll_to.unwrap_or(self.scroll_to),
            version: options.version.unwrap_or_else(|| self.version.clone()),
            id: options.id,
        })
    }
}

fn deserialize_scroll<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Scroll, D::Error> {
    Ok(match Option::<f64>::deserialize(deserializer)? {
        Some(y) => Scroll::To(y),
        None => Scroll::Keep,
    })
}

/// Per-navigation options; `None` falls back to the engine defaults
#[derive(Debug, Clone, Default)]
pub struct NavigateOptions {
    pub url: Option<String>,
    pub container: Option<String>,
    pub fragment: Option<String>,
    pub method: Option<Method>,
    /// Form fields or extra query pairs
    pub data: Vec<(String, String)>,
    pub push: Option<bool>,
    pub replace: Option<bool>,
    pub timeout_ms: Option<u64>,
    pub scroll_to: Option<Scroll>,
    pub version: Option<VersionProvider>,
    /// Reuse an existing state id (history replays)
    pub id: Option<StateId>,
}

impl NavigateOptions {
    pub fn new(url: &str, container: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            container: Some(container.to_string()),
            ..Default::default()
        }
    }

    pub fn with_fragment(mut self, fragment: &str) -> Self {
        self.fragment = Some(fragment.to_string());
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_data(mut self, key: &str, value: &str) -> Self {
        self.data.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_push(mut self, push: bool) -> Self {
        self.push = Some(push);
        self
    }

    pub fn with_replace(mut self, replace: bool) -> Self {
        self.replace = Some(replace);
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_scroll(mut self, scroll: Scroll) -> Self {
        self.scroll_to = Some(scroll);
        self
    }

    pub fn with_version(mut self, version: VersionProvider) -> Self {
        self.version = Some(version);
        self
    }
}

/// Options after merging, as carried by a request and its notifications
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    /// Absolute target, as requested
    pub url: Url,
    pub container: String,
    pub fragment: Option<String>,
    pub method: Method,
    pub data: Vec<(String, String)>,
    pub push: bool,
    pub replace: bool,
    pub timeout_ms: u64,
    pub scroll_to: Scroll,
    /// Layout version source for the staleness check
    pub version: VersionProvider,
    pub id: Option<StateId>,
}

impl ResolvedOptions {
    /// Whether a successful load adds a history entry
    pub fn pushes(&self) -> bool {
        self.push && !self.replace
    }

    /// Timeout armed for this request, if any
    pub fn effective_timeout(&self) -> Option<u64> {
        (self.method.is_idempotent() && self.timeout_ms > 0).then_some(self.timeout_ms)
    }
}
