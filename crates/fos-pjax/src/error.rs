//! Pjax Errors

/// Errors raised while navigating
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PjaxError {
    /// Missing or unusable container, bad URL. Nothing was mutated.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error{}: {message}", http_status(.status))]
    Network { status: Option<u16>, message: String },

    #[error("Request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("Layout version changed: {known} -> {received}")]
    StaleLayout { known: String, received: String },

    #[error("Empty response for {url}")]
    EmptyResponse { url: String },

    #[error("History API unavailable")]
    UnsupportedEnvironment,

    #[error("Request aborted")]
    Aborted,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

fn http_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl PjaxError {
    pub(crate) fn missing_container(selector: &str) -> Self {
        PjaxError::Validation(format!("no pjax container for {selector:?}"))
    }

    /// Whether the engine answers this error with a full page load
    pub fn falls_back(&self) -> bool {
        matches!(
            self,
            PjaxError::Network { .. }
                | PjaxError::Timeout { .. }
                | PjaxError::StaleLayout { .. }
                | PjaxError::EmptyResponse { .. }
        )
    }
}

impl From<url::ParseError> for PjaxError {
    fn from(err: url::ParseError) -> Self {
        PjaxError::Validation(format!("invalid URL: {err}"))
    }
}

impl From<serde_json::Error> for PjaxError {
    fn from(err: serde_json::Error) -> Self {
        PjaxError::Config(err.to_string())
    }
}
