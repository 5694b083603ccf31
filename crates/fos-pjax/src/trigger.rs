//! Navigation Triggers
//!
//! Link clicks, form submissions and reloads, filtered the way a browser
//! user expects: modified clicks, foreign links and in-page anchors keep
//! their native behaviour.

use crate::config::{Method, NavigateOptions, Scroll};
use crate::engine::Pjax;
use crate::events::PjaxEvent;
use crate::host::Host;
use crate::locator;
use crate::request::NavigateOutcome;
use crate::PjaxError;

/// Primary mouse button, as reported in `event.which`
pub const PRIMARY_BUTTON: u16 = 1;

/// Modifier keys held during a click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub meta: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.meta || self.ctrl || self.shift || self.alt
    }
}

/// A click on a link
#[derive(Debug, Clone, PartialEq)]
pub struct LinkClick {
    /// `href` attribute, or `data-href` for non-anchor elements
    pub href: String,
    pub button: u16,
    pub modifiers: Modifiers,
    /// Another handler already claimed the click
    pub default_prevented: bool,
    /// `data-pjax` attribute naming the container
    pub container: Option<String>,
}

impl LinkClick {
    /// Plain primary-button click
    pub fn primary(href: &str) -> Self {
        Self {
            href: href.to_string(),
            button: PRIMARY_BUTTON,
            modifiers: Modifiers::default(),
            default_prevented: false,
            container: None,
        }
    }

    pub fn with_container(mut self, container: &str) -> Self {
        self.container = Some(container.to_string());
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Why a click was left to the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Inactive,
    NotPrimaryButton,
    Modified,
    AlreadyHandled,
    CrossOrigin,
    SamePageAnchor,
    EmptyAnchor,
}

/// What became of a click
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// The browser should follow the link itself
    Ignored(IgnoreReason),
    /// An observer vetoed the click event; the browser follows the link
    Prevented,
    /// Handled by the engine; the native click must be suppressed
    Navigated(NavigateOutcome),
}

/// A form being submitted
#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmission {
    pub method: Method,
    pub action: String,
    pub fields: Vec<(String, String)>,
    /// `data-pjax` attribute naming the container
    pub container: Option<String>,
}

impl FormSubmission {
    /// Build from raw attributes; an unknown `method` falls back to GET
    pub fn new(method: &str, action: &str) -> Self {
        Self {
            method: Method::parse(method).unwrap_or_default(),
            action: action.to_string(),
            fields: Vec::new(),
            container: None,
        }
    }

    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_container(mut self, container: &str) -> Self {
        self.container = Some(container.to_string());
        self
    }
}

impl<H: Host> Pjax<H> {
    /// Handle a link click.
    ///
    /// `options` override what the link itself provides.
    pub fn click(
        &mut self,
        click: &LinkClick,
        options: NavigateOptions,
    ) -> Result<ClickOutcome, PjaxError> {
        if !self.is_active() {
            return Ok(ClickOutcome::Ignored(IgnoreReason::Inactive));
        }
        if click.button > PRIMARY_BUTTON {
            return Ok(ClickOutcome::Ignored(IgnoreReason::NotPrimaryButton));
        }
        if click.modifiers.any() {
            return Ok(ClickOutcome::Ignored(IgnoreReason::Modified));
        }
        if click.default_prevented {
            return Ok(ClickOutcome::Ignored(IgnoreReason::AlreadyHandled));
        }
        if click.href.trim().is_empty() {
            return Err(PjaxError::Validation("link has no href".into()));
        }

        let location = self.host.location();
        let link = locator::resolve(&location, &click.href)?;
        if !locator::same_origin(&location, &link) {
            return Ok(ClickOutcome::Ignored(IgnoreReason::CrossOrigin));
        }
        if locator::is_same_page_anchor(&location, &link) {
            return Ok(ClickOutcome::Ignored(IgnoreReason::SamePageAnchor));
        }
        if locator::is_empty_anchor(&location, &link) {
            return Ok(ClickOutcome::Ignored(IgnoreReason::EmptyAnchor));
        }

        let options = NavigateOptions {
            url: Some(link.to_string()),
            container: options.container.or_else(|| click.container.clone()),
            ..options
        };
        let resolved = self.prepare(options)?;

        let event = PjaxEvent::Click { url: link.to_string() };
        if !self.emit(event, Some(&resolved)) {
            return Ok(ClickOutcome::Prevented);
        }
        let outcome = self.start(resolved.clone())?;
        self.emit(PjaxEvent::Clicked { url: link.to_string() }, Some(&resolved));
        Ok(ClickOutcome::Navigated(outcome))
    }

    /// Submit a form through the engine, or natively when inactive
    pub fn submit(
        &mut self,
        form: &FormSubmission,
        options: NavigateOptions,
    ) -> Result<NavigateOutcome, PjaxError> {
        let options = NavigateOptions {
            url: options.url.or_else(|| Some(form.action.clone())),
            container: options.container.or_else(|| form.container.clone()),
            method: options.method.or(Some(form.method)),
            data: if options.data.is_empty() { form.fields.clone() } else { options.data },
            ..options
        };
        self.navigate(options)
    }

    /// Reload the current page's container in place
    pub fn reload(&mut self, options: NavigateOptions) -> Result<NavigateOutcome, PjaxError> {
        if !self.is_active() {
            self.host.location_reload();
            return Ok(NavigateOutcome::PassThrough);
        }
        let options = NavigateOptions {
            url: options.url.or_else(|| Some(self.host.location().to_string())),
            push: Some(false),
            replace: Some(true),
            scroll_to: options.scroll_to.or(Some(Scroll::Keep)),
            ..options
        };
        self.navigate(options)
    }
}
