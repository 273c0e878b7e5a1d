//! Browser automation capability used by every pipeline step.
//!
//! The pipeline never talks to a concrete browser. It drives the [`Engine`],
//! [`Page`] and [`Element`] traits, which expose exactly the primitives a
//! category scrape needs: navigate, locate, click, read text, read an
//! attribute, and wait for the page to settle. Two implementations exist:
//!
//! - [`chromium::ChromiumEngine`] drives a real Chromium over CDP.
//! - [`fixture::FixtureEngine`] replays saved HTML documents in memory.
//!
//! Every call reports failures as [`InteractionError`] so call sites can pick
//! a [`crate::policy::Policy`] per step.

pub mod chromium;
pub mod fixture;

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::InteractionError;

/// How often lookups re-query the DOM while waiting for a match.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A CSS selector, optionally narrowed to elements whose visible text
/// contains `has_text`. The first match in document order wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub css: String,
    pub has_text: Option<String>,
}

impl Locator {
    #[must_use]
    pub fn css(css: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            has_text: None,
        }
    }

    /// Any element with a button role whose text contains `text`.
    #[must_use]
    pub fn button(text: impl Into<String>) -> Self {
        Self::css(r#"button, [role="button"]"#).with_text(text)
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.has_text = Some(text.into());
        self
    }

    /// Returns `true` when `text` satisfies the text filter.
    #[must_use]
    pub fn text_matches(&self, text: &str) -> bool {
        self.has_text
            .as_deref()
            .is_none_or(|needle| text.contains(needle))
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.has_text {
            Some(text) => write!(f, "{}:has-text({text:?})", self.css),
            None => write!(f, "{}", self.css),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const FULL_HD: Viewport = Viewport {
        width: 1920,
        height: 1080,
    };
}

impl Default for Viewport {
    fn default() -> Self {
        Self::FULL_HD
    }
}

/// Options for starting an engine and its single browsing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub headless: bool,
    pub viewport: Viewport,
    pub executable: Option<PathBuf>,
    /// Upper bound the engine itself puts on any single protocol request.
    /// Must cover the longest per-call timeout handed to [`Page`] methods.
    pub request_timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::FULL_HD,
            executable: None,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// A browser engine that hosts one page at a time.
pub trait Engine {
    type Page: Page;

    /// Starts the engine and opens one browsing context.
    fn open(
        &mut self,
        options: &LaunchOptions,
    ) -> impl Future<Output = Result<Self::Page, InteractionError>>;

    /// Releases every engine resource. Calling it on an engine that never
    /// opened is a no-op.
    fn close(&mut self) -> impl Future<Output = Result<(), InteractionError>>;
}

/// A rendered page.
pub trait Page {
    type Element: Element;

    /// Navigates to `url`, giving up with [`InteractionError::Timeout`] after
    /// `timeout`.
    fn navigate(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), InteractionError>>;

    /// Waits up to `timeout` for the first element matching `locator`.
    fn locate(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> impl Future<Output = Result<Self::Element, InteractionError>>;

    /// Every element currently matching `locator`, without waiting.
    fn locate_all(
        &self,
        locator: &Locator,
    ) -> impl Future<Output = Result<Vec<Self::Element>, InteractionError>>;

    /// Waits for pending navigation and document loading to finish.
    fn wait_stable(&self, timeout: Duration)
        -> impl Future<Output = Result<(), InteractionError>>;
}

/// One element on a rendered page.
pub trait Element: Sized {
    /// Waits up to `timeout` for the first descendant matching `locator`.
    fn locate(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> impl Future<Output = Result<Self, InteractionError>>;

    fn click(&self) -> impl Future<Output = Result<(), InteractionError>>;

    /// Rendered text content.
    fn text(&self) -> impl Future<Output = Result<String, InteractionError>>;

    /// Attribute value; [`InteractionError::NotFound`] when it is absent.
    fn attribute(&self, name: &str) -> impl Future<Output = Result<String, InteractionError>>;
}
