//! Chromium over the DevTools protocol via `chromiumoxide`.
//!
//! CDP lookups do not wait for elements to appear, so [`ChromiumPage::locate`]
//! and [`ChromiumElement::locate`] poll the DOM every [`POLL_INTERVAL`] until
//! a match shows up or the caller's timeout runs out.

use std::future::Future;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element as CdpElement;
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::viewport::Viewport as CdpViewport;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{Element, Engine, LaunchOptions, Locator, Page, POLL_INTERVAL};
use crate::error::InteractionError;

/// A Chromium instance launched on [`Engine::open`].
#[derive(Default)]
pub struct ChromiumEngine {
    browser: Option<Browser>,
    handler_task: Option<JoinHandle<()>>,
}

impl ChromiumEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Engine for ChromiumEngine {
    type Page = ChromiumPage;

    async fn open(&mut self, options: &LaunchOptions) -> Result<ChromiumPage, InteractionError> {
        let viewport = CdpViewport {
            width: options.viewport.width,
            height: options.viewport.height,
            ..CdpViewport::default()
        };
        let mut builder = BrowserConfig::builder()
            .window_size(options.viewport.width, options.viewport.height)
            .viewport(viewport)
            .request_timeout(options.request_timeout);
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|message| InteractionError::engine("browser config", message))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| InteractionError::engine("browser launch", e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::warn!(error = %e, "chromium handler event error");
                }
            }
        });
        self.handler_task = Some(handler_task);

        // Stored before the page is opened so close() can still reap it.
        let browser = self.browser.insert(browser);
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| InteractionError::engine("new page", e))?;

        Ok(ChromiumPage {
            inner: page,
            request_timeout: options.request_timeout,
        })
    }

    async fn close(&mut self) -> Result<(), InteractionError> {
        let closed = match self.browser.take() {
            Some(mut browser) => {
                let closed = browser
                    .close()
                    .await
                    .map(|_| ())
                    .map_err(|e| InteractionError::engine("browser close", e));
                if let Err(e) = browser.wait().await {
                    tracing::warn!(error = %e, "failed to reap browser process");
                }
                closed
            }
            None => Ok(()),
        };
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
        closed
    }
}

pub struct ChromiumPage {
    inner: CdpPage,
    request_timeout: Duration,
}

impl ChromiumPage {
    async fn matching(&self, locator: &Locator) -> Result<Vec<ChromiumElement>, InteractionError> {
        let candidates = self
            .inner
            .find_elements(locator.css.as_str())
            .await
            .map_err(|e| map_cdp_error(locator.to_string(), e, self.request_timeout))?;
        filter_by_text(candidates, locator, self.request_timeout).await
    }

    async fn ready_state(&self) -> Result<String, InteractionError> {
        self.inner
            .evaluate("document.readyState")
            .await
            .map_err(|e| map_cdp_error("document.readyState", e, self.request_timeout))?
            .into_value::<String>()
            .map_err(|e| InteractionError::engine("document.readyState", e))
    }
}

impl Page for ChromiumPage {
    type Element = ChromiumElement;

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), InteractionError> {
        let what = format!("navigation to {url}");
        // The browser evicts requests older than its own request timeout.
        let bound = timeout.min(self.request_timeout);
        match tokio::time::timeout(timeout, self.inner.goto(url)).await {
            Err(_) => Err(InteractionError::timeout(what, timeout)),
            Ok(Err(e)) => Err(map_cdp_error(what, e, bound)),
            Ok(Ok(_)) => Ok(()),
        }
    }

    async fn locate(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<ChromiumElement, InteractionError> {
        poll_first(locator, timeout, || self.matching(locator)).await
    }

    async fn locate_all(&self, locator: &Locator) -> Result<Vec<ChromiumElement>, InteractionError> {
        self.matching(locator).await
    }

    async fn wait_stable(&self, timeout: Duration) -> Result<(), InteractionError> {
        let settle = async {
            self.inner
                .wait_for_navigation()
                .await
                .map_err(|e| map_cdp_error("navigation", e, self.request_timeout))?;
            while self.ready_state().await? != "complete" {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            Ok(())
        };
        tokio::time::timeout(timeout, settle)
            .await
            .unwrap_or_else(|_| Err(InteractionError::timeout("stable page", timeout)))
    }
}

pub struct ChromiumElement {
    inner: CdpElement,
    request_timeout: Duration,
}

impl ChromiumElement {
    async fn matching(&self, locator: &Locator) -> Result<Vec<ChromiumElement>, InteractionError> {
        let candidates = self
            .inner
            .find_elements(locator.css.as_str())
            .await
            .map_err(|e| map_cdp_error(locator.to_string(), e, self.request_timeout))?;
        filter_by_text(candidates, locator, self.request_timeout).await
    }
}

impl Element for ChromiumElement {
    async fn locate(&self, locator: &Locator, timeout: Duration) -> Result<Self, InteractionError> {
        poll_first(locator, timeout, || self.matching(locator)).await
    }

    async fn click(&self) -> Result<(), InteractionError> {
        self.inner
            .click()
            .await
            .map(|_| ())
            .map_err(|e| map_cdp_error("click", e, self.request_timeout))
    }

    async fn text(&self) -> Result<String, InteractionError> {
        self.inner
            .inner_text()
            .await
            .map_err(|e| map_cdp_error("inner text", e, self.request_timeout))?
            .ok_or_else(|| InteractionError::not_found("inner text"))
    }

    async fn attribute(&self, name: &str) -> Result<String, InteractionError> {
        self.inner
            .attribute(name)
            .await
            .map_err(|e| map_cdp_error(format!("attribute {name}"), e, self.request_timeout))?
            .ok_or_else(|| InteractionError::not_found(format!("attribute {name}")))
    }
}

/// Keeps only candidates whose inner text satisfies the locator's text filter.
async fn filter_by_text(
    candidates: Vec<CdpElement>,
    locator: &Locator,
    request_timeout: Duration,
) -> Result<Vec<ChromiumElement>, InteractionError> {
    let wrap = |inner| ChromiumElement {
        inner,
        request_timeout,
    };
    if locator.has_text.is_none() {
        return Ok(candidates.into_iter().map(wrap).collect());
    }

    let mut matched = Vec::new();
    for inner in candidates {
        let text = inner
            .inner_text()
            .await
            .map_err(|e| map_cdp_error(locator.to_string(), e, request_timeout))?
            .unwrap_or_default();
        if locator.text_matches(&text) {
            matched.push(wrap(inner));
        }
    }
    Ok(matched)
}

/// Re-runs `fetch` until it yields at least one element or `timeout` passes.
async fn poll_first<F, Fut>(
    locator: &Locator,
    timeout: Duration,
    mut fetch: F,
) -> Result<ChromiumElement, InteractionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<ChromiumElement>, InteractionError>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(first) = fetch().await?.into_iter().next() {
            return Ok(first);
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(InteractionError::timeout(locator.to_string(), timeout));
        }
        tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
    }
}

/// `after` is the bound the browser enforced when it reports a timeout.
fn map_cdp_error(what: impl Into<String>, err: CdpError, after: Duration) -> InteractionError {
    match err {
        CdpError::NotFound => InteractionError::not_found(what),
        CdpError::Timeout => InteractionError::timeout(what, after),
        other => InteractionError::engine(what, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_timeout_reports_enforced_bound() {
        let err = map_cdp_error("navigation to https://shop.test", CdpError::Timeout, Duration::from_secs(60));
        assert_eq!(
            err,
            InteractionError::Timeout {
                what: "navigation to https://shop.test".to_string(),
                after: Duration::from_secs(60),
            }
        );
    }

    #[test]
    fn browser_not_found_is_not_found() {
        let err = map_cdp_error("click", CdpError::NotFound, Duration::from_secs(30));
        assert_eq!(err.kind(), crate::error::InteractionKind::NotFound);
    }
}
