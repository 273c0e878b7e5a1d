//! "Load more" pagination.
//!
//! The listing reveals additional cards in place each time the "load more"
//! button is clicked. The paginator makes at most `max_clicks` attempts. When
//! the button is missing or the click fails, the attempt is logged as a
//! warning and counted as a miss: running out of pages is the normal way
//! for pagination to end, at some unknown attempt.
//!
//! After each successful click the paginator polls the card count until it
//! grows or the settle window closes, rather than sleeping a fixed time.

use std::time::Duration;

use tokio::time::Instant;

use crate::engine::{Element, Locator, Page};
use crate::error::{ScraperError, Step};
use crate::policy::{self, Policy};

/// How often the card count is re-read while waiting for new cards.
const SETTLE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// What happened across all pagination attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationReport {
    pub attempts: u32,
    pub clicks: u32,
    /// Attempts where the button was missing or the click failed.
    pub misses: u32,
    /// Clicks after which no new cards appeared within the settle window.
    pub unsettled: u32,
}

pub struct Paginator<'a> {
    load_more: &'a Locator,
    listing_card: &'a Locator,
    lookup_timeout: Duration,
    settle: Duration,
}

impl<'a> Paginator<'a> {
    #[must_use]
    pub fn new(
        load_more: &'a Locator,
        listing_card: &'a Locator,
        lookup_timeout: Duration,
        settle: Duration,
    ) -> Self {
        Self {
            load_more,
            listing_card,
            lookup_timeout,
            settle,
        }
    }

    /// Clicks "load more" up to `max_clicks` times.
    ///
    /// # Errors
    ///
    /// Does not fail on a missing or unclickable button. Returns
    /// [`ScraperError::Interaction`] only if the card count cannot be read.
    pub async fn expand<P: Page>(
        &self,
        page: &P,
        max_clicks: u32,
    ) -> Result<PaginationReport, ScraperError> {
        tracing::info!(max_clicks, "expanding listing");
        let mut report = PaginationReport::default();

        for attempt in 1..=max_clicks {
            report.attempts += 1;
            let before = self.card_count(page).await?;

            let outcome = async {
                let button = page.locate(self.load_more, self.lookup_timeout).await?;
                button.click().await
            }
            .await;

            if policy::apply(Step::LoadMore, Policy::EXHAUSTION, outcome)?.is_none() {
                tracing::warn!(attempt, max_clicks, "no more products to load");
                report.misses += 1;
                continue;
            }
            report.clicks += 1;

            match self.wait_for_growth(page, before).await? {
                Some(after) => tracing::debug!(attempt, before, after, "listing grew"),
                None => {
                    tracing::warn!(
                        attempt,
                        cards = before,
                        settle_ms = u64::try_from(self.settle.as_millis()).unwrap_or(u64::MAX),
                        "no new cards appeared after load more"
                    );
                    report.unsettled += 1;
                }
            }
        }

        tracing::info!(
            attempts = report.attempts,
            clicks = report.clicks,
            misses = report.misses,
            "pagination finished"
        );
        Ok(report)
    }

    async fn card_count<P: Page>(&self, page: &P) -> Result<usize, ScraperError> {
        let cards = page.locate_all(self.listing_card).await;
        let cards = policy::apply(Step::LoadMore, Policy::Propagate, cards)?;
        Ok(cards.map_or(0, |c| c.len()))
    }

    /// Polls until the card count exceeds `before`, returning the new count,
    /// or `None` once the settle window has passed.
    async fn wait_for_growth<P: Page>(
        &self,
        page: &P,
        before: usize,
    ) -> Result<Option<usize>, ScraperError> {
        let deadline = Instant::now() + self.settle;
        loop {
            let now_count = self.card_count(page).await?;
            if now_count > before {
                return Ok(Some(now_count));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(SETTLE_POLL_INTERVAL.min(deadline - now)).await;
        }
    }
}
