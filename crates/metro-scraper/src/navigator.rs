//! Drives a fresh page from the site root to the selected category listing.

use metro_core::ScrapeConfig;

use crate::engine::{Element, Page};
use crate::error::{ScraperError, Step};
use crate::policy::{self, Policy};
use crate::selectors::SiteSelectors;

pub struct Navigator<'a> {
    config: &'a ScrapeConfig,
    selectors: &'a SiteSelectors,
}

impl<'a> Navigator<'a> {
    #[must_use]
    pub fn new(config: &'a ScrapeConfig, selectors: &'a SiteSelectors) -> Self {
        Self { config, selectors }
    }

    /// Opens the site root within the navigation timeout.
    ///
    /// A timeout is logged and the run continues on whatever has rendered so
    /// far. Any other navigation failure (DNS, refused connection) leaves a
    /// blank page and aborts.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Interaction`] for non-timeout failures.
    pub async fn load<P: Page>(&self, page: &P) -> Result<(), ScraperError> {
        tracing::info!(url = %self.config.site_url, "opening site");
        let outcome = page
            .navigate(&self.config.site_url, self.config.navigation_timeout)
            .await;
        policy::apply(Step::Navigate, Policy::SLOW_NAVIGATION, outcome)?;
        Ok(())
    }

    /// Clicks the "shop online" prompt if it shows up. Never fails the run.
    ///
    /// Returns `true` when the prompt was clicked.
    ///
    /// # Errors
    ///
    /// Never returns an error in practice; the signature keeps the policy
    /// call uniform with the other steps.
    pub async fn dismiss_online_shopping_prompt<P: Page>(
        &self,
        page: &P,
    ) -> Result<bool, ScraperError> {
        let outcome = async {
            let button = page
                .locate(
                    &self.selectors.online_shopping_prompt,
                    self.config.interaction_timeout,
                )
                .await?;
            button.click().await
        }
        .await;
        let clicked = policy::apply(Step::OnlineShoppingPrompt, Policy::BEST_EFFORT, outcome)?;
        Ok(clicked.is_some())
    }

    /// Clicks the full-page modal overlay away.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Interaction`] if the overlay is missing or the
    /// click fails.
    pub async fn dismiss_interstitial<P: Page>(&self, page: &P) -> Result<(), ScraperError> {
        tracing::info!("dismissing interstitial");
        let outcome = async {
            let overlay = page
                .locate(&self.selectors.interstitial, self.config.interaction_timeout)
                .await?;
            overlay.click().await
        }
        .await;
        policy::apply(Step::Interstitial, Policy::Propagate, outcome)?;
        Ok(())
    }

    /// Opens the first category menu entry whose text contains
    /// `category_name`, then waits for the page to settle.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Interaction`] if no entry matches, the click
    /// fails, or the page never settles.
    pub async fn select_category<P: Page>(
        &self,
        page: &P,
        category_name: &str,
    ) -> Result<(), ScraperError> {
        tracing::info!(category = category_name, "selecting category");
        let outcome = async {
            let entry = page
                .locate(
                    &self.selectors.category(category_name),
                    self.config.interaction_timeout,
                )
                .await?;
            entry.click().await
        }
        .await;
        policy::apply(Step::SelectCategory, Policy::Propagate, outcome)?;

        let settled = page.wait_stable(self.config.interaction_timeout).await;
        policy::apply(Step::WaitStable, Policy::Propagate, settled)?;
        Ok(())
    }
}
