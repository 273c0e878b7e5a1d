//! End-to-end run orchestration.
//!
//! A run moves strictly forward through [`PipelineState`]:
//! launch, load the site, dismiss prompts, select the category, paginate,
//! collect, export, close. Tolerated failures are logged by the step that
//! hit them; anything else aborts the run. Once the browser has launched it
//! is closed on every exit path.

use std::fmt;
use std::path::PathBuf;

use metro_core::{Catalog, ScrapeConfig};

use crate::collect::ListingCollector;
use crate::engine::{Engine, LaunchOptions, Page, Viewport};
use crate::error::ScraperError;
use crate::export::export;
use crate::extract::FieldExtractor;
use crate::navigator::Navigator;
use crate::pagination::{PaginationReport, Paginator};
use crate::selectors::SiteSelectors;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineState {
    Launching,
    SiteLoaded,
    PromptDismissed,
    CategorySelected,
    Paginated,
    Collected,
    Exported,
    Closed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Launching => "launching",
            PipelineState::SiteLoaded => "site_loaded",
            PipelineState::PromptDismissed => "prompt_dismissed",
            PipelineState::CategorySelected => "category_selected",
            PipelineState::Paginated => "paginated",
            PipelineState::Collected => "collected",
            PipelineState::Exported => "exported",
            PipelineState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub products: usize,
    /// Products that carried an old (pre-discount) price.
    pub discounted: usize,
    pub pagination: PaginationReport,
    pub output_path: PathBuf,
    pub final_state: PipelineState,
    pub catalog: Catalog,
}

pub struct Pipeline {
    config: ScrapeConfig,
    selectors: SiteSelectors,
    state: PipelineState,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: ScrapeConfig, selectors: SiteSelectors) -> Self {
        Self {
            config,
            selectors,
            state: PipelineState::Launching,
        }
    }

    /// The last state the pipeline reached.
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Runs one scrape of the configured category with `engine`.
    ///
    /// A teardown failure after a successful export is logged and does not
    /// fail the run; the snapshot is already on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Launch`] if the engine cannot start, or the
    /// first unguarded step failure. The browser is closed before the error
    /// is returned.
    pub async fn run<E: Engine>(&mut self, engine: E) -> Result<RunReport, ScraperError> {
        self.state = PipelineState::Launching;
        tracing::info!(
            site = %self.config.site_url,
            category = %self.config.category_name,
            show_more = self.config.show_more_count,
            "starting scrape"
        );

        let session = Session::open(engine, &launch_options(&self.config)).await?;

        let outcome = self.drive(session.page()).await;
        let closed = session.close().await;
        advance(&mut self.state, PipelineState::Closed);

        match (outcome, closed) {
            (Ok((catalog, pagination)), closed) => {
                if let Err(e) = closed {
                    tracing::warn!(error = %e, "browser teardown failed after export");
                }
                Ok(RunReport {
                    products: catalog.len(),
                    discounted: catalog.discounted_count(),
                    pagination,
                    output_path: self.config.output_path.clone(),
                    final_state: self.state,
                    catalog,
                })
            }
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    tracing::warn!(error = %close_err, "browser teardown failed");
                }
                tracing::error!(state = %self.state, error = %e, "scrape aborted");
                Err(e)
            }
        }
    }

    async fn drive<P: Page>(
        &mut self,
        page: &P,
    ) -> Result<(Catalog, PaginationReport), ScraperError> {
        let Self {
            config,
            selectors,
            state,
        } = self;
        let (config, selectors) = (&*config, &*selectors);
        let navigator = Navigator::new(config, selectors);

        navigator.load(page).await?;
        advance(state, PipelineState::SiteLoaded);

        navigator.dismiss_online_shopping_prompt(page).await?;
        navigator.dismiss_interstitial(page).await?;
        advance(state, PipelineState::PromptDismissed);

        navigator.select_category(page, &config.category_name).await?;
        advance(state, PipelineState::CategorySelected);

        let pagination = Paginator::new(
            &selectors.load_more,
            &selectors.listing_card,
            config.load_more_timeout,
            config.pagination_settle,
        )
        .expand(page, config.show_more_count)
        .await?;
        advance(state, PipelineState::Paginated);

        let extractor = FieldExtractor::new(
            &config.site_url,
            selectors,
            config.interaction_timeout,
            config.optional_field_timeout,
        );
        let catalog = ListingCollector::new(&selectors.listing_card, extractor)
            .collect(page)
            .await?;
        advance(state, PipelineState::Collected);

        export(&catalog, &config.output_path)?;
        advance(state, PipelineState::Exported);

        Ok((catalog, pagination))
    }
}

/// The engine's own request bound must not cut off the longest per-step
/// timeout.
fn launch_options(config: &ScrapeConfig) -> LaunchOptions {
    let request_timeout = config
        .navigation_timeout
        .max(config.interaction_timeout)
        .max(config.load_more_timeout);
    LaunchOptions {
        headless: config.headless,
        viewport: Viewport::FULL_HD,
        executable: config.chrome_executable.clone(),
        request_timeout,
    }
}

fn advance(state: &mut PipelineState, next: PipelineState) {
    debug_assert!(next > *state, "pipeline moved backwards: {state} -> {next}");
    *state = next;
    tracing::info!(state = %next, "pipeline advanced");
}
