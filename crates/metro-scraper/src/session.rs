//! Browser engine lifecycle: one engine, one page, closed exactly once.

use crate::engine::{Engine, LaunchOptions};
use crate::error::{ScraperError, Step};

/// A launched engine together with its single page.
pub struct Session<E: Engine> {
    engine: E,
    page: E::Page,
}

impl<E: Engine> Session<E> {
    /// Launches `engine` with the given viewport and headless mode.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Launch`] if the engine cannot start. There is
    /// no recovery; the run aborts.
    pub async fn open(mut engine: E, options: &LaunchOptions) -> Result<Self, ScraperError> {
        tracing::info!(
            headless = options.headless,
            width = options.viewport.width,
            height = options.viewport.height,
            "launching browser"
        );
        match engine.open(options).await {
            Ok(page) => Ok(Self { engine, page }),
            Err(err) => {
                if let Err(close_err) = engine.close().await {
                    tracing::warn!(error = %close_err, "cleanup after failed launch failed");
                }
                Err(ScraperError::Launch(err))
            }
        }
    }

    pub fn page(&self) -> &E::Page {
        &self.page
    }

    /// Drops the page and releases every engine resource.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Interaction`] tagged [`Step::Teardown`] if the
    /// engine reports a failure while shutting down.
    pub async fn close(self) -> Result<(), ScraperError> {
        let Self { mut engine, page } = self;
        drop(page);
        tracing::info!("closing browser");
        engine
            .close()
            .await
            .map_err(|source| ScraperError::Interaction {
                step: Step::Teardown,
                source,
            })
    }
}
