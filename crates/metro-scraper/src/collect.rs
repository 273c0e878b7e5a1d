//! Listing collection: every rendered card becomes one catalog entry.

use metro_core::Catalog;

use crate::engine::{Locator, Page};
use crate::error::{ScraperError, Step};
use crate::extract::FieldExtractor;

pub struct ListingCollector<'a> {
    listing_card: &'a Locator,
    extractor: FieldExtractor<'a>,
}

impl<'a> ListingCollector<'a> {
    #[must_use]
    pub fn new(listing_card: &'a Locator, extractor: FieldExtractor<'a>) -> Self {
        Self {
            listing_card,
            extractor,
        }
    }

    /// Extracts every card currently under the listing container.
    ///
    /// Cards are processed in document order and keyed by SKU; a later card
    /// with an already-seen SKU replaces the earlier entry.
    ///
    /// **All-or-nothing**: the first card whose required fields cannot be
    /// read aborts the collection and the partial catalog is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Interaction`] tagged [`Step::CollectListing`]
    /// if the cards cannot be enumerated, or the extractor's error for the
    /// first unreadable card.
    pub async fn collect<P: Page>(&self, page: &P) -> Result<Catalog, ScraperError> {
        let cards = page
            .locate_all(self.listing_card)
            .await
            .map_err(|source| ScraperError::Interaction {
                step: Step::CollectListing,
                source,
            })?;
        tracing::info!(cards = cards.len(), "collecting listing");

        let mut catalog = Catalog::new();
        for card in &cards {
            let product = self.extractor.extract(card).await?;
            if let Some(previous) = catalog.insert(product) {
                tracing::debug!(sku = %previous.id, "duplicate card replaced earlier entry");
            }
        }

        tracing::info!(
            products = catalog.len(),
            discounted = catalog.discounted_count(),
            "listing collected"
        );
        Ok(catalog)
    }
}
