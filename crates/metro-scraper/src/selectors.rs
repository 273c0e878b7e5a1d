//! Where things live on the Metro storefront.

use crate::engine::Locator;

/// Locators for every element the pipeline touches.
///
/// [`Default`] holds the live Metro markup; tests and alternative layouts can
/// override individual fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSelectors {
    /// "Shop online" button shown over the landing page.
    pub online_shopping_prompt: Locator,
    /// Full-page modal overlay that swallows clicks until dismissed.
    pub interstitial: Locator,
    /// Header category menu entries; narrowed by category name at runtime.
    pub category_entry: String,
    pub load_more: Locator,
    /// Direct children of the listing container, one per product card.
    pub listing_card: Locator,
    pub sku_attribute: String,
    pub actual_price: Locator,
    pub old_price: Locator,
    /// Anchor carrying the product title and relative href.
    pub title_link: Locator,
}

impl SiteSelectors {
    #[must_use]
    pub fn category(&self, name: &str) -> Locator {
        Locator::css(self.category_entry.as_str()).with_text(name)
    }
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            online_shopping_prompt: Locator::button("Покупать онлайн"),
            interstitial: Locator::css("#__layout > div > div > div.modal-root"),
            category_entry: "div.header-categories.header-main__categories > ul > li".to_string(),
            load_more: Locator::button("Показать ещё"),
            listing_card: Locator::css("#products-inner > div"),
            sku_attribute: "data-sku".to_string(),
            actual_price: Locator::css(
                "span.product-price.nowrap.product-card-prices__actual span.product-price__sum-rubles",
            ),
            old_price: Locator::css(
                "span.product-price.nowrap.product-card-prices__old span.product-price__sum-rubles",
            ),
            title_link: Locator::css("div.product-card__top > a"),
        }
    }
}
