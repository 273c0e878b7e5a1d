//! Per-card field extraction.
//!
//! `id`, `price`, `name` and `link` are required: any failure aborts the
//! collection. `old_price` is the only field designed to be absent. Its
//! lookup uses a short timeout so a card without a discount costs about a
//! second instead of the full interaction timeout.

use std::time::Duration;

use metro_core::Product;
use tracing::Instrument;

use crate::engine::{Element, Locator};
use crate::error::{InteractionError, ScraperError, Step};
use crate::normalize::{build_link, normalize_price};
use crate::policy::{self, Policy};
use crate::selectors::SiteSelectors;

pub struct FieldExtractor<'a> {
    site_url: &'a str,
    selectors: &'a SiteSelectors,
    required_timeout: Duration,
    optional_timeout: Duration,
}

impl<'a> FieldExtractor<'a> {
    #[must_use]
    pub fn new(
        site_url: &'a str,
        selectors: &'a SiteSelectors,
        required_timeout: Duration,
        optional_timeout: Duration,
    ) -> Self {
        Self {
            site_url,
            selectors,
            required_timeout,
            optional_timeout,
        }
    }

    /// Builds a [`Product`] from one rendered card.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Interaction`] tagged with the failing field if
    /// a required field cannot be read, or if the old-price lookup fails for
    /// a reason other than absence.
    pub async fn extract<E: Element>(&self, card: &E) -> Result<Product, ScraperError> {
        let id = required(
            "id",
            card.attribute(&self.selectors.sku_attribute).await,
        )?;
        let span = tracing::debug_span!("card", sku = %id);
        self.extract_fields(card, id).instrument(span).await
    }

    async fn extract_fields<E: Element>(
        &self,
        card: &E,
        id: String,
    ) -> Result<Product, ScraperError> {
        let price = required("price", self.read_text(card, &self.selectors.actual_price).await)?;
        let price = normalize_price(&price);

        let anchor = required(
            "name",
            card.locate(&self.selectors.title_link, self.required_timeout)
                .await,
        )?;
        let name = required("name", anchor.attribute("title").await)?;
        let href = required("link", anchor.attribute("href").await)?;
        let link = build_link(self.site_url, &href);

        let old_price = self.old_price(card).await?;

        Ok(Product {
            id,
            price,
            name,
            link,
            old_price,
        })
    }

    async fn old_price<E: Element>(&self, card: &E) -> Result<Option<String>, ScraperError> {
        let outcome = async {
            let element = card
                .locate(&self.selectors.old_price, self.optional_timeout)
                .await?;
            element.text().await
        }
        .await;
        let old_price = policy::apply(Step::ExtractField("old_price"), Policy::ABSENCE, outcome)?;
        if old_price.is_none() {
            tracing::warn!("card has no old price");
        }
        Ok(old_price.map(|raw| normalize_price(&raw)))
    }

    async fn read_text<E: Element>(
        &self,
        card: &E,
        locator: &Locator,
    ) -> Result<String, InteractionError> {
        card.locate(locator, self.required_timeout).await?.text().await
    }
}

/// Required fields propagate every failure, tagged with the field name.
fn required<T>(field: &'static str, outcome: Result<T, InteractionError>) -> Result<T, ScraperError> {
    outcome.map_err(|source| ScraperError::Interaction {
        step: Step::ExtractField(field),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixture::{FixtureEngine, FixtureElement, FixtureSite};
    use crate::engine::{Engine, LaunchOptions, Locator, Page};
    use crate::test_logs::CapturedLogs;

    const SITE: &str = "https://online.metro-cc.ru";

    fn card_html(sku: &str, price: &str, old_price: Option<&str>) -> String {
        let old = old_price.map_or(String::new(), |p| {
            format!(
                r#"<span class="product-price nowrap product-card-prices__old"><span class="product-price__sum-rubles">{p}</span></span>"#
            )
        });
        format!(
            r#"<div data-sku="{sku}">
                 <div class="product-card__top"><a title="Молоко 3,2%" href="/products/moloko-{sku}">Молоко</a></div>
                 <span class="product-price nowrap product-card-prices__actual"><span class="product-price__sum-rubles">{price}</span></span>
                 {old}
               </div>"#
        )
    }

    async fn first_card(html: &str, site: impl FnOnce(FixtureSite) -> FixtureSite) -> FixtureElement {
        let doc = format!(r#"<html><body><div id="products-inner">{html}</div></body></html>"#);
        let mut engine = FixtureEngine::new(site(FixtureSite::new([doc])));
        let page = engine.open(&LaunchOptions::default()).await.unwrap();
        page.locate_all(&Locator::css("#products-inner > div"))
            .await
            .unwrap()
            .into_iter()
            .next()
            .unwrap()
    }

    fn extractor(selectors: &SiteSelectors) -> FieldExtractor<'_> {
        FieldExtractor::new(SITE, selectors, Duration::from_secs(30), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn extracts_all_fields_with_old_price() {
        let selectors = SiteSelectors::default();
        let card = first_card(&card_html("101", "1\u{a0}299", Some("1\u{a0}599")), |s| s).await;
        let product = extractor(&selectors).extract(&card).await.unwrap();
        assert_eq!(
            product,
            Product {
                id: "101".to_string(),
                price: "1299".to_string(),
                name: "Молоко 3,2%".to_string(),
                link: "https://online.metro-cc.ru/products/moloko-101".to_string(),
                old_price: Some("1599".to_string()),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn missing_old_price_is_null() {
        let selectors = SiteSelectors::default();
        let card = first_card(&card_html("7", "89", None), |s| s).await;
        let product = extractor(&selectors).extract(&card).await.unwrap();
        assert_eq!(product.old_price, None);
        assert_eq!(product.price, "89");
    }

    #[tokio::test(start_paused = true)]
    async fn missing_old_price_warns_once() {
        let logs = CapturedLogs::install();
        let selectors = SiteSelectors::default();
        let card = first_card(&card_html("7", "89", None), |s| s).await;
        extractor(&selectors).extract(&card).await.unwrap();
        assert_eq!(logs.warnings(), 1);
        assert_eq!(logs.warnings_containing("card has no old price"), 1);
    }

    #[tokio::test]
    async fn old_price_engine_failure_aborts() {
        let selectors = SiteSelectors::default();
        let card = first_card(&card_html("7", "89", Some("99")), |s| {
            s.with_read_failure(
                ".product-card-prices__old .product-price__sum-rubles",
                InteractionError::Engine {
                    what: "inner text".to_string(),
                    message: "node detached".to_string(),
                },
            )
        })
        .await;
        let err = extractor(&selectors).extract(&card).await.unwrap_err();
        assert!(
            matches!(
                err,
                ScraperError::Interaction {
                    step: Step::ExtractField("old_price"),
                    source: InteractionError::Engine { .. }
                }
            ),
            "got: {err:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_old_price_is_null_within_bound() {
        let selectors = SiteSelectors::default();
        let card = first_card(&card_html("7", "89", Some("99")), |s| {
            s.with_render_delay(".product-card-prices__old", Duration::from_millis(1500))
        })
        .await;
        let started = tokio::time::Instant::now();
        let product = extractor(&selectors).extract(&card).await.unwrap();
        assert_eq!(product.old_price, None);
        assert!(started.elapsed() <= Duration::from_millis(1100), "{:?}", started.elapsed());
    }

    #[tokio::test(start_paused = true)]
    async fn fast_old_price_within_bound_is_kept() {
        let selectors = SiteSelectors::default();
        let card = first_card(&card_html("7", "89", Some("99")), |s| {
            s.with_render_delay(".product-card-prices__old", Duration::from_millis(400))
        })
        .await;
        let product = extractor(&selectors).extract(&card).await.unwrap();
        assert_eq!(product.old_price.as_deref(), Some("99"));
    }

    #[tokio::test]
    async fn missing_sku_aborts() {
        let selectors = SiteSelectors::default();
        let html = card_html("1", "10", None).replacen(r#"data-sku="1""#, "", 1);
        let card = first_card(&html, |s| s).await;
        let err = extractor(&selectors).extract(&card).await.unwrap_err();
        assert_eq!(err.step(), Some(Step::ExtractField("id")));
    }

    #[tokio::test]
    async fn missing_href_aborts() {
        let selectors = SiteSelectors::default();
        let html = card_html("1", "10", Some("12")).replace(r#" href="/products/moloko-1""#, "");
        let card = first_card(&html, |s| s).await;
        let err = extractor(&selectors).extract(&card).await.unwrap_err();
        assert_eq!(err.step(), Some(Step::ExtractField("link")));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_price_aborts_after_required_timeout() {
        let selectors = SiteSelectors::default();
        let html = r#"<div data-sku="5"><div class="product-card__top"><a title="x" href="/x"></a></div></div>"#;
        let card = first_card(html, |s| s).await;
        let err = extractor(&selectors).extract(&card).await.unwrap_err();
        assert!(
            matches!(
                err,
                ScraperError::Interaction {
                    step: Step::ExtractField("price"),
                    source: InteractionError::Timeout { .. }
                }
            ),
            "got: {err:?}"
        );
    }

    #[tokio::test]
    async fn link_is_verbatim_concatenation() {
        let selectors = SiteSelectors::default();
        let html = card_html("9", "1", None).replace("/products/moloko-9", "//weird path?q=1");
        let card = first_card(&html, |s| s).await;
        let extractor = FieldExtractor::new(
            "https://shop.test/",
            &selectors,
            Duration::from_secs(30),
            Duration::from_millis(10),
        );
        let product = extractor.extract(&card).await.unwrap();
        assert_eq!(product.link, "https://shop.test///weird path?q=1");
    }
}
