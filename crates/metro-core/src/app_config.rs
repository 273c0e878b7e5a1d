use std::path::PathBuf;
use std::time::Duration;

/// Storefront the scraper targets when `METRO_SITE_URL` is unset.
pub const DEFAULT_SITE_URL: &str = "https://online.metro-cc.ru";

/// Everything one scrape run needs, passed explicitly into the pipeline.
#[derive(Clone, PartialEq, Eq)]
pub struct ScrapeConfig {
    /// Navigation target, also the prefix for every product link.
    pub site_url: String,
    /// Category menu entry to open, matched as a substring of its text.
    pub category_name: String,
    /// Upper bound on "load more" click attempts.
    pub show_more_count: u32,
    pub headless: bool,
    pub output_path: PathBuf,
    pub log_level: String,
    pub navigation_timeout: Duration,
    /// Lookup bound for the old-price element, kept short so absent
    /// elements fail fast.
    pub optional_field_timeout: Duration,
    /// Engine default for every other lookup.
    pub interaction_timeout: Duration,
    pub load_more_timeout: Duration,
    /// How long to wait for new cards after a "load more" click.
    pub pagination_settle: Duration,
    pub chrome_executable: Option<PathBuf>,
}

impl ScrapeConfig {
    /// Builds a config with default timeouts for the given site and category.
    #[must_use]
    pub fn new(site_url: impl Into<String>, category_name: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            category_name: category_name.into(),
            show_more_count: 5,
            headless: true,
            output_path: PathBuf::from("goods.json"),
            log_level: "info".to_string(),
            navigation_timeout: Duration::from_secs(60),
            optional_field_timeout: Duration::from_millis(1000),
            interaction_timeout: Duration::from_secs(30),
            load_more_timeout: Duration::from_millis(5000),
            pagination_settle: Duration::from_millis(5000),
            chrome_executable: None,
        }
    }
}

impl std::fmt::Debug for ScrapeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrapeConfig")
            .field("site_url", &self.site_url)
            .field("category_name", &self.category_name)
            .field("show_more_count", &self.show_more_count)
            .field("headless", &self.headless)
            .field("output_path", &self.output_path)
            .field("log_level", &self.log_level)
            .field("navigation_timeout_secs", &self.navigation_timeout.as_secs())
            .field(
                "optional_field_timeout_ms",
                &self.optional_field_timeout.as_millis(),
            )
            .field(
                "interaction_timeout_secs",
                &self.interaction_timeout.as_secs(),
            )
            .field("load_more_timeout_ms", &self.load_more_timeout.as_millis())
            .field("pagination_settle_ms", &self.pagination_settle.as_millis())
            .field("chrome_executable", &self.chrome_executable)
            .finish()
    }
}
