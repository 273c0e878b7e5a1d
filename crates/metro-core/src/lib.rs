mod app_config;
mod config;
mod products;

pub use app_config::{ScrapeConfig, DEFAULT_SITE_URL};
pub use config::{build_scrape_config, load_scrape_config, parse_bool, with_overrides};
pub use products::{Catalog, Product};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
