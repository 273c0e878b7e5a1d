use std::env::VarError;
use std::path::PathBuf;
use std::time::Duration;

use crate::app_config::{ScrapeConfig, DEFAULT_SITE_URL};
use crate::ConfigError;

/// Load scrape configuration from `.env` and the process environment, with
/// `overrides` (env-var name, value) taking precedence.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_scrape_config(overrides: &[(&str, String)]) -> Result<ScrapeConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_scrape_config(with_overrides(overrides, |key| std::env::var(key)))
}

/// Layers `overrides` over a `fallback` env-var lookup. The first override
/// with a matching name wins.
pub fn with_overrides<'a, F>(
    overrides: &'a [(&'a str, String)],
    fallback: F,
) -> impl Fn(&str) -> Result<String, VarError> + 'a
where
    F: Fn(&str) -> Result<String, VarError> + 'a,
{
    move |key| {
        overrides
            .iter()
            .find(|(var, _)| *var == key)
            .map_or_else(|| fallback(key), |(_, value)| Ok(value.clone()))
    }
}

/// Build scrape configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup, and so callers can layer overrides on top of it.
///
/// # Errors
///
/// Returns `ConfigError` if required vars are missing or values are invalid.
pub fn build_scrape_config<F>(lookup: F) -> Result<ScrapeConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let site_url = or_default("METRO_SITE_URL", DEFAULT_SITE_URL);
    if site_url.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "METRO_SITE_URL".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    let category_name = lookup("METRO_CATEGORY_NAME")
        .map_err(|_| ConfigError::MissingEnvVar("METRO_CATEGORY_NAME".to_string()))?;
    if category_name.trim().is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "METRO_CATEGORY_NAME".to_string(),
            reason: "must not be blank".to_string(),
        });
    }

    let show_more_count = parse_u32("METRO_SHOW_MORE_COUNT", "5")?;
    let headless = parse_bool(&or_default("METRO_HEADLESS", "true")).ok_or_else(|| {
        ConfigError::InvalidEnvVar {
            var: "METRO_HEADLESS".to_string(),
            reason: "expected one of true/false/1/0/yes/no".to_string(),
        }
    })?;
    let output_path = PathBuf::from(or_default("METRO_OUTPUT_PATH", "goods.json"));
    let log_level = or_default("METRO_LOG_LEVEL", "info");

    let navigation_timeout =
        Duration::from_secs(parse_u64("METRO_NAVIGATION_TIMEOUT_SECS", "60")?);
    let optional_field_timeout =
        Duration::from_millis(parse_u64("METRO_OPTIONAL_FIELD_TIMEOUT_MS", "1000")?);
    let interaction_timeout =
        Duration::from_secs(parse_u64("METRO_INTERACTION_TIMEOUT_SECS", "30")?);
    let load_more_timeout = Duration::from_millis(parse_u64("METRO_LOAD_MORE_TIMEOUT_MS", "5000")?);
    let pagination_settle = Duration::from_millis(parse_u64("METRO_PAGINATION_SETTLE_MS", "5000")?);
    let chrome_executable = lookup("METRO_CHROME_EXECUTABLE")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from);

    Ok(ScrapeConfig {
        site_url,
        category_name,
        show_more_count,
        headless,
        output_path,
        log_level,
        navigation_timeout,
        optional_field_timeout,
        interaction_timeout,
        load_more_timeout,
        pagination_settle,
        chrome_executable,
    })
}

/// Parses the boolean spellings accepted for flag-like env vars.
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
