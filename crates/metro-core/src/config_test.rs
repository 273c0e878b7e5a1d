use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("METRO_CATEGORY_NAME", "Молочные продукты");
    m
}

#[test]
fn build_scrape_config_fails_without_category_name() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_scrape_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "METRO_CATEGORY_NAME"),
        "expected MissingEnvVar(METRO_CATEGORY_NAME), got: {result:?}"
    );
}

#[test]
fn build_scrape_config_rejects_blank_category_name() {
    let mut map = full_env();
    map.insert("METRO_CATEGORY_NAME", "   ");
    let result = build_scrape_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "METRO_CATEGORY_NAME"),
        "expected InvalidEnvVar(METRO_CATEGORY_NAME), got: {result:?}"
    );
}

#[test]
fn build_scrape_config_succeeds_with_defaults() {
    let map = full_env();
    let result = build_scrape_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.site_url, DEFAULT_SITE_URL);
    assert_eq!(cfg.category_name, "Молочные продукты");
    assert_eq!(cfg.show_more_count, 5);
    assert!(cfg.headless);
    assert_eq!(cfg.output_path, PathBuf::from("goods.json"));
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.navigation_timeout, Duration::from_secs(60));
    assert_eq!(cfg.optional_field_timeout, Duration::from_millis(1000));
    assert_eq!(cfg.interaction_timeout, Duration::from_secs(30));
    assert_eq!(cfg.load_more_timeout, Duration::from_millis(5000));
    assert_eq!(cfg.pagination_settle, Duration::from_millis(5000));
    assert!(cfg.chrome_executable.is_none());
}

#[test]
fn defaults_match_programmatic_constructor() {
    let map = full_env();
    let cfg = build_scrape_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg, ScrapeConfig::new(DEFAULT_SITE_URL, "Молочные продукты"));
}

#[test]
fn site_url_override() {
    let mut map = full_env();
    map.insert("METRO_SITE_URL", "http://127.0.0.1:8080");
    let cfg = build_scrape_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.site_url, "http://127.0.0.1:8080");
}

#[test]
fn site_url_rejects_empty() {
    let mut map = full_env();
    map.insert("METRO_SITE_URL", "");
    let result = build_scrape_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "METRO_SITE_URL"),
        "expected InvalidEnvVar(METRO_SITE_URL), got: {result:?}"
    );
}

#[test]
fn show_more_count_override() {
    let mut map = full_env();
    map.insert("METRO_SHOW_MORE_COUNT", "12");
    let cfg = build_scrape_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.show_more_count, 12);
}

#[test]
fn show_more_count_invalid() {
    let mut map = full_env();
    map.insert("METRO_SHOW_MORE_COUNT", "-1");
    let result = build_scrape_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "METRO_SHOW_MORE_COUNT"),
        "expected InvalidEnvVar(METRO_SHOW_MORE_COUNT), got: {result:?}"
    );
}

#[test]
fn headless_accepts_false_spellings() {
    for raw in ["false", "0", "no", "OFF"] {
        let mut map = full_env();
        map.insert("METRO_HEADLESS", raw);
        let cfg = build_scrape_config(lookup_from_map(&map)).unwrap();
        assert!(!cfg.headless, "{raw} should disable headless mode");
    }
}

#[test]
fn headless_invalid() {
    let mut map = full_env();
    map.insert("METRO_HEADLESS", "maybe");
    let result = build_scrape_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "METRO_HEADLESS"),
        "expected InvalidEnvVar(METRO_HEADLESS), got: {result:?}"
    );
}

#[test]
fn optional_field_timeout_override() {
    let mut map = full_env();
    map.insert("METRO_OPTIONAL_FIELD_TIMEOUT_MS", "250");
    let cfg = build_scrape_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.optional_field_timeout, Duration::from_millis(250));
}

#[test]
fn navigation_timeout_invalid() {
    let mut map = full_env();
    map.insert("METRO_NAVIGATION_TIMEOUT_SECS", "soon");
    let result = build_scrape_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "METRO_NAVIGATION_TIMEOUT_SECS"),
        "expected InvalidEnvVar(METRO_NAVIGATION_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn chrome_executable_blank_is_ignored() {
    let mut map = full_env();
    map.insert("METRO_CHROME_EXECUTABLE", " ");
    let cfg = build_scrape_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.chrome_executable.is_none());

    map.insert("METRO_CHROME_EXECUTABLE", "/usr/bin/chromium");
    let cfg = build_scrape_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.chrome_executable,
        Some(PathBuf::from("/usr/bin/chromium"))
    );
}

#[test]
fn debug_output_reports_timeouts_in_units() {
    let cfg = build_scrape_config(lookup_from_map(&full_env())).unwrap();
    let debug = format!("{cfg:?}");
    assert!(debug.contains("navigation_timeout_secs: 60"), "{debug}");
    assert!(debug.contains("optional_field_timeout_ms: 1000"), "{debug}");
}

#[test]
fn parse_bool_rejects_unknown() {
    assert_eq!(parse_bool("TRUE"), Some(true));
    assert_eq!(parse_bool(" yes "), Some(true));
    assert_eq!(parse_bool(""), None);
}

#[test]
fn overrides_take_precedence_over_lookup() {
    let mut map = full_env();
    map.insert("METRO_HEADLESS", "maybe");
    map.insert("METRO_SHOW_MORE_COUNT", "7");
    let overrides = vec![
        ("METRO_HEADLESS", "false".to_string()),
        ("METRO_CATEGORY_NAME", "Овощи".to_string()),
    ];
    let cfg = build_scrape_config(with_overrides(&overrides, lookup_from_map(&map))).unwrap();
    assert!(!cfg.headless);
    assert_eq!(cfg.category_name, "Овощи");
    assert_eq!(cfg.show_more_count, 7);
}

#[test]
fn blank_override_is_still_validated() {
    let map = full_env();
    let overrides = vec![("METRO_CATEGORY_NAME", "  ".to_string())];
    let result = build_scrape_config(with_overrides(&overrides, lookup_from_map(&map)));
    assert!(result.is_err(), "expected blank category to be rejected, got: {result:?}");
}
