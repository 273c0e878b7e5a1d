//! The scrape command: config layering, engine choice and the run summary.

use std::path::PathBuf;

use metro_core::ScrapeConfig;
use metro_scraper::{ChromiumEngine, FixtureEngine, FixtureSite, Pipeline, RunReport, SiteSelectors};

use crate::Cli;

/// Env-var spellings of the flags that were given on the command line.
pub(crate) fn flag_overrides(cli: &Cli) -> Vec<(&'static str, String)> {
    let mut overrides = Vec::new();
    if let Some(category) = &cli.category {
        overrides.push(("METRO_CATEGORY_NAME", category.clone()));
    }
    if let Some(count) = cli.show_more {
        overrides.push(("METRO_SHOW_MORE_COUNT", count.to_string()));
    }
    if cli.headed {
        overrides.push(("METRO_HEADLESS", "false".to_string()));
    }
    if let Some(output) = &cli.output {
        overrides.push(("METRO_OUTPUT_PATH", output.display().to_string()));
    }
    if let Some(site) = &cli.site {
        overrides.push(("METRO_SITE_URL", site.clone()));
    }
    overrides
}

/// Builds the scrape config from `.env` and the environment with
/// command-line flags taking precedence.
///
/// # Errors
///
/// Returns an error if a required value is missing from both the flags and
/// the environment, or a value cannot be parsed.
pub(crate) fn load_config(cli: &Cli) -> anyhow::Result<ScrapeConfig> {
    Ok(metro_core::load_scrape_config(&flag_overrides(cli))?)
}

/// Same layering as [`load_config`] over an arbitrary env lookup.
#[cfg(test)]
pub(crate) fn config_from<F>(cli: &Cli, env: F) -> anyhow::Result<ScrapeConfig>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let overrides = flag_overrides(cli);
    Ok(metro_core::build_scrape_config(metro_core::with_overrides(
        &overrides, env,
    ))?)
}

/// Reads fixture stage files in the order given.
///
/// # Errors
///
/// Returns an error naming the first file that cannot be read.
pub(crate) fn read_fixture_stages(paths: &[PathBuf]) -> anyhow::Result<Vec<String>> {
    paths
        .iter()
        .map(|path| {
            std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("failed to read fixture {}: {e}", path.display()))
        })
        .collect()
}

/// Runs one scrape, against Chromium or the given fixture files, and prints
/// a one-line summary.
///
/// # Errors
///
/// Returns an error if fixture files cannot be read or the pipeline aborts.
pub(crate) async fn run_scrape(config: ScrapeConfig, fixtures: &[PathBuf]) -> anyhow::Result<()> {
    let mut pipeline = Pipeline::new(config, SiteSelectors::default());

    let report = if fixtures.is_empty() {
        pipeline.run(ChromiumEngine::new()).await?
    } else {
        tracing::info!(stages = fixtures.len(), "replaying fixture pages");
        let stages = read_fixture_stages(fixtures)?;
        pipeline.run(FixtureEngine::new(FixtureSite::new(stages))).await?
    };

    println!("{}", summary(&report));
    Ok(())
}

pub(crate) fn summary(report: &RunReport) -> String {
    format!(
        "saved {} products ({} discounted) to {} after {} load-more clicks",
        report.products,
        report.discounted,
        report.output_path.display(),
        report.pagination.clicks,
    )
}
