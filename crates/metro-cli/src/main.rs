use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod scrape;

#[derive(Debug, Parser)]
#[command(name = "metro-cli")]
#[command(about = "Scrape one Metro category listing into a JSON snapshot")]
struct Cli {
    /// Category menu entry to open; the first entry containing this text wins
    #[arg(long)]
    category: Option<String>,
    /// Maximum number of "load more" clicks
    #[arg(long)]
    show_more: Option<u32>,
    /// Show the browser window instead of running headless
    #[arg(long)]
    headed: bool,
    /// Where to write the JSON snapshot
    #[arg(long)]
    output: Option<PathBuf>,
    /// Site base URL
    #[arg(long)]
    site: Option<String>,
    /// Replay saved HTML stage files instead of launching Chromium
    #[arg(long, num_args = 1..)]
    fixture: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = scrape::load_config(&cli)?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    scrape::run_scrape(config, &cli.fixture).await
}
