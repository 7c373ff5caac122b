mod archiver;
mod browser;
mod config;
mod error;
mod fetcher;
mod locator;
mod models;
mod parser;
mod price;
mod probe;
mod promotion;
mod runner;
mod site;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::browser::chrome::ChromeBrowser;

#[derive(Debug, Parser)]
#[command(name = "grocery_price_archiver")]
#[command(about = "Daily price archive for a fixed grocery basket")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape the basket and write today's price file
    Run {
        /// Date the artifact is filed under (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Run Chrome without a window
        #[arg(long)]
        headless: bool,
        /// Parallel browser sessions; 1 keeps the run sequential
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Check over plain HTTP whether a search page is server-rendered
    Probe {
        url: String,
        #[arg(long, default_value = "yumurta")]
        keyword: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Run {
            date,
            output_dir,
            headless,
            workers,
        }) => run_daily(date, output_dir, headless, workers),
        Some(Commands::Probe { url, keyword }) => run_probe(&url, &keyword),
        None => run_daily(None, None, false, None),
    }
}

fn run_daily(
    date: Option<NaiveDate>,
    output_dir: Option<PathBuf>,
    headless: bool,
    workers: Option<usize>,
) -> Result<()> {
    let mut config = config::load_config().context("invalid configuration")?;
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if headless {
        config.headless = true;
    }
    if let Some(workers) = workers {
        config.workers = workers.max(1);
    }
    let run_date = date.unwrap_or_else(|| Local::now().date_naive());
    let chrome = config.chrome_options();

    info!(
        "--- Starting daily {} scrape ({} mode): {run_date} ---",
        config.source_name,
        if config.headless { "headless" } else { "visible" }
    );

    let report = runner::run(&config, run_date, || ChromeBrowser::launch(&chrome))
        .context("failed to write run artifact")?;

    for failure in &report.failures {
        warn!(query = %failure.query, "item failed: {}", failure.error);
    }
    for fatal in &report.fatal {
        error!("{fatal}");
    }
    let priced = report.record.items().iter().filter(|i| i.has_price()).count();
    info!(
        captured = report.record.items().len(),
        priced,
        missed = report.misses.len(),
        complete = report.is_complete(),
        "summary"
    );
    println!("Saved to {}", report.artifact.display());
    Ok(())
}

fn run_probe(url: &str, keyword: &str) -> Result<()> {
    let config = config::load_config().context("invalid configuration")?;
    let report = probe::probe(url, keyword, &config.user_agent)
        .with_context(|| format!("probe of {url} failed"))?;

    println!("Status: {}", report.status);
    println!("Length: {}", report.length);
    println!("Title in HTML: {}", report.has_title);
    println!("Keyword '{keyword}' found: {}", report.keyword_found);
    println!("Currency symbol found: {}", report.currency_found);
    if report.likely_client_rendered() {
        println!("Keyword missing from a 200 response: likely client-side rendering or blocking.");
    }
    Ok(())
}
