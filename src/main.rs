//! # Yogonet Kicker Scraper
//!
//! Scrapes article records (title, kicker, link, image) from a
//! JavaScript-rendered news listing using a headless Chromium session, then
//! writes them to JSON and CSV with a few title features attached.
//!
//! ## Usage
//!
//! ```sh
//! yogonet_kicker_scraper -o ./output
//! ```
//!
//! ## Architecture
//!
//! 1. **Listing**: open the listing page and turn every item into a draft,
//!    resolving kickers from the item markup
//! 2. **Recovery**: for drafts still missing a kicker, visit the article page
//!    and try the page-level kicker selectors
//! 3. **Retry**: the whole attempt runs in a fresh browser session and is
//!    retried a bounded number of times on errors or empty results
//! 4. **Output**: compute title features, write JSON and CSV files, and
//!    append to BigQuery when `GCP_PROJECT_ID`/`BQ_DATASET_ID`/`BQ_TABLE_ID`
//!    are set

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod browser;
mod cli;
mod config;
mod error;
mod extract;
mod models;
mod orchestrator;
mod outputs;
mod processing;
#[cfg(test)]
mod testing;
mod utils;

use browser::chrome::ChromeLauncher;
use cli::Cli;
use models::ScrapeBatch;
use orchestrator::Scraper;
use outputs::bigquery::{self, BigQueryTarget};
use outputs::csv::write_csv;
use outputs::json::write_batch;
use processing::process_articles;
use utils::{ensure_writable_dir, file_stamp, truncate_for_log};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("Starting news scraping");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // Fail before launching a browser if results could not be saved.
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let mut config = config::load_config(args.config.as_deref()).await?;
    args.apply(&mut config);
    config.validate()?;
    let warehouse = BigQueryTarget::from_env()?;
    if warehouse.is_none() {
        info!("BigQuery upload disabled (GCP_PROJECT_ID/BQ_DATASET_ID/BQ_TABLE_ID unset)");
    }

    // ---- Scrape ----
    let launcher = ChromeLauncher::new(config.browser.clone(), &config.timeouts);
    let scraper = Scraper::new(launcher, &config)?;
    let articles = match scraper.scrape().await {
        Ok(articles) => articles,
        Err(e) => {
            error!(error = %e, "Scraping failed");
            return Err(e.into());
        }
    };

    let Some(processed) = process_articles(&articles) else {
        error!("No articles were scraped");
        return Err("no articles were scraped".into());
    };
    info!(count = processed.len(), "Successfully scraped articles");

    // ---- Output ----
    let now = Local::now();
    let stamp = file_stamp(now);

    for p in processed.iter().take(5) {
        info!(
            title = %truncate_for_log(p.article.title(), 60),
            kicker = %p.article.kicker(),
            words = p.title_word_count,
            chars = p.title_char_count,
            "Sample article"
        );
    }
    if let Some(first) = processed.first() {
        info!(capital_words = ?first.capital_words, "Capital words in first article");
    }

    write_csv(&processed, Path::new(&args.output_dir), &stamp)?;

    let batch = ScrapeBatch {
        local_date: now.date_naive().to_string(),
        local_time: now.time().to_string(),
        listing_url: config.listing_url.clone(),
        articles: processed,
    };
    write_batch(&batch, &args.output_dir, &stamp).await?;

    if let Some(target) = &warehouse {
        if let Err(e) = bigquery::upload(target, &batch.articles).await {
            error!(error = %e, "Failed to upload data to BigQuery");
            return Err(e.into());
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        articles = batch.articles.len(),
        "Execution complete"
    );

    Ok(())
}
