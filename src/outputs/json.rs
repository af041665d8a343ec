//! JSON output of a scrape run.
//!
//! Files are grouped by run date:
//! ```text
//! output_dir/
//! └── 2025-05-06/
//!     ├── news_scraper_results_20250506_081500.json
//!     └── news_scraper_results_20250506_201500.json
//! ```

use crate::models::ScrapeBatch;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`ScrapeBatch`] under `{output_dir}/{date}/`.
///
/// # Returns
///
/// The path of the written file.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_batch(
    batch: &ScrapeBatch,
    output_dir: &str,
    stamp: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(batch)?;

    let full_json_dir = PathBuf::from(output_dir).join(&batch.local_date);
    info!(dir = %full_json_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = full_json_dir.join(format!("news_scraper_results_{stamp}.json"));
    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = batch.articles.len(), "Wrote JSON results");

    Ok(path)
}
