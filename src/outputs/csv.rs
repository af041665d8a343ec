//! Flat CSV output of a scrape run, one row per article.

use crate::models::ProcessedArticle;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

const HEADERS: [&str; 8] = [
    "title",
    "kicker",
    "link",
    "image",
    "scrape_date",
    "title_word_count",
    "title_char_count",
    "capital_words",
];

/// Write `articles` to `{output_dir}/news_scraper_results_{stamp}.csv`.
///
/// `capital_words` is stored as a JSON array string.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub fn write_csv(
    articles: &[ProcessedArticle],
    output_dir: &Path,
    stamp: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("news_scraper_results_{stamp}.csv"));

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(HEADERS)?;
    for p in articles {
        writer.write_record([
            p.article.title().to_string(),
            p.article.kicker().to_string(),
            p.article.link().to_string(),
            p.article.image().to_string(),
            p.article.scraped_at().to_rfc3339(),
            p.title_word_count.to_string(),
            p.title_char_count.to_string(),
            serde_json::to_string(&p.capital_words)?,
        ])?;
    }
    writer.flush()?;

    let size = std::fs::metadata(&path)?.len();
    info!(path = %path.display(), rows = articles.len(), bytes = size, "Wrote CSV results");
    Ok(path)
}
