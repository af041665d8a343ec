//! Data models for scraped articles.
//!
//! - [`ArticleDraft`]: mutable record built while one scrape attempt runs
//! - [`Article`]: final, immutable record with its scrape timestamp
//! - [`ProcessedArticle`]: an article plus title features for storage
//! - [`ScrapeBatch`]: one run's worth of processed articles, as written to JSON

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An article as assembled from the listing page, before kicker recovery.
///
/// The title is trimmed and guaranteed non-empty by [`ArticleDraft::new`].
/// Only the kicker is expected to change after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDraft {
    title: String,
    pub link: String,
    pub kicker: String,
    pub image: String,
}

impl ArticleDraft {
    /// Returns `None` when the title is empty after trimming.
    pub fn new(title: &str, link: &str) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        Some(Self {
            title: title.to_string(),
            link: link.trim().to_string(),
            kicker: String::new(),
            image: String::new(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Kicker recovery applies only to drafts with no kicker and a link to follow.
    pub fn needs_kicker(&self) -> bool {
        self.kicker.is_empty() && !self.link.is_empty()
    }
}

/// A finished article record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    title: String,
    kicker: String,
    link: String,
    image: String,
    #[serde(rename = "scrape_date")]
    scraped_at: DateTime<Utc>,
}

impl Article {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kicker(&self) -> &str {
        &self.kicker
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn scraped_at(&self) -> DateTime<Utc> {
        self.scraped_at
    }
}

impl From<ArticleDraft> for Article {
    fn from(draft: ArticleDraft) -> Self {
        Self {
            title: draft.title,
            kicker: draft.kicker,
            link: draft.link,
            image: draft.image,
            scraped_at: Utc::now(),
        }
    }
}

/// An article with the title features computed for storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedArticle {
    #[serde(flatten)]
    pub article: Article,
    pub title_word_count: usize,
    pub title_char_count: usize,
    pub capital_words: Vec<String>,
}

/// All processed articles of one run.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScrapeBatch {
    /// The date of the run in `YYYY-MM-DD` format.
    pub local_date: String,
    /// The local time of the run.
    pub local_time: String,
    /// The listing page the articles came from.
    pub listing_url: String,
    pub articles: Vec<ProcessedArticle>,
}
