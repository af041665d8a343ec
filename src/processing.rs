//! Title features computed before storage.

use crate::models::{Article, ProcessedArticle};
use tracing::{error, info, instrument};

/// Attach title features to every article.
///
/// Returns `None` for an empty batch, since there is nothing worth storing.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub fn process_articles(articles: &[Article]) -> Option<Vec<ProcessedArticle>> {
    if articles.is_empty() {
        error!("No articles to process");
        return None;
    }

    let processed: Vec<ProcessedArticle> = articles.iter().cloned().map(process).collect();
    info!(count = processed.len(), "Computed title features");
    Some(processed)
}

fn process(article: Article) -> ProcessedArticle {
    let title = article.title();
    ProcessedArticle {
        title_word_count: title.split_whitespace().count(),
        title_char_count: title.chars().count(),
        capital_words: capital_words(title),
        article,
    }
}

/// Words of `title` starting with an uppercase letter, in order.
pub fn capital_words(title: &str) -> Vec<String> {
    title
        .split_whitespace()
        .filter(|w| w.chars().next().is_some_and(char::is_uppercase))
        .map(String::from)
        .collect()
}
