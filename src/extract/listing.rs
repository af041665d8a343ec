//! Listing page extraction.
//!
//! Walks every listing item in document order and turns each one into an
//! [`ArticleDraft`]. Title and link are mandatory and come from one fixed
//! nested lookup; the kicker goes through the container-scoped strategy list;
//! the image is best-effort. Items that cannot produce a title are skipped
//! with a logged reason and never stop the walk.

use super::field::{extract_field, first_match};
use crate::browser::{Element, Locator, Scope};
use crate::config::SelectorConfig;
use crate::error::BrowserError;
use crate::models::ArticleDraft;
use crate::utils::truncate_for_log;
use std::fmt;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Result of extracting one listing item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Found(ArticleDraft),
    Skipped(SkipReason),
}

/// Why a listing item produced no draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The title link path did not resolve.
    MissingTitleLink,
    /// The title link resolved but its text was blank.
    EmptyTitle,
    /// A lookup on the item failed for a reason other than absence.
    Fault(BrowserError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingTitleLink => write!(f, "no title link"),
            SkipReason::EmptyTitle => write!(f, "empty title"),
            SkipReason::Fault(e) => write!(f, "{e}"),
        }
    }
}

/// Extract drafts from every listing item on `page`.
///
/// Only enumerating the items can fail; per-item problems are logged and
/// skipped.
#[instrument(level = "info", skip_all, fields(listing_url = %base_url))]
pub async fn extract_listing<S: Scope>(
    page: &S,
    selectors: &SelectorConfig,
    base_url: &Url,
) -> Result<Vec<ArticleDraft>, BrowserError> {
    let items = page.find_all(&selectors.listing_item).await?;
    info!(count = items.len(), "Found news items");

    let mut drafts = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match extract_item(item, selectors, base_url).await {
            ItemOutcome::Found(draft) => {
                debug!(
                    index,
                    title = %truncate_for_log(draft.title(), 50),
                    kicker = %draft.kicker,
                    "Extracted listing item"
                );
                drafts.push(draft);
            }
            ItemOutcome::Skipped(SkipReason::Fault(e)) => {
                warn!(index, error = %e, "Error extracting listing item; skipping");
            }
            ItemOutcome::Skipped(reason) => {
                debug!(index, %reason, "Skipping listing item");
            }
        }
    }

    info!(drafts = drafts.len(), skipped = items.len() - drafts.len(), "Listing extracted");
    Ok(drafts)
}

/// Extract one listing item.
pub async fn extract_item<E: Element>(
    item: &E,
    selectors: &SelectorConfig,
    base_url: &Url,
) -> ItemOutcome {
    let (title, href) = match title_link(item, &selectors.title_link_path).await {
        Ok(found) => found,
        Err(e) if e.is_not_found() => return ItemOutcome::Skipped(SkipReason::MissingTitleLink),
        Err(e) => return ItemOutcome::Skipped(SkipReason::Fault(e)),
    };

    let link = href
        .filter(|href| !href.trim().is_empty())
        .map(|href| absolutize(base_url, &href))
        .unwrap_or_default();
    let Some(mut draft) = ArticleDraft::new(&title, &link) else {
        return ItemOutcome::Skipped(SkipReason::EmptyTitle);
    };

    if let Some(kicker) = first_match(item, &selectors.container_kicker).await {
        draft.kicker = kicker;
    }
    draft.image = extract_field(item, &selectors.image, "").await;

    ItemOutcome::Found(draft)
}

/// Follow `path` from `item` and read the anchor's text and `href`.
async fn title_link<E: Element>(
    item: &E,
    path: &[Locator],
) -> Result<(String, Option<String>), BrowserError> {
    let Some((first, rest)) = path.split_first() else {
        return Err(BrowserError::NotFound {
            locator: "<empty title path>".to_string(),
        });
    };

    let mut anchor = item.find(first).await?;
    for locator in rest {
        anchor = anchor.find(locator).await?;
    }

    let title = anchor.text().await?;
    let href = anchor.attribute("href").await?;
    Ok((title, href))
}

/// Resolve `href` against the listing URL; unparsable values are kept as-is.
fn absolutize(base: &Url, href: &str) -> String {
    let href = href.trim();
    match base.join(href) {
        Ok(url) => url.to_string(),
        Err(_) => href.to_string(),
    }
}
