//! Kicker recovery from an article's own page.
//!
//! Used for drafts whose listing item carried no kicker. A failed navigation
//! or readiness wait only costs that one draft its kicker; it never fails the
//! batch. The session is left on the last visited article page.

use super::field::first_match;
use crate::browser::Session;
use crate::config::SelectorConfig;
use crate::models::ArticleDraft;
use crate::utils::truncate_for_log;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Try to fill `draft.kicker` from its detail page.
///
/// Drafts that already have a kicker, or have no link, are returned untouched
/// without navigating.
#[instrument(level = "info", skip_all, fields(link = %draft.link))]
pub async fn recover_kicker<S: Session>(
    session: &mut S,
    mut draft: ArticleDraft,
    selectors: &SelectorConfig,
    ready_timeout: Duration,
) -> ArticleDraft {
    if !draft.needs_kicker() {
        return draft;
    }

    let title = truncate_for_log(draft.title(), 50);
    info!(%title, "No kicker found on listing; checking article page");

    if let Err(e) = session.goto(&draft.link).await {
        error!(url = %draft.link, %title, error = %e, "Failed to open article page");
        return draft;
    }
    if let Err(e) = session.wait_for(&selectors.detail_ready, ready_timeout).await {
        error!(
            url = %draft.link,
            marker = %selectors.detail_ready,
            error = %e,
            "Article content did not load"
        );
        return draft;
    }

    match first_match(&*session, &selectors.page_kicker).await {
        Some(kicker) => {
            debug!(%title, %kicker, "Recovered kicker from article page");
            draft.kicker = kicker;
        }
        None => debug!(%title, "Article page has no kicker either"),
    }
    draft
}
