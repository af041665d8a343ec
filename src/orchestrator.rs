//! Scrape orchestration with bounded retry.
//!
//! One call to [`Scraper::scrape`] runs up to `max_attempts` attempts. Every
//! attempt owns a freshly launched browser session and walks the stages in
//! [`Stage`] order; any error fails the attempt. Partial results of a failed
//! attempt are discarded and the next attempt starts over from navigation.
//!
//! # Exhaustion
//!
//! | Last attempt | Result |
//! |--------------|--------|
//! | hard failure (error) | `Err(ScrapeError::Exhausted)` |
//! | soft failure (zero articles) | `Ok(vec![])` |
//!
//! Both kinds of failure wait `retry_delay` before the next attempt.

use crate::browser::{Launcher, Session};
use crate::config::{AppConfig, RetryPolicy, SelectorConfig, Timeouts};
use crate::error::{BrowserError, ScrapeError};
use crate::extract::listing::extract_listing;
use crate::extract::recovery::recover_kicker;
use crate::models::Article;
use crate::utils::truncate_for_log;
use std::fmt;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Progress of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NavigatingListing,
    WaitingReady,
    ExtractingListing,
    RecoveringKickers,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::NavigatingListing => "navigating_listing",
            Stage::WaitingReady => "waiting_ready",
            Stage::ExtractingListing => "extracting_listing",
            Stage::RecoveringKickers => "recovering_kickers",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// How an attempt that did not return articles ended.
#[derive(Debug)]
enum Failure {
    Hard(BrowserError),
    Soft,
}

/// Drives the extraction pipeline against sessions from `L`.
#[derive(Debug)]
pub struct Scraper<L> {
    launcher: L,
    listing_url: Url,
    retry: RetryPolicy,
    timeouts: Timeouts,
    selectors: SelectorConfig,
}

impl<L: Launcher> Scraper<L> {
    /// Build a scraper from a validated configuration.
    pub fn new(launcher: L, config: &AppConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            launcher,
            listing_url: Url::parse(&config.listing_url)?,
            retry: config.retry,
            timeouts: config.timeouts,
            selectors: config.selectors.clone(),
        })
    }

    /// Scrape the listing, retrying whole attempts up to the configured bound.
    #[instrument(level = "info", skip_all, fields(listing_url = %self.listing_url))]
    pub async fn scrape(&self) -> Result<Vec<Article>, ScrapeError> {
        let total_t0 = Instant::now();
        let max = self.retry.max_attempts.max(1);
        let mut last = Failure::Soft;

        for attempt in 1..=max {
            let attempt_t0 = Instant::now();
            match self.attempt(attempt).await {
                Ok(articles) if !articles.is_empty() => {
                    info!(
                        attempt,
                        count = articles.len(),
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        "Scrape succeeded"
                    );
                    return Ok(articles);
                }
                Ok(_) => {
                    warn!(
                        attempt,
                        max,
                        elapsed_ms_attempt = attempt_t0.elapsed().as_millis(),
                        "Attempt yielded no articles"
                    );
                    last = Failure::Soft;
                }
                Err(e) => {
                    error!(
                        attempt,
                        max,
                        elapsed_ms_attempt = attempt_t0.elapsed().as_millis(),
                        error = %e,
                        "Attempt failed"
                    );
                    last = Failure::Hard(e);
                }
            }

            if attempt < max {
                let delay = self.retry.retry_delay();
                info!(?delay, next_attempt = attempt + 1, "Retrying");
                sleep(delay).await;
            }
        }

        match last {
            Failure::Hard(source) => {
                error!(
                    attempts = max,
                    elapsed_ms_total = total_t0.elapsed().as_millis(),
                    error = %source,
                    "All retry attempts failed"
                );
                Err(ScrapeError::Exhausted {
                    attempts: max,
                    source,
                })
            }
            Failure::Soft => {
                warn!(attempts = max, "All attempts yielded no articles");
                Ok(Vec::new())
            }
        }
    }

    /// One attempt with its own session, closed on every exit path.
    #[instrument(level = "info", skip(self))]
    async fn attempt(&self, attempt: u32) -> Result<Vec<Article>, BrowserError> {
        let mut session = self.launcher.launch().await?;
        let result = self.run_stages(&mut session).await;
        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close browser session");
        }
        result
    }

    async fn run_stages(&self, session: &mut L::Session) -> Result<Vec<Article>, BrowserError> {
        let url = self.listing_url.as_str();

        enter(Stage::NavigatingListing);
        info!(url, "Accessing listing page");
        session.goto(url).await.map_err(|e| {
            error!(url, error = %e, "Failed to load listing page");
            e
        })?;

        enter(Stage::WaitingReady);
        session
            .wait_for(&self.selectors.listing_item, self.timeouts.listing_ready())
            .await
            .map_err(|e| {
                error!(url, error = %e, "Timed out waiting for article containers");
                e
            })?;

        enter(Stage::ExtractingListing);
        let drafts = extract_listing(&*session, &self.selectors, &self.listing_url).await?;

        enter(Stage::RecoveringKickers);
        let mut articles = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let draft = recover_kicker(
                &mut *session,
                draft,
                &self.selectors,
                self.timeouts.detail_ready(),
            )
            .await;
            let article = Article::from(draft);
            info!(
                title = %truncate_for_log(article.title(), 50),
                kicker = %truncate_for_log(article.kicker(), 50),
                "Processed article"
            );
            articles.push(article);
        }

        enter(Stage::Done);
        Ok(articles)
    }
}

fn enter(stage: Stage) {
    debug!(%stage, "Entering stage");
}
