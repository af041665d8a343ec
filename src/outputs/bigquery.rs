//! Optional BigQuery upload.
//!
//! Enabled when `GCP_PROJECT_ID`, `BQ_DATASET_ID` and `BQ_TABLE_ID` are all
//! set. Credentials come from the service-account key named by
//! `GOOGLE_APPLICATION_CREDENTIALS`. Rows are appended with streaming inserts.

use crate::error::{ConfigError, UploadError};
use crate::models::ProcessedArticle;
use gcp_bigquery_client::Client;
use gcp_bigquery_client::model::table_data_insert_all_request::TableDataInsertAllRequest;
use serde::Serialize;
use tracing::{error, info, instrument};

const TABLE_VARS: [&str; 3] = ["GCP_PROJECT_ID", "BQ_DATASET_ID", "BQ_TABLE_ID"];
const CREDENTIALS_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Destination table and credentials for an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigQueryTarget {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
    pub key_file: String,
}

impl BigQueryTarget {
    /// Read the target from the process environment.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// `Ok(None)` when no table variable is set; an error when only some are,
    /// or when the credentials path is missing.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        let values: Vec<Option<String>> = TABLE_VARS
            .iter()
            .map(|name| get(name).filter(|v| !v.trim().is_empty()))
            .collect();

        if values.iter().all(Option::is_none) {
            return Ok(None);
        }
        let missing: Vec<&str> = TABLE_VARS
            .iter()
            .zip(&values)
            .filter(|(_, v)| v.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "BigQuery upload needs {}",
                missing.join(", ")
            )));
        }
        let Some(key_file) = get(CREDENTIALS_VAR).filter(|v| !v.trim().is_empty()) else {
            return Err(ConfigError::Invalid(format!(
                "BigQuery upload needs {CREDENTIALS_VAR}"
            )));
        };

        let mut values = values.into_iter().flatten();
        Ok(Some(Self {
            project_id: values.next().unwrap_or_default(),
            dataset_id: values.next().unwrap_or_default(),
            table_id: values.next().unwrap_or_default(),
            key_file,
        }))
    }

    fn table_ref(&self) -> String {
        format!("{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

/// One table row.
#[derive(Debug, Serialize)]
struct Row<'a> {
    title: &'a str,
    kicker: &'a str,
    link: &'a str,
    image: &'a str,
    scrape_date: String,
    title_word_count: usize,
    title_char_count: usize,
    capital_words: &'a [String],
}

impl<'a> From<&'a ProcessedArticle> for Row<'a> {
    fn from(p: &'a ProcessedArticle) -> Self {
        Self {
            title: p.article.title(),
            kicker: p.article.kicker(),
            link: p.article.link(),
            image: p.article.image(),
            scrape_date: p.article.scraped_at().to_rfc3339(),
            title_word_count: p.title_word_count,
            title_char_count: p.title_char_count,
            capital_words: &p.capital_words,
        }
    }
}

/// Append `articles` to the target table.
///
/// # Returns
///
/// The number of rows uploaded.
#[instrument(level = "info", skip_all, fields(table = %target.table_ref()))]
pub async fn upload(
    target: &BigQueryTarget,
    articles: &[ProcessedArticle],
) -> Result<usize, UploadError> {
    let client = Client::from_service_account_key_file(&target.key_file).await?;

    let mut request = TableDataInsertAllRequest::new();
    for article in articles {
        request.add_row(None, Row::from(article))?;
    }

    let response = client
        .tabledata()
        .insert_all(
            &target.project_id,
            &target.dataset_id,
            &target.table_id,
            request,
        )
        .await?;

    let rejected = response.insert_errors.map_or(0, |errors| errors.len());
    if rejected > 0 {
        error!(rejected, rows = articles.len(), "BigQuery rejected rows");
        return Err(UploadError::RowsRejected {
            rejected,
            rows: articles.len(),
        });
    }

    info!(rows = articles.len(), "Uploaded rows to BigQuery");
    Ok(articles.len())
}
