//! Runtime configuration loaded from YAML.
//!
//! Every field has a default, so an absent config file or a partial one is
//! valid. The defaults target the Yogonet international listing and the markup
//! variants it has used for kickers.

use crate::browser::{Locator, Lookup};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_LISTING_URL: &str = "https://www.yogonet.com/international/";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.212 Safari/537.36";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listing page to scrape.
    pub listing_url: String,
    pub retry: RetryPolicy,
    pub timeouts: Timeouts,
    pub browser: BrowserSettings,
    pub selectors: SelectorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            retry: RetryPolicy::default(),
            timeouts: Timeouts::default(),
            browser: BrowserSettings::default(),
            selectors: SelectorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listing_url.trim().is_empty() {
            return Err(ConfigError::Invalid("listing_url must not be empty".into()));
        }
        Url::parse(&self.listing_url).map_err(|e| {
            ConfigError::Invalid(format!("listing_url {:?} is not a URL: {e}", self.listing_url))
        })?;
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be greater than 0".into(),
            ));
        }
        if self.timeouts.page_load_secs == 0
            || self.timeouts.listing_ready_secs == 0
            || self.timeouts.detail_ready_secs == 0
        {
            return Err(ConfigError::Invalid("timeouts must be greater than 0".into()));
        }
        if self.selectors.title_link_path.is_empty() {
            return Err(ConfigError::Invalid(
                "selectors.title_link_path must not be empty".into(),
            ));
        }
        if self.selectors.container_kicker.is_empty() || self.selectors.page_kicker.is_empty() {
            return Err(ConfigError::Invalid(
                "kicker strategy lists must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from a YAML file, or defaults when `path` is `None`.
#[instrument(level = "info")]
pub async fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let Some(path) = path else {
        info!("No config file given; using defaults");
        return Ok(AppConfig::default());
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
    let config = AppConfig::from_yaml(&raw)?;
    info!(path, listing_url = %config.listing_url, "Loaded configuration");
    Ok(config)
}

/// Bounded retry of whole scrape attempts with a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
}

impl RetryPolicy {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_secs: 5,
        }
    }
}

/// Navigation and readiness timeouts, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub page_load_secs: u64,
    pub listing_ready_secs: u64,
    pub detail_ready_secs: u64,
}

impl Timeouts {
    pub fn page_load(&self) -> Duration {
        Duration::from_secs(self.page_load_secs)
    }

    pub fn listing_ready(&self) -> Duration {
        Duration::from_secs(self.listing_ready_secs)
    }

    pub fn detail_ready(&self) -> Duration {
        Duration::from_secs(self.detail_ready_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            page_load_secs: 30,
            listing_ready_secs: 20,
            detail_ready_secs: 10,
        }
    }
}

/// How the Chromium process is started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    pub no_sandbox: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: Option<String>,
    pub extra_args: Vec<String>,
    /// Chrome/Chromium binary; auto-detected when unset.
    pub executable: Option<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            no_sandbox: true,
            window_width: 1920,
            window_height: 1080,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            extra_args: [
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--disable-notifications",
                "--disable-software-rasterizer",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            executable: None,
        }
    }
}

/// Static selector strategies for the listing and detail pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Marks one article summary on the listing page; also its readiness marker.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub listing_item: Locator,
    /// Nested path from a listing item to the anchor carrying title and href.
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub title_link_path: Vec<Locator>,
    /// Kicker strategies scoped to one listing item.
    pub container_kicker: Vec<Lookup>,
    /// Image lookup scoped to one listing item.
    pub image: Lookup,
    /// Marks a loaded article page.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub detail_ready: Locator,
    /// Kicker strategies scoped to a whole article page.
    pub page_kicker: Vec<Lookup>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing_item: Locator::class("contenedor_dato_modulo"),
            title_link_path: vec![Locator::class("titulo"), Locator::tag("a")],
            container_kicker: vec![
                Lookup::text(Locator::class("volanta")),
                Lookup::text(Locator::class("volanta fuente_roboto_slab")),
                Lookup::text(Locator::class("volanta_noticia")),
                Lookup::text(Locator::class("volanta_noticia fuente_roboto_slab")),
                Lookup::text(Locator::css(".volanta_titulo .volanta")),
                Lookup::text(Locator::css("div.volanta")),
            ],
            image: Lookup::source(Locator::tag("img")),
            detail_ready: Locator::class("contenido_noticia"),
            page_kicker: vec![
                Lookup::text(Locator::class("volanta_noticia")),
                Lookup::text(Locator::class("volanta_noticia fuente_roboto_slab")),
                Lookup::text(Locator::css(
                    ".slot.contenido_fijo.titulo_de_noticia .volanta_noticia",
                )),
                Lookup::text(Locator::css(".titulo_de_noticia .volanta_noticia")),
            ],
        }
    }
}
