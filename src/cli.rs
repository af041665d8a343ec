//! Command-line interface definitions.
//!
//! Flags override values from the YAML config file; the listing URL can also
//! come from the environment.

use crate::config::AppConfig;
use clap::Parser;

/// Command-line arguments for the scraper.
///
/// # Examples
///
/// ```sh
/// # Defaults: built-in selectors, ./output
/// yogonet_kicker_scraper
///
/// # Custom config and output directory, visible browser
/// yogonet_kicker_scraper -c scraper.yaml -o /app/output --headful
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "SCRAPER_CONFIG")]
    pub config: Option<String>,

    /// Output directory for JSON and CSV results
    #[arg(short, long, env = "SCRAPER_OUTPUT_DIR", default_value = "./output")]
    pub output_dir: String,

    /// Listing page to scrape
    #[arg(long, env = "LISTING_URL")]
    pub listing_url: Option<String>,

    /// Maximum number of scrape attempts
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Seconds to wait between attempts
    #[arg(long)]
    pub retry_delay_secs: Option<u64>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headful: bool,
}

impl Cli {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(url) = &self.listing_url {
            config.listing_url = url.clone();
        }
        if let Some(n) = self.max_attempts {
            config.retry.max_attempts = n;
        }
        if let Some(secs) = self.retry_delay_secs {
            config.retry.retry_delay_secs = secs;
        }
        if self.headful {
            config.browser.headless = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["yogonet_kicker_scraper"]);
        assert_eq!(cli.output_dir, "./output");
        assert!(cli.config.is_none());
        assert!(!cli.headful);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "yogonet_kicker_scraper",
            "-c",
            "/etc/scraper.yaml",
            "-o",
            "/tmp/out",
        ]);
        assert_eq!(cli.config.as_deref(), Some("/etc/scraper.yaml"));
        assert_eq!(cli.output_dir, "/tmp/out");
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from([
            "yogonet_kicker_scraper",
            "--listing-url",
            "https://news.example.com/",
            "--max-attempts",
            "5",
            "--retry-delay-secs",
            "1",
            "--headful",
        ]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.listing_url, "https://news.example.com/");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.retry_delay_secs, 1);
        assert!(!config.browser.headless);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let cli = Cli::parse_from(["yogonet_kicker_scraper"]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.retry, AppConfig::default().retry);
    }
}
