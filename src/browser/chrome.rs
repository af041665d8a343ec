//! Headless Chromium backend built on `chromiumoxide`.
//!
//! Each [`ChromeLauncher::launch`] starts a brand-new browser process with its
//! own DevTools handler task and a single blank page. [`ChromeSession::close`]
//! asks the browser to close and waits for the process. If the close request
//! fails or the process outlives [`EXIT_GRACE`], the process is killed, so
//! teardown always finishes. If a session is dropped without `close`,
//! `chromiumoxide`'s `Browser` kills the child process on drop.

use super::{Element, Launcher, Locator, Scope, Session};
use crate::config::{BrowserSettings, Timeouts};
use crate::error::BrowserError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::element::Element as CdpElement;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, instrument, warn};

/// How often readiness markers are polled.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How long each teardown step may take before the process is killed.
const EXIT_GRACE: Duration = Duration::from_secs(10);

/// Launches isolated headless Chromium sessions.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    settings: BrowserSettings,
    page_load_timeout: Duration,
}

impl ChromeLauncher {
    pub fn new(settings: BrowserSettings, timeouts: &Timeouts) -> Self {
        Self {
            settings,
            page_load_timeout: timeouts.page_load(),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, BrowserError> {
        let s = &self.settings;
        let mut builder = BrowserConfig::builder()
            .window_size(s.window_width, s.window_height)
            .request_timeout(self.page_load_timeout)
            .args(s.extra_args.iter().map(String::as_str));

        if !s.headless {
            builder = builder.with_head();
        }
        if s.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ua) = &s.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }
        if let Some(path) = &s.executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(BrowserError::Launch)
    }
}

impl Launcher for ChromeLauncher {
    type Session = ChromeSession;

    #[instrument(level = "debug", skip_all)]
    async fn launch(&self) -> Result<ChromeSession, BrowserError> {
        let config = self.browser_config()?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "DevTools handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(BrowserError::Launch(e.to_string()));
            }
        };

        debug!("Browser session launched");
        Ok(ChromeSession {
            browser,
            page,
            handler_task,
            page_load_timeout: self.page_load_timeout,
        })
    }
}

/// A single browser process driving one page.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    page_load_timeout: Duration,
}

impl std::fmt::Debug for ChromeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromeSession")
            .field("page_load_timeout", &self.page_load_timeout)
            .finish()
    }
}

impl Scope for ChromeSession {
    type Element = ChromeElement;

    async fn find(&self, locator: &Locator) -> Result<ChromeElement, BrowserError> {
        let found = self
            .page
            .find_elements(locator.to_css())
            .await
            .map_err(session_error)?;
        first_or_not_found(found, locator)
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ChromeElement>, BrowserError> {
        let found = self
            .page
            .find_elements(locator.to_css())
            .await
            .map_err(session_error)?;
        Ok(found.into_iter().map(ChromeElement).collect())
    }
}

impl Session for ChromeSession {
    #[instrument(level = "debug", skip(self))]
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        match timeout(self.page_load_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(CdpError::Timeout)) | Err(_) => Err(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout: self.page_load_timeout,
            }),
            Ok(Err(e)) => Err(session_error(e)),
        }
    }

    async fn wait_for(&self, locator: &Locator, limit: Duration) -> Result<(), BrowserError> {
        let css = locator.to_css();
        let deadline = Instant::now() + limit;
        loop {
            match self.page.find_elements(css.as_str()).await {
                Ok(found) if !found.is_empty() => return Ok(()),
                Ok(_) => {}
                Err(e) => debug!(%locator, error = %e, "Readiness probe failed; polling again"),
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::WaitTimeout {
                    locator: locator.to_string(),
                    timeout: limit,
                });
            }
            sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    #[instrument(level = "debug", skip_all)]
    async fn close(self) -> Result<(), BrowserError> {
        let ChromeSession {
            mut browser,
            handler_task,
            ..
        } = self;

        let closed = shut_down(&mut browser, EXIT_GRACE).await;
        handler_task.abort();
        closed
    }
}

/// The process controls teardown needs.
trait BrowserProcess {
    async fn request_close(&mut self) -> Result<(), BrowserError>;
    async fn wait_exit(&mut self) -> Result<(), BrowserError>;
    async fn kill(&mut self);
}

impl BrowserProcess for Browser {
    async fn request_close(&mut self) -> Result<(), BrowserError> {
        Browser::close(self).await.map(|_| ()).map_err(session_error)
    }

    async fn wait_exit(&mut self) -> Result<(), BrowserError> {
        Browser::wait(self)
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::Session(e.to_string()))
    }

    async fn kill(&mut self) {
        if let Some(Err(e)) = Browser::kill(self).await {
            warn!(error = %e, "Failed to kill browser process");
        }
    }
}

/// Close `process` gracefully, killing it when it will not go away.
///
/// Returns the outcome of the close request; a kill is logged, not reported.
async fn shut_down<P: BrowserProcess>(
    process: &mut P,
    grace: Duration,
) -> Result<(), BrowserError> {
    let closed = match timeout(grace, process.request_close()).await {
        Ok(result) => result,
        Err(_) => Err(BrowserError::Session(format!(
            "browser close request timed out after {grace:?}"
        ))),
    };
    if let Err(e) = &closed {
        warn!(error = %e, "Browser close failed; killing process");
        process.kill().await;
    }

    match timeout(grace, process.wait_exit()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Failed waiting for browser process to exit"),
        Err(_) => {
            warn!(?grace, "Browser process did not exit; killing");
            process.kill().await;
        }
    }
    closed
}

/// A node of the page driven by a [`ChromeSession`].
#[derive(Debug)]
pub struct ChromeElement(CdpElement);

impl Scope for ChromeElement {
    type Element = ChromeElement;

    async fn find(&self, locator: &Locator) -> Result<ChromeElement, BrowserError> {
        let found = self
            .0
            .find_elements(locator.to_css())
            .await
            .map_err(session_error)?;
        first_or_not_found(found, locator)
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<ChromeElement>, BrowserError> {
        let found = self
            .0
            .find_elements(locator.to_css())
            .await
            .map_err(session_error)?;
        Ok(found.into_iter().map(ChromeElement).collect())
    }
}

impl Element for ChromeElement {
    async fn text(&self) -> Result<String, BrowserError> {
        Ok(self
            .0
            .inner_text()
            .await
            .map_err(session_error)?
            .unwrap_or_default())
    }

    /// Prefers the DOM property so `src`/`href` come back as absolute URLs,
    /// falling back to the raw attribute. Empty values count as absent.
    async fn attribute(&self, name: &str) -> Result<Option<String>, BrowserError> {
        let property = self.0.property(name).await.map_err(session_error)?;
        if let Some(value) = property_string(property) {
            return Ok(Some(value));
        }
        let raw = self.0.attribute(name).await.map_err(session_error)?;
        Ok(raw.filter(|value| !value.is_empty()))
    }
}

/// A non-empty string DOM property. `img.src` is `""` when the attribute is
/// missing, which must read the same as absent.
fn property_string(property: Option<serde_json::Value>) -> Option<String> {
    match property {
        Some(serde_json::Value::String(value)) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn first_or_not_found(
    found: Vec<CdpElement>,
    locator: &Locator,
) -> Result<ChromeElement, BrowserError> {
    found
        .into_iter()
        .next()
        .map(ChromeElement)
        .ok_or_else(|| BrowserError::NotFound {
            locator: locator.to_string(),
        })
}

fn session_error(e: CdpError) -> BrowserError {
    BrowserError::Session(e.to_string())
}
