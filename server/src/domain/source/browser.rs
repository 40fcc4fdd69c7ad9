//! Headless-browser seat reader (Chrome DevTools Protocol)

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::error::ScrapeError;
use super::extract::extract_seat_count;
use super::{SeatSource, ensure_url};
use crate::core::config::ScraperConfig;
use crate::core::constants::SELECTOR_POLL_INTERVAL_MS;

/// Reads the counter from the rendered page, opening a fresh browser
/// session for every read.
pub struct BrowserSeatSource {
    selector: String,
    timeout: Duration,
    /// Full WebSocket URL including the access token; never logged
    ws_url: Option<String>,
    /// Endpoint without credentials, for logs
    endpoint: Option<String>,
}

impl BrowserSeatSource {
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let ws_url = config
            .browser
            .as_ref()
            .map(|b| b.ws_url())
            .transpose()
            .map_err(|e| ScrapeError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            selector: config.selector.clone(),
            timeout: config.timeout(),
            ws_url: ws_url.map(String::from),
            endpoint: config.browser.as_ref().map(|b| b.endpoint.clone()),
        })
    }

    /// Whether reads go to a remote browser instead of a local Chromium
    pub fn is_remote(&self) -> bool {
        self.ws_url.is_some()
    }
}

#[async_trait]
impl SeatSource for BrowserSeatSource {
    async fn read(&self, url: &str) -> Result<u32, ScrapeError> {
        ensure_url(url)?;

        let mut session = BrowserSession::open(self.ws_url.as_deref(), self.endpoint.as_deref())
            .await?;
        let result = session.read_label(url, &self.selector, self.timeout).await;
        session.close().await;

        let text = result?;
        let seats = extract_seat_count(&text);
        tracing::debug!(url = %url, text = %text.trim(), seats, "Read seat label");
        Ok(seats)
    }

    fn backend_name(&self) -> &'static str {
        "browser"
    }
}

/// One browser connection plus the task driving its CDP event loop.
///
/// `close` shuts the browser down; dropping the session without closing
/// still stops the event loop.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    async fn open(ws_url: Option<&str>, endpoint: Option<&str>) -> Result<Self, ScrapeError> {
        let (browser, mut handler) = match ws_url {
            Some(ws_url) => {
                tracing::debug!(endpoint = endpoint.unwrap_or_default(), "Connecting to remote browser");
                Browser::connect(ws_url)
                    .await
                    .map_err(|e| ScrapeError::Connect(e.to_string()))?
            }
            None => {
                tracing::debug!("Launching local headless browser");
                let config = BrowserConfig::builder()
                    .no_sandbox()
                    .build()
                    .map_err(ScrapeError::Browser)?;
                Browser::launch(config)
                    .await
                    .map_err(|e| ScrapeError::Connect(e.to_string()))?
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!(error = %e, "Browser event loop stopped");
                    break;
                }
            }
        });

        Ok(Self { browser, handler })
    }

    /// Navigate to `url` and return the inner text of the first element
    /// matching `selector`. The page is closed on every path.
    async fn read_label(
        &self,
        url: &str,
        selector: &str,
        timeout: Duration,
    ) -> Result<String, ScrapeError> {
        let page = self.browser.new_page("about:blank").await?;
        let result = read_from_page(&page, url, selector, timeout).await;
        if let Err(e) = page.close().await {
            tracing::debug!(error = %e, "Failed to close page");
        }
        result
    }

    async fn close(&mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::debug!(error = %e, "Failed to close browser");
        }
        // Reap a locally launched process; no-op for remote sessions
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(error = %e, "Failed to wait for browser process");
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Navigate and wait for `selector`, all within `timeout`.
///
/// `goto` returns once the load event fires, not on network idle.
/// Content rendered after load (XHR, client-side frameworks) is picked up
/// by polling for the selector until the deadline.
async fn read_from_page(
    page: &Page,
    url: &str,
    selector: &str,
    timeout: Duration,
) -> Result<String, ScrapeError> {
    let deadline = Instant::now() + timeout;

    match tokio::time::timeout(timeout, page.goto(url)).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            return Err(ScrapeError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            });
        }
        Err(_) => {
            return Err(ScrapeError::Navigation {
                url: url.to_string(),
                message: format!("page did not load within {}s", timeout.as_secs()),
            });
        }
    }

    let poll = Duration::from_millis(SELECTOR_POLL_INTERVAL_MS);
    let element = loop {
        match page.find_element(selector).await {
            Ok(element) => break element,
            Err(e) => {
                if Instant::now() + poll > deadline {
                    tracing::debug!(selector = %selector, error = %e, "Selector wait expired");
                    return Err(ScrapeError::SelectorTimeout {
                        selector: selector.to_string(),
                        timeout_secs: timeout.as_secs(),
                    });
                }
                tokio::time::sleep(poll).await;
            }
        }
    };

    Ok(element.inner_text().await?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{BrowserEndpointConfig, ScraperBackend};

    fn config(browser: Option<BrowserEndpointConfig>) -> ScraperConfig {
        ScraperConfig {
            backend: ScraperBackend::Browser,
            event_url: "https://example.com/event".to_string(),
            selector: ".slots button p:last-child".to_string(),
            browser,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_local_launch_without_endpoint() {
        let source = BrowserSeatSource::new(&config(None)).unwrap();
        assert!(!source.is_remote());
        assert_eq!(source.backend_name(), "browser");
        assert_eq!(source.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_remote_endpoint_carries_token() {
        let source = BrowserSeatSource::new(&config(Some(BrowserEndpointConfig {
            endpoint: "wss://chrome.example.com".to_string(),
            token: Some("secret".to_string()),
        })))
        .unwrap();
        assert!(source.is_remote());
        assert_eq!(
            source.ws_url.as_deref(),
            Some("wss://chrome.example.com/?token=secret")
        );
        assert_eq!(source.endpoint.as_deref(), Some("wss://chrome.example.com"));
    }

    #[test]
    fn test_malformed_endpoint_rejected() {
        let result = BrowserSeatSource::new(&config(Some(BrowserEndpointConfig {
            endpoint: "not a url".to_string(),
            token: None,
        })));
        assert!(matches!(result, Err(ScrapeError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_empty_url_rejected_before_connecting() {
        let source = BrowserSeatSource::new(&config(None)).unwrap();
        let err = source.read("   ").await.unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connect_error() {
        let source = BrowserSeatSource::new(&config(Some(BrowserEndpointConfig {
            endpoint: "ws://127.0.0.1:1".to_string(),
            token: None,
        })))
        .unwrap();
        let err = source.read("https://example.com").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Connect(_)));
    }
}
