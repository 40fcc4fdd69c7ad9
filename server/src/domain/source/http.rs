//! Static-HTML seat reader
//!
//! Works for pages that render the counter server-side. Nothing is executed,
//! so a selector that only matches after client-side rendering will not be
//! found here.

use async_trait::async_trait;
use scraper::{Html, Selector};

use super::error::ScrapeError;
use super::extract::extract_seat_count;
use super::{SeatSource, ensure_url};
use crate::core::config::ScraperConfig;
use crate::core::constants::SCRAPER_USER_AGENT;

pub struct HttpSeatSource {
    client: reqwest::Client,
    selector: Selector,
    selector_text: String,
}

impl HttpSeatSource {
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let selector = Selector::parse(&config.selector)
            .map_err(|_| ScrapeError::InvalidSelector(config.selector.clone()))?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(SCRAPER_USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            selector,
            selector_text: config.selector.clone(),
        })
    }
}

#[async_trait]
impl SeatSource for HttpSeatSource {
    async fn read(&self, url: &str) -> Result<u32, ScrapeError> {
        ensure_url(url)?;

        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        // Html is !Send; keep it out of any await
        let text = label_text(&body, &self.selector)
            .ok_or_else(|| ScrapeError::SelectorNotFound(self.selector_text.clone()))?;
        let seats = extract_seat_count(&text);
        tracing::debug!(url = %url, text = %text.trim(), seats, "Read seat label");
        Ok(seats)
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}

/// Text of the first element matching `selector`
fn label_text(html: &str, selector: &Selector) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ScraperBackend;
    use axum::Router;
    use axum::response::Html as HtmlResponse;
    use axum::routing::get;

    const PAGE: &str = r#"<html><body>
        <div class="slots">
          <button><p>General</p><p>12 seats left</p></button>
          <button><p>VIP</p><p>3 seats left</p></button>
        </div>
    </body></html>"#;

    fn config(selector: &str) -> ScraperConfig {
        ScraperConfig {
            backend: ScraperBackend::Http,
            event_url: "http://127.0.0.1/".to_string(),
            selector: selector.to_string(),
            browser: None,
            timeout_secs: 5,
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_label_text_first_match() {
        let selector = Selector::parse(".slots button p:last-child").unwrap();
        assert_eq!(label_text(PAGE, &selector).as_deref(), Some("12 seats left"));
    }

    #[test]
    fn test_label_text_missing() {
        let selector = Selector::parse(".waitlist").unwrap();
        assert!(label_text(PAGE, &selector).is_none());
    }

    #[test]
    fn test_invalid_selector() {
        let err = HttpSeatSource::new(&config("div[")).err().unwrap();
        assert!(matches!(err, ScrapeError::InvalidSelector(_)));
    }

    #[tokio::test]
    async fn test_reads_count_from_page() {
        let base = serve(Router::new().route("/event", get(|| async { HtmlResponse(PAGE) }))).await;
        let source = HttpSeatSource::new(&config(".slots button p:last-child")).unwrap();

        let seats = source.read(&format!("{}/event", base)).await.unwrap();
        assert_eq!(seats, 12);
    }

    #[tokio::test]
    async fn test_sold_out_reads_zero() {
        let page = r#"<div class="slots"><button><p>General</p><p>Sold out</p></button></div>"#;
        let base = serve(Router::new().route("/event", get(move || async move { HtmlResponse(page) }))).await;
        let source = HttpSeatSource::new(&config(".slots button p:last-child")).unwrap();

        assert_eq!(source.read(&format!("{}/event", base)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_element_is_error() {
        let base = serve(Router::new().route("/event", get(|| async { HtmlResponse(PAGE) }))).await;
        let source = HttpSeatSource::new(&config(".waitlist")).unwrap();

        let err = source.read(&format!("{}/event", base)).await.unwrap_err();
        assert!(matches!(err, ScrapeError::SelectorNotFound(_)));
    }

    #[tokio::test]
    async fn test_error_status_is_http_error() {
        let base = serve(Router::new()).await;
        let source = HttpSeatSource::new(&config(".slots p")).unwrap();

        let err = source.read(&format!("{}/missing", base)).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Http(_)));
    }

    #[tokio::test]
    async fn test_empty_url_rejected() {
        let source = HttpSeatSource::new(&config(".slots p")).unwrap();
        let err = source.read("").await.unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidUrl(_)));
    }
}
