//! HTTP middleware (CORS, no-store headers, 404 handler)

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::types::ApiError;
use crate::core::config::is_all_interfaces;
use crate::core::constants::NO_STORE_CACHE_CONTROL;

static CDN_CACHE_CONTROL: HeaderName = HeaderName::from_static("cdn-cache-control");
static VERCEL_CDN_CACHE_CONTROL: HeaderName = HeaderName::from_static("vercel-cdn-cache-control");

/// Allowed origins configuration
#[derive(Debug, Clone)]
pub struct AllowedOrigins {
    origins: Vec<String>,
    any: bool,
}

impl AllowedOrigins {
    /// Create allowed origins from host and port configuration plus any
    /// configured extras. An extra of `*` allows every origin.
    pub fn new(host: &str, port: u16, extra: &[String]) -> Self {
        let mut origins = Vec::new();
        let is_all = is_all_interfaces(host);

        let base_hosts: Vec<&str> = if is_all || host == "127.0.0.1" || host == "localhost" {
            vec!["localhost", "127.0.0.1"]
        } else {
            vec![host]
        };

        for h in &base_hosts {
            origins.push(format!("http://{}:{}", h, port));
            origins.push(format!("http://{}", h));
        }

        if is_all && let Ok(interfaces) = local_ip_address::list_afinet_netifas() {
            for (_, ip) in interfaces
                .iter()
                .filter(|(_, ip)| ip.is_ipv4() && !ip.is_loopback())
            {
                origins.push(format!("http://{}:{}", ip, port));
            }
        }

        let any = extra.iter().any(|o| o == "*");
        for origin in extra.iter().filter(|o| *o != "*") {
            if !origins.contains(origin) {
                origins.push(origin.clone());
            }
        }

        Self { origins, any }
    }

    fn as_header_values(&self) -> Vec<HeaderValue> {
        self.origins.iter().filter_map(|o| o.parse().ok()).collect()
    }
}

/// Create CORS layer (read-only API)
pub fn cors(allowed: &AllowedOrigins) -> CorsLayer {
    let allow_origin = if allowed.any {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed.as_header_values())
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            header::CACHE_CONTROL,
        ])
}

/// Forbid caching at the browser and every CDN layer
pub async fn no_store(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(NO_STORE_CACHE_CONTROL),
    );
    headers.insert(CDN_CACHE_CONTROL.clone(), HeaderValue::from_static("no-store"));
    headers.insert(
        VERCEL_CDN_CACHE_CONTROL.clone(),
        HeaderValue::from_static("no-store"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    response
}

/// Handle 404 Not Found with logging
pub async fn handle_404(req: Request) -> ApiError {
    tracing::debug!(method = %req.method(), uri = %req.uri(), "[404]");
    ApiError::not_found("NOT_FOUND", format!("No route for {}", req.uri().path()))
}
