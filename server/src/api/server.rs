//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::middleware::{self, AllowedOrigins};
use super::openapi::openapi_json;
use super::routes::{health, seats};
use crate::core::CoreApp;
use crate::core::constants::DEFAULT_BODY_LIMIT;
use crate::data::series::SeriesService;
use crate::domain::seats::SeatService;

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let server = &app.config.server;
        let allowed_origins = AllowedOrigins::new(&server.host, server.port, &server.cors_origins);
        Self {
            app,
            allowed_origins,
        }
    }

    /// Returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self {
            app,
            allowed_origins,
        } = self;

        let shutdown = app.shutdown.clone();
        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);

        let router = build_router(app.seats.clone(), app.series.clone(), &allowed_origins);

        let listener = TcpListener::bind(addr).await?;
        tracing::debug!(%addr, "HTTP server listening");
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.wait())
        .await?;

        Ok(app)
    }
}

/// Assemble the full HTTP surface
pub fn build_router(
    seats: Arc<SeatService>,
    series: Arc<SeriesService>,
    allowed_origins: &AllowedOrigins,
) -> Router {
    let api_routes = seats::routes(seats).merge(health::routes(series));

    Router::new()
        .route("/api/openapi.json", get(openapi_json))
        .nest("/api/v1", api_routes)
        .fallback(middleware::handle_404)
        .layer(CompressionLayer::new())
        .layer(middleware::cors(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::ErrorResponse;
    use crate::data::series::{BoundedSeries, InMemorySeries};
    use crate::domain::seats::tests::{DownSeries, StubSource, seats_config};
    use crate::domain::seats::{SeatSettings, Snapshot};
    use crate::domain::source::{ScrapeError, SeatSource};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    fn router_with(source: Arc<dyn SeatSource>, backend: Arc<dyn BoundedSeries>) -> Router {
        router_with_origins(source, backend, &[])
    }

    fn router_with_origins(
        source: Arc<dyn SeatSource>,
        backend: Arc<dyn BoundedSeries>,
        cors_origins: &[String],
    ) -> Router {
        let series = Arc::new(SeriesService::from_backend(backend));
        let seats = Arc::new(SeatService::new(
            source,
            series.clone(),
            "test:history",
            "https://example.com/event",
            seats_config(800, 3),
        ));
        build_router(
            seats,
            series,
            &AllowedOrigins::new("127.0.0.1", 5390, cors_origins),
        )
    }

    async fn get(router: Router, uri: &str) -> axum::response::Response {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn get_from(router: Router, uri: &str, origin: &str) -> axum::response::Response {
        router
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header(header::ORIGIN, origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn assert_no_store(response: &axum::response::Response) {
        let headers = response.headers();
        assert_eq!(
            headers[header::CACHE_CONTROL],
            "no-store, max-age=0, must-revalidate"
        );
        assert_eq!(headers["cdn-cache-control"], "no-store");
        assert_eq!(headers["vercel-cdn-cache-control"], "no-store");
        assert_eq!(headers[header::PRAGMA], "no-cache");
        assert_eq!(headers[header::EXPIRES], "0");
    }

    #[tokio::test]
    async fn test_snapshot_ok() {
        let router = router_with(
            Arc::new(StubSource::new(vec![Ok(12)])),
            Arc::new(InMemorySeries::new()),
        );

        let response = get(router, "/api/v1/seats-snapshot").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_no_store(&response);

        let snapshot: Snapshot = json(response).await;
        assert_eq!(snapshot.current, 788);
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.history[0].seats, 788);
    }

    #[tokio::test]
    async fn test_snapshot_body_shape() {
        let router = router_with(
            Arc::new(StubSource::new(vec![Ok(0)])),
            Arc::new(InMemorySeries::new()),
        );

        let body: serde_json::Value = json(get(router, "/api/v1/seats-snapshot").await).await;
        assert_eq!(body["current"], 800);
        let sample = &body["history"][0];
        assert!(sample["timestamp"].is_i64());
        assert_eq!(sample["seats"], 800);
    }

    #[tokio::test]
    async fn test_snapshot_history_capped_across_requests() {
        let backend = Arc::new(InMemorySeries::new());
        let router = router_with(
            Arc::new(StubSource::new(vec![Ok(790), Ok(780), Ok(770), Ok(760)])),
            backend.clone(),
        );

        let mut last = None;
        for _ in 0..4 {
            last = Some(get(router.clone(), "/api/v1/seats-snapshot").await);
        }
        let snapshot: Snapshot = json(last.unwrap()).await;
        let seats: Vec<u32> = snapshot.history.iter().map(|s| s.seats).collect();
        assert_eq!(seats, vec![40, 30, 20]);
        assert_eq!(backend.len("test:history").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_snapshot_scrape_failure() {
        let router = router_with(
            Arc::new(StubSource::new(vec![Err(ScrapeError::Connect(
                "refused".into(),
            ))])),
            Arc::new(InMemorySeries::new()),
        );

        let response = get(router, "/api/v1/seats-snapshot").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_no_store(&response);

        let body: ErrorResponse = json(response).await;
        assert_eq!(body.code, "SNAPSHOT_FAILED");
    }

    #[tokio::test]
    async fn test_snapshot_store_down() {
        let router = router_with(
            Arc::new(StubSource::new(vec![Ok(12)])),
            Arc::new(DownSeries),
        );

        let response = get(router, "/api/v1/seats-snapshot").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_no_store(&response);
    }

    #[tokio::test]
    async fn test_settings() {
        let router = router_with(
            Arc::new(StubSource::new(vec![])),
            Arc::new(InMemorySeries::new()),
        );

        let response = get(router, "/api/v1/seats/settings").await;
        assert_eq!(response.status(), StatusCode::OK);
        let settings: SeatSettings = json(response).await;
        assert_eq!(settings.total_seats, 800);
        assert_eq!(settings.max_data_points, 3);
        assert_eq!(settings.poll_interval_ms, 5000);
    }

    #[tokio::test]
    async fn test_settings_does_not_scrape() {
        let source = Arc::new(StubSource::new(vec![]));
        let router = router_with(source.clone(), Arc::new(InMemorySeries::new()));

        get(router, "/api/v1/seats/settings").await;
        assert!(source.urls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_health() {
        let router = router_with(
            Arc::new(StubSource::new(vec![])),
            Arc::new(InMemorySeries::new()),
        );
        let response = get(router, "/api/v1/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: health::HealthResponse = json(response).await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_health_store_down() {
        let router = router_with(Arc::new(StubSource::new(vec![])), Arc::new(DownSeries));
        let response = get(router, "/api/v1/health").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_openapi_json() {
        let router = router_with(
            Arc::new(StubSource::new(vec![])),
            Arc::new(InMemorySeries::new()),
        );
        let response = get(router, "/api/openapi.json").await;
        assert_eq!(response.status(), StatusCode::OK);
        let doc: serde_json::Value = json(response).await;
        assert!(doc["paths"]["/api/v1/seats-snapshot"].is_object());
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let router = router_with(
            Arc::new(StubSource::new(vec![])),
            Arc::new(InMemorySeries::new()),
        );
        let response = get(router, "/api/v1/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = json(response).await;
        assert_eq!(body.code, "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_snapshot_rejects_post() {
        let router = router_with(
            Arc::new(StubSource::new(vec![Ok(1)])),
            Arc::new(InMemorySeries::new()),
        );
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/seats-snapshot")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_cors_configured_origin_allowed() {
        let router = router_with_origins(
            Arc::new(StubSource::new(vec![])),
            Arc::new(InMemorySeries::new()),
            &["http://localhost:3000".to_string()],
        );
        let response = get_from(router, "/api/v1/seats/settings", "http://localhost:3000").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
    }

    #[tokio::test]
    async fn test_cors_own_origin_allowed() {
        let router = router_with(
            Arc::new(StubSource::new(vec![])),
            Arc::new(InMemorySeries::new()),
        );
        let response = get_from(router, "/api/v1/seats/settings", "http://localhost:5390").await;
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5390"
        );
    }

    #[tokio::test]
    async fn test_cors_unlisted_origin_gets_no_header() {
        let router = router_with(
            Arc::new(StubSource::new(vec![])),
            Arc::new(InMemorySeries::new()),
        );
        let response = get_from(router, "/api/v1/seats/settings", "http://localhost:3000").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            !response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }

    #[tokio::test]
    async fn test_cors_wildcard() {
        let router = router_with_origins(
            Arc::new(StubSource::new(vec![])),
            Arc::new(InMemorySeries::new()),
            &["*".to_string()],
        );
        let response =
            get_from(router, "/api/v1/seats/settings", "https://anywhere.example.com").await;
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
