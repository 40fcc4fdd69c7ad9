//! Centralized shutdown management

use std::sync::Arc;

use tokio::sync::watch;

use crate::data::series::SeriesService;

/// Coordinates graceful shutdown of the server and its clients
#[derive(Clone)]
pub struct ShutdownService {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
    series: Arc<SeriesService>,
}

impl ShutdownService {
    pub fn new(series: Arc<SeriesService>) -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
            series,
        }
    }

    /// Trigger shutdown
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    /// Trigger shutdown and release the history store pool
    ///
    /// Called after the HTTP server has drained in-flight requests.
    pub async fn shutdown(&self) {
        tracing::debug!("Initiating graceful shutdown...");
        self.trigger();

        self.series.close();
        tracing::debug!(backend = self.series.backend_name(), "History store closed");
        tracing::debug!("Shutdown complete");
    }

    /// Wait for shutdown signal (for use with axum graceful shutdown)
    pub fn wait(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.rx.clone();
        async move {
            let _ = rx.wait_for(|&v| v).await;
        }
    }

    /// Install OS signal handlers and auto-trigger on Ctrl+C/SIGTERM
    pub fn install_signal_handlers(&self) {
        let service = self.clone();
        tokio::spawn(async move {
            let ctrl_c = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(mut signal) => {
                        signal.recv().await;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to install SIGTERM handler");
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => tracing::debug!("Received Ctrl+C, shutting down"),
                _ = terminate => tracing::debug!("Received SIGTERM, shutting down"),
            }

            service.trigger();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::data::series::InMemorySeries;

    fn make_shutdown() -> ShutdownService {
        let series = Arc::new(SeriesService::from_backend(Arc::new(InMemorySeries::new())));
        ShutdownService::new(series)
    }

    async fn resolves(shutdown: &ShutdownService) -> bool {
        tokio::time::timeout(Duration::from_millis(50), shutdown.wait())
            .await
            .is_ok()
    }

    #[tokio::test]
    async fn test_wait_pending_until_triggered() {
        let shutdown = make_shutdown();
        assert!(!resolves(&shutdown).await);

        shutdown.trigger();
        assert!(resolves(&shutdown).await);
    }

    #[tokio::test]
    async fn test_shutdown_wait_returns_after_trigger() {
        let shutdown = make_shutdown();
        let handle = tokio::spawn(shutdown.wait());

        tokio::task::yield_now().await;
        shutdown.trigger();

        tokio::time::timeout(Duration::from_millis(100), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_signal() {
        let shutdown = make_shutdown();
        let clone = shutdown.clone();

        clone.shutdown().await;
        assert!(resolves(&shutdown).await);
    }
}
