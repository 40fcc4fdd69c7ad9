//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::series::{SeriesError, SeriesService};
use crate::domain::seats::{Sample, SeatService, derive_seats_taken};
use crate::domain::source::{self, SeatSource};
use crate::utils::time::millis_to_datetime;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub series: Arc<SeriesService>,
    pub source: Arc<dyn SeatSource>,
    pub seats: Arc<SeatService>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Scrape { url }) => Self::handle_scrape(&cli_config, url).await,
            Some(Commands::History) => Self::handle_history(&cli_config).await,
            Some(Commands::Start) | None => {
                let app = Self::init(&cli_config).await?;
                Self::start_server(app).await
            }
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let series = Arc::new(
            SeriesService::new(&config.store)
                .await
                .context("Failed to initialize history store")?,
        );
        tracing::debug!(backend = series.backend_name(), "History store initialized");

        let source =
            source::from_config(&config.scraper).context("Failed to initialize seat reader")?;
        tracing::debug!(backend = source.backend_name(), "Seat reader initialized");

        let seats = Arc::new(SeatService::new(
            source.clone(),
            series.clone(),
            config.store.series_key.clone(),
            config.scraper.event_url.clone(),
            config.seats,
        ));
        let shutdown = ShutdownService::new(series.clone());

        Ok(Self {
            shutdown,
            config,
            series,
            source,
            seats,
        })
    }

    /// Read the page once and print the result; the history is untouched
    async fn handle_scrape(cli: &CliConfig, url: Option<String>) -> Result<()> {
        let config = AppConfig::load(cli)?;
        let source = source::from_config(&config.scraper)?;
        let url = url.unwrap_or_else(|| config.scraper.event_url.clone());

        let available = source
            .read(&url)
            .await
            .with_context(|| format!("Failed to read seats from {}", url))?;
        let taken = derive_seats_taken(config.seats.total_seats, available);

        println!("available: {}", available);
        println!("taken:     {} / {}", taken, config.seats.total_seats);
        Ok(())
    }

    /// Print the stored history, newest first
    async fn handle_history(cli: &CliConfig) -> Result<()> {
        let config = AppConfig::load(cli)?;
        let series = SeriesService::new(&config.store)
            .await
            .context("Failed to initialize history store")?;

        let result = read_history(&series, &config.store.series_key).await;
        series.close();
        let (stored, history) = result.context("Failed to read seat history")?;

        if stored == 0 {
            println!(
                "No samples recorded under '{}' ({} backend).",
                config.store.series_key,
                series.backend_name()
            );
            return Ok(());
        }

        for sample in &history {
            println!(
                "{}  {}",
                millis_to_datetime(sample.timestamp).to_rfc3339(),
                sample.seats
            );
        }
        println!("{}", history_summary(stored, history.len()));
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        banner::print_banner(
            &app.config,
            app.series.backend_name(),
            app.source.backend_name(),
        );

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }
}

/// Stored entry count and the samples that decoded
async fn read_history(
    series: &SeriesService,
    series_id: &str,
) -> Result<(usize, Vec<Sample>), SeriesError> {
    let stored = series.len(series_id).await?;
    let samples = series.read_all::<Sample>(series_id).await?;
    Ok((stored, samples))
}

fn history_summary(stored: usize, decoded: usize) -> String {
    if decoded < stored {
        format!(
            "{} of {} stored entries shown ({} undecodable skipped)",
            decoded,
            stored,
            stored - decoded
        )
    } else {
        format!("{} stored entries", stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::series::{BoundedSeries, InMemorySeries};

    #[tokio::test]
    async fn test_read_history_counts_undecodable_entries() {
        let backend = Arc::new(InMemorySeries::new());
        let series = SeriesService::from_backend(backend.clone());
        series
            .append(
                "h",
                &Sample {
                    timestamp: 1,
                    seats: 10,
                },
            )
            .await
            .unwrap();
        backend.append("h", b"garbage".to_vec()).await.unwrap();

        let (stored, samples) = read_history(&series, "h").await.unwrap();
        assert_eq!(stored, 2);
        assert_eq!(samples.len(), 1);
        assert_eq!(
            history_summary(stored, samples.len()),
            "1 of 2 stored entries shown (1 undecodable skipped)"
        );
    }

    #[tokio::test]
    async fn test_read_history_empty_series() {
        let series = SeriesService::from_backend(Arc::new(InMemorySeries::new()));
        let (stored, samples) = read_history(&series, "h").await.unwrap();
        assert_eq!(stored, 0);
        assert!(samples.is_empty());
    }

    #[test]
    fn test_history_summary_all_decoded() {
        assert_eq!(history_summary(3, 3), "3 stored entries");
    }
}
