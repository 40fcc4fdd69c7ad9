use clap::{Parser, Subcommand};

use std::ffi::OsString;
use std::path::PathBuf;

use super::config::{ScraperBackend, StoreBackend};
use super::constants::{
    ENV_BROWSER_ENDPOINT, ENV_BROWSER_TOKEN, ENV_CONFIG, ENV_CORS_ORIGINS, ENV_EVENT_URL, ENV_HOST,
    ENV_MAX_DATA_POINTS, ENV_POLL_INTERVAL_MS, ENV_PORT, ENV_REDIS_HOST, ENV_REDIS_PASSWORD,
    ENV_REDIS_PORT, ENV_REDIS_URL, ENV_SCRAPE_TIMEOUT_SECS, ENV_SCRAPER_BACKEND, ENV_SELECTOR,
    ENV_SERIES_KEY, ENV_STORE_BACKEND, ENV_TOTAL_SEATS,
};

#[derive(Parser)]
#[command(name = "seatwatch")]
#[command(version, about = "Live seat counter for event registrations", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Extra browser origins allowed to call the API (comma-separated, `*` for any)
    #[arg(long, global = true, env = ENV_CORS_ORIGINS, value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // History store options
    /// History store backend (memory or redis)
    #[arg(long, global = true, env = ENV_STORE_BACKEND, value_parser = parse_store_backend)]
    pub store_backend: Option<StoreBackend>,

    /// Redis connection URL. Takes precedence over host/port/password.
    /// Formats: redis://[:password@]host:port[/db], rediss:// for TLS
    #[arg(long, global = true, env = ENV_REDIS_URL, hide_env_values = true)]
    pub redis_url: Option<String>,

    /// Redis host
    #[arg(long, global = true, env = ENV_REDIS_HOST)]
    pub redis_host: Option<String>,

    /// Redis port
    #[arg(long, global = true, env = ENV_REDIS_PORT)]
    pub redis_port: Option<u16>,

    /// Redis password
    #[arg(long, global = true, env = ENV_REDIS_PASSWORD, hide_env_values = true)]
    pub redis_password: Option<String>,

    /// Key of the history list in the store
    #[arg(long, global = true, env = ENV_SERIES_KEY)]
    pub series_key: Option<String>,

    // Scraper options
    /// Scraper backend (browser or http)
    #[arg(long, global = true, env = ENV_SCRAPER_BACKEND, value_parser = parse_scraper_backend)]
    pub scraper_backend: Option<ScraperBackend>,

    /// Registration page to scrape
    #[arg(long, global = true, env = ENV_EVENT_URL)]
    pub event_url: Option<String>,

    /// CSS selector of the element holding the seat counter
    #[arg(long, global = true, env = ENV_SELECTOR)]
    pub selector: Option<String>,

    /// Remote browser WebSocket endpoint (launches a local Chromium when unset)
    #[arg(long, global = true, env = ENV_BROWSER_ENDPOINT)]
    pub browser_endpoint: Option<String>,

    /// Remote browser access token
    #[arg(long, global = true, env = ENV_BROWSER_TOKEN, hide_env_values = true)]
    pub browser_token: Option<String>,

    /// Bound on page load and selector wait, in seconds
    #[arg(long, global = true, env = ENV_SCRAPE_TIMEOUT_SECS)]
    pub scrape_timeout_secs: Option<u64>,

    // Seat options
    /// Total seat capacity of the event
    #[arg(long, global = true, env = ENV_TOTAL_SEATS)]
    pub total_seats: Option<u32>,

    /// Maximum number of samples kept in the history
    #[arg(long, global = true, env = ENV_MAX_DATA_POINTS)]
    pub max_data_points: Option<usize>,

    /// Client poll interval in milliseconds
    #[arg(long, global = true, env = ENV_POLL_INTERVAL_MS)]
    pub poll_interval_ms: Option<u64>,
}

/// Parse store backend from CLI/env string
fn parse_store_backend(s: &str) -> Result<StoreBackend, String> {
    match s.to_lowercase().as_str() {
        "memory" => Ok(StoreBackend::Memory),
        "redis" => Ok(StoreBackend::Redis),
        _ => Err(format!(
            "Invalid store backend '{}'. Valid options: memory, redis",
            s
        )),
    }
}

/// Parse scraper backend from CLI/env string
fn parse_scraper_backend(s: &str) -> Result<ScraperBackend, String> {
    match s.to_lowercase().as_str() {
        "browser" | "chromium" => Ok(ScraperBackend::Browser),
        "http" => Ok(ScraperBackend::Http),
        _ => Err(format!(
            "Invalid scraper backend '{}'. Valid options: browser, http",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// Read the seat counter once and print it (does not touch the history)
    Scrape {
        /// Page to read instead of the configured event URL
        #[arg(long)]
        url: Option<String>,
    },
    /// Print the stored seat history, newest first
    History,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub cors_origins: Option<Vec<String>>,
    pub store_backend: Option<StoreBackend>,
    pub redis_url: Option<String>,
    pub redis_host: Option<String>,
    pub redis_port: Option<u16>,
    pub redis_password: Option<String>,
    pub series_key: Option<String>,
    pub scraper_backend: Option<ScraperBackend>,
    pub event_url: Option<String>,
    pub selector: Option<String>,
    pub browser_endpoint: Option<String>,
    pub browser_token: Option<String>,
    pub scrape_timeout_secs: Option<u64>,
    pub total_seats: Option<u32>,
    pub max_data_points: Option<usize>,
    pub poll_interval_ms: Option<u64>,
}

impl From<Cli> for CliConfig {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            config: cli.config,
            cors_origins: cli.cors_origins,
            store_backend: cli.store_backend,
            redis_url: cli.redis_url,
            redis_host: cli.redis_host,
            redis_port: cli.redis_port,
            redis_password: cli.redis_password,
            series_key: cli.series_key,
            scraper_backend: cli.scraper_backend,
            event_url: cli.event_url,
            selector: cli.selector,
            browser_endpoint: cli.browser_endpoint,
            browser_token: cli.browser_token,
            scrape_timeout_secs: cli.scrape_timeout_secs,
            total_seats: cli.total_seats,
            max_data_points: cli.max_data_points,
            poll_interval_ms: cli.poll_interval_ms,
        }
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let mut cli = Cli::parse();
    let command = cli.command.take();
    (cli.into(), command)
}

/// Parse an explicit argument list (first item is the binary name)
pub fn try_parse_from<I, T>(args: I) -> Result<(CliConfig, Option<Commands>), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut cli = Cli::try_parse_from(args)?;
    let command = cli.command.take();
    Ok((cli.into(), command))
}
