use std::fmt;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use reqwest::Url;

use crate::utils::url::sanitize_redis_url;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_EVENT_URL, DEFAULT_HOST, DEFAULT_MAX_DATA_POINTS,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_PORT, DEFAULT_REDIS_PORT, DEFAULT_SCRAPE_TIMEOUT_SECS,
    DEFAULT_SEAT_SELECTOR, DEFAULT_SERIES_KEY, DEFAULT_TOTAL_SEATS, ENV_REDIS_HOST, ENV_REDIS_URL,
};

// =============================================================================
// Store Backend Enum
// =============================================================================

/// History store backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Redis,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Redis => write!(f, "redis"),
        }
    }
}

// =============================================================================
// Scraper Backend Enum
// =============================================================================

/// How the registration page is read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScraperBackend {
    /// Headless Chromium over CDP (renders client-side content)
    #[default]
    Browser,
    /// Plain HTTP fetch + static HTML parse
    Http,
}

impl fmt::Display for ScraperBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScraperBackend::Browser => write!(f, "browser"),
            ScraperBackend::Http => write!(f, "http"),
        }
    }
}

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cors_origins: Option<Vec<String>>,
}

/// Redis connection section (nested under store)
#[derive(Default, Clone, Deserialize)]
pub struct RedisFileConfig {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub password: Option<String>,
}

impl fmt::Debug for RedisFileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisFileConfig")
            .field("url", &self.url.as_deref().map(sanitize_redis_url))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// History store section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StoreFileConfig {
    pub backend: Option<StoreBackend>,
    pub series_key: Option<String>,
    pub redis: Option<RedisFileConfig>,
}

/// Scraper section
#[derive(Default, Clone, Deserialize)]
pub struct ScraperFileConfig {
    pub backend: Option<ScraperBackend>,
    pub event_url: Option<String>,
    pub selector: Option<String>,
    pub browser_endpoint: Option<String>,
    pub browser_token: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for ScraperFileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScraperFileConfig")
            .field("backend", &self.backend)
            .field("event_url", &self.event_url)
            .field("selector", &self.selector)
            .field("browser_endpoint", &self.browser_endpoint)
            .field("browser_token", &self.browser_token.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Seat counting section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SeatsFileConfig {
    pub total_seats: Option<u32>,
    pub max_data_points: Option<usize>,
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub store: Option<StoreFileConfig>,
    pub scraper: Option<ScraperFileConfig>,
    pub seats: Option<SeatsFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                current.host = server.host;
            }
            if server.port.is_some() {
                current.port = server.port;
            }
            if server.cors_origins.is_some() {
                current.cors_origins = server.cors_origins;
            }
        }

        if let Some(store) = other.store {
            let current = self.store.get_or_insert_with(StoreFileConfig::default);
            if store.backend.is_some() {
                tracing::trace!(backend = ?store.backend, "Merging store.backend");
                current.backend = store.backend;
            }
            if store.series_key.is_some() {
                current.series_key = store.series_key;
            }
            if let Some(redis) = store.redis {
                let current_redis = current.redis.get_or_insert_with(RedisFileConfig::default);
                if redis.url.is_some() {
                    current_redis.url = redis.url;
                }
                if redis.host.is_some() {
                    current_redis.host = redis.host;
                }
                if redis.port.is_some() {
                    current_redis.port = redis.port;
                }
                if redis.password.is_some() {
                    current_redis.password = redis.password;
                }
            }
        }

        if let Some(scraper) = other.scraper {
            let current = self.scraper.get_or_insert_with(ScraperFileConfig::default);
            if scraper.backend.is_some() {
                tracing::trace!(backend = ?scraper.backend, "Merging scraper.backend");
                current.backend = scraper.backend;
            }
            if scraper.event_url.is_some() {
                current.event_url = scraper.event_url;
            }
            if scraper.selector.is_some() {
                current.selector = scraper.selector;
            }
            if scraper.browser_endpoint.is_some() {
                current.browser_endpoint = scraper.browser_endpoint;
            }
            if scraper.browser_token.is_some() {
                current.browser_token = scraper.browser_token;
            }
            if scraper.timeout_secs.is_some() {
                current.timeout_secs = scraper.timeout_secs;
            }
        }

        if let Some(seats) = other.seats {
            let current = self.seats.get_or_insert_with(SeatsFileConfig::default);
            if seats.total_seats.is_some() {
                tracing::trace!(total_seats = ?seats.total_seats, "Merging seats.total_seats");
                current.total_seats = seats.total_seats;
            }
            if seats.max_data_points.is_some() {
                current.max_data_points = seats.max_data_points;
            }
            if seats.poll_interval_ms.is_some() {
                current.poll_interval_ms = seats.poll_interval_ms;
            }
        }

        if let (serde_json::Value::Object(current), serde_json::Value::Object(extra)) =
            (&mut self.extra, other.extra)
        {
            current.extend(extra);
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Extra browser origins allowed to call the API; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Resolved Redis connection
#[derive(Clone)]
pub struct RedisConfig {
    pub url: String,
}

impl fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConfig")
            .field("url", &sanitize_redis_url(&self.url))
            .finish()
    }
}

/// History store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub series_key: String,
    pub redis: Option<RedisConfig>,
}

/// Remote browser connection
#[derive(Clone)]
pub struct BrowserEndpointConfig {
    pub endpoint: String,
    pub token: Option<String>,
}

impl fmt::Debug for BrowserEndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserEndpointConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl BrowserEndpointConfig {
    /// WebSocket URL with the access token appended as `token` query parameter
    pub fn ws_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)
            .with_context(|| format!("Invalid browser endpoint: {}", self.endpoint))?;
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url)
    }
}

/// Scraper configuration
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub backend: ScraperBackend,
    pub event_url: String,
    pub selector: String,
    /// Remote browser; a local Chromium is launched when absent
    pub browser: Option<BrowserEndpointConfig>,
    pub timeout_secs: u64,
}

impl ScraperConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Seat counting configuration
#[derive(Debug, Clone, Copy)]
pub struct SeatsConfig {
    pub total_seats: u32,
    pub max_data_points: usize,
    pub poll_interval_ms: u64,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub scraper: ScraperConfig,
    pub seats: SeatsConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.seatwatch/seatwatch.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Some(path.clone())
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::from_layers(cli, file_config)?;
        config.validate()?;

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            store_backend = %config.store.backend,
            series_key = %config.store.series_key,
            scraper_backend = %config.scraper.backend,
            event_url = %config.scraper.event_url,
            remote_browser = config.scraper.browser.is_some(),
            total_seats = config.seats.total_seats,
            max_data_points = config.seats.max_data_points,
            poll_interval_ms = config.seats.poll_interval_ms,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Layer defaults -> file config -> CLI/env overrides
    fn from_layers(cli: &CliConfig, file_config: FileConfig) -> Result<Self> {
        let file_server = file_config.server.unwrap_or_default();
        let file_store = file_config.store.unwrap_or_default();
        let file_redis = file_store.redis.unwrap_or_default();
        let file_scraper = file_config.scraper.unwrap_or_default();
        let file_seats = file_config.seats.unwrap_or_default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
            cors_origins: cli
                .cors_origins
                .clone()
                .or(file_server.cors_origins)
                .unwrap_or_default()
                .into_iter()
                .map(|o| o.trim().trim_end_matches('/').to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        };

        // Redis: explicit URL wins, otherwise build one from host/port/password
        let redis_url = cli.redis_url.clone().or(file_redis.url);
        let redis_host = cli.redis_host.clone().or(file_redis.host);
        let redis_port = cli
            .redis_port
            .or(file_redis.port)
            .unwrap_or(DEFAULT_REDIS_PORT);
        let redis_password = cli.redis_password.clone().or(file_redis.password);
        let redis = match (redis_url, redis_host) {
            (Some(url), _) => Some(RedisConfig { url }),
            (None, Some(host)) => Some(RedisConfig {
                url: build_redis_url(&host, redis_port, redis_password.as_deref())?,
            }),
            (None, None) => None,
        };

        let store = StoreConfig {
            backend: cli
                .store_backend
                .or(file_store.backend)
                .unwrap_or_default(),
            series_key: cli
                .series_key
                .clone()
                .or(file_store.series_key)
                .unwrap_or_else(|| DEFAULT_SERIES_KEY.to_string()),
            redis,
        };

        let browser = cli
            .browser_endpoint
            .clone()
            .or(file_scraper.browser_endpoint)
            .filter(|e| !e.is_empty())
            .map(|endpoint| BrowserEndpointConfig {
                endpoint,
                token: cli.browser_token.clone().or(file_scraper.browser_token),
            });

        let scraper = ScraperConfig {
            backend: cli
                .scraper_backend
                .or(file_scraper.backend)
                .unwrap_or_default(),
            event_url: cli
                .event_url
                .clone()
                .or(file_scraper.event_url)
                .unwrap_or_else(|| DEFAULT_EVENT_URL.to_string()),
            selector: cli
                .selector
                .clone()
                .or(file_scraper.selector)
                .unwrap_or_else(|| DEFAULT_SEAT_SELECTOR.to_string()),
            browser,
            timeout_secs: cli
                .scrape_timeout_secs
                .or(file_scraper.timeout_secs)
                .unwrap_or(DEFAULT_SCRAPE_TIMEOUT_SECS),
        };

        let seats = SeatsConfig {
            total_seats: cli
                .total_seats
                .or(file_seats.total_seats)
                .unwrap_or(DEFAULT_TOTAL_SEATS),
            max_data_points: cli
                .max_data_points
                .or(file_seats.max_data_points)
                .unwrap_or(DEFAULT_MAX_DATA_POINTS),
            poll_interval_ms: cli
                .poll_interval_ms
                .or(file_seats.poll_interval_ms)
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        };

        Ok(Self {
            server,
            store,
            scraper,
            seats,
        })
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }

        // Port 0 would bind an ephemeral port the front end cannot find
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        if self.store.backend == StoreBackend::Redis
            && self.store.redis.as_ref().is_none_or(|r| r.url.is_empty())
        {
            anyhow::bail!(
                "Configuration error: a Redis URL or host is required when store.backend is 'redis'. \
                 Set {} or {} env var, or store.redis in config file.",
                ENV_REDIS_URL,
                ENV_REDIS_HOST
            );
        }

        if self.store.series_key.is_empty() {
            anyhow::bail!("Configuration error: store.series_key must not be empty");
        }

        if self.scraper.event_url.trim().is_empty() {
            anyhow::bail!("Configuration error: scraper.event_url must not be empty");
        }
        if !Url::parse(&self.scraper.event_url)
            .is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
        {
            anyhow::bail!(
                "Configuration error: scraper.event_url must be an http:// or https:// URL. Got: {}",
                self.scraper.event_url
            );
        }

        if self.scraper.selector.trim().is_empty() {
            anyhow::bail!("Configuration error: scraper.selector must not be empty");
        }
        if let Err(e) = scraper::Selector::parse(&self.scraper.selector) {
            anyhow::bail!(
                "Configuration error: scraper.selector '{}' is not a valid CSS selector: {}",
                self.scraper.selector,
                e
            );
        }

        if let Some(ref browser) = self.scraper.browser
            && !Url::parse(&browser.endpoint).is_ok_and(|u| matches!(u.scheme(), "ws" | "wss"))
        {
            anyhow::bail!(
                "Configuration error: scraper.browser_endpoint must be a ws:// or wss:// URL. Got: {}",
                browser.endpoint
            );
        }

        for origin in &self.server.cors_origins {
            if origin != "*"
                && !Url::parse(origin).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
            {
                anyhow::bail!(
                    "Configuration error: server.cors_origins entry '{}' must be '*' or an http(s) origin",
                    origin
                );
            }
        }

        if self.scraper.timeout_secs == 0 {
            anyhow::bail!("Configuration error: scraper.timeout_secs must be greater than 0");
        }

        if self.seats.total_seats == 0 {
            anyhow::bail!("Configuration error: seats.total_seats must be greater than 0");
        }
        if self.seats.max_data_points == 0 {
            anyhow::bail!("Configuration error: seats.max_data_points must be greater than 0");
        }
        if self.seats.poll_interval_ms == 0 {
            anyhow::bail!("Configuration error: seats.poll_interval_ms must be greater than 0");
        }

        // Every poll re-scrapes; very short intervals hammer the third-party page
        if self.seats.poll_interval_ms < 1_000 {
            tracing::warn!(
                poll_interval_ms = self.seats.poll_interval_ms,
                "seats.poll_interval_ms is below one second, every poll triggers a scrape"
            );
        }

        if self.scraper.backend == ScraperBackend::Http && self.scraper.browser.is_some() {
            tracing::warn!("scraper.browser_endpoint is ignored when scraper.backend is 'http'");
        }

        Ok(())
    }
}

/// Build a Redis URL from discrete connection parameters
///
/// The password is percent-encoded; IPv6 hosts are bracketed.
pub fn build_redis_url(host: &str, port: u16, password: Option<&str>) -> Result<String> {
    let mut url = Url::parse("redis://localhost")?;
    match host.parse::<IpAddr>() {
        Ok(ip) => url
            .set_ip_host(ip)
            .map_err(|_| anyhow::anyhow!("Invalid Redis host: {}", host))?,
        Err(_) => url
            .set_host(Some(host))
            .with_context(|| format!("Invalid Redis host: {}", host))?,
    }
    url.set_port(Some(port))
        .map_err(|_| anyhow::anyhow!("Invalid Redis port: {}", port))?;
    if let Some(password) = password.filter(|p| !p.is_empty()) {
        url.set_password(Some(password))
            .map_err(|_| anyhow::anyhow!("Cannot set Redis password"))?;
    }
    Ok(url.to_string())
}

/// Get the profile config path (~/.seatwatch/seatwatch.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Check if host binds to all network interfaces
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}
