// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "SeatWatch";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "seatwatch";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".seatwatch";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "seatwatch.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "SEATWATCH_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "SEATWATCH_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "SEATWATCH_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "SEATWATCH_LOG";

/// Environment variable for extra CORS origins (comma-separated)
pub const ENV_CORS_ORIGINS: &str = "SEATWATCH_CORS_ORIGINS";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5390;

// =============================================================================
// Environment Variables - History Store
// =============================================================================

/// Environment variable for store backend (memory or redis)
pub const ENV_STORE_BACKEND: &str = "SEATWATCH_STORE_BACKEND";

/// Environment variable for a full Redis connection URL
pub const ENV_REDIS_URL: &str = "SEATWATCH_REDIS_URL";

/// Environment variable for Redis host (used when no URL is given)
pub const ENV_REDIS_HOST: &str = "SEATWATCH_REDIS_HOST";

/// Environment variable for Redis port
pub const ENV_REDIS_PORT: &str = "SEATWATCH_REDIS_PORT";

/// Environment variable for Redis password
pub const ENV_REDIS_PASSWORD: &str = "SEATWATCH_REDIS_PASSWORD";

/// Environment variable for the history list key
pub const ENV_SERIES_KEY: &str = "SEATWATCH_SERIES_KEY";

// =============================================================================
// History Store Defaults
// =============================================================================

/// Default Redis port
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Default key of the seat history list
pub const DEFAULT_SERIES_KEY: &str = "seatwatch:seats:history";

/// Maximum pooled Redis connections
pub const REDIS_POOL_MAX_SIZE: usize = 16;

/// Timeout for acquiring, creating and recycling pooled connections
pub const REDIS_POOL_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// Environment Variables - Scraper
// =============================================================================

/// Environment variable for scraper backend (browser or http)
pub const ENV_SCRAPER_BACKEND: &str = "SEATWATCH_SCRAPER_BACKEND";

/// Environment variable for the registration page URL
pub const ENV_EVENT_URL: &str = "SEATWATCH_EVENT_URL";

/// Environment variable for the CSS selector holding the seat counter
pub const ENV_SELECTOR: &str = "SEATWATCH_SELECTOR";

/// Environment variable for a remote browser WebSocket endpoint
pub const ENV_BROWSER_ENDPOINT: &str = "SEATWATCH_BROWSER_ENDPOINT";

/// Environment variable for the remote browser access token
pub const ENV_BROWSER_TOKEN: &str = "SEATWATCH_BROWSER_TOKEN";

/// Environment variable for the scrape timeout in seconds
pub const ENV_SCRAPE_TIMEOUT_SECS: &str = "SEATWATCH_SCRAPE_TIMEOUT_SECS";

// =============================================================================
// Scraper Defaults
// =============================================================================

/// Default registration page
pub const DEFAULT_EVENT_URL: &str =
    "https://gravitas.vit.ac.in/events/ea3eb2e8-7036-4265-9c9d-ecb8866d176b";

/// Default selector of the "seats left" label
pub const DEFAULT_SEAT_SELECTOR: &str = ".slots button p:last-child";

/// Default bound on page load and selector wait
pub const DEFAULT_SCRAPE_TIMEOUT_SECS: u64 = 30;

/// Interval between selector lookups while waiting for the element
pub const SELECTOR_POLL_INTERVAL_MS: u64 = 100;

/// User agent for plain HTTP scraping
pub const SCRAPER_USER_AGENT: &str = concat!("seatwatch/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Environment Variables - Seats
// =============================================================================

/// Environment variable for the event's total seat capacity
pub const ENV_TOTAL_SEATS: &str = "SEATWATCH_TOTAL_SEATS";

/// Environment variable for the history cap
pub const ENV_MAX_DATA_POINTS: &str = "SEATWATCH_MAX_DATA_POINTS";

/// Environment variable for the client poll interval
pub const ENV_POLL_INTERVAL_MS: &str = "SEATWATCH_POLL_INTERVAL_MS";

// =============================================================================
// Seats Defaults
// =============================================================================

/// Default total seat capacity
pub const DEFAULT_TOTAL_SEATS: u32 = 800;

/// Default number of samples retained in the history
pub const DEFAULT_MAX_DATA_POINTS: usize = 100;

/// Default client poll interval
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

// =============================================================================
// HTTP
// =============================================================================

/// Default request body limit (the API is read-only)
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

/// Cache-Control value for responses that must never be cached
pub const NO_STORE_CACHE_CONTROL: &str = "no-store, max-age=0, must-revalidate";
