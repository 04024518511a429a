//! Constants for the exchange rate SDK
//!
//! These are the compile-time defaults behind [`ConverterConfig`](crate::config::ConverterConfig).
//! Nothing here is read from the environment.

/// How long a fetched rate table stays fresh (in seconds)
pub const RATE_CACHE_TTL_SECS: i64 = 60 * 60;

/// Quiet period after the last amount edit before converting (in milliseconds)
pub const DEBOUNCE_DELAY_MS: u64 = 500;

/// How often the cache is dropped and rates are fetched again (in seconds)
pub const FORCED_REFRESH_INTERVAL_SECS: u64 = 10 * 60;

/// How often the "last updated" label is recomputed (in seconds)
pub const LAST_UPDATED_TICK_SECS: u64 = 30;

/// HTTP request timeout when fetching rates (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Primary provider: full rate table keyed by base currency in the path
pub const EXCHANGERATE_API_URL: &str = "https://api.exchangerate-api.com/v4/latest";

/// Fallback provider: server-side conversion with `amount`, `from`, `to` query parameters
pub const FRANKFURTER_API_URL: &str = "https://api.frankfurter.app/latest";

/// Flag images served per region code
pub const FLAGS_API_URL: &str = "https://flagsapi.com";

/// Source currency selected on startup
pub const DEFAULT_FROM_CURRENCY: &str = "USD";

/// Target currency selected on startup
pub const DEFAULT_TO_CURRENCY: &str = "BDT";

/// Amount input on startup and after a clear or a rejected amount
pub const DEFAULT_AMOUNT_INPUT: &str = "1";

/// Capacity of the conversion event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "exchange-rate-sdk/0.1.0";
