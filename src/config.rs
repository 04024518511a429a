//! Runtime tunables for the converter
//!
//! Every field defaults to the matching value in [`constants`](crate::constants),
//! so an empty JSON object deserializes to the stock configuration.

use crate::constants::{
    DEBOUNCE_DELAY_MS, DEFAULT_AMOUNT_INPUT, DEFAULT_FROM_CURRENCY, DEFAULT_TO_CURRENCY,
    EXCHANGERATE_API_URL, FORCED_REFRESH_INTERVAL_SECS, FRANKFURTER_API_URL,
    LAST_UPDATED_TICK_SECS, RATE_CACHE_TTL_SECS, REQUEST_TIMEOUT_SECS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Converter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Lifetime of a cached rate table in seconds
    pub cache_ttl_secs: i64,
    /// Debounce quiet period for amount edits in milliseconds
    pub debounce_ms: u64,
    /// Interval of the forced refresh in seconds
    pub refresh_interval_secs: u64,
    /// Interval of the "last updated" label tick in seconds
    pub tick_interval_secs: u64,
    /// HTTP timeout for both providers in seconds
    pub request_timeout_secs: u64,
    /// Base URL of the primary (rate table) provider
    pub primary_url: String,
    /// Base URL of the fallback (server-side conversion) provider
    pub fallback_url: String,
    /// Initial source currency
    pub default_from: String,
    /// Initial target currency
    pub default_to: String,
    /// Initial amount input
    pub default_amount: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: RATE_CACHE_TTL_SECS,
            debounce_ms: DEBOUNCE_DELAY_MS,
            refresh_interval_secs: FORCED_REFRESH_INTERVAL_SECS,
            tick_interval_secs: LAST_UPDATED_TICK_SECS,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            primary_url: EXCHANGERATE_API_URL.to_string(),
            fallback_url: FRANKFURTER_API_URL.to_string(),
            default_from: DEFAULT_FROM_CURRENCY.to_string(),
            default_to: DEFAULT_TO_CURRENCY.to_string(),
            default_amount: DEFAULT_AMOUNT_INPUT.to_string(),
        }
    }
}

impl ConverterConfig {
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_ttl_secs)
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
