//! Single-entry rate table cache with a fixed TTL

use crate::{
    constants::RATE_CACHE_TTL_SECS,
    types::{CurrencyCode, RateTable},
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// The one live cache entry
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub base: CurrencyCode,
    pub table: Arc<RateTable>,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// True while `now` is strictly before expiry
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// In-memory cache holding the rate table for a single base currency
///
/// Storing a table for a new base replaces the previous one. Reads never
/// trigger a fetch.
pub struct RateCache {
    entry: RwLock<Option<CacheEntry>>,
    ttl: Duration,
}

impl RateCache {
    /// Creates a cache with the default one hour TTL
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(RATE_CACHE_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
        }
    }

    /// Returns the cached table if it is for `base` and has not expired
    pub async fn get(&self, base: &CurrencyCode, now: DateTime<Utc>) -> Option<Arc<RateTable>> {
        // base, table and expiry come from the same guard
        let entry = self.entry.read().await;
        match entry.as_ref() {
            Some(entry) if &entry.base == base && entry.is_fresh(now) => {
                tracing::debug!(base = %base, "Rate cache hit");
                Some(entry.table.clone())
            }
            Some(entry) if &entry.base == base => {
                tracing::debug!(base = %base, expired_at = %entry.expires_at, "Rate cache expired");
                None
            }
            _ => {
                tracing::debug!(base = %base, "Rate cache miss");
                None
            }
        }
    }

    /// Stores `table` for `base`, unconditionally replacing any prior entry
    pub async fn put(&self, base: CurrencyCode, table: RateTable, now: DateTime<Utc>) -> Arc<RateTable> {
        let table = Arc::new(table);
        let expires_at = now + self.ttl;
        tracing::debug!(base = %base, rates = table.len(), %expires_at, "Caching rate table");
        *self.entry.write().await = Some(CacheEntry {
            base,
            table: table.clone(),
            fetched_at: now,
            expires_at,
        });
        table
    }

    /// Drops the entry so the next `get` misses
    pub async fn invalidate(&self) {
        if self.entry.write().await.take().is_some() {
            tracing::debug!("Rate cache invalidated");
        }
    }

    /// Copy of the current entry, fresh or not
    pub async fn snapshot(&self) -> Option<CacheEntry> {
        self.entry.read().await.clone()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}
