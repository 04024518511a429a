//! Primary and fallback rate lookups

use crate::{
    error::ProviderError,
    metrics::MetricsCollector,
    provider::{ConversionProvider, RateTableProvider},
    types::{CurrencyCode, FallbackQuote, RateTable},
};
use std::sync::Arc;
use std::time::Instant;

/// Pairs a rate table provider with a server-side conversion fallback
///
/// `RateSource` only performs the lookups and records their outcome. Whether
/// the fallback is consulted is decided by the
/// [`ConversionEngine`](crate::engine::ConversionEngine).
pub struct RateSource {
    primary: Arc<dyn RateTableProvider>,
    fallback: Arc<dyn ConversionProvider>,
    primary_metrics: MetricsCollector,
    fallback_metrics: MetricsCollector,
}

impl RateSource {
    pub fn new(primary: Arc<dyn RateTableProvider>, fallback: Arc<dyn ConversionProvider>) -> Self {
        let primary_metrics = MetricsCollector::new(primary.provider_name());
        let fallback_metrics = MetricsCollector::new(fallback.provider_name());
        Self {
            primary,
            fallback,
            primary_metrics,
            fallback_metrics,
        }
    }

    /// Fetches the full rate table for `base` from the primary provider
    pub async fn fetch_primary(&self, base: &CurrencyCode) -> Result<RateTable, ProviderError> {
        let start = Instant::now();
        let result = self.primary.fetch_rates(base).await;
        self.primary_metrics
            .record_request(start.elapsed(), result.is_ok())
            .await;

        if let Err(e) = &result {
            tracing::warn!(
                provider = self.primary.provider_name(),
                base = %base,
                kind = ?e.kind(),
                error = %e,
                "Primary provider failed"
            );
        }
        result
    }

    /// Converts `amount` through the fallback provider
    pub async fn fetch_fallback(
        &self,
        amount: f64,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<FallbackQuote, ProviderError> {
        let start = Instant::now();
        let result = self.fallback.fetch_conversion(amount, from, to).await;
        self.fallback_metrics
            .record_request(start.elapsed(), result.is_ok())
            .await;

        match &result {
            Ok(quote) => tracing::info!(
                provider = self.fallback.provider_name(),
                %from,
                %to,
                rate = quote.rate,
                "Using fallback provider"
            ),
            Err(e) => tracing::warn!(
                provider = self.fallback.provider_name(),
                %from,
                %to,
                error = %e,
                "Fallback provider failed"
            ),
        }
        result
    }

    pub fn primary_metrics(&self) -> &MetricsCollector {
        &self.primary_metrics
    }

    pub fn fallback_metrics(&self) -> &MetricsCollector {
        &self.fallback_metrics
    }
}
