//! Conversion engine
//!
//! Resolves a rate for a [`ConversionRequest`] through the cache, the primary
//! provider and, on transport failure, the fallback provider. At most one
//! conversion runs at a time; requests arriving meanwhile are dropped.

use crate::{
    error::{ConversionError, ProviderError},
    metrics::{CacheCounters, ConverterMetrics},
    presentation::PresentationPort,
    source::RateSource,
    store::RateCache,
    types::{Conversion, ConversionRequest, ConversionResult, RateSourceKind},
};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// When and from where the last successful conversion came
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastSuccess {
    pub at: DateTime<Utc>,
    pub source: RateSourceKind,
}

/// Clears the in-flight flag when the conversion ends, however it ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Reports loading on creation and its end on drop, so an aborted
/// conversion still clears the host's loading state
struct LoadingGuard<'a>(&'a dyn PresentationPort);

impl<'a> LoadingGuard<'a> {
    fn begin(presenter: &'a dyn PresentationPort) -> Self {
        presenter.on_loading_change(true);
        Self(presenter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.on_loading_change(false);
    }
}

/// Orchestrates cache, rate source and presentation for each conversion
pub struct ConversionEngine {
    cache: Arc<RateCache>,
    source: RateSource,
    presenter: Arc<dyn PresentationPort>,
    in_flight: AtomicBool,
    last_success: RwLock<Option<LastSuccess>>,
    cache_counters: CacheCounters,
}

impl ConversionEngine {
    pub fn new(
        cache: Arc<RateCache>,
        source: RateSource,
        presenter: Arc<dyn PresentationPort>,
    ) -> Self {
        Self {
            cache,
            source,
            presenter,
            in_flight: AtomicBool::new(false),
            last_success: RwLock::new(None),
            cache_counters: CacheCounters::default(),
        }
    }

    /// Converts using the current time
    ///
    /// # Returns
    /// `None` if another conversion was already in flight and this one was
    /// dropped, otherwise the outcome (also delivered to the presentation port)
    pub async fn convert(&self, request: &ConversionRequest) -> Option<ConversionResult> {
        self.convert_at(request, Utc::now()).await
    }

    /// Converts as of `now`
    pub async fn convert_at(
        &self,
        request: &ConversionRequest,
        now: DateTime<Utc>,
    ) -> Option<ConversionResult> {
        self.run(request, now, false).await
    }

    /// Drops the cached table and converts, unless a conversion is in flight
    pub async fn refresh_at(
        &self,
        request: &ConversionRequest,
        now: DateTime<Utc>,
    ) -> Option<ConversionResult> {
        self.run(request, now, true).await
    }

    /// True while a conversion is outstanding
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn last_success(&self) -> Option<LastSuccess> {
        *self.last_success.read().await
    }

    pub fn cache(&self) -> &Arc<RateCache> {
        &self.cache
    }

    pub fn presenter(&self) -> &Arc<dyn PresentationPort> {
        &self.presenter
    }

    /// Snapshot of source and cache metrics
    pub async fn metrics(&self) -> ConverterMetrics {
        ConverterMetrics {
            primary: self.source.primary_metrics().get_metrics().await,
            fallback: self.source.fallback_metrics().get_metrics().await,
            cache_hits: self.cache_counters.hits(),
            cache_misses: self.cache_counters.misses(),
        }
    }

    fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(&self.in_flight))
    }

    async fn run(
        &self,
        request: &ConversionRequest,
        now: DateTime<Utc>,
        force_refresh: bool,
    ) -> Option<ConversionResult> {
        let Some(_guard) = self.try_begin() else {
            tracing::debug!(from = %request.from, to = %request.to, "Conversion in flight, dropping request");
            return None;
        };

        if force_refresh {
            self.cache.invalidate().await;
        }

        if !request.amount.is_finite() || request.amount < 0.0 {
            let result = Err(ConversionError::InvalidAmount {
                amount: request.amount,
            });
            self.presenter.on_result(&result);
            return Some(result);
        }

        let _loading = LoadingGuard::begin(self.presenter.as_ref());
        let result = self.resolve(request, now).await;

        match &result {
            Ok(conversion) => {
                *self.last_success.write().await = Some(LastSuccess {
                    at: now,
                    source: conversion.source,
                });
                self.presenter.on_result(&result);
                self.presenter
                    .on_rate_display(&conversion.from, &conversion.to, conversion.rate);
            }
            Err(_) => self.presenter.on_result(&result),
        }

        Some(result)
    }

    /// Finds a rate for the request and applies it
    async fn resolve(&self, request: &ConversionRequest, now: DateTime<Utc>) -> ConversionResult {
        let cached = self.cache.get(&request.from, now).await;
        self.cache_counters.record(cached.is_some());

        let table = match cached {
            Some(table) => table,
            None => match self.source.fetch_primary(&request.from).await {
                Ok(table) => self.cache.put(request.from.clone(), table, now).await,
                Err(e) if e.is_network() => return self.resolve_fallback(request, e, now).await,
                Err(e) => return Err(ConversionError::from_provider(&e)),
            },
        };

        // a missing target never goes to the fallback
        let rate = table
            .rate(&request.to)
            .ok_or_else(|| ConversionError::CurrencyUnavailable {
                currency: request.to.to_string(),
            })?;

        Ok(Conversion::new(
            request,
            rate,
            request.amount * rate,
            RateSourceKind::Primary,
            now,
        ))
    }

    /// Single fallback hop; its answer is never cached
    async fn resolve_fallback(
        &self,
        request: &ConversionRequest,
        primary_error: ProviderError,
        now: DateTime<Utc>,
    ) -> ConversionResult {
        match self
            .source
            .fetch_fallback(request.amount, &request.from, &request.to)
            .await
        {
            Ok(quote) => Ok(Conversion::new(
                request,
                quote.rate,
                quote.converted_amount,
                RateSourceKind::Fallback,
                now,
            )),
            Err(fallback_error) => {
                tracing::error!(
                    from = %request.from,
                    to = %request.to,
                    primary = %primary_error,
                    fallback = %fallback_error,
                    "All exchange rate sources failed"
                );
                Err(ConversionError::AllSourcesUnavailable {
                    primary: primary_error.to_string(),
                    fallback: fallback_error.to_string(),
                })
            }
        }
    }
}
