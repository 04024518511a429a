//! Currency converter service
//!
//! Owns the user's selection (amount text, source and target currency) and
//! turns edits into conversions on the [`ConversionEngine`].

use crate::{
    config::ConverterConfig,
    constants::EVENT_CHANNEL_CAPACITY,
    engine::{ConversionEngine, LastSuccess},
    error::{ConversionError, ConverterError, SelectionError},
    metrics::ConverterMetrics,
    presentation::{elapsed_label, regions::supported_currency, PresentationPort},
    providers::{ExchangeRateApiProvider, FrankfurterProvider},
    scheduler::{Debouncer, RefreshScheduler},
    source::RateSource,
    store::RateCache,
    types::{
        ComponentHealth, ConversionEvent, ConversionRequest, ConversionResult, CurrencyCode,
        HealthStatus, RateSourceKind,
    },
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Label shown before any conversion has succeeded
const NEVER_UPDATED_LABEL: &str = "Not updated yet";

/// What the user currently has selected
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Raw amount text as typed
    pub amount_input: String,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl Selection {
    pub fn request(&self) -> ConversionRequest {
        ConversionRequest::from_input(&self.amount_input, self.from.clone(), self.to.clone())
    }
}

/// Currency converter
///
/// # Example
/// ```no_run
/// use exchange_rate_sdk::{ConverterConfig, CurrencyConverter, LogPresenter};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let converter = Arc::new(CurrencyConverter::new(
///     ConverterConfig::default(),
///     Arc::new(LogPresenter),
/// )?);
/// let _scheduler = converter.start();
///
/// converter.set_amount_input("250").await;
/// if let Some(Ok(conversion)) = converter.submit().await {
///     println!("{} {}", conversion.amount_text(), conversion.to);
/// }
/// # Ok(())
/// # }
/// ```
pub struct CurrencyConverter {
    engine: Arc<ConversionEngine>,
    selection: RwLock<Selection>,
    debouncer: Debouncer,
    events: broadcast::Sender<ConversionEvent>,
    config: ConverterConfig,
}

impl CurrencyConverter {
    /// Creates a converter backed by exchangerate-api with Frankfurter as fallback
    pub fn new(
        config: ConverterConfig,
        presenter: Arc<dyn PresentationPort>,
    ) -> Result<Self, ConverterError> {
        let source = RateSource::new(
            Arc::new(ExchangeRateApiProvider::new(&config)?),
            Arc::new(FrankfurterProvider::new(&config)?),
        );
        Ok(Self::with_source(config, source, presenter)?)
    }

    /// Creates a converter over a custom rate source
    ///
    /// This is primarily for testing with mock providers.
    pub fn with_source(
        config: ConverterConfig,
        source: RateSource,
        presenter: Arc<dyn PresentationPort>,
    ) -> Result<Self, SelectionError> {
        let selection = Selection {
            amount_input: config.default_amount.clone(),
            from: supported_currency(&config.default_from)?,
            to: supported_currency(&config.default_to)?,
        };
        let cache = Arc::new(RateCache::with_ttl(config.cache_ttl()));
        let engine = Arc::new(ConversionEngine::new(cache, source, presenter));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            engine,
            selection: RwLock::new(selection),
            debouncer: Debouncer::new(config.debounce_delay()),
            events,
            config,
        })
    }

    /// Starts the forced refresh and label tick timers
    pub fn start(self: &Arc<Self>) -> RefreshScheduler {
        RefreshScheduler::start(
            self.clone(),
            self.config.refresh_interval(),
            self.config.tick_interval(),
        )
    }

    pub async fn selection(&self) -> Selection {
        self.selection.read().await.clone()
    }

    /// Records new amount text and converts once typing pauses
    pub async fn set_amount_input(self: &Arc<Self>, input: impl Into<String>) {
        self.selection.write().await.amount_input = input.into();
        let this = self.clone();
        self.debouncer.schedule(async move {
            this.convert_now().await;
        });
    }

    /// Converts immediately, superseding any pending debounced conversion
    pub async fn submit(&self) -> Option<ConversionResult> {
        self.debouncer.cancel();
        self.convert_now().await
    }

    /// Selects the source currency and converts
    pub async fn set_from(&self, code: &str) -> Result<Option<ConversionResult>, SelectionError> {
        let code = supported_currency(code)?;
        self.selection.write().await.from = code;
        Ok(self.convert_now().await)
    }

    /// Selects the target currency and converts
    pub async fn set_to(&self, code: &str) -> Result<Option<ConversionResult>, SelectionError> {
        let code = supported_currency(code)?;
        self.selection.write().await.to = code;
        Ok(self.convert_now().await)
    }

    /// Exchanges source and target currency and converts
    pub async fn swap(&self) -> Option<ConversionResult> {
        {
            let mut selection = self.selection.write().await;
            let selection = &mut *selection;
            std::mem::swap(&mut selection.from, &mut selection.to);
        }
        self.convert_now().await
    }

    /// Resets the amount to its default and converts
    pub async fn clear(&self) -> Option<ConversionResult> {
        self.reset_amount().await;
        self.submit().await
    }

    /// Drops cached rates and converts, unless a conversion is in flight
    pub async fn refresh(&self) -> Option<ConversionResult> {
        let request = self.selection.read().await.request();
        let result = self.engine.refresh_at(&request, Utc::now()).await?;
        self.publish(ConversionEvent::CacheInvalidated {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
        });
        self.finish(&request, &result).await;
        Some(result)
    }

    /// Recomputes the "last updated" label and hands it to the port
    pub async fn tick(&self) -> String {
        let label = match self.engine.last_success().await {
            Some(last) => elapsed_label(last.at, Utc::now()),
            None => NEVER_UPDATED_LABEL.to_string(),
        };
        self.engine.presenter().on_last_updated(&label);
        label
    }

    /// Subscribes to conversion events
    pub fn subscribe(&self) -> broadcast::Receiver<ConversionEvent> {
        self.events.subscribe()
    }

    pub async fn last_success(&self) -> Option<LastSuccess> {
        self.engine.last_success().await
    }

    pub fn is_converting(&self) -> bool {
        self.engine.is_in_flight()
    }

    pub fn is_input_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn debounce_delay(&self) -> Duration {
        self.debouncer.delay()
    }

    pub fn engine(&self) -> &Arc<ConversionEngine> {
        &self.engine
    }

    /// Gets rate source metrics including latency percentiles and cache hits
    pub async fn metrics(&self) -> ConverterMetrics {
        self.engine.metrics().await
    }

    /// Perform a health check on the converter
    ///
    /// # Returns
    /// Healthy with a fresh primary table, Degraded when serving fallback
    /// quotes or an expired table, Unhealthy before the first success
    pub async fn health_check(&self) -> ComponentHealth {
        let now = Utc::now();
        let mut details = HashMap::new();

        let entry = self.engine.cache().snapshot().await;
        let cache_fresh = entry.as_ref().is_some_and(|e| e.is_fresh(now));
        if let Some(entry) = &entry {
            details.insert("cache_base".to_string(), serde_json::json!(entry.base));
            details.insert(
                "cache_expires_at".to_string(),
                serde_json::json!(entry.expires_at),
            );
        }
        details.insert("cache_fresh".to_string(), serde_json::json!(cache_fresh));

        let last = self.engine.last_success().await;
        if let Some(last) = last {
            details.insert("last_success_at".to_string(), serde_json::json!(last.at));
            details.insert("last_source".to_string(), serde_json::json!(last.source));
        }

        let metrics = self.metrics().await;
        details.insert(
            "primary_success_rate".to_string(),
            serde_json::json!(metrics.primary.success_rate),
        );
        details.insert(
            "fallback_success_rate".to_string(),
            serde_json::json!(metrics.fallback.success_rate),
        );
        details.insert(
            "cache_hit_rate".to_string(),
            serde_json::json!(metrics.cache_hit_rate()),
        );

        let status = match last {
            None => HealthStatus::Unhealthy,
            Some(last) if last.source == RateSourceKind::Primary && cache_fresh => {
                HealthStatus::Healthy
            }
            Some(_) => HealthStatus::Degraded,
        };

        let message = match status {
            HealthStatus::Healthy => "Converter is operational with fresh rates".to_string(),
            HealthStatus::Degraded if last.is_some_and(|l| l.source == RateSourceKind::Fallback) => {
                "Converter is serving fallback quotes".to_string()
            }
            HealthStatus::Degraded => "Converter rate table has expired".to_string(),
            HealthStatus::Unhealthy => "Converter has not completed a conversion".to_string(),
        };

        ComponentHealth {
            name: "currency_converter".to_string(),
            status,
            message: Some(message),
            details,
            last_checked: now,
        }
    }

    async fn convert_now(&self) -> Option<ConversionResult> {
        let request = self.selection.read().await.request();
        let result = self.engine.convert(&request).await?;
        self.finish(&request, &result).await;
        Some(result)
    }

    async fn finish(&self, request: &ConversionRequest, result: &ConversionResult) {
        match result {
            Ok(_) => {
                self.tick().await;
            }
            Err(ConversionError::InvalidAmount { .. }) => self.reset_amount().await,
            Err(_) => {}
        }
        self.publish(ConversionEvent::from_result(request, result, Utc::now()));
    }

    async fn reset_amount(&self) {
        let text = self.config.default_amount.clone();
        self.selection.write().await.amount_input = text.clone();
        self.engine.presenter().on_amount_input(&text);
    }

    fn publish(&self, event: ConversionEvent) {
        tracing::trace!(event = %event, "Publishing conversion event");
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::presentation::recording::{PortCall, RecordingPresenter};
    use crate::provider::mock::{MockConversionProvider, MockResponse, MockRateProvider};
    use tokio::time::sleep;

    struct Harness {
        converter: Arc<CurrencyConverter>,
        primary: Arc<MockRateProvider>,
        fallback: Arc<MockConversionProvider>,
        presenter: Arc<RecordingPresenter>,
    }

    fn harness() -> Harness {
        let primary = Arc::new(MockRateProvider::new());
        primary.set_rates("USD", &[("BDT", 110.5), ("EUR", 0.92), ("USD", 1.0)]);
        primary.set_rates("BDT", &[("USD", 0.00905), ("BDT", 1.0)]);
        let fallback = Arc::new(MockConversionProvider::new());
        let presenter = Arc::new(RecordingPresenter::default());
        let converter = CurrencyConverter::with_source(
            ConverterConfig::default(),
            RateSource::new(primary.clone(), fallback.clone()),
            presenter.clone(),
        )
        .unwrap();
        Harness {
            converter: Arc::new(converter),
            primary,
            fallback,
            presenter,
        }
    }

    #[tokio::test]
    async fn test_defaults() {
        let h = harness();
        let selection = h.converter.selection().await;
        assert_eq!(selection.amount_input, "1");
        assert_eq!(selection.from.as_str(), "USD");
        assert_eq!(selection.to.as_str(), "BDT");
        assert_eq!(h.converter.debounce_delay(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_unsupported_default_is_rejected() {
        let config = ConverterConfig {
            default_to: "XYZ".to_string(),
            ..ConverterConfig::default()
        };
        let source = RateSource::new(
            Arc::new(MockRateProvider::new()),
            Arc::new(MockConversionProvider::new()),
        );
        let err = CurrencyConverter::with_source(config, source, Arc::new(RecordingPresenter::default()))
            .err()
            .unwrap();
        assert_eq!(err, SelectionError::UnsupportedCurrency("XYZ".to_string()));
    }

    #[tokio::test]
    async fn test_submit_converts_current_selection() {
        let h = harness();
        let conversion = h.converter.submit().await.unwrap().unwrap();
        assert_eq!(conversion.converted_amount, 110.5);
        assert_eq!(conversion.rate_line(), "1 USD = 110.5000 BDT");
        assert!(h
            .presenter
            .calls()
            .contains(&PortCall::LastUpdated("Just now".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_amount_edits_are_debounced() {
        let h = harness();
        h.converter.set_amount_input("1").await;
        sleep(Duration::from_millis(100)).await;
        h.converter.set_amount_input("10").await;
        sleep(Duration::from_millis(100)).await;
        h.converter.set_amount_input("100").await;
        assert!(h.converter.is_input_pending());

        sleep(Duration::from_millis(600)).await;
        tokio::task::yield_now().await;

        let results = h.presenter.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().converted_amount, 11050.0);
        assert_eq!(h.primary.call_count(), 1);
    }

    #[tokio::test]
    async fn test_swap_and_select() {
        let h = harness();
        let swapped = h.converter.swap().await.unwrap().unwrap();
        assert_eq!(swapped.from.as_str(), "BDT");
        assert_eq!(swapped.to.as_str(), "USD");

        let err = h.converter.set_to("XYZ").await.unwrap_err();
        assert_eq!(err, SelectionError::UnsupportedCurrency("XYZ".to_string()));
        assert_eq!(h.converter.selection().await.to.as_str(), "USD");

        let same = h.converter.set_to("bdt").await.unwrap().unwrap().unwrap();
        assert_eq!(same.rate, 1.0);
    }

    #[tokio::test]
    async fn test_negative_amount_resets_input() {
        let h = harness();
        h.converter.set_amount_input("-3").await;
        let err = h.converter.submit().await.unwrap().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidAmount);
        assert_eq!(h.converter.selection().await.amount_input, "1");
        assert!(h.presenter.calls().contains(&PortCall::AmountInput("1".to_string())));
        assert_eq!(h.primary.call_count(), 0);
        assert!(!h.converter.is_input_pending());
    }

    #[tokio::test]
    async fn test_clear_restores_default_amount() {
        let h = harness();
        h.converter.set_amount_input("42").await;
        let conversion = h.converter.clear().await.unwrap().unwrap();
        assert_eq!(conversion.amount, 1.0);
        assert!(!h.converter.is_input_pending());
    }

    #[tokio::test]
    async fn test_refresh_refetches_and_publishes() {
        let h = harness();
        let mut events = h.converter.subscribe();

        h.converter.submit().await.unwrap().unwrap();
        h.converter.refresh().await.unwrap().unwrap();

        assert_eq!(h.primary.call_count(), 2);
        let types: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|e| e.event_type())
            .collect();
        assert_eq!(
            types,
            vec!["CONVERSION_COMPLETED", "CACHE_INVALIDATED", "CONVERSION_COMPLETED"]
        );
    }

    #[tokio::test]
    async fn test_refresh_with_negative_amount_still_drops_cache() {
        let h = harness();
        let mut events = h.converter.subscribe();

        h.converter.submit().await.unwrap().unwrap();
        h.converter.set_amount_input("-3").await;
        let err = h.converter.refresh().await.unwrap().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidAmount);
        assert!(h.converter.engine().cache().snapshot().await.is_none());
        assert_eq!(h.converter.selection().await.amount_input, "1");

        let types: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|e| e.event_type())
            .collect();
        assert_eq!(
            types,
            vec!["CONVERSION_COMPLETED", "CACHE_INVALIDATED", "CONVERSION_FAILED"]
        );
    }

    #[tokio::test]
    async fn test_tick_before_and_after_success() {
        let h = harness();
        assert_eq!(h.converter.tick().await, NEVER_UPDATED_LABEL);
        h.converter.submit().await.unwrap().unwrap();
        assert_eq!(h.converter.tick().await, "Just now");
    }

    #[tokio::test]
    async fn test_health_transitions() {
        let h = harness();
        assert_eq!(h.converter.health_check().await.status, HealthStatus::Unhealthy);

        h.converter.submit().await.unwrap().unwrap();
        let health = h.converter.health_check().await;
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.details["cache_base"], serde_json::json!("USD"));

        h.primary.set_response("USD", MockResponse::HttpStatus(503));
        h.fallback.set_rate(110.0);
        let fallback = h.converter.refresh().await.unwrap().unwrap();
        assert_eq!(fallback.source, RateSourceKind::Fallback);

        let health = h.converter.health_check().await;
        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.details["last_source"], serde_json::json!("fallback"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_forces_refresh_and_ticks() {
        let h = harness();
        h.converter.submit().await.unwrap().unwrap();
        assert_eq!(h.primary.call_count(), 1);

        let mut scheduler = h.converter.start();
        assert!(scheduler.is_running());

        // within the TTL, only the forced refresh hits the provider
        sleep(Duration::from_secs(10 * 60 + 1)).await;
        tokio::task::yield_now().await;
        assert_eq!(h.primary.call_count(), 2);

        let ticks = h
            .presenter
            .calls()
            .iter()
            .filter(|c| matches!(c, PortCall::LastUpdated(_)))
            .count();
        assert!(ticks >= 20);

        scheduler.stop();
        assert!(!scheduler.is_running());
    }
}
