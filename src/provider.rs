//! Provider abstractions for fetching exchange rates from external APIs

use crate::{
    error::ProviderError,
    types::{CurrencyCode, FallbackQuote, RateTable},
};
use async_trait::async_trait;

/// Provider that returns a full rate table for a base currency
///
/// Used as the primary source; its tables are cacheable.
#[async_trait]
pub trait RateTableProvider: Send + Sync {
    /// Fetches all rates relative to `base`
    ///
    /// # Returns
    /// The rate table, or `ProviderError` whose [`kind`](ProviderError::kind)
    /// tells transport failures apart from bad data
    async fn fetch_rates(&self, base: &CurrencyCode) -> Result<RateTable, ProviderError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

/// Provider that converts an amount server-side
///
/// Used as the fallback source. Its answers cover a single pair and are not cached.
#[async_trait]
pub trait ConversionProvider: Send + Sync {
    /// Converts `amount` from `from` into `to`
    async fn fetch_conversion(
        &self,
        amount: f64,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<FallbackQuote, ProviderError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    /// Canned provider answer; errors are rebuilt on every call since
    /// `ProviderError` is not `Clone`
    #[derive(Debug, Clone)]
    pub enum MockResponse {
        Rates(Vec<(String, f64)>),
        Quote(f64),
        HttpStatus(u16),
        Timeout,
        MissingRates,
    }

    impl MockResponse {
        fn error(&self) -> Option<ProviderError> {
            match self {
                MockResponse::HttpStatus(status) => Some(ProviderError::HttpStatus {
                    status: *status,
                    body: String::new(),
                }),
                MockResponse::Timeout => Some(ProviderError::Timeout),
                MockResponse::MissingRates => Some(ProviderError::MissingRates { provider: "mock" }),
                MockResponse::Rates(_) | MockResponse::Quote(_) => None,
            }
        }
    }

    /// Mock rate table provider for testing
    #[derive(Default)]
    pub struct MockRateProvider {
        responses: Mutex<HashMap<CurrencyCode, MockResponse>>,
        call_count: Mutex<usize>,
        gate: Option<Arc<Notify>>,
    }

    impl MockRateProvider {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every fetch waits for a permit on `gate` before answering
        pub fn gated(gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::default()
            }
        }

        pub fn set_rates(&self, base: &str, rates: &[(&str, f64)]) {
            let rates = rates.iter().map(|(c, r)| (c.to_string(), *r)).collect();
            self.set_response(base, MockResponse::Rates(rates));
        }

        pub fn set_response(&self, base: &str, response: MockResponse) {
            let base = CurrencyCode::new(base).unwrap();
            self.responses.lock().unwrap().insert(base, response);
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl RateTableProvider for MockRateProvider {
        async fn fetch_rates(&self, base: &CurrencyCode) -> Result<RateTable, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let response = self.responses.lock().unwrap().get(base).cloned();
            match response {
                Some(MockResponse::Rates(rates)) => Ok(RateTable::new(base.clone(), rates)),
                Some(other) => Err(other
                    .error()
                    .unwrap_or(ProviderError::MissingRates { provider: "mock" })),
                None => Err(ProviderError::HttpStatus {
                    status: 404,
                    body: format!("unknown base {}", base),
                }),
            }
        }

        fn provider_name(&self) -> &'static str {
            "mock-primary"
        }
    }

    /// Mock fallback provider for testing
    pub struct MockConversionProvider {
        response: Mutex<MockResponse>,
        call_count: Mutex<usize>,
    }

    impl Default for MockConversionProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockConversionProvider {
        /// Fails with HTTP 503 until told otherwise
        pub fn new() -> Self {
            Self {
                response: Mutex::new(MockResponse::HttpStatus(503)),
                call_count: Mutex::new(0),
            }
        }

        pub fn set_rate(&self, rate: f64) {
            *self.response.lock().unwrap() = MockResponse::Quote(rate);
        }

        pub fn set_response(&self, response: MockResponse) {
            *self.response.lock().unwrap() = response;
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl ConversionProvider for MockConversionProvider {
        async fn fetch_conversion(
            &self,
            amount: f64,
            _from: &CurrencyCode,
            _to: &CurrencyCode,
        ) -> Result<FallbackQuote, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            let response = self.response.lock().unwrap().clone();
            match response {
                MockResponse::Quote(rate) => Ok(FallbackQuote {
                    rate,
                    converted_amount: amount * rate,
                }),
                other => Err(other
                    .error()
                    .unwrap_or(ProviderError::MissingRates { provider: "mock" })),
            }
        }

        fn provider_name(&self) -> &'static str {
            "mock-fallback"
        }
    }
}
