//! exchangerate-api.com provider: full rate table per base currency

use super::http::{build_client, read_body};
use crate::{
    config::ConverterConfig,
    error::ProviderError,
    provider::RateTableProvider,
    types::{CurrencyCode, RateTable},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Instant;

/// Body of `GET {base_url}/{BASE}`
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    rates: Option<HashMap<String, f64>>,
}

/// Primary provider backed by the exchangerate-api `latest` endpoint
pub struct ExchangeRateApiProvider {
    client: Client,
    base_url: String,
}

impl ExchangeRateApiProvider {
    /// Creates a provider for the configured endpoint and timeout
    pub fn new(config: &ConverterConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(config.request_timeout())?,
            base_url: config.primary_url.trim_end_matches('/').to_string(),
        })
    }

    fn build_url(&self, base: &CurrencyCode) -> String {
        format!("{}/{}", self.base_url, base)
    }

    /// Parses a response body into a rate table for `base`
    pub(crate) fn parse_response(base: &CurrencyCode, body: &str) -> Result<RateTable, ProviderError> {
        let response: LatestRatesResponse = serde_json::from_str(body).map_err(|e| {
            ProviderError::InvalidResponse(format!(
                "Failed to parse exchangerate-api response: {}. Response: {}",
                e, body
            ))
        })?;

        let rates = response.rates.ok_or(ProviderError::MissingRates {
            provider: "exchangerate-api",
        })?;

        let table = RateTable::new(base.clone(), rates);
        if table.is_empty() {
            return Err(ProviderError::MissingRates {
                provider: "exchangerate-api",
            });
        }
        Ok(table)
    }
}

#[async_trait]
impl RateTableProvider for ExchangeRateApiProvider {
    async fn fetch_rates(&self, base: &CurrencyCode) -> Result<RateTable, ProviderError> {
        let url = self.build_url(base);
        let start = Instant::now();
        tracing::debug!(%url, "Fetching rate table");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;
        let body = read_body(response).await?;
        let table = Self::parse_response(base, &body)?;

        tracing::debug!(
            base = %base,
            rates = table.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Fetched rate table from exchangerate-api"
        );
        Ok(table)
    }

    fn provider_name(&self) -> &'static str {
        "exchangerate-api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s).unwrap()
    }

    #[test]
    fn test_parse_valid_body() {
        let body = r#"{
            "provider": "https://www.exchangerate-api.com",
            "base": "USD",
            "date": "2026-10-17",
            "time_last_updated": 1760659201,
            "rates": {"USD": 1, "BDT": 110.5, "EUR": 0.92}
        }"#;
        let table = ExchangeRateApiProvider::parse_response(&code("USD"), body).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rate(&code("BDT")), Some(110.5));
        assert_eq!(table.base(), &code("USD"));
    }

    #[test]
    fn test_missing_rates_is_data_error() {
        let err = ExchangeRateApiProvider::parse_response(&code("USD"), r#"{"base":"USD"}"#)
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingRates { .. }));
        assert_eq!(err.kind(), ErrorKind::DataError);
    }

    #[test]
    fn test_malformed_body_is_data_error() {
        let err = ExchangeRateApiProvider::parse_response(&code("USD"), "<html>").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
        assert!(!err.is_network());
    }

    #[test]
    fn test_url_uses_base_in_path() {
        let config = ConverterConfig {
            primary_url: "http://localhost:8080/v4/latest/".to_string(),
            ..ConverterConfig::default()
        };
        let provider = ExchangeRateApiProvider::new(&config).unwrap();
        assert_eq!(provider.build_url(&code("EUR")), "http://localhost:8080/v4/latest/EUR");
    }
}
