//! Frankfurter provider: server-side conversion of a single pair

use super::http::{build_client, read_body};
use crate::{
    config::ConverterConfig,
    error::ProviderError,
    provider::ConversionProvider,
    types::{CurrencyCode, FallbackQuote},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

/// Body of `GET {base_url}?amount=..&from=..&to=..`
#[derive(Debug, Deserialize)]
struct ConvertResponse {
    #[serde(default)]
    rates: Option<HashMap<String, f64>>,
}

/// Fallback provider backed by api.frankfurter.app
pub struct FrankfurterProvider {
    client: Client,
    base_url: String,
}

impl FrankfurterProvider {
    /// Creates a provider for the configured endpoint and timeout
    pub fn new(config: &ConverterConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(config.request_timeout())?,
            base_url: config.fallback_url.clone(),
        })
    }

    /// Amount sent upstream; zero is swapped for one so a unit rate can
    /// still be recovered
    fn query_amount(amount: f64) -> f64 {
        if amount > 0.0 {
            amount
        } else {
            1.0
        }
    }

    /// Parses a response body into a quote for `amount` of the source currency
    pub(crate) fn parse_response(
        body: &str,
        amount: f64,
        to: &CurrencyCode,
    ) -> Result<FallbackQuote, ProviderError> {
        let response: ConvertResponse = serde_json::from_str(body).map_err(|e| {
            ProviderError::InvalidResponse(format!(
                "Failed to parse Frankfurter response: {}. Response: {}",
                e, body
            ))
        })?;

        let converted = response
            .rates
            .and_then(|rates| rates.get(to.as_str()).copied())
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or(ProviderError::MissingRates {
                provider: "frankfurter",
            })?;

        let rate = converted / Self::query_amount(amount);
        Ok(FallbackQuote {
            rate,
            converted_amount: rate * amount,
        })
    }
}

#[async_trait]
impl ConversionProvider for FrankfurterProvider {
    async fn fetch_conversion(
        &self,
        amount: f64,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<FallbackQuote, ProviderError> {
        let query_amount = Self::query_amount(amount).to_string();
        tracing::debug!(url = %self.base_url, %from, %to, amount, "Requesting fallback conversion");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("amount", query_amount.as_str()),
                ("from", from.as_str()),
                ("to", to.as_str()),
            ])
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;
        let body = read_body(response).await?;

        Self::parse_response(&body, amount, to)
    }

    fn provider_name(&self) -> &'static str {
        "frankfurter"
    }
}
