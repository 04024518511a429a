//! Error types for the exchange rate SDK

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of every failure the converter can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Amount was negative
    InvalidAmount,
    /// Transport failure or non-success HTTP status
    NetworkError,
    /// Response body was malformed or lacked a rates table
    DataError,
    /// Rate table was valid but did not contain the target currency
    CurrencyUnavailable,
    /// Primary and fallback providers both failed
    AllSourcesUnavailable,
}

/// Errors that can occur when fetching rates from a provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("HTTP error! status: {status}")]
    HttpStatus { status: u16, body: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Timeout waiting for response
    #[error("Request timeout")]
    Timeout,

    /// Body could not be parsed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Body parsed but carried no usable rates
    #[error("Invalid exchange rate data received from {provider}")]
    MissingRates { provider: &'static str },
}

impl ProviderError {
    /// Maps this error to the kind the engine uses to decide on fallback
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::NetworkError(e) if e.is_decode() => ErrorKind::DataError,
            ProviderError::NetworkError(_)
            | ProviderError::HttpStatus { .. }
            | ProviderError::RateLimitExceeded
            | ProviderError::Timeout => ErrorKind::NetworkError,
            ProviderError::InvalidResponse(_) | ProviderError::MissingRates { .. } => {
                ErrorKind::DataError
            }
        }
    }

    /// True when the request never produced a usable HTTP answer
    pub fn is_network(&self) -> bool {
        self.kind() == ErrorKind::NetworkError
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::NetworkError(err)
        }
    }
}

/// Failure variant of a conversion attempt
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConversionError {
    /// Amount below zero
    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    /// Primary provider could not be reached and no fallback was attempted
    #[error("Network error: {0}")]
    Network(String),

    /// Primary provider returned unusable data
    #[error("Data error: {0}")]
    Data(String),

    /// Target currency missing from an otherwise valid rate table
    #[error("Exchange rate not available for {currency}")]
    CurrencyUnavailable { currency: String },

    /// Both providers failed
    #[error("All exchange rate services are unavailable (primary: {primary}; fallback: {fallback})")]
    AllSourcesUnavailable { primary: String, fallback: String },
}

impl ConversionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            ConversionError::Network(_) => ErrorKind::NetworkError,
            ConversionError::Data(_) => ErrorKind::DataError,
            ConversionError::CurrencyUnavailable { .. } => ErrorKind::CurrencyUnavailable,
            ConversionError::AllSourcesUnavailable { .. } => ErrorKind::AllSourcesUnavailable,
        }
    }

    /// Converts a primary provider failure that will not be retried
    pub(crate) fn from_provider(err: &ProviderError) -> Self {
        match err.kind() {
            ErrorKind::NetworkError => ConversionError::Network(err.to_string()),
            _ => ConversionError::Data(err.to_string()),
        }
    }
}

/// Errors raised while editing the currency selection
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// Code is not in the currency to region table
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Code was blank
    #[error("Currency code is empty")]
    EmptyCode,
}

/// Errors raised while assembling a converter
#[derive(Debug, Error)]
pub enum ConverterError {
    /// An HTTP provider could not be built
    #[error("Failed to create provider: {0}")]
    Provider(#[from] ProviderError),

    /// A configured default currency is not supported
    #[error("Invalid default selection: {0}")]
    Selection(#[from] SelectionError),
}
