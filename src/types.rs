//! Types for the exchange rate SDK

use crate::error::{ConversionError, SelectionError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// ISO-style currency code such as `USD` or `BDT`
///
/// The core treats codes as opaque; only normalization happens here.
/// Membership in the supported set is checked by
/// [`presentation::regions`](crate::presentation::regions).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Creates a code, trimming whitespace and upper-casing
    pub fn new(code: impl AsRef<str>) -> Result<Self, SelectionError> {
        let code = code.as_ref().trim();
        if code.is_empty() {
            return Err(SelectionError::EmptyCode);
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Multipliers for every quoted currency relative to one base currency
///
/// Only finite, strictly positive rates are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    base: CurrencyCode,
    rates: HashMap<CurrencyCode, f64>,
}

impl RateTable {
    /// Builds a table from raw provider entries, dropping unusable ones
    pub fn new<I, K>(base: CurrencyCode, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut rates = HashMap::new();
        for (code, rate) in entries {
            if !(rate.is_finite() && rate > 0.0) {
                tracing::debug!(base = %base, code = code.as_ref(), rate, "Dropping non-positive rate");
                continue;
            }
            if let Ok(code) = CurrencyCode::new(code) {
                rates.insert(code, rate);
            }
        }
        Self { base, rates }
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    /// Rate for one unit of the base expressed in `target`
    pub fn rate(&self, target: &CurrencyCode) -> Option<f64> {
        self.rates.get(target).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Which provider produced a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSourceKind {
    /// Rate table from the primary provider (possibly cached)
    Primary,
    /// Server-side conversion from the fallback provider
    Fallback,
}

impl fmt::Display for RateSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateSourceKind::Primary => f.write_str("primary"),
            RateSourceKind::Fallback => f.write_str("fallback"),
        }
    }
}

/// One conversion attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub amount: f64,
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl ConversionRequest {
    pub fn new(amount: f64, from: CurrencyCode, to: CurrencyCode) -> Self {
        Self { amount, from, to }
    }

    /// Builds a request from raw amount text, see [`parse_amount_input`]
    pub fn from_input(input: &str, from: CurrencyCode, to: CurrencyCode) -> Self {
        Self::new(parse_amount_input(input), from, to)
    }
}

/// Pre-converted amount returned by the fallback provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackQuote {
    /// Unit rate recovered from the converted amount
    pub rate: f64,
    /// Converted amount as reported by the provider
    pub converted_amount: f64,
}

/// Successful conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub amount: f64,
    /// Unit rate `from` -> `to`
    pub rate: f64,
    /// Converted amount rounded to 2 decimal places
    pub converted_amount: f64,
    /// Converted amount at full precision
    pub raw_amount: f64,
    pub source: RateSourceKind,
    pub as_of: DateTime<Utc>,
}

impl Conversion {
    pub(crate) fn new(
        request: &ConversionRequest,
        rate: f64,
        raw_amount: f64,
        source: RateSourceKind,
        as_of: DateTime<Utc>,
    ) -> Self {
        Self {
            from: request.from.clone(),
            to: request.to.clone(),
            amount: request.amount,
            rate,
            converted_amount: round_to_cents(raw_amount),
            raw_amount,
            source,
            as_of,
        }
    }

    /// Display text for the converted amount, e.g. `11050.00`
    pub fn amount_text(&self) -> String {
        format!("{:.2}", self.converted_amount)
    }

    /// Display text for the rate, e.g. `1 USD = 110.5000 BDT`
    pub fn rate_line(&self) -> String {
        format_rate_line(&self.from, &self.to, self.rate)
    }
}

/// Outcome of a conversion attempt
pub type ConversionResult = Result<Conversion, ConversionError>;

/// Parses free-form amount text the way a permissive number field does
///
/// A leading numeric prefix is honoured (`"12abc"` is 12). Input without one,
/// or one that is not finite, falls back to 1. Negative values pass through so
/// the engine can reject them.
pub fn parse_amount_input(input: &str) -> f64 {
    let trimmed = input.trim();
    let end = numeric_prefix_len(trimmed);
    match trimmed[..end].parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 1.0,
    }
}

fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == b'-' || bytes[i] == b'+') {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut seen_digits = i > digits_start;
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > frac_start || seen_digits {
            seen_digits = seen_digits || j > frac_start;
            i = j;
        }
    }
    if !seen_digits {
        return 0;
    }
    // exponent only counts when followed by digits
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'-' || bytes[j] == b'+') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

/// Rounds half away from zero to 2 decimal places
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `1 FROM = RATE TO` with the rate at 4 decimal places
pub fn format_rate_line(from: &CurrencyCode, to: &CurrencyCode, rate: f64) -> String {
    format!("1 {} = {:.4} {}", from, rate, to)
}

/// Converter events for subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversionEvent {
    /// A conversion produced a value
    ConversionCompleted {
        id: Uuid,
        conversion: Conversion,
        timestamp: DateTime<Utc>,
    },

    /// A conversion failed
    ConversionFailed {
        id: Uuid,
        from: CurrencyCode,
        to: CurrencyCode,
        error: ConversionError,
        timestamp: DateTime<Utc>,
    },

    /// The rate cache was dropped ahead of a forced refresh
    CacheInvalidated { id: Uuid, timestamp: DateTime<Utc> },
}

impl ConversionEvent {
    pub(crate) fn from_result(
        request: &ConversionRequest,
        result: &ConversionResult,
        timestamp: DateTime<Utc>,
    ) -> Self {
        match result {
            Ok(conversion) => ConversionEvent::ConversionCompleted {
                id: Uuid::new_v4(),
                conversion: conversion.clone(),
                timestamp,
            },
            Err(error) => ConversionEvent::ConversionFailed {
                id: Uuid::new_v4(),
                from: request.from.clone(),
                to: request.to.clone(),
                error: error.clone(),
                timestamp,
            },
        }
    }

    /// Get the event ID
    pub fn id(&self) -> Uuid {
        match self {
            ConversionEvent::ConversionCompleted { id, .. } => *id,
            ConversionEvent::ConversionFailed { id, .. } => *id,
            ConversionEvent::CacheInvalidated { id, .. } => *id,
        }
    }

    /// Get the event type as string
    pub fn event_type(&self) -> &'static str {
        match self {
            ConversionEvent::ConversionCompleted { .. } => "CONVERSION_COMPLETED",
            ConversionEvent::ConversionFailed { .. } => "CONVERSION_FAILED",
            ConversionEvent::CacheInvalidated { .. } => "CACHE_INVALIDATED",
        }
    }
}

impl fmt::Display for ConversionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionEvent::ConversionCompleted { conversion, .. } => write!(
                f,
                "Converted {} {} = {} {} ({})",
                conversion.amount,
                conversion.from,
                conversion.amount_text(),
                conversion.to,
                conversion.source
            ),
            ConversionEvent::ConversionFailed {
                from, to, error, ..
            } => write!(f, "Conversion {} -> {} failed: {}", from, to, error),
            ConversionEvent::CacheInvalidated { .. } => write!(f, "Rate cache invalidated"),
        }
    }
}

/// Overall system health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Fresh rates from the primary provider
    Healthy,
    /// Working, but on fallback data or an expired cache
    Degraded,
    /// No conversion has ever succeeded
    Unhealthy,
}

/// Component health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s).unwrap()
    }

    #[test]
    fn test_currency_code_normalization() {
        assert_eq!(code(" usd ").as_str(), "USD");
        assert_eq!(CurrencyCode::new("  "), Err(SelectionError::EmptyCode));
        assert_eq!("bdt".parse::<CurrencyCode>().unwrap(), code("BDT"));
    }

    #[test]
    fn test_rate_table_drops_unusable_rates() {
        let table = RateTable::new(
            code("USD"),
            vec![("BDT", 110.5), ("EUR", 0.0), ("GBP", -1.0), ("JPY", f64::NAN)],
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.rate(&code("BDT")), Some(110.5));
        assert_eq!(table.rate(&code("EUR")), None);
        assert_eq!(table.base(), &code("USD"));
    }

    #[test]
    fn test_parse_amount_input() {
        assert_eq!(parse_amount_input("100"), 100.0);
        assert_eq!(parse_amount_input(" 12.5 "), 12.5);
        assert_eq!(parse_amount_input("12abc"), 12.0);
        assert_eq!(parse_amount_input(".5"), 0.5);
        assert_eq!(parse_amount_input("3."), 3.0);
        assert_eq!(parse_amount_input("1e3"), 1000.0);
        assert_eq!(parse_amount_input("2e"), 2.0);
        assert_eq!(parse_amount_input("-4"), -4.0);
        assert_eq!(parse_amount_input("0"), 0.0);
        assert_eq!(parse_amount_input(""), 1.0);
        assert_eq!(parse_amount_input("abc"), 1.0);
        assert_eq!(parse_amount_input("."), 1.0);
        assert_eq!(parse_amount_input("-"), 1.0);
    }

    #[test]
    fn test_conversion_rounding_and_labels() {
        let request = ConversionRequest::new(100.0, code("USD"), code("BDT"));
        let conversion = Conversion::new(&request, 110.5, 11050.0, RateSourceKind::Primary, Utc::now());
        assert_eq!(conversion.converted_amount, 11050.00);
        assert_eq!(conversion.amount_text(), "11050.00");
        assert_eq!(conversion.rate_line(), "1 USD = 110.5000 BDT");

        assert_eq!(round_to_cents(1.005 * 1000.0), 1005.0);
        assert_eq!(round_to_cents(2.345678), 2.35);
    }

    #[test]
    fn test_amount_text_rounds_ties_like_converted_amount() {
        let request = ConversionRequest::new(0.5, code("USD"), code("EUR"));
        let conversion = Conversion::new(&request, 0.25, 0.125, RateSourceKind::Primary, Utc::now());
        assert_eq!(conversion.converted_amount, 0.13);
        assert_eq!(conversion.amount_text(), "0.13");
        assert_eq!(conversion.raw_amount, 0.125);
    }

    #[test]
    fn test_event_serialization_tag() {
        let event = ConversionEvent::CacheInvalidated {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CACHE_INVALIDATED");
        assert_eq!(event.event_type(), "CACHE_INVALIDATED");
    }
}
