//! Presentation boundary
//!
//! The engine never renders anything itself. It reports loading state,
//! results and rates through a [`PresentationPort`] supplied by the host UI.

pub mod regions;

use crate::{
    error::{ConversionError, ErrorKind},
    types::{ConversionResult, CurrencyCode, RateSourceKind},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sink for everything the converter wants to show the user
pub trait PresentationPort: Send + Sync {
    /// Called once per completed conversion attempt
    fn on_result(&self, result: &ConversionResult);

    /// Called with `true` before a lookup starts and `false` once it ends
    fn on_loading_change(&self, loading: bool);

    /// Called after a successful conversion with the unit rate
    fn on_rate_display(&self, from: &CurrencyCode, to: &CurrencyCode, rate: f64);

    /// Called with a fresh "last updated" label
    fn on_last_updated(&self, _label: &str) {}

    /// Called when the converter rewrites the amount input
    fn on_amount_input(&self, _text: &str) {}
}

/// Port that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPresenter;

impl PresentationPort for NoopPresenter {
    fn on_result(&self, _result: &ConversionResult) {}
    fn on_loading_change(&self, _loading: bool) {}
    fn on_rate_display(&self, _from: &CurrencyCode, _to: &CurrencyCode, _rate: f64) {}
}

/// Port that renders through `tracing`, for headless hosts and demos
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPresenter;

impl PresentationPort for LogPresenter {
    fn on_result(&self, result: &ConversionResult) {
        match result {
            Ok(conversion) => tracing::info!(
                amount = conversion.amount,
                from = %conversion.from,
                to = %conversion.to,
                converted = %conversion.amount_text(),
                source = %conversion.source,
                "Conversion complete"
            ),
            Err(e) => tracing::error!(kind = ?e.kind(), error = %e, "Conversion failed"),
        }
        if let Some(notice) = Notice::for_result(result) {
            tracing::info!(notice_level = ?notice.level, "{}", notice.message);
        }
    }

    fn on_loading_change(&self, loading: bool) {
        tracing::debug!(loading, "Loading state changed");
    }

    fn on_rate_display(&self, from: &CurrencyCode, to: &CurrencyCode, rate: f64) {
        tracing::info!("{}", crate::types::format_rate_line(from, to, rate));
    }

    fn on_last_updated(&self, label: &str) {
        tracing::debug!(label, "Last updated");
    }
}

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// Message the host should surface for a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    /// Picks the notice for a result, if any
    ///
    /// Primary successes and rejected amounts are silent. Fallback successes
    /// warn; everything else is a blocking error.
    pub fn for_result(result: &ConversionResult) -> Option<Self> {
        match result {
            Ok(conversion) if conversion.source == RateSourceKind::Fallback => Some(Self {
                level: NoticeLevel::Warning,
                message: "Using fallback API due to main service issues".to_string(),
            }),
            Ok(_) => None,
            Err(e) => Self::for_error(e),
        }
    }

    fn for_error(error: &ConversionError) -> Option<Self> {
        let message = match error.kind() {
            ErrorKind::InvalidAmount => return None,
            ErrorKind::AllSourcesUnavailable => {
                "All exchange rate services are currently unavailable. Please try again later."
            }
            ErrorKind::CurrencyUnavailable
            | ErrorKind::DataError
            | ErrorKind::NetworkError => "Failed to fetch exchange rate. Please try again.",
        };
        Some(Self {
            level: NoticeLevel::Error,
            message: message.to_string(),
        })
    }
}

/// Human label for the time since the last successful conversion
pub fn elapsed_label(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(since).num_seconds().max(0);
    if secs < 60 {
        "Just now".to_string()
    } else if secs < 3600 {
        plural(secs / 60, "minute")
    } else {
        plural(secs / 3600, "hour")
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}
