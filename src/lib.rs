//! # Exchange Rate SDK
//!
//! Converts amounts between fiat currencies using exchange rates from
//! off-chain HTTP providers, with a one hour rate cache and a single
//! fallback provider.
//!
//! ## Usage
//!
//! ```no_run
//! use exchange_rate_sdk::{ConverterConfig, CurrencyConverter, LogPresenter};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = Arc::new(CurrencyConverter::new(
//!     ConverterConfig::default(),
//!     Arc::new(LogPresenter),
//! )?);
//!
//! // Periodic forced refresh (10 min) and "last updated" tick (30 s)
//! let _scheduler = converter.start();
//!
//! converter.set_from("EUR").await?;
//! converter.set_amount_input("100").await; // converts after 500 ms of quiet
//!
//! match converter.submit().await {
//!     Some(Ok(conversion)) => println!("{}", conversion.rate_line()),
//!     Some(Err(e)) => eprintln!("Error: {}", e),
//!     None => println!("Conversion already in flight"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! RefreshScheduler / Debouncer / user action
//!     ↓
//! CurrencyConverter (selection state)
//!     ↓
//! ConversionEngine (in-flight guard)
//!     ↓
//! RateCache ── hit ──→ rate table
//!     ↓ miss
//! RateSource: primary (exchangerate-api) ── network error ──→ fallback (Frankfurter)
//!     ↓
//! PresentationPort (your UI)
//! ```

pub mod config;
pub mod constants;
pub mod converter;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod presentation;
pub mod provider;
pub mod providers;
pub mod scheduler;
pub mod source;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::ConverterConfig;
pub use converter::{CurrencyConverter, Selection};
pub use engine::{ConversionEngine, LastSuccess};
pub use error::{ConversionError, ConverterError, ErrorKind, ProviderError, SelectionError};
pub use metrics::{ConverterMetrics, SourceMetrics};
pub use presentation::{LogPresenter, NoopPresenter, Notice, NoticeLevel, PresentationPort};
pub use scheduler::{Debouncer, RefreshScheduler};
pub use source::RateSource;
pub use store::RateCache;
pub use types::{
    ComponentHealth, Conversion, ConversionEvent, ConversionRequest, ConversionResult,
    CurrencyCode, HealthStatus, RateSourceKind, RateTable,
};
