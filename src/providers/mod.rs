//! Exchange rate provider implementations

mod http;

pub mod exchangerate_api;
pub mod frankfurter;

pub use exchangerate_api::ExchangeRateApiProvider;
pub use frankfurter::FrankfurterProvider;
