//! Currency to region table used for validation and flag images

use crate::constants::FLAGS_API_URL;
use crate::error::SelectionError;
use crate::types::CurrencyCode;

/// Supported currencies and the region whose flag represents them
pub const CURRENCY_REGIONS: &[(&str, &str)] = &[
    ("AED", "AE"),
    ("ARS", "AR"),
    ("AUD", "AU"),
    ("BDT", "BD"),
    ("BGN", "BG"),
    ("BHD", "BH"),
    ("BRL", "BR"),
    ("CAD", "CA"),
    ("CHF", "CH"),
    ("CLP", "CL"),
    ("CNY", "CN"),
    ("COP", "CO"),
    ("CZK", "CZ"),
    ("DKK", "DK"),
    ("EGP", "EG"),
    ("EUR", "FR"),
    ("GBP", "GB"),
    ("HKD", "HK"),
    ("HUF", "HU"),
    ("IDR", "ID"),
    ("ILS", "IL"),
    ("INR", "IN"),
    ("ISK", "IS"),
    ("JPY", "JP"),
    ("KES", "KE"),
    ("KRW", "KR"),
    ("KWD", "KW"),
    ("LKR", "LK"),
    ("MAD", "MA"),
    ("MXN", "MX"),
    ("MYR", "MY"),
    ("NGN", "NG"),
    ("NOK", "NO"),
    ("NPR", "NP"),
    ("NZD", "NZ"),
    ("OMR", "OM"),
    ("PEN", "PE"),
    ("PHP", "PH"),
    ("PKR", "PK"),
    ("PLN", "PL"),
    ("QAR", "QA"),
    ("RON", "RO"),
    ("SAR", "SA"),
    ("SEK", "SE"),
    ("SGD", "SG"),
    ("THB", "TH"),
    ("TRY", "TR"),
    ("TWD", "TW"),
    ("UAH", "UA"),
    ("USD", "US"),
    ("VND", "VN"),
    ("ZAR", "ZA"),
];

/// Region code for a currency, if supported
pub fn region_for(code: &CurrencyCode) -> Option<&'static str> {
    CURRENCY_REGIONS
        .iter()
        .find(|(currency, _)| *currency == code.as_str())
        .map(|(_, region)| *region)
}

/// Parses `code` and checks it against the supported set
pub fn supported_currency(code: &str) -> Result<CurrencyCode, SelectionError> {
    let code = CurrencyCode::new(code)?;
    match region_for(&code) {
        Some(_) => Ok(code),
        None => Err(SelectionError::UnsupportedCurrency(code.to_string())),
    }
}

/// Flag image URL for a currency's region
pub fn flag_url(code: &CurrencyCode) -> Option<String> {
    region_for(code).map(|region| format!("{}/{}/flat/64.png", FLAGS_API_URL, region))
}

/// All supported codes in table order
pub fn supported_codes() -> impl Iterator<Item = &'static str> {
    CURRENCY_REGIONS.iter().map(|(currency, _)| *currency)
}
