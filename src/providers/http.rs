//! Response handling shared by the HTTP providers

use crate::{constants::USER_AGENT, error::ProviderError};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

/// Builds the client every provider uses
pub(crate) fn build_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(ProviderError::NetworkError)
}

/// Maps a non-2xx status to its error, keeping the body for diagnostics
pub(crate) fn check_status(status: StatusCode, body: &str) -> Result<(), ProviderError> {
    // Check for rate limiting
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimitExceeded);
    }

    if !status.is_success() {
        return Err(ProviderError::HttpStatus {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }

    Ok(())
}

/// Checks the status and reads the body as text
pub(crate) async fn read_body(response: Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().await;
    check_status(status, body.as_deref().unwrap_or_default())?;
    body.map_err(ProviderError::from_reqwest)
}
