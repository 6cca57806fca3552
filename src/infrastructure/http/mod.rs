//! Live HTTP clients for the settlement rails, built on `reqwest`.

pub mod bank;
pub mod mpesa;
pub mod paypal;
pub mod stripe;
pub mod token;

use crate::error::{PayoutError, Result};
use reqwest::{Client, Response};
use std::time::Duration;

/// Builds the shared HTTP client with rustls and a request timeout.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .use_rustls_tls()
        .timeout(timeout)
        .build()
        .map_err(PayoutError::from)
}

/// Turns a non-2xx response into a transport error carrying the provider's body.
pub(crate) async fn ensure_success(provider: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(PayoutError::TransportError(format!(
        "{provider} request failed with status {}: {}",
        status.as_u16(),
        body.trim()
    )))
}
