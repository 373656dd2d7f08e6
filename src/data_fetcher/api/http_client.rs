//! HTTP client creation and configuration utilities

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;

use crate::constants::{API_KEY_HEADER, HTTP_POOL_MAX_IDLE_PER_HOST};
use crate::error::AppError;

/// Creates the shared HTTP client: bounded timeout, connection pooling, and the
/// upstream credential attached as a default header on every request.
///
/// # Errors
/// * `AppError::Config` - If the API key contains characters not allowed in a header
/// * `AppError::ApiFetch` - If the client could not be built
pub fn create_http_client(api_key: &str, timeout_seconds: u64) -> Result<Client, AppError> {
    let mut headers = HeaderMap::new();
    let mut key = HeaderValue::from_str(api_key)
        .map_err(|e| AppError::config_error(format!("API key is not a valid header value: {e}")))?;
    key.set_sensitive(true);
    headers.insert(API_KEY_HEADER, key);

    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .pool_max_idle_per_host(HTTP_POOL_MAX_IDLE_PER_HOST)
        .default_headers(headers)
        .build()?)
}

/// Creates an HTTP client for testing with a short timeout
#[cfg(test)]
pub fn create_test_http_client() -> Client {
    create_http_client("test-key", 5).expect("Failed to create test HTTP client")
}
