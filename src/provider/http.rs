//! Shared HTTP client construction and status classification.

use std::time::Duration;

use crate::error::AisError;

/// Build the reqwest client used for every GitHub and Copilot call.
///
/// The timeout bounds each request; the device-flow poll loop has its own
/// attempt budget on top of it.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, AisError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .pool_max_idle_per_host(4)
        .build()
        .map_err(|e| AisError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Map a non-success Copilot API response to an error.
pub fn status_to_error(status: u16, body: &str) -> AisError {
    let message = extract_error_message(body).unwrap_or_else(|| body.to_string());
    match status {
        401 | 403 => AisError::Unauthorized(message),
        _ => AisError::api(status, message),
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    let error = value.get("error")?;
    error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map(str::to_string)
}
