use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;

use crate::auth::error::AuthError;
use crate::auth::token::AccessToken;
use crate::provider::github_copilot::identification_headers;

pub const DEFAULT_COPILOT_TOKEN_URL: &str = "https://api.github.com/copilot_internal/v2/token";

/// Exchanges the long-lived GitHub token for a short-lived Copilot token.
#[derive(Debug, Clone)]
pub struct TokenExchangeClient {
    client: reqwest::Client,
    copilot_token_url: String,
}

impl Default for TokenExchangeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenExchangeClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            copilot_token_url: DEFAULT_COPILOT_TOKEN_URL.to_string(),
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_copilot_token_url(mut self, url: impl Into<String>) -> Self {
        self.copilot_token_url = url.into();
        self
    }

    pub async fn exchange(&self, refresh_token: &str) -> Result<AccessToken, AuthError> {
        let resp = self
            .client
            .get(&self.copilot_token_url)
            .headers(identification_headers())
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Bearer {refresh_token}"))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(AuthError::Exchange {
                status: status.as_u16(),
                message: if message.is_empty() {
                    status.to_string()
                } else {
                    message
                },
            });
        }
        let payload: CopilotTokenResponse = resp.json().await.map_err(|e| {
            AuthError::Decode(format!("Copilot token response did not match schema: {e}"))
        })?;
        let expires_at_ms = parse_expires_at(&payload.expires_at)?;
        tracing::debug!(expires_at_ms, "exchanged refresh token for Copilot token");
        Ok(AccessToken::new(payload.token, expires_at_ms))
    }
}

#[derive(Debug, Deserialize)]
struct CopilotTokenResponse {
    token: String,
    expires_at: serde_json::Value,
}

/// Upstream reports `expires_at` in seconds; the cache keeps milliseconds.
fn parse_expires_at(value: &serde_json::Value) -> Result<i64, AuthError> {
    let secs = match value {
        serde_json::Value::Number(num) => num.as_i64().or_else(|| {
            num.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        serde_json::Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| AuthError::Decode(format!("Copilot token expires_at invalid: {value}")))?;
    secs.checked_mul(1000)
        .ok_or_else(|| AuthError::Decode(format!("Copilot token expires_at out of range: {secs}")))
}
