use std::time::Duration;

use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Serialize;

use crate::auth::device_code::{DeviceAuthorization, DeviceGrant, PollOutcome};
use crate::auth::error::AuthError;
use crate::provider::github_copilot::COPILOT_USER_AGENT;
use crate::util::poll::{Attempt, PollSchedule};

pub const DEFAULT_CLIENT_ID: &str = "Iv1.b507a08c87ecfe98";
pub const DEFAULT_DEVICE_CODE_URL: &str = "https://github.com/login/device/code";
pub const DEFAULT_ACCESS_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;

const DEVICE_SCOPE: &str = "read:user";
const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// GitHub OAuth device-authorization client.
///
/// # Example
/// ```no_run
/// use ais::auth::DeviceFlowClient;
///
/// # async fn example() -> Result<(), ais::auth::AuthError> {
/// let client = DeviceFlowClient::new();
/// let authorization = client.request_device_code().await?;
/// println!("{} {}", authorization.verification_uri, authorization.user_code);
/// let grant = client.poll_until_approved(&authorization).await?;
/// # let _ = grant;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DeviceFlowClient {
    client: reqwest::Client,
    client_id: String,
    device_code_url: String,
    access_token_url: String,
    max_attempts: u32,
    interval_override: Option<Duration>,
}

impl Default for DeviceFlowClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceFlowClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            device_code_url: DEFAULT_DEVICE_CODE_URL.to_string(),
            access_token_url: DEFAULT_ACCESS_TOKEN_URL.to_string(),
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            interval_override: None,
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_device_code_url(mut self, url: impl Into<String>) -> Self {
        self.device_code_url = url.into();
        self
    }

    pub fn with_access_token_url(mut self, url: impl Into<String>) -> Self {
        self.access_token_url = url.into();
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Poll at this spacing instead of the server-provided interval.
    pub fn with_interval_override(mut self, interval: Duration) -> Self {
        self.interval_override = Some(interval);
        self
    }

    /// Ask GitHub for a new device code.
    pub async fn request_device_code(&self) -> Result<DeviceAuthorization, AuthError> {
        let resp = self
            .client
            .post(&self.device_code_url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, COPILOT_USER_AGENT)
            .json(&DeviceCodeRequest {
                client_id: &self.client_id,
                scope: DEVICE_SCOPE,
            })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AuthError::Network(format!(
                "Device code request failed with status {}",
                resp.status()
            )));
        }
        let body = resp.text().await?;
        let authorization: DeviceAuthorization = serde_json::from_str(&body).map_err(|e| {
            AuthError::Decode(format!("Device code response did not match schema: {e}"))
        })?;
        tracing::debug!(
            verification_uri = %authorization.verification_uri,
            interval = authorization.interval,
            expires_in = authorization.expires_in,
            "received device code"
        );
        Ok(authorization)
    }

    /// Poll the token endpoint once.
    pub async fn poll_once(&self, device_code: &str) -> Result<PollOutcome, AuthError> {
        let resp = self
            .client
            .post(&self.access_token_url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, COPILOT_USER_AGENT)
            .json(&DeviceTokenRequest {
                client_id: &self.client_id,
                device_code,
                grant_type: DEVICE_GRANT_TYPE,
            })
            .send()
            .await?;
        let body = resp.text().await?;
        Ok(PollOutcome::classify(&body))
    }

    /// Poll until the user approves, denies, or the attempt budget runs out.
    ///
    /// Only `authorization_pending` is retried; a denial or an unrecognised
    /// response ends the attempt immediately.
    pub async fn poll_until_approved(
        &self,
        authorization: &DeviceAuthorization,
    ) -> Result<DeviceGrant, AuthError> {
        let interval = self
            .interval_override
            .unwrap_or_else(|| Duration::from_secs(authorization.interval));
        let schedule = PollSchedule::new(self.max_attempts, interval);
        let device_code = authorization.device_code.as_str();

        let grant = schedule
            .run(|attempt| async move {
                match self.poll_once(device_code).await? {
                    PollOutcome::Approved(grant) => {
                        tracing::info!(attempt, "device code approved");
                        Ok(Attempt::Done(grant))
                    }
                    PollOutcome::Pending => Ok(Attempt::Retry),
                    PollOutcome::Denied(reason) => {
                        tracing::warn!(attempt, %reason, "device authorization rejected");
                        Err(AuthError::Denied(reason))
                    }
                    PollOutcome::Malformed(raw) => {
                        tracing::error!(attempt, "unrecognised device token response");
                        Err(AuthError::Decode(format!(
                            "Unrecognised device token response: {raw}"
                        )))
                    }
                }
            })
            .await?;

        grant.ok_or(AuthError::Timeout {
            attempts: self.max_attempts,
        })
    }
}

#[derive(Debug, Serialize)]
struct DeviceCodeRequest<'a> {
    client_id: &'a str,
    scope: &'a str,
}

#[derive(Debug, Serialize)]
struct DeviceTokenRequest<'a> {
    client_id: &'a str,
    device_code: &'a str,
    grant_type: &'a str,
}
