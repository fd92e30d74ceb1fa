use serde::Deserialize;

/// Device-code grant issued by GitHub for one authentication attempt.
///
/// # Example
/// ```
/// use ais::auth::DeviceAuthorization;
///
/// let authorization = DeviceAuthorization {
///     device_code: "abc".to_string(),
///     user_code: "WXYZ-1234".to_string(),
///     verification_uri: "https://github.com/login/device".to_string(),
///     expires_in: 900,
///     interval: 5,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceAuthorization {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    /// Lifetime of the device code, in seconds.
    pub expires_in: u64,
    /// Minimum spacing between polls, in seconds.
    pub interval: u64,
}

/// Access grant returned once the user approves the device code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceGrant {
    /// Long-lived GitHub token; stored as the refresh token.
    pub access_token: String,
    pub token_type: Option<String>,
    pub scope: Option<String>,
}

/// Result of a single poll of the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Approved(DeviceGrant),
    Pending,
    Denied(String),
    Malformed(String),
}

impl PollOutcome {
    /// Classify a raw token-endpoint body.
    ///
    /// Shapes are checked in order: a grant carrying `access_token`, the
    /// `authorization_pending` error, then any other string `error`.
    pub fn classify(body: &str) -> Self {
        let value: serde_json::Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(_) => return Self::Malformed(body.to_string()),
        };
        if let Some(access_token) = value.get("access_token").and_then(|v| v.as_str()) {
            return Self::Approved(DeviceGrant {
                access_token: access_token.to_string(),
                token_type: string_field(&value, "token_type"),
                scope: string_field(&value, "scope"),
            });
        }
        match value.get("error").and_then(|v| v.as_str()) {
            Some("authorization_pending") => Self::Pending,
            Some(error) => Self::Denied(error.to_string()),
            None => Self::Malformed(body.to_string()),
        }
    }
}

fn string_field(value: &serde_json::Value, name: &str) -> Option<String> {
    value.get(name).and_then(|v| v.as_str()).map(str::to_string)
}

/// Shows the verification URL and user code to whoever approves the grant.
pub trait DevicePrompt: Send + Sync {
    fn present(&self, authorization: &DeviceAuthorization);
}

/// Writes the device-code instructions to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrompt;

impl DevicePrompt for ConsolePrompt {
    fn present(&self, authorization: &DeviceAuthorization) {
        eprintln!("🔗 Open: {}", authorization.verification_uri);
        eprintln!("📋 Enter code: {}", authorization.user_code);
        eprintln!("⏳ Waiting for authorization...");
    }
}
