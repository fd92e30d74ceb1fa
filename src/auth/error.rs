use thiserror::Error;

use super::store::StoreError;

/// Terminal failures of the credential lifecycle.
///
/// `Clone` so one in-flight acquisition can hand the same failure to every
/// caller waiting on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error("Authorization denied: {0}")]
    Denied(String),
    #[error("Timed out waiting for approval after {attempts} attempts")]
    Timeout { attempts: u32 },
    #[error("Copilot token exchange failed (status {status}): {message}")]
    Exchange { status: u16, message: String },
    #[error("Secret store error: {0}")]
    SecretStore(String),
}

impl AuthError {
    /// Human-actionable next step for this failure.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::Network(_) => "Check your network connection and try again.",
            Self::Decode(_) => "GitHub returned an unexpected response; try again later.",
            Self::Denied(_) => {
                "The device authorization was denied or expired. Run `ais auth login` to start over."
            }
            Self::Timeout { .. } => {
                "Timed out waiting for approval. Run `ais auth login` and enter the code promptly."
            }
            Self::Exchange { .. } => {
                "Your GitHub token was rejected. Run `ais auth logout`, then `ais auth login` to re-authenticate."
            }
            Self::SecretStore(_) => "The credential vault could not be accessed; check its permissions.",
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        Self::SecretStore(error.to_string())
    }
}
