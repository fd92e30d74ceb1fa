//! Convenience re-exports for common use.

pub use crate::auth::{AccessToken, AuthError, CredentialManager, SecretStore};
pub use crate::config::{AisConfig, SecretBackend};
pub use crate::error::{AisError, Result};
pub use crate::provider::CopilotClient;
