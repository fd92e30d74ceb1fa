//! Copilot credential lifecycle: device-code flow, token exchange and storage.

pub mod device_code;
pub mod device_flow;
pub mod error;
pub mod exchange;
pub mod manager;
pub mod store;
pub mod token;
#[cfg(feature = "keyring")]
pub mod vault;

pub use device_code::{ConsolePrompt, DeviceAuthorization, DeviceGrant, DevicePrompt, PollOutcome};
pub use device_flow::DeviceFlowClient;
pub use error::AuthError;
pub use exchange::TokenExchangeClient;
pub use manager::{CredentialManager, CredentialStatus};
pub use store::{FileSecretStore, MemorySecretStore, SecretStore, StoreError};
pub use token::AccessToken;
#[cfg(feature = "keyring")]
pub use vault::KeyringSecretStore;
