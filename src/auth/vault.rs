//! OS credential vault backend.

use super::store::{SecretStore, StoreError};

/// Secret store backed by the platform keychain.
///
/// On Linux this is the kernel keyutils session keyring, which is cleared
/// at reboot.
///
/// The service name is the vault's service field and each key is an account
/// under it, so other applications sharing the vault cannot collide.
#[derive(Debug, Clone)]
pub struct KeyringSecretStore {
    service: String,
}

impl KeyringSecretStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, StoreError> {
        keyring::Entry::new(&self.service, key).map_err(|e| StoreError::backend(key, e.to_string()))
    }
}

impl SecretStore for KeyringSecretStore {
    fn read(&self, key: &str) -> Result<String, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(value),
            Err(keyring::Error::NoEntry) => Err(StoreError::NotFound {
                key: key.to_string(),
            }),
            Err(e) => Err(StoreError::backend(key, e.to_string())),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let entry = self.entry(key)?;
        // Some vaults reject adding an account that already exists.
        match entry.get_password() {
            Ok(_) => {
                tracing::debug!(key, "replacing existing keychain entry");
                self.delete(key)?;
            }
            Err(keyring::Error::NoEntry) => {}
            Err(e) => return Err(StoreError::backend(key, e.to_string())),
        }
        self.entry(key)?
            .set_password(value)
            .map_err(|e| StoreError::backend(key, e.to_string()))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StoreError::backend(key, e.to_string())),
        }
    }
}
