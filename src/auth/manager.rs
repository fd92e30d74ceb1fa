//! Credential lifecycle: cached token, refresh, or full device flow.

use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};

use super::device_code::{ConsolePrompt, DevicePrompt};
use super::device_flow::DeviceFlowClient;
use super::error::AuthError;
use super::exchange::TokenExchangeClient;
use super::store::{
    SecretStore, StoreError, ACCESS_TOKEN_EXPIRES_KEY, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};
use super::token::{now_ms, AccessToken};

/// Source of "now" in milliseconds since the Unix epoch.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

type InFlight = Shared<BoxFuture<'static, Result<String, AuthError>>>;

/// What is currently stored, without touching the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialStatus {
    pub has_refresh_token: bool,
    pub access_token: Option<AccessToken>,
}

/// Owns the credential state machine.
///
/// Every dependency is injected, so tests can swap in a fake vault, mocked
/// endpoints, a recording prompt and a fixed clock. Clones share the same
/// in-flight acquisition.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use ais::auth::{CredentialManager, DeviceFlowClient, MemorySecretStore, TokenExchangeClient};
///
/// # async fn example() -> Result<(), ais::auth::AuthError> {
/// let manager = CredentialManager::new(
///     Arc::new(MemorySecretStore::new()),
///     DeviceFlowClient::new(),
///     TokenExchangeClient::new(),
/// );
/// let token = manager.get_token().await?;
/// # let _ = token;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CredentialManager {
    store: Arc<dyn SecretStore>,
    device_flow: Arc<DeviceFlowClient>,
    exchange: Arc<TokenExchangeClient>,
    prompt: Arc<dyn DevicePrompt>,
    clock: Clock,
    in_flight: Arc<Mutex<Option<InFlight>>>,
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("device_flow", &self.device_flow)
            .field("exchange", &self.exchange)
            .field("store", &"..")
            .finish()
    }
}

impl CredentialManager {
    pub fn new(
        store: Arc<dyn SecretStore>,
        device_flow: DeviceFlowClient,
        exchange: TokenExchangeClient,
    ) -> Self {
        Self {
            store,
            device_flow: Arc::new(device_flow),
            exchange: Arc::new(exchange),
            prompt: Arc::new(ConsolePrompt),
            clock: Arc::new(now_ms),
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_prompt(mut self, prompt: Arc<dyn DevicePrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn store(&self) -> &Arc<dyn SecretStore> {
        &self.store
    }

    /// Return a usable Copilot token, refreshing or authenticating as needed.
    ///
    /// Concurrent callers share one acquisition and all observe its result.
    /// The shared acquisition is forgotten once it settles, so a failed call
    /// can be retried.
    pub async fn get_token(&self) -> Result<String, AuthError> {
        let acquisition = {
            let mut slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            match slot.as_ref() {
                Some(existing) => {
                    tracing::debug!("joining in-flight token acquisition");
                    existing.clone()
                }
                None => {
                    let this = self.clone();
                    let fresh = async move { this.acquire_token().await }.boxed().shared();
                    *slot = Some(fresh.clone());
                    fresh
                }
            }
        };

        let result = acquisition.clone().await;

        let mut slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if slot
            .as_ref()
            .is_some_and(|current| current.ptr_eq(&acquisition))
        {
            *slot = None;
        }
        result
    }

    /// Run the device flow and store the resulting refresh token.
    ///
    /// Returns the new refresh token.
    pub async fn authenticate(&self) -> Result<String, AuthError> {
        tracing::info!("starting GitHub Copilot device authorization");
        let authorization = self.device_flow.request_device_code().await?;
        self.prompt.present(&authorization);
        let grant = self.device_flow.poll_until_approved(&authorization).await?;
        self.write_secret(REFRESH_TOKEN_KEY, grant.access_token.clone())
            .await?;
        tracing::info!("device authorization complete; refresh token stored");
        Ok(grant.access_token)
    }

    /// Force a fresh device flow, then exchange once to prove the grant works.
    pub async fn login(&self) -> Result<AccessToken, AuthError> {
        let refresh_token = self.authenticate().await?;
        self.refresh(&refresh_token).await
    }

    /// Delete every stored credential. Missing entries are fine.
    pub async fn logout(&self) -> Result<(), AuthError> {
        for key in [ACCESS_TOKEN_KEY, ACCESS_TOKEN_EXPIRES_KEY, REFRESH_TOKEN_KEY] {
            self.on_store(key, move |store| store.delete(key)).await?;
        }
        tracing::info!("stored Copilot credentials removed");
        Ok(())
    }

    pub async fn status(&self) -> Result<CredentialStatus, AuthError> {
        let has_refresh_token = match self.read_secret(REFRESH_TOKEN_KEY).await {
            Ok(_) => true,
            Err(StoreError::NotFound { .. }) => false,
            Err(e) => return Err(e.into()),
        };
        Ok(CredentialStatus {
            has_refresh_token,
            access_token: self.cached_access_token().await?,
        })
    }

    async fn acquire_token(&self) -> Result<String, AuthError> {
        if let Some(cached) = self.cached_access_token().await? {
            let now = (self.clock)();
            if cached.is_valid_at(now) {
                tracing::debug!("using cached Copilot token");
                return Ok(cached.token);
            }
            tracing::debug!(
                expires_at_ms = cached.expires_at_ms,
                now_ms = now,
                "cached Copilot token expired"
            );
        }

        let refresh_token = match self.read_secret(REFRESH_TOKEN_KEY).await {
            Ok(token) => token,
            Err(StoreError::NotFound { .. }) => {
                tracing::info!("no refresh token stored");
                self.authenticate().await?
            }
            Err(e) => return Err(e.into()),
        };

        let access = self.refresh(&refresh_token).await?;
        Ok(access.token)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, AuthError> {
        tracing::debug!("fetching new Copilot token");
        let access = self.exchange.exchange(refresh_token).await?;
        self.write_secret(ACCESS_TOKEN_KEY, access.token.clone())
            .await?;
        self.write_secret(ACCESS_TOKEN_EXPIRES_KEY, access.expires_at_ms.to_string())
            .await?;
        Ok(access)
    }

    async fn cached_access_token(&self) -> Result<Option<AccessToken>, AuthError> {
        let token = match self.read_secret(ACCESS_TOKEN_KEY).await {
            Ok(token) => token,
            Err(StoreError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let expires = match self.read_secret(ACCESS_TOKEN_EXPIRES_KEY).await {
            Ok(expires) => expires,
            Err(StoreError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match expires.trim().parse::<i64>() {
            Ok(expires_at_ms) => Ok(Some(AccessToken::new(token, expires_at_ms))),
            Err(_) => {
                tracing::warn!("stored Copilot token expiry is not a number; ignoring cache");
                Ok(None)
            }
        }
    }

    async fn read_secret(&self, key: &'static str) -> Result<String, StoreError> {
        self.on_store(key, move |store| store.read(key)).await
    }

    async fn write_secret(&self, key: &'static str, value: String) -> Result<(), StoreError> {
        self.on_store(key, move |store| store.write(key, &value))
            .await
    }

    /// Vault backends may block (keychain prompts, file IO), so every call
    /// runs on the blocking pool.
    async fn on_store<T, F>(&self, key: &'static str, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn SecretStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| StoreError::backend(key, format!("secret store task failed: {e}")))?
    }
}
