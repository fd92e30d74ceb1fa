#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ais::auth::store::{ACCESS_TOKEN_EXPIRES_KEY, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use ais::auth::{
    CredentialManager, DeviceAuthorization, DeviceFlowClient, DevicePrompt, SecretStore,
    StoreError, TokenExchangeClient,
};
use wiremock::MockServer;

/// In-memory vault that counts operations and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    secrets: Mutex<HashMap<String, String>>,
    pub writes: AtomicUsize,
    pub deletes: AtomicUsize,
    broken: Mutex<Option<String>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, key: &str, value: &str) {
        self.secrets
            .lock()
            .expect("store lock poisoned")
            .insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.secrets
            .lock()
            .expect("store lock poisoned")
            .get(key)
            .cloned()
    }

    /// Make every operation fail with `message`.
    pub fn break_with(&self, message: &str) {
        *self.broken.lock().expect("store lock poisoned") = Some(message.to_string());
    }

    fn check(&self, key: &str) -> Result<(), StoreError> {
        match self.broken.lock().expect("store lock poisoned").as_ref() {
            Some(message) => Err(StoreError::backend(key, message.clone())),
            None => Ok(()),
        }
    }
}

impl SecretStore for RecordingStore {
    fn read(&self, key: &str) -> Result<String, StoreError> {
        self.check(key)?;
        self.get(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check(key)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut secrets = self.secrets.lock().expect("store lock poisoned");
        secrets.remove(key);
        secrets.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check(key)?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.secrets
            .lock()
            .expect("store lock poisoned")
            .remove(key);
        Ok(())
    }
}

/// Captures device codes instead of printing them.
#[derive(Default)]
pub struct RecordingPrompt {
    pub shown: Mutex<Vec<DeviceAuthorization>>,
}

impl RecordingPrompt {
    pub fn shown(&self) -> Vec<DeviceAuthorization> {
        self.shown.lock().expect("prompt lock poisoned").clone()
    }
}

impl DevicePrompt for RecordingPrompt {
    fn present(&self, authorization: &DeviceAuthorization) {
        self.shown
            .lock()
            .expect("prompt lock poisoned")
            .push(authorization.clone());
    }
}

pub fn device_flow(server: &MockServer) -> DeviceFlowClient {
    DeviceFlowClient::new()
        .with_device_code_url(format!("{}/login/device/code", server.uri()))
        .with_access_token_url(format!("{}/login/oauth/access_token", server.uri()))
}

pub fn exchange(server: &MockServer) -> TokenExchangeClient {
    TokenExchangeClient::new()
        .with_copilot_token_url(format!("{}/copilot_internal/v2/token", server.uri()))
}

/// Manager against `server`, polling without waiting between attempts.
pub fn manager(
    server: &MockServer,
    store: Arc<RecordingStore>,
    prompt: Arc<RecordingPrompt>,
) -> CredentialManager {
    CredentialManager::new(
        store,
        device_flow(server).with_interval_override(Duration::ZERO),
        exchange(server),
    )
    .with_prompt(prompt)
}

pub fn seed_access_token(store: &RecordingStore, token: &str, expires_at_ms: i64) {
    store.seed(ACCESS_TOKEN_KEY, token);
    store.seed(ACCESS_TOKEN_EXPIRES_KEY, &expires_at_ms.to_string());
}

pub fn seed_refresh_token(store: &RecordingStore, token: &str) {
    store.seed(REFRESH_TOKEN_KEY, token);
}
