//! Configuration system (layered: defaults < config file < env < code).

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::auth::device_flow::{
    DEFAULT_ACCESS_TOKEN_URL, DEFAULT_CLIENT_ID, DEFAULT_DEVICE_CODE_URL,
    DEFAULT_MAX_POLL_ATTEMPTS,
};
use crate::auth::exchange::DEFAULT_COPILOT_TOKEN_URL;
use crate::auth::store::{default_ais_dir, SECRET_SERVICE_NAME};
use crate::auth::{CredentialManager, DeviceFlowClient, FileSecretStore, SecretStore, TokenExchangeClient};
use crate::error::{AisError, Result};
use crate::provider::github_copilot::{CopilotClient, DEFAULT_COPILOT_API_URL};
use crate::provider::http::build_client;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Where secrets are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SecretBackend {
    /// OS credential vault.
    Keyring,
    /// `0600` TOML file under the secrets directory.
    File,
}

impl Default for SecretBackend {
    /// The OS keychain where it persists; the file store on Linux, whose
    /// keyutils keyring does not survive a reboot.
    fn default() -> Self {
        if cfg!(all(feature = "keyring", not(target_os = "linux"))) {
            Self::Keyring
        } else {
            Self::File
        }
    }
}

/// Runtime configuration for the credential subsystem.
///
/// # Example
/// ```no_run
/// use ais::config::{AisConfig, SecretBackend};
///
/// # fn example() -> ais::error::Result<()> {
/// let config = AisConfig::load(None)?.with_secret_backend(SecretBackend::File);
/// let manager = config.credential_manager()?;
/// # let _ = manager;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AisConfig {
    pub client_id: String,
    pub device_code_url: String,
    pub access_token_url: String,
    pub copilot_token_url: String,
    pub api_base_url: String,
    pub secret_service: String,
    pub secret_backend: SecretBackend,
    pub secrets_dir: PathBuf,
    pub max_poll_attempts: u32,
    pub http_timeout: Duration,
}

impl fmt::Debug for AisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AisConfig")
            .field("device_code_url", &self.device_code_url)
            .field("access_token_url", &self.access_token_url)
            .field("copilot_token_url", &self.copilot_token_url)
            .field("api_base_url", &self.api_base_url)
            .field("secret_service", &self.secret_service)
            .field("secret_backend", &self.secret_backend)
            .field("secrets_dir", &self.secrets_dir)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("http_timeout", &self.http_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for AisConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            device_code_url: DEFAULT_DEVICE_CODE_URL.to_string(),
            access_token_url: DEFAULT_ACCESS_TOKEN_URL.to_string(),
            copilot_token_url: DEFAULT_COPILOT_TOKEN_URL.to_string(),
            api_base_url: DEFAULT_COPILOT_API_URL.to_string(),
            secret_service: SECRET_SERVICE_NAME.to_string(),
            secret_backend: SecretBackend::default(),
            secrets_dir: default_ais_dir(),
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

/// On-disk shape of `config.toml`; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    client_id: Option<String>,
    device_code_url: Option<String>,
    access_token_url: Option<String>,
    copilot_token_url: Option<String>,
    api_base_url: Option<String>,
    secret_service: Option<String>,
    secret_backend: Option<SecretBackend>,
    secrets_dir: Option<PathBuf>,
    max_poll_attempts: Option<u32>,
    http_timeout_secs: Option<u64>,
}

impl AisConfig {
    /// Default config file location (`~/.ais/config.toml`).
    pub fn default_path() -> PathBuf {
        default_ais_dir().join("config.toml")
    }

    /// Resolve configuration from defaults, a config file, then the environment.
    ///
    /// An explicit `path` must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::default().merge_file(path)?,
            None => {
                let default_path = Self::default_path();
                if default_path.is_file() {
                    Self::default().merge_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        Ok(config.merge_env())
    }

    /// Overlay the settings found in a TOML file.
    pub fn merge_file(self, path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&raw).map_err(|e| {
            AisError::Configuration(format!("invalid config file {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(self.apply_file(file))
    }

    /// Overlay `AIS_*` environment variables (and a `.env` file if present).
    pub fn merge_env(self) -> Self {
        let _ = dotenvy::dotenv();
        self.merge_vars(|name| std::env::var(name).ok())
    }

    /// Overlay variables from an arbitrary lookup.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn merge_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let strings = [
            ("AIS_CLIENT_ID", &mut self.client_id),
            ("AIS_DEVICE_CODE_URL", &mut self.device_code_url),
            ("AIS_ACCESS_TOKEN_URL", &mut self.access_token_url),
            ("AIS_COPILOT_TOKEN_URL", &mut self.copilot_token_url),
            ("AIS_API_BASE_URL", &mut self.api_base_url),
            ("AIS_SECRET_SERVICE", &mut self.secret_service),
        ];
        for (var, field) in strings {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                *field = value;
            }
        }

        if let Some(value) = lookup("AIS_SECRET_BACKEND") {
            match value.trim().parse::<SecretBackend>() {
                Ok(backend) => self.secret_backend = backend,
                Err(_) => tracing::warn!(%value, "ignoring unknown AIS_SECRET_BACKEND"),
            }
        }
        if let Some(value) = lookup("AIS_SECRETS_DIR").filter(|v| !v.trim().is_empty()) {
            self.secrets_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("AIS_MAX_POLL_ATTEMPTS") {
            match value.trim().parse::<u32>() {
                Ok(attempts) if attempts > 0 => self.max_poll_attempts = attempts,
                _ => tracing::warn!(%value, "ignoring invalid AIS_MAX_POLL_ATTEMPTS"),
            }
        }
        if let Some(value) = lookup("AIS_HTTP_TIMEOUT_SECS") {
            match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.http_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(%value, "ignoring invalid AIS_HTTP_TIMEOUT_SECS"),
            }
        }
        self
    }

    fn apply_file(mut self, file: ConfigFile) -> Self {
        if let Some(v) = file.client_id {
            self.client_id = v;
        }
        if let Some(v) = file.device_code_url {
            self.device_code_url = v;
        }
        if let Some(v) = file.access_token_url {
            self.access_token_url = v;
        }
        if let Some(v) = file.copilot_token_url {
            self.copilot_token_url = v;
        }
        if let Some(v) = file.api_base_url {
            self.api_base_url = v;
        }
        if let Some(v) = file.secret_service {
            self.secret_service = v;
        }
        if let Some(v) = file.secret_backend {
            self.secret_backend = v;
        }
        if let Some(v) = file.secrets_dir {
            self.secrets_dir = v;
        }
        if let Some(v) = file.max_poll_attempts.filter(|v| *v > 0) {
            self.max_poll_attempts = v;
        }
        if let Some(v) = file.http_timeout_secs.filter(|v| *v > 0) {
            self.http_timeout = Duration::from_secs(v);
        }
        self
    }

    pub fn with_secret_backend(mut self, backend: SecretBackend) -> Self {
        self.secret_backend = backend;
        self
    }

    pub fn with_secrets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.secrets_dir = dir.into();
        self
    }

    pub fn with_github_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.device_code_url = format!("{base}/login/device/code");
        self.access_token_url = format!("{base}/login/oauth/access_token");
        self.copilot_token_url = format!("{base}/copilot_internal/v2/token");
        self
    }

    pub fn with_api_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into();
        self
    }

    /// Open the configured secret backend.
    pub fn build_store(&self) -> Result<Arc<dyn SecretStore>> {
        match self.secret_backend {
            SecretBackend::File => Ok(Arc::new(FileSecretStore::new(
                &self.secrets_dir,
                &self.secret_service,
            ))),
            #[cfg(feature = "keyring")]
            SecretBackend::Keyring => Ok(Arc::new(crate::auth::KeyringSecretStore::new(
                &self.secret_service,
            ))),
            #[cfg(not(feature = "keyring"))]
            SecretBackend::Keyring => Err(AisError::Configuration(
                "the keyring backend is not compiled in; use secret_backend = \"file\"".to_string(),
            )),
        }
    }

    /// Assemble a credential manager over the configured store and endpoints.
    pub fn credential_manager(&self) -> Result<CredentialManager> {
        let client = build_client(self.http_timeout)?;
        let device_flow = DeviceFlowClient::new()
            .with_client(client.clone())
            .with_client_id(&self.client_id)
            .with_device_code_url(&self.device_code_url)
            .with_access_token_url(&self.access_token_url)
            .with_max_attempts(self.max_poll_attempts);
        let exchange = TokenExchangeClient::new()
            .with_client(client)
            .with_copilot_token_url(&self.copilot_token_url);
        Ok(CredentialManager::new(self.build_store()?, device_flow, exchange))
    }

    /// Copilot API client sharing `credentials`.
    pub fn copilot_client(&self, credentials: CredentialManager) -> Result<CopilotClient> {
        Ok(CopilotClient::new(credentials)
            .with_client(build_client(self.http_timeout)?)
            .with_base_url(&self.api_base_url))
    }
}
