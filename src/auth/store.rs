use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Service identifier every secret is namespaced under.
pub const SECRET_SERVICE_NAME: &str = "ais";

/// Long-lived GitHub OAuth token obtained through the device flow.
pub const REFRESH_TOKEN_KEY: &str = "refresh-token";
/// Short-lived Copilot API token.
pub const ACCESS_TOKEN_KEY: &str = "access-token";
/// Expiry of [`ACCESS_TOKEN_KEY`], decimal milliseconds since the epoch.
pub const ACCESS_TOKEN_EXPIRES_KEY: &str = "access-token-expires";

const SECRETS_FILE_VERSION: u32 = 1;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("secret `{key}` not found")]
    NotFound { key: String },
    #[error("secret store failure for `{key}`: {message}")]
    Backend { key: String, message: String },
}

impl StoreError {
    pub fn backend(key: &str, message: impl Into<String>) -> Self {
        Self::Backend {
            key: key.to_string(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Key/value vault for credentials.
///
/// `write` must replace any existing value for the key rather than fail on a
/// duplicate, and `delete` of a missing key succeeds.
pub trait SecretStore: Send + Sync {
    fn read(&self, key: &str) -> Result<String, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local secret store.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.secrets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SecretStore for MemorySecretStore {
    fn read(&self, key: &str) -> Result<String, StoreError> {
        self.lock().get(key).cloned().ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut secrets = self.lock();
        secrets.remove(key);
        secrets.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// File-backed secret store using one TOML file per service.
///
/// Writes go through a temp file and a rename, and the file is kept at
/// `0600` on unix.
///
/// # Example
/// ```no_run
/// use ais::auth::{FileSecretStore, SecretStore};
///
/// let store = FileSecretStore::new_default();
/// store.write("refresh-token", "gho_example")?;
/// # Ok::<(), ais::auth::StoreError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
    service: String,
}

impl FileSecretStore {
    /// Store secrets for `service` inside `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>, service: impl Into<String>) -> Self {
        let service = service.into();
        let path = base_dir
            .into()
            .join(format!("{}.toml", normalize_label(&service)));
        Self { path, service }
    }

    pub fn new_default() -> Self {
        Self::new(default_ais_dir(), SECRET_SERVICE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self, key: &str) -> Result<SecretsFile, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SecretsFile::empty(&self.service));
            }
            Err(err) => return Err(StoreError::backend(key, err.to_string())),
        };
        let file: SecretsFile =
            toml::from_str(&raw).map_err(|e| StoreError::backend(key, e.to_string()))?;
        if file.version != SECRETS_FILE_VERSION {
            return Err(StoreError::backend(
                key,
                format!(
                    "unsupported secrets file version {} at {}",
                    file.version,
                    self.path.display()
                ),
            ));
        }
        Ok(file)
    }

    fn save(&self, key: &str, file: &SecretsFile) -> Result<(), StoreError> {
        let serialized =
            toml::to_string(file).map_err(|e| StoreError::backend(key, e.to_string()))?;
        atomic_write(&self.path, serialized.as_bytes())
            .map_err(|e| StoreError::backend(key, e.to_string()))
    }
}

impl SecretStore for FileSecretStore {
    fn read(&self, key: &str) -> Result<String, StoreError> {
        self.load(key)?
            .secrets
            .remove(key)
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut file = self.load(key)?;
        file.secrets.remove(key);
        file.secrets.insert(key.to_string(), value.to_string());
        self.save(key, &file)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut file = self.load(key)?;
        if file.secrets.remove(key).is_none() {
            return Ok(());
        }
        self.save(key, &file)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SecretsFile {
    version: u32,
    service: String,
    #[serde(default)]
    secrets: BTreeMap<String, String>,
}

impl SecretsFile {
    fn empty(service: &str) -> Self {
        Self {
            version: SECRETS_FILE_VERSION,
            service: service.to_string(),
            secrets: BTreeMap::new(),
        }
    }
}

pub(crate) fn default_ais_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".ais"))
        .unwrap_or_else(|| PathBuf::from(".ais"))
}

fn normalize_label(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "default".to_string();
    }
    let mut out = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() || lower == '-' {
            out.push(lower);
        } else {
            out.push('-');
        }
    }
    if out.trim_matches('-').is_empty() {
        "default".to_string()
    } else {
        out
    }
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("secrets path {} has no file name", path.display()),
        )
    })?;

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_name = format!(
        ".{}.tmp-{}-{nonce}",
        file_name.to_string_lossy(),
        std::process::id()
    );
    let temp_path = path.with_file_name(temp_name);

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let write_result = (|| -> std::io::Result<()> {
        let mut temp_file = options.open(&temp_path)?;
        temp_file.write_all(data)?;
        temp_file.sync_all()?;
        Ok(())
    })();

    if let Err(err) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    #[cfg(unix)]
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, FileSecretStore) {
        let dir = TempDir::new().unwrap();
        let store = FileSecretStore::new(dir.path(), SECRET_SERVICE_NAME);
        (dir, store)
    }

    #[test]
    fn second_write_replaces_first() {
        let (_dir, store) = temp_store();
        store.write(REFRESH_TOKEN_KEY, "gho_first").unwrap();
        store.write(REFRESH_TOKEN_KEY, "gho_second").unwrap();
        assert_eq!(store.read(REFRESH_TOKEN_KEY).unwrap(), "gho_second");
    }

    #[test]
    fn read_of_missing_key_is_not_found() {
        let (_dir, store) = temp_store();
        let err = store.read(ACCESS_TOKEN_KEY).unwrap_err();
        assert!(err.is_not_found());

        store.write(REFRESH_TOKEN_KEY, "gho_1").unwrap();
        let err = store.read(ACCESS_TOKEN_KEY).unwrap_err();
        assert_eq!(
            err,
            StoreError::NotFound {
                key: ACCESS_TOKEN_KEY.to_string()
            }
        );
    }

    #[test]
    fn delete_of_missing_key_succeeds() {
        let (_dir, store) = temp_store();
        store.delete(ACCESS_TOKEN_KEY).unwrap();
        store.write(ACCESS_TOKEN_KEY, "tok").unwrap();
        store.delete(ACCESS_TOKEN_KEY).unwrap();
        store.delete(ACCESS_TOKEN_KEY).unwrap();
        assert!(store.read(ACCESS_TOKEN_KEY).unwrap_err().is_not_found());
    }

    #[test]
    fn keys_are_independent() {
        let (_dir, store) = temp_store();
        store.write(ACCESS_TOKEN_KEY, "tok").unwrap();
        store.write(ACCESS_TOKEN_EXPIRES_KEY, "1700000000000").unwrap();
        store.delete(ACCESS_TOKEN_KEY).unwrap();
        assert_eq!(
            store.read(ACCESS_TOKEN_EXPIRES_KEY).unwrap(),
            "1700000000000"
        );
    }

    #[test]
    fn services_do_not_collide_in_one_directory() {
        let dir = TempDir::new().unwrap();
        let ais = FileSecretStore::new(dir.path(), "ais");
        let other = FileSecretStore::new(dir.path(), "other-app");
        ais.write(REFRESH_TOKEN_KEY, "gho_ais").unwrap();
        other.write(REFRESH_TOKEN_KEY, "gho_other").unwrap();
        assert_eq!(ais.read(REFRESH_TOKEN_KEY).unwrap(), "gho_ais");
        assert_eq!(other.read(REFRESH_TOKEN_KEY).unwrap(), "gho_other");
    }

    #[test]
    fn unsupported_version_is_backend_error() {
        let (_dir, store) = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            "version = 9\nservice = \"ais\"\n[secrets]\n",
        )
        .unwrap();
        let err = store.read(REFRESH_TOKEN_KEY).unwrap_err();
        assert!(matches!(err, StoreError::Backend { message, .. } if message.contains("version 9")));
    }

    #[cfg(unix)]
    #[test]
    fn secrets_file_is_owner_only() {
        let (_dir, store) = temp_store();
        store.write(REFRESH_TOKEN_KEY, "gho_1").unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn memory_store_overwrites_and_deletes() {
        let store = MemorySecretStore::new();
        store.write(ACCESS_TOKEN_KEY, "a").unwrap();
        store.write(ACCESS_TOKEN_KEY, "b").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.read(ACCESS_TOKEN_KEY).unwrap(), "b");
        store.delete(ACCESS_TOKEN_KEY).unwrap();
        store.delete(ACCESS_TOKEN_KEY).unwrap();
        assert!(store.is_empty());
    }
}
