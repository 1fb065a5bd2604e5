//! Storage capabilities consumed by the vault.
//!
//! | Capability | Holds | Implementations |
//! |------------|-------|-----------------|
//! | [`SecretStore`] | root key material, keyed by seed id | [`MemorySecretStore`] |
//! | [`AccountStorage`] | the serialized account registry | [`MemoryAccountStorage`], `FileAccountStorage` (native) |
//!
//! Root key material never reaches [`AccountStorage`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;
use zeroize::Zeroizing;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Secret store error: {0}")]
    Secret(String),
    #[error("Account storage error: {0}")]
    Storage(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Which credential to retrieve. `id: None` asks for the currently selected one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretQuery {
    pub id: Option<String>,
}

impl SecretQuery {
    pub fn selected() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }
}

/// A credential as returned by the secret store.
#[derive(Clone)]
pub struct StoredSecret {
    pub id: String,
    pub secret: Zeroizing<String>,
}

impl fmt::Debug for StoredSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredSecret").field("id", &self.id).field("secret", &"<redacted>").finish()
    }
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, query: &SecretQuery) -> StoreResult<Option<StoredSecret>>;
    async fn store(&self, id: &str, secret: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait AccountStorage: Send + Sync {
    async fn load(&self, key: &str) -> StoreResult<Option<String>>;
    async fn save(&self, key: &str, value: &str) -> StoreResult<()>;
}

#[derive(Default)]
struct Credentials {
    entries: Vec<(String, Zeroizing<String>)>,
    selected: Option<String>,
}

/// In-memory secret store. Behaves like a credential picker: storing a
/// credential selects it, and [`select`](Self::select) switches to another.
#[derive(Default)]
pub struct MemorySecretStore {
    inner: RwLock<Credentials>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `id` the selected credential. Returns false if it is unknown.
    pub async fn select(&self, id: &str) -> bool {
        let mut inner = self.inner.write().await;
        if inner.entries.iter().any(|(entry, _)| entry == id) {
            inner.selected = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Forget the selection; `get` with no id then finds nothing.
    pub async fn clear_selection(&self) {
        self.inner.write().await.selected = None;
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, query: &SecretQuery) -> StoreResult<Option<StoredSecret>> {
        let inner = self.inner.read().await;
        let Some(id) = query.id.as_ref().or(inner.selected.as_ref()) else {
            return Ok(None);
        };
        Ok(inner
            .entries
            .iter()
            .find(|(entry, _)| entry == id)
            .map(|(entry, secret)| StoredSecret { id: entry.clone(), secret: secret.clone() }))
    }

    async fn store(&self, id: &str, secret: &str) -> StoreResult<()> {
        if id.is_empty() {
            return Err(StoreError::Secret("credential id must not be empty".into()));
        }
        let mut inner = self.inner.write().await;
        inner.entries.retain(|(entry, _)| entry != id);
        inner.entries.push((id.to_string(), Zeroizing::new(secret.to_string())));
        inner.selected = Some(id.to_string());
        Ok(())
    }
}

/// In-memory account storage.
#[derive(Debug, Default)]
pub struct MemoryAccountStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryAccountStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStorage for MemoryAccountStorage {
    async fn load(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(feature = "native")]
pub use file::FileAccountStorage;

#[cfg(feature = "native")]
mod file {
    use super::*;
    use std::path::{Path, PathBuf};

    /// One `<key>.json` file per storage key under a root directory.
    #[derive(Debug, Clone)]
    pub struct FileAccountStorage {
        root: PathBuf,
    }

    impl FileAccountStorage {
        pub fn new(root: impl Into<PathBuf>) -> Self {
            Self { root: root.into() }
        }

        /// `$SILEX_DATA_DIR`, or `<data_local_dir>/silex`.
        pub fn default_location() -> Self {
            let root = std::env::var("SILEX_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")).join("silex")
                });
            Self::new(root)
        }

        pub fn root(&self) -> &Path {
            &self.root
        }

        fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
            let valid = !key.is_empty()
                && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
            if !valid {
                return Err(StoreError::Storage(format!("invalid storage key '{key}'")));
            }
            Ok(self.root.join(format!("{key}.json")))
        }
    }

    #[async_trait]
    impl AccountStorage for FileAccountStorage {
        async fn load(&self, key: &str) -> StoreResult<Option<String>> {
            let path = self.path_for(key)?;
            match std::fs::read_to_string(&path) {
                Ok(raw) => Ok(Some(raw)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(StoreError::Storage(format!("read {}: {e}", path.display()))),
            }
        }

        async fn save(&self, key: &str, value: &str) -> StoreResult<()> {
            let path = self.path_for(key)?;
            std::fs::create_dir_all(&self.root)
                .map_err(|e| StoreError::Storage(format!("mkdir {}: {e}", self.root.display())))?;
            // Readers only ever observe a complete file.
            let tmp = path.with_extension("json.tmp");
            std::fs::write(&tmp, value)
                .map_err(|e| StoreError::Storage(format!("write {}: {e}", tmp.display())))?;
            std::fs::rename(&tmp, &path)
                .map_err(|e| StoreError::Storage(format!("rename {}: {e}", path.display())))
        }
    }
}
