//! Vault - account registry and seed-consistent signing workflows.
//!
//! # Architecture
//!
//! ```text
//! Vault
//!   │
//!   ├── SecretStore     root key material (seed id -> xprv), never persisted here
//!   ├── AccountStorage  public account registry, JSON under `storage_key`
//!   └── SignerRegistry  SignerKind -> Signer
//! ```
//!
//! # Operations
//!
//! | Operation | Steps |
//! |-----------|-------|
//! | `derive_account` | root key -> signer -> child key -> address -> duplicate check -> persist -> commit |
//! | `sign` | root key -> account -> seed check -> payload -> child key -> address check -> sign |
//!
//! Registry mutations are serialized by a mutation lock held across every
//! await. The new registry is built on a copy and only replaces the live one
//! after storage accepted it, so a failed operation leaves no trace. The
//! registry write lock is taken before storage is touched: an operation
//! abandoned while waiting for it has persisted nothing.
//! Derived private keys live in `Zeroizing` buffers for one operation and are
//! never cached.

pub mod config;
pub mod mnemonic;
pub mod store;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::core::{Account, DerivationPath, SignRequest, Signature, SignerKind};
use crate::signers::{SignArgs, SignPayload, Signer, SignerError, SignerRegistry};

pub use config::VaultConfig;
pub use store::{
    AccountStorage, MemoryAccountStorage, MemorySecretStore, SecretQuery, SecretStore, StoreError,
    StoredSecret,
};
#[cfg(feature = "native")]
pub use store::FileAccountStorage;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultError {
    #[error("Root private key not found")]
    RootKeyMissing,
    #[error("Account not found")]
    AccountNotFound,
    #[error("Seed ID mismatch")]
    SeedMismatch,
    #[error("Account already exists")]
    DuplicateAccount,
    #[error("No signer available for {0}")]
    SignerUnavailable(SignerKind),
    #[error(transparent)]
    Signer(#[from] SignerError),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error("Corrupt account registry: {0}")]
    CorruptRegistry(String),
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),
}

pub type VaultResult<T> = Result<T, VaultError>;

/// Coarse category a UI reports to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingKey,
    UnknownAccount,
    WrongSeed,
    AlreadyExists,
    Unsupported,
    InvalidRequest,
    CorruptData,
    StorageFailure,
    SignerFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingKey => "missing-key",
            ErrorKind::UnknownAccount => "unknown-account",
            ErrorKind::WrongSeed => "wrong-seed",
            ErrorKind::AlreadyExists => "already-exists",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::InvalidRequest => "invalid-request",
            ErrorKind::CorruptData => "corrupt-data",
            ErrorKind::StorageFailure => "storage-failure",
            ErrorKind::SignerFailure => "signer-failure",
        }
    }
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::RootKeyMissing => ErrorKind::MissingKey,
            VaultError::AccountNotFound => ErrorKind::UnknownAccount,
            VaultError::SeedMismatch => ErrorKind::WrongSeed,
            VaultError::DuplicateAccount => ErrorKind::AlreadyExists,
            VaultError::SignerUnavailable(_) => ErrorKind::Unsupported,
            VaultError::Signer(err) => match err {
                SignerError::UnsupportedSignType(_) => ErrorKind::Unsupported,
                SignerError::MissingNetworkSelector | SignerError::InvalidRequest(_) => {
                    ErrorKind::InvalidRequest
                }
                // Root key material that does not parse or derive is corrupt.
                SignerError::InvalidKey(_) | SignerError::DerivationError(_) => ErrorKind::CorruptData,
                SignerError::Crypto(_) => ErrorKind::SignerFailure,
            },
            VaultError::Storage(_) => ErrorKind::StorageFailure,
            VaultError::CorruptRegistry(_) => ErrorKind::CorruptData,
            VaultError::InvalidMnemonic(_) => ErrorKind::InvalidRequest,
        }
    }
}

/// Root key material plus the id of the seed it came from. Held only for
/// the duration of one operation.
pub struct RootKey {
    pub seed_id: String,
    private_key: Zeroizing<String>,
}

impl RootKey {
    pub fn new(seed_id: impl Into<String>, private_key: Zeroizing<String>) -> Self {
        Self { seed_id: seed_id.into(), private_key }
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }
}

impl From<StoredSecret> for RootKey {
    fn from(secret: StoredSecret) -> Self {
        Self { seed_id: secret.id, private_key: secret.secret }
    }
}

impl fmt::Debug for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootKey").field("seed_id", &self.seed_id).finish_non_exhaustive()
    }
}

/// Persisted registry layout.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Registry {
    accounts: Vec<Account>,
}

impl Registry {
    fn parse(raw: &str) -> VaultResult<Self> {
        let registry: Registry =
            serde_json::from_str(raw).map_err(|e| VaultError::CorruptRegistry(e.to_string()))?;
        for (i, account) in registry.accounts.iter().enumerate() {
            if conflicts(&registry.accounts[..i], account) {
                return Err(VaultError::CorruptRegistry(format!(
                    "account {} collides with an earlier entry",
                    account.id
                )));
            }
        }
        Ok(registry)
    }
}

/// True if `candidate` shares an id, address or (kind, path) with any account.
fn conflicts(accounts: &[Account], candidate: &Account) -> bool {
    accounts.iter().any(|account| {
        account.id == candidate.id
            || account.address == candidate.address
            || same_slot(account, candidate.signer_kind, &candidate.derivation_path)
    })
}

fn same_slot(account: &Account, kind: SignerKind, path: &DerivationPath) -> bool {
    account.signer_kind == kind && &account.derivation_path == path
}

pub struct Vault {
    config: VaultConfig,
    secrets: Arc<dyn SecretStore>,
    storage: Arc<dyn AccountStorage>,
    signers: SignerRegistry,
    accounts: RwLock<Vec<Account>>,
    mutation: Mutex<()>,
}

impl Vault {
    /// Load the registry persisted under `config.storage_key` (empty if absent).
    pub async fn open(
        config: VaultConfig,
        secrets: Arc<dyn SecretStore>,
        storage: Arc<dyn AccountStorage>,
        signers: SignerRegistry,
    ) -> VaultResult<Self> {
        let registry = match storage.load(&config.storage_key).await? {
            Some(raw) => Registry::parse(&raw)?,
            None => Registry::default(),
        };
        info!(
            storage_key = %config.storage_key,
            accounts = registry.accounts.len(),
            signers = ?signers.kinds(),
            "vault opened"
        );
        Ok(Self {
            config,
            secrets,
            storage,
            signers,
            accounts: RwLock::new(registry.accounts),
            mutation: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub async fn accounts(&self) -> Vec<Account> {
        self.accounts.read().await.clone()
    }

    pub async fn get_account(&self, id: &str) -> Option<Account> {
        self.accounts.read().await.iter().find(|account| account.id == id).cloned()
    }

    pub async fn get_account_by_signer_and_derivation_path(
        &self,
        kind: SignerKind,
        path: &DerivationPath,
    ) -> Option<Account> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|account| same_slot(account, kind, path))
            .cloned()
    }

    /// Enroll an externally built account. Fails `DuplicateAccount` if its id,
    /// address or (kind, path) is already taken.
    pub async fn add_account(&self, account: Account) -> VaultResult<()> {
        let _guard = self.mutation.lock().await;
        let mut next = self.accounts.read().await.clone();
        if conflicts(&next, &account) {
            return Err(VaultError::DuplicateAccount);
        }
        let id = account.id.clone();
        next.push(account);
        self.commit(next).await?;
        info!(account_id = %id, "account added");
        Ok(())
    }

    pub async fn remove_account(&self, id: &str) -> VaultResult<Account> {
        let _guard = self.mutation.lock().await;
        let mut next = self.accounts.read().await.clone();
        let index = next
            .iter()
            .position(|account| account.id == id)
            .ok_or(VaultError::AccountNotFound)?;
        let removed = next.remove(index);
        self.commit(next).await?;
        info!(account_id = %id, "account removed");
        Ok(removed)
    }

    /// Derive and enroll the account at `path` under the selected root key.
    pub async fn derive_account(
        &self,
        kind: SignerKind,
        path: DerivationPath,
    ) -> VaultResult<Account> {
        let _guard = self.mutation.lock().await;

        let root = self.root_key().await?;
        let signer = self.signer(kind)?;
        let child = signer.derive_child_private_key(root.private_key(), &path).await?;
        let address = signer.get_public_key(&child).await?;
        drop(child);

        let mut next = self.accounts.read().await.clone();
        if next
            .iter()
            .any(|account| account.address == address || same_slot(account, kind, &path))
        {
            warn!(%kind, %path, "derived account already enrolled");
            return Err(VaultError::DuplicateAccount);
        }

        let account = Account {
            id: Uuid::new_v4().to_string(),
            address,
            derivation_path: path,
            signer_kind: kind,
            seed_id: root.seed_id.clone(),
        };
        next.push(account.clone());
        self.commit(next).await?;
        info!(
            account_id = %account.id,
            address = %account.address,
            %kind,
            path = %account.derivation_path,
            "account derived"
        );
        Ok(account)
    }

    /// Sign `request` with the enrolled account it addresses.
    ///
    /// The root key must come from the same seed as the account, and must
    /// still derive the account's address.
    pub async fn sign(&self, request: &SignRequest) -> VaultResult<Signature> {
        let root = self.root_key().await?;

        let account = self
            .get_account_by_signer_and_derivation_path(request.signer_kind, &request.derivation_path)
            .await
            .ok_or(VaultError::AccountNotFound)?;
        if account.seed_id != root.seed_id {
            warn!(account_id = %account.id, "root key belongs to another seed");
            return Err(VaultError::SeedMismatch);
        }

        let payload = SignPayload::from_wire(request.sign_type, request.payload.clone())?;
        let signer = self.signer(account.signer_kind)?;
        let child = signer.derive_child_private_key(root.private_key(), &account.derivation_path).await?;
        let public_key = signer.get_public_key(&child).await?;
        if public_key != account.address {
            warn!(account_id = %account.id, "root key no longer derives the account address");
            return Err(VaultError::SeedMismatch);
        }

        debug!(account_id = %account.id, sign_type = ?payload.sign_type(), "signing");
        let signature = signer
            .sign(SignArgs {
                payload: &payload,
                child_private_key: &child,
                network: request.network_selector(),
            })
            .await?;
        Ok(Signature { signature, public_key })
    }

    /// Store the master key of `mnemonic` under a fresh seed id and return the id.
    pub async fn import_wallet(&self, mnemonic: &str) -> VaultResult<String> {
        let root = mnemonic::root_key_from_mnemonic(mnemonic)?;
        let seed_id = Uuid::new_v4().to_string();
        self.secrets.store(&seed_id, &root).await?;
        info!(%seed_id, "wallet imported");
        Ok(seed_id)
    }

    pub fn generate_mnemonic(&self) -> VaultResult<Zeroizing<String>> {
        mnemonic::generate_mnemonic(self.config.mnemonic_words)
    }

    async fn root_key(&self) -> VaultResult<RootKey> {
        let secret = self
            .secrets
            .get(&SecretQuery::selected())
            .await?
            .filter(|secret| !secret.secret.is_empty())
            .ok_or(VaultError::RootKeyMissing)?;
        debug!(seed_id = %secret.id, "root key fetched");
        Ok(RootKey::from(secret))
    }

    fn signer(&self, kind: SignerKind) -> VaultResult<Arc<dyn Signer>> {
        self.signers.get(kind).ok_or(VaultError::SignerUnavailable(kind))
    }

    /// Persist `next`, then make it the live registry.
    ///
    /// The write guard is held across `save`, so the live registry and storage
    /// change together or not at all.
    async fn commit(&self, next: Vec<Account>) -> VaultResult<()> {
        let registry = Registry { accounts: next };
        let raw = serde_json::to_string(&registry)
            .map_err(|e| StoreError::Storage(format!("serialize registry: {e}")))?;
        let mut live = self.accounts.write().await;
        self.storage.save(&self.config.storage_key, &raw).await?;
        *live = registry.accounts;
        debug!(storage_key = %self.config.storage_key, "registry committed");
        Ok(())
    }
}

impl fmt::Debug for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault")
            .field("config", &self.config)
            .field("signers", &self.signers)
            .finish_non_exhaustive()
    }
}
