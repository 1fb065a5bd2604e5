//! Vault workflows end to end with the deterministic crypto provider.

mod common;

use async_trait::async_trait;
use common::*;
use serde_json::json;
use silex_core::vault::store::StoreResult;
use silex_core::{
    Account, AccountStorage, DerivationPath, ErrorKind, FileAccountStorage, MemoryAccountStorage,
    MemorySecretStore, SecretStore, SignRequest, SignerError, SignerKind, SignerRegistry,
    StoreError, Vault, VaultConfig, VaultError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const MESSAGE_MAINNET: &str = "1262ff506e90e08e5851226f2e8543a720c6764d7884e631989203b5d710c5fa";

struct Harness {
    vault: Arc<Vault>,
    secrets: Arc<MemorySecretStore>,
    storage: Arc<MemoryAccountStorage>,
}

async fn harness() -> Harness {
    let secrets = Arc::new(MemorySecretStore::new());
    let storage = Arc::new(MemoryAccountStorage::new());
    let vault = Vault::open(
        VaultConfig::new(),
        secrets.clone(),
        storage.clone(),
        SignerRegistry::with_mina(HmacCrypto::shared()),
    )
    .await
    .unwrap();
    Harness { vault: Arc::new(vault), secrets, storage }
}

fn mina_path() -> DerivationPath {
    MINA_PATH.parse().unwrap()
}

fn message_request(path: DerivationPath) -> SignRequest {
    SignRequest::new(SignerKind::Mina, path, 0, json!("Bonjour")).with_options(vec![0])
}

#[tokio::test]
async fn test_derive_then_sign() {
    let h = harness().await;
    h.secrets.store("seed-a", ROOT_XPRV).await.unwrap();

    let account = h.vault.derive_account(SignerKind::Mina, mina_path()).await.unwrap();
    assert_eq!(account.seed_id, "seed-a");
    assert_eq!(account.signer_kind, SignerKind::Mina);
    assert_eq!(account.derivation_path, mina_path());
    assert!(account.address.starts_with("B62"));

    let signature = h.vault.sign(&message_request(mina_path())).await.unwrap();
    assert_eq!(signature.signature, MESSAGE_MAINNET);
    assert_eq!(signature.public_key, account.address);
}

#[tokio::test]
async fn test_sign_with_other_seed_fails() {
    let h = harness().await;
    h.secrets.store("seed-a", ROOT_XPRV).await.unwrap();
    h.vault.derive_account(SignerKind::Mina, mina_path()).await.unwrap();

    // The picker now hands out a different seed.
    h.vault.import_wallet(ABANDON).await.unwrap();
    let err = h.vault.sign(&message_request(mina_path())).await.unwrap_err();
    assert_eq!(err, VaultError::SeedMismatch);
    assert_eq!(err.kind(), ErrorKind::WrongSeed);

    assert!(h.secrets.select("seed-a").await);
    assert!(h.vault.sign(&message_request(mina_path())).await.is_ok());
}

#[tokio::test]
async fn test_sign_detects_replaced_key_material() {
    let h = harness().await;
    h.secrets.store("seed-a", ROOT_XPRV).await.unwrap();
    h.vault.derive_account(SignerKind::Mina, mina_path()).await.unwrap();

    // Same seed id, different material.
    let other = silex_core::vault::mnemonic::root_key_from_mnemonic(ABANDON).unwrap();
    h.secrets.store("seed-a", &other).await.unwrap();
    assert_eq!(
        h.vault.sign(&message_request(mina_path())).await,
        Err(VaultError::SeedMismatch)
    );
}

#[tokio::test]
async fn test_derive_duplicate_leaves_registry_unchanged() {
    let h = harness().await;
    h.secrets.store("seed-a", ROOT_XPRV).await.unwrap();
    let first = h.vault.derive_account(SignerKind::Mina, mina_path()).await.unwrap();
    let persisted = h.storage.load("silex_vault").await.unwrap();

    let err = h.vault.derive_account(SignerKind::Mina, mina_path()).await.unwrap_err();
    assert_eq!(err, VaultError::DuplicateAccount);
    assert_eq!(h.vault.accounts().await, vec![first]);
    assert_eq!(h.storage.load("silex_vault").await.unwrap(), persisted);
}

#[tokio::test]
async fn test_same_path_under_another_seed_is_rejected() {
    let h = harness().await;
    h.secrets.store("seed-a", ROOT_XPRV).await.unwrap();
    h.vault.derive_account(SignerKind::Mina, mina_path()).await.unwrap();

    h.vault.import_wallet(ABANDON).await.unwrap();
    assert_eq!(
        h.vault.derive_account(SignerKind::Mina, mina_path()).await,
        Err(VaultError::DuplicateAccount)
    );
    assert_eq!(h.vault.accounts().await.len(), 1);
}

#[tokio::test]
async fn test_concurrent_derive_only_one_wins() {
    let h = harness().await;
    h.secrets.store("seed-a", ROOT_XPRV).await.unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let vault = h.vault.clone();
            tokio::spawn(async move { vault.derive_account(SignerKind::Mina, mina_path()).await })
        })
        .collect();

    let mut wins = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => wins += 1,
            Err(err) => assert_eq!(err, VaultError::DuplicateAccount),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(h.vault.accounts().await.len(), 1);
}

#[tokio::test]
async fn test_missing_root_key() {
    let h = harness().await;
    assert_eq!(
        h.vault.derive_account(SignerKind::Mina, mina_path()).await,
        Err(VaultError::RootKeyMissing)
    );
    let err = h.vault.sign(&message_request(mina_path())).await.unwrap_err();
    assert_eq!(err, VaultError::RootKeyMissing);
    assert_eq!(err.kind(), ErrorKind::MissingKey);

    // The root key is checked before the payload is looked at.
    let bad_type = SignRequest::new(SignerKind::Mina, mina_path(), 7, json!("Bonjour"));
    assert_eq!(h.vault.sign(&bad_type).await, Err(VaultError::RootKeyMissing));
}

#[tokio::test]
async fn test_sign_unknown_account() {
    let h = harness().await;
    h.secrets.store("seed-a", ROOT_XPRV).await.unwrap();
    let err = h.vault.sign(&message_request(mina_path())).await.unwrap_err();
    assert_eq!(err, VaultError::AccountNotFound);
    assert_eq!(err.kind(), ErrorKind::UnknownAccount);
    let bad_shape = SignRequest::new(SignerKind::Mina, mina_path(), 0, json!({"text": "hi"}));
    assert_eq!(h.vault.sign(&bad_shape).await, Err(VaultError::AccountNotFound));
}

#[tokio::test]
async fn test_sign_request_validation() {
    let h = harness().await;
    h.secrets.store("seed-a", ROOT_XPRV).await.unwrap();
    h.vault.derive_account(SignerKind::Mina, mina_path()).await.unwrap();

    let no_network = SignRequest::new(SignerKind::Mina, mina_path(), 0, json!("Bonjour"));
    assert_eq!(
        h.vault.sign(&no_network).await,
        Err(VaultError::Signer(SignerError::MissingNetworkSelector))
    );

    let bad_type = SignRequest::new(SignerKind::Mina, mina_path(), 7, json!("Bonjour")).with_options(vec![0]);
    assert_eq!(
        h.vault.sign(&bad_type).await,
        Err(VaultError::Signer(SignerError::UnsupportedSignType(7)))
    );

    let bad_shape = SignRequest::new(SignerKind::Mina, mina_path(), 0, json!({"text": "hi"})).with_options(vec![0]);
    assert!(matches!(
        h.vault.sign(&bad_shape).await,
        Err(VaultError::Signer(SignerError::InvalidRequest(_)))
    ));
}

#[tokio::test]
async fn test_signer_unavailable() {
    let h = harness().await;
    h.secrets.store("seed-a", ROOT_XPRV).await.unwrap();
    let err = h.vault.derive_account(SignerKind::Evm, vec![0].into()).await.unwrap_err();
    assert_eq!(err, VaultError::SignerUnavailable(SignerKind::Evm));
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[tokio::test]
async fn test_remove_absent_account() {
    let h = harness().await;
    h.secrets.store("seed-a", ROOT_XPRV).await.unwrap();
    let account = h.vault.derive_account(SignerKind::Mina, mina_path()).await.unwrap();

    assert_eq!(h.vault.remove_account("missing").await, Err(VaultError::AccountNotFound));
    assert_eq!(h.vault.accounts().await, vec![account.clone()]);

    assert_eq!(h.vault.remove_account(&account.id).await.unwrap(), account);
    assert!(h.vault.get_account(&account.id).await.is_none());
}

#[tokio::test]
async fn test_registry_survives_reopen() {
    let h = harness().await;
    h.secrets.store("seed-a", ROOT_XPRV).await.unwrap();
    let account = h.vault.derive_account(SignerKind::Mina, mina_path()).await.unwrap();

    let reopened = Vault::open(
        VaultConfig::new(),
        h.secrets.clone(),
        h.storage.clone(),
        SignerRegistry::with_mina(HmacCrypto::shared()),
    )
    .await
    .unwrap();
    assert_eq!(reopened.accounts().await, vec![account.clone()]);
    assert_eq!(reopened.sign(&message_request(mina_path())).await.unwrap().public_key, account.address);
}

#[tokio::test]
async fn test_persisted_layout() {
    let h = harness().await;
    h.secrets.store("seed-a", ROOT_XPRV).await.unwrap();
    let account = h.vault.derive_account(SignerKind::Mina, mina_path()).await.unwrap();

    let raw = h.storage.load("silex_vault").await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        value,
        json!({
            "accounts": [{
                "id": account.id,
                "address": account.address,
                "derivationPath": [2147483692u32, 2147496234u32, 2147483648u32, 0, 0],
                "signerKind": 2,
                "seedId": "seed-a"
            }]
        })
    );
    assert!(!raw.contains("xprv"));
}

#[tokio::test]
async fn test_corrupt_registry() {
    let storage = Arc::new(MemoryAccountStorage::new());
    storage.save("silex_vault", "{\"accounts\": 3}").await.unwrap();
    let err = Vault::open(
        VaultConfig::new(),
        Arc::new(MemorySecretStore::new()),
        storage,
        SignerRegistry::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, VaultError::CorruptRegistry(_)));
    assert_eq!(err.kind(), ErrorKind::CorruptData);
}

/// Storage that can be switched to reject writes.
#[derive(Default)]
struct FlakyStorage {
    inner: MemoryAccountStorage,
    failing: AtomicBool,
}

#[async_trait]
impl AccountStorage for FlakyStorage {
    async fn load(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.load(key).await
    }

    async fn save(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Storage("disk full".into()));
        }
        self.inner.save(key, value).await
    }
}

#[tokio::test]
async fn test_failed_persist_leaves_registry_unchanged() {
    let secrets = Arc::new(MemorySecretStore::new());
    secrets.store("seed-a", ROOT_XPRV).await.unwrap();
    let storage = Arc::new(FlakyStorage::default());
    let vault = Vault::open(
        VaultConfig::new(),
        secrets,
        storage.clone(),
        SignerRegistry::with_mina(HmacCrypto::shared()),
    )
    .await
    .unwrap();

    storage.failing.store(true, Ordering::SeqCst);
    let err = vault.derive_account(SignerKind::Mina, mina_path()).await.unwrap_err();
    assert!(matches!(err, VaultError::Storage(_)));
    assert!(vault.accounts().await.is_empty());

    storage.failing.store(false, Ordering::SeqCst);
    let account = vault.derive_account(SignerKind::Mina, mina_path()).await.unwrap();

    storage.failing.store(true, Ordering::SeqCst);
    assert!(vault.remove_account(&account.id).await.is_err());
    assert_eq!(vault.accounts().await, vec![account]);
}

#[tokio::test]
async fn test_add_account_conflicts() {
    let h = harness().await;
    let account = Account {
        id: "manual".into(),
        address: MINA_ADDRESS.into(),
        derivation_path: mina_path(),
        signer_kind: SignerKind::Mina,
        seed_id: "seed-a".into(),
    };
    h.vault.add_account(account.clone()).await.unwrap();
    assert_eq!(h.vault.add_account(account.clone()).await, Err(VaultError::DuplicateAccount));
    assert_eq!(
        h.vault
            .get_account_by_signer_and_derivation_path(SignerKind::Mina, &mina_path())
            .await,
        Some(account)
    );
}

#[tokio::test]
async fn test_import_and_generate_mnemonic() {
    let h = harness().await;
    let seed_id = h.vault.import_wallet(ABANDON).await.unwrap();
    let secret = h
        .secrets
        .get(&silex_core::SecretQuery::by_id(seed_id.clone()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(secret.id, seed_id);
    assert!(secret.secret.starts_with("xprv"));

    assert!(matches!(h.vault.import_wallet("nope").await, Err(VaultError::InvalidMnemonic(_))));
    assert_eq!(h.secrets.len().await, 1);

    let phrase = h.vault.generate_mnemonic().unwrap();
    assert_eq!(phrase.split_whitespace().count(), 24);
}

#[tokio::test]
async fn test_generated_mnemonic_can_be_imported_and_used() {
    let secrets = Arc::new(MemorySecretStore::new());
    let vault = Vault::open(
        VaultConfig::new().with_mnemonic_words(12),
        secrets,
        Arc::new(MemoryAccountStorage::new()),
        SignerRegistry::with_mina(HmacCrypto::shared()),
    )
    .await
    .unwrap();

    let phrase = vault.generate_mnemonic().unwrap();
    assert_eq!(phrase.split_whitespace().count(), 12);
    let seed_id = vault.import_wallet(&phrase).await.unwrap();
    let account = vault.derive_account(SignerKind::Mina, mina_path()).await.unwrap();
    assert_eq!(account.seed_id, seed_id);
}

#[tokio::test]
async fn test_file_storage_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let secrets = Arc::new(MemorySecretStore::new());
    secrets.store("seed-a", ROOT_XPRV).await.unwrap();
    let config = VaultConfig::new().with_storage_key("wallet_1");

    let vault = Vault::open(
        config.clone(),
        secrets.clone(),
        Arc::new(FileAccountStorage::new(dir.path())),
        SignerRegistry::with_mina(HmacCrypto::shared()),
    )
    .await
    .unwrap();
    let account = vault.derive_account(SignerKind::Mina, mina_path()).await.unwrap();
    assert!(dir.path().join("wallet_1.json").exists());

    let reopened = Vault::open(
        config,
        secrets,
        Arc::new(FileAccountStorage::new(dir.path())),
        SignerRegistry::with_mina(HmacCrypto::shared()),
    )
    .await
    .unwrap();
    assert_eq!(reopened.get_account(&account.id).await, Some(account));
}
