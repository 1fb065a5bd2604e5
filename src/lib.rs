//! Silex core: the key-management and signing core of a self-custodial wallet.
//!
//! # Architecture
//!
//! ```text
//! Vault (entry point)
//!   │
//!   ├── SecretStore     root keys by seed id (external, e.g. browser credentials)
//!   ├── AccountStorage  persisted account registry
//!   └── SignerRegistry
//!         └── MinaSigner ── MinaCrypto (Pallas/Poseidon provider)
//!
//! Transport: SignRequest / Signature / TransportAccount <-> base64(zlib(cbor))
//! Path codec: "m/44'/12586'/0'/0/0" <-> [2147483692, 2147496234, 2147483648, 0, 0]
//! ```
//!
//! # Features
//!
//! - `native` - CLI, file-backed account storage, tracing subscriber
//! - `wasm` - wasm-bindgen bindings for the transport and path codecs
//!
//! # Usage
//!
//! ```ignore
//! use silex_core::{SignerKind, SignerRegistry, Vault, VaultConfig};
//!
//! let vault = Vault::open(
//!     VaultConfig::new(),
//!     secrets,
//!     Arc::new(MemoryAccountStorage::new()),
//!     SignerRegistry::with_mina(crypto),
//! ).await?;
//!
//! vault.import_wallet("abandon abandon ...").await?;
//! let account = vault.derive_account(SignerKind::Mina, "m/44'/12586'/0'/0/0".parse()?).await?;
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod core;
pub mod signers;
pub mod transport;
pub mod vault;

// =============================================================================
// Native-only modules
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(feature = "wasm")]
pub mod wasm;

// =============================================================================
// Re-exports: Shared
// =============================================================================
pub use core::{
    array_to_path, path_to_array, Account, DerivationPath, PathError, SignRequest, Signature,
    SignerKind, TransportAccount, HARDENED_OFFSET,
};
pub use signers::mina::{MinaCrypto, MinaNetwork, MinaPrivateKey};
pub use signers::{MinaSigner, SignArgs, SignPayload, SignType, Signer, SignerError, SignerRegistry};
pub use transport::{
    decode_account, decode_sign_request, decode_signature, encode_account, encode_sign_request,
    encode_signature, TransportError, Transportable,
};
pub use vault::{
    AccountStorage, ErrorKind, MemoryAccountStorage, MemorySecretStore, RootKey, SecretQuery,
    SecretStore, StoreError, StoredSecret, Vault, VaultConfig, VaultError,
};

// =============================================================================
// Re-exports: Native
// =============================================================================
#[cfg(feature = "native")]
pub use vault::FileAccountStorage;

// =============================================================================
// Re-exports: WASM
// =============================================================================
#[cfg(feature = "wasm")]
pub use wasm::{WasmPath, WasmTransport};
