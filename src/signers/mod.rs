//! Signers - per-network key derivation and signature production.
//!
//! Every network implements the same capability set:
//!
//! | Capability | Description |
//! |------------|-------------|
//! | `get_public_key` | Project a child private key to its public key / address |
//! | `derive_child_private_key` | BIP32 walk from the root key, then network post-processing |
//! | `sign` | Exhaustive dispatch over [`SignPayload`] into the network's crypto provider |
//!
//! Signers are looked up through [`SignerRegistry`], keyed by the closed
//! [`SignerKind`] enum. Adding a network means one enum case plus one
//! `Signer` implementation.

pub mod hd;
pub mod mina;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::core::{DerivationPath, SignerKind};

pub use mina::MinaSigner;

/// Errors raised by signers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignerError {
    #[error("Network selector not provided")]
    MissingNetworkSelector,
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Derivation failed: {0}")]
    DerivationError(String),
    #[error("Unsupported sign type: {0}")]
    UnsupportedSignType(u32),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Crypto provider error: {0}")]
    Crypto(String),
}

pub type SignerResult<T> = Result<T, SignerError>;

/// Wire discriminant of a sign request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SignType {
    Message = 0,
    Transaction = 1,
    FieldArray = 2,
}

impl TryFrom<u32> for SignType {
    type Error = SignerError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SignType::Message),
            1 => Ok(SignType::Transaction),
            2 => Ok(SignType::FieldArray),
            other => Err(SignerError::UnsupportedSignType(other)),
        }
    }
}

/// A sign payload resolved into its closed shape.
///
/// Transactions stay as raw values here; each network parses them into its
/// own transaction schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SignPayload {
    Message(String),
    Transaction(Value),
    FieldArray(Vec<String>),
}

impl SignPayload {
    /// Resolve the `(type, payload)` pair carried by a [`SignRequest`](crate::core::SignRequest).
    pub fn from_wire(sign_type: u32, payload: Value) -> SignerResult<Self> {
        match SignType::try_from(sign_type)? {
            SignType::Message => match payload {
                Value::String(message) => Ok(SignPayload::Message(message)),
                _ => Err(SignerError::InvalidRequest("message payload must be a string".into())),
            },
            SignType::Transaction => match payload {
                Value::Object(_) => Ok(SignPayload::Transaction(payload)),
                _ => Err(SignerError::InvalidRequest("transaction payload must be an object".into())),
            },
            SignType::FieldArray => match payload {
                Value::Array(items) => items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(field) => Ok(field),
                        _ => Err(SignerError::InvalidRequest("fields must be decimal strings".into())),
                    })
                    .collect::<SignerResult<Vec<_>>>()
                    .map(SignPayload::FieldArray),
                _ => Err(SignerError::InvalidRequest("field payload must be an array".into())),
            },
        }
    }

    pub fn sign_type(&self) -> SignType {
        match self {
            SignPayload::Message(_) => SignType::Message,
            SignPayload::Transaction(_) => SignType::Transaction,
            SignPayload::FieldArray(_) => SignType::FieldArray,
        }
    }
}

/// Arguments for [`Signer::sign`].
#[derive(Debug, Clone, Copy)]
pub struct SignArgs<'a> {
    pub payload: &'a SignPayload,
    pub child_private_key: &'a str,
    /// Raw network selector (`options[0]` of the request).
    pub network: Option<u32>,
}

/// Per-network signing capability.
///
/// `sign` must be a pure function of its arguments: the same payload, key and
/// network always produce the same signature string.
#[async_trait]
pub trait Signer: Send + Sync {
    fn kind(&self) -> SignerKind;

    /// Human readable network name.
    fn name(&self) -> &'static str;

    fn slug(&self) -> &'static str {
        self.kind().as_str()
    }

    async fn get_public_key(&self, private_key: &str) -> SignerResult<String>;

    async fn derive_child_private_key(
        &self,
        root_private_key: &str,
        derivation_path: &DerivationPath,
    ) -> SignerResult<Zeroizing<String>>;

    async fn sign(&self, args: SignArgs<'_>) -> SignerResult<String>;
}

/// Maps each [`SignerKind`] to its implementation.
#[derive(Clone, Default)]
pub struct SignerRegistry {
    signers: HashMap<SignerKind, Arc<dyn Signer>>,
}

impl SignerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the Mina signer backed by `crypto`.
    pub fn with_mina(crypto: Arc<dyn mina::MinaCrypto>) -> Self {
        Self::new().with_signer(Arc::new(MinaSigner::new(crypto)))
    }

    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.register(signer);
        self
    }

    /// Register `signer` under its own kind, replacing any previous one.
    pub fn register(&mut self, signer: Arc<dyn Signer>) {
        self.signers.insert(signer.kind(), signer);
    }

    pub fn get(&self, kind: SignerKind) -> Option<Arc<dyn Signer>> {
        self.signers.get(&kind).cloned()
    }

    pub fn kinds(&self) -> Vec<SignerKind> {
        SignerKind::ALL.into_iter().filter(|kind| self.signers.contains_key(kind)).collect()
    }
}

impl std::fmt::Debug for SignerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerRegistry").field("kinds", &self.kinds()).finish()
    }
}
