//! Shared data model: accounts, sign requests, signatures.
//!
//! Everything here is public metadata. Private key material never appears in
//! these types; it lives in the secret store and in transient `Zeroizing`
//! buffers inside the vault.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use super::path::DerivationPath;

/// Network family an account belongs to. Closed set, wire value is the discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum SignerKind {
    Evm = 0,
    Solana = 1,
    Mina = 2,
}

impl SignerKind {
    pub const ALL: [SignerKind; 3] = [SignerKind::Evm, SignerKind::Solana, SignerKind::Mina];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignerKind::Evm => "evm",
            SignerKind::Solana => "solana",
            SignerKind::Mina => "mina",
        }
    }
}

impl From<SignerKind> for u8 {
    fn from(kind: SignerKind) -> Self {
        kind as u8
    }
}

impl TryFrom<u8> for SignerKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SignerKind::Evm),
            1 => Ok(SignerKind::Solana),
            2 => Ok(SignerKind::Mina),
            other => Err(format!("unknown signer kind {other}")),
        }
    }
}

impl fmt::Display for SignerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An enrolled account. Immutable once created; only inserted or removed whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Account {
    pub id: String,
    pub address: String,
    pub derivation_path: DerivationPath,
    pub signer_kind: SignerKind,
    /// Secret-store id of the root seed this account was derived from.
    pub seed_id: String,
}

/// The shareable projection of an [`Account`]: what a companion device needs
/// to address it, without local ids or seed bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransportAccount {
    pub address: String,
    pub signer_kind: SignerKind,
    pub derivation_path: DerivationPath,
}

impl From<&Account> for TransportAccount {
    fn from(account: &Account) -> Self {
        Self {
            address: account.address.clone(),
            signer_kind: account.signer_kind,
            derivation_path: account.derivation_path.clone(),
        }
    }
}

/// A request to sign `payload` with the account at (`signer_kind`, `derivation_path`).
///
/// `sign_type` is the raw discriminant (0 message, 1 transaction, 2 field
/// array); it is resolved into a closed type by the signer layer. The first
/// element of `options` selects the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignRequest {
    pub payload: Value,
    pub derivation_path: DerivationPath,
    pub signer_kind: SignerKind,
    #[serde(rename = "type")]
    pub sign_type: u32,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub options: Option<Vec<u32>>,
}

/// An optional field may be absent, but never an explicit null.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl SignRequest {
    pub fn new(
        signer_kind: SignerKind,
        derivation_path: DerivationPath,
        sign_type: u32,
        payload: Value,
    ) -> Self {
        Self { payload, derivation_path, signer_kind, sign_type, options: None }
    }

    pub fn with_options(mut self, options: Vec<u32>) -> Self {
        self.options = Some(options);
        self
    }

    /// Network selector carried in `options[0]`, if any.
    pub fn network_selector(&self) -> Option<u32> {
        self.options.as_ref().and_then(|options| options.first().copied())
    }
}

/// Result of a signing operation, both values encoded by the network signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Signature {
    pub signature: String,
    pub public_key: String,
}

impl Signature {
    pub fn new(signature: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self { signature: signature.into(), public_key: public_key.into() }
    }
}
