//! Mina request types and the crypto provider capability.

use async_trait::async_trait;
use ruint::aliases::U256;
use serde::{Deserialize, Serialize};

use super::keys::{validate_public_key, MinaPrivateKey};
use crate::signers::{SignerError, SignerResult};

/// Pallas base-field modulus; signed fields must be canonical elements.
pub const PALLAS_MODULUS: U256 = U256::from_limbs([
    0x992d_30ed_0000_0001,
    0x2246_98fc_094c_f91b,
    0x0000_0000_0000_0000,
    0x4000_0000_0000_0000,
]);

/// Memo size limit in bytes.
pub const MAX_MEMO_LEN: usize = 32;

/// Network selector carried in `options[0]` of a sign request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MinaNetwork {
    Mainnet = 0,
    Testnet = 1,
}

impl MinaNetwork {
    pub fn from_selector(selector: u32) -> SignerResult<Self> {
        match selector {
            0 => Ok(MinaNetwork::Mainnet),
            1 => Ok(MinaNetwork::Testnet),
            other => Err(SignerError::InvalidRequest(format!("unknown Mina network {other}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MinaNetwork::Mainnet => "mainnet",
            MinaNetwork::Testnet => "testnet",
        }
    }
}

/// Unsigned payment as it arrives in a sign request. Amounts are decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MinaTransaction {
    pub to: String,
    pub from: String,
    pub fee: String,
    pub nonce: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

/// Normalized payment handed to the crypto provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinaPayment {
    pub to: String,
    pub from: String,
    pub fee: u64,
    pub nonce: u32,
    pub memo: Option<String>,
    pub valid_until: Option<u32>,
    pub amount: Option<u64>,
}

impl MinaTransaction {
    pub fn normalize(&self) -> SignerResult<MinaPayment> {
        validate_public_key(&self.to).map_err(SignerError::InvalidRequest)?;
        validate_public_key(&self.from).map_err(SignerError::InvalidRequest)?;
        if let Some(memo) = &self.memo {
            if memo.len() > MAX_MEMO_LEN {
                return Err(SignerError::InvalidRequest(format!(
                    "memo longer than {MAX_MEMO_LEN} bytes"
                )));
            }
        }
        Ok(MinaPayment {
            to: self.to.clone(),
            from: self.from.clone(),
            fee: parse_decimal("fee", &self.fee)?,
            nonce: parse_decimal("nonce", &self.nonce)?,
            memo: self.memo.clone(),
            valid_until: self.valid_until.as_deref().map(|v| parse_decimal("validUntil", v)).transpose()?,
            amount: self.amount.as_deref().map(|v| parse_decimal("amount", v)).transpose()?,
        })
    }
}

fn parse_decimal<T: std::str::FromStr>(name: &str, value: &str) -> SignerResult<T> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SignerError::InvalidRequest(format!("{name} must be a decimal string")));
    }
    value
        .parse()
        .map_err(|_| SignerError::InvalidRequest(format!("{name} out of range")))
}

/// Parse decimal field elements, rejecting anything outside the base field.
pub fn parse_fields(fields: &[String]) -> SignerResult<Vec<U256>> {
    fields
        .iter()
        .map(|field| {
            if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
                return Err(SignerError::InvalidRequest(format!("field '{field}' is not decimal")));
            }
            let value = U256::from_str_radix(field, 10)
                .map_err(|_| SignerError::InvalidRequest(format!("field '{field}' out of range")))?;
            if value >= PALLAS_MODULUS {
                return Err(SignerError::InvalidRequest(format!("field '{field}' out of range")));
            }
            Ok(value)
        })
        .collect()
}

/// Failure reported by the crypto provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CryptoError(pub String);

impl From<CryptoError> for SignerError {
    fn from(err: CryptoError) -> Self {
        SignerError::Crypto(err.0)
    }
}

/// Pallas/Poseidon operations the Mina signer delegates to.
///
/// Implementations must be deterministic: identical inputs yield identical
/// outputs across processes.
#[async_trait]
pub trait MinaCrypto: Send + Sync {
    /// Base58 public key (`B62…`) for `key`.
    async fn public_key(&self, key: &MinaPrivateKey) -> Result<String, CryptoError>;

    async fn sign_message(
        &self,
        key: &MinaPrivateKey,
        message: &str,
        network: MinaNetwork,
    ) -> Result<String, CryptoError>;

    async fn sign_transaction(
        &self,
        key: &MinaPrivateKey,
        payment: &MinaPayment,
        network: MinaNetwork,
    ) -> Result<String, CryptoError>;

    async fn sign_fields(
        &self,
        key: &MinaPrivateKey,
        fields: &[U256],
        network: MinaNetwork,
    ) -> Result<String, CryptoError>;
}
