//! Shared fixtures: a deterministic stand-in for the Pallas/Poseidon provider.
#![allow(dead_code)]

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use ruint::aliases::U256;
use sha2::{Digest, Sha256};
use silex_core::signers::mina::{CryptoError, MinaCrypto, MinaNetwork, MinaPayment, MinaPrivateKey};
use std::sync::Arc;

pub const ROOT_XPRV: &str = "xprv9s21ZrQH143K2qibXtqGd39wAWC6cho6YL2poXyZC1ah44GGFESc2D779kstN93jzVN5Vf68usCQnHkPMcXfjNRfBp1HkDnjadcbrYwRptF";
pub const MINA_PATH: &str = "m/44'/12586'/0'/0/0";
pub const MINA_CHILD_KEY: &str = "EKEG5Dj44pUvRGwPZauMzYnneFWAyCn3qoJLCSwX2BnkJg4duYa4";
pub const MINA_ADDRESS: &str = "B62qmWKtvNQTtUqo1LxfEEDLyWMg59cp6U7c4uDC7aqgaCEijSc3Hx5";
pub const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

type HmacSha256 = Hmac<Sha256>;

/// Signatures are `hex(HMAC-SHA256(scalar_le, domain || network || data))`.
/// Public keys are well-formed `B62…` strings derived from a hash of the scalar.
pub struct HmacCrypto;

impl HmacCrypto {
    pub fn shared() -> Arc<dyn MinaCrypto> {
        Arc::new(HmacCrypto)
    }

    fn tag(key: &MinaPrivateKey, domain: &[u8], network: MinaNetwork, data: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(key.scalar_le()).expect("any key length is valid");
        mac.update(domain);
        mac.update(&[network as u8]);
        mac.update(data);
        hex::encode(mac.finalize().into_bytes())
    }
}

#[async_trait]
impl MinaCrypto for HmacCrypto {
    async fn public_key(&self, key: &MinaPrivateKey) -> Result<String, CryptoError> {
        let digest = Sha256::new().chain_update(b"pub").chain_update(key.scalar_le()).finalize();
        let mut bytes = vec![0xcb, 0x01, 0x01];
        bytes.extend_from_slice(&digest);
        bytes.push(digest[0] & 1);
        Ok(bitcoin::base58::encode_check(&bytes))
    }

    async fn sign_message(
        &self,
        key: &MinaPrivateKey,
        message: &str,
        network: MinaNetwork,
    ) -> Result<String, CryptoError> {
        Ok(Self::tag(key, b"message", network, message.as_bytes()))
    }

    async fn sign_transaction(
        &self,
        key: &MinaPrivateKey,
        payment: &MinaPayment,
        network: MinaNetwork,
    ) -> Result<String, CryptoError> {
        let canonical = format!(
            "{}|{}|{}|{}|{}|{}|{}",
            payment.from,
            payment.to,
            payment.fee,
            payment.nonce,
            payment.amount.unwrap_or(0),
            payment.valid_until.unwrap_or(u32::MAX),
            payment.memo.as_deref().unwrap_or(""),
        );
        Ok(Self::tag(key, b"transaction", network, canonical.as_bytes()))
    }

    async fn sign_fields(
        &self,
        key: &MinaPrivateKey,
        fields: &[U256],
        network: MinaNetwork,
    ) -> Result<String, CryptoError> {
        let data: Vec<u8> = fields.iter().flat_map(|field| field.to_be_bytes::<32>()).collect();
        Ok(Self::tag(key, b"fields", network, &data))
    }
}

/// A provider that is always down.
pub struct FailingCrypto;

#[async_trait]
impl MinaCrypto for FailingCrypto {
    async fn public_key(&self, _key: &MinaPrivateKey) -> Result<String, CryptoError> {
        Err(CryptoError("provider unavailable".into()))
    }

    async fn sign_message(&self, _: &MinaPrivateKey, _: &str, _: MinaNetwork) -> Result<String, CryptoError> {
        Err(CryptoError("provider unavailable".into()))
    }

    async fn sign_transaction(&self, _: &MinaPrivateKey, _: &MinaPayment, _: MinaNetwork) -> Result<String, CryptoError> {
        Err(CryptoError("provider unavailable".into()))
    }

    async fn sign_fields(&self, _: &MinaPrivateKey, _: &[U256], _: MinaNetwork) -> Result<String, CryptoError> {
        Err(CryptoError("provider unavailable".into()))
    }
}
