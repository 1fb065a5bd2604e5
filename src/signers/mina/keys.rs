//! Mina key encodings.
//!
//! Private keys: Base58Check over `5a 01 || scalar (32 bytes, little-endian)`.
//! Public keys: Base58Check over `cb 01 01 || x (32 bytes, little-endian) || is_odd`.

use bitcoin::base58;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::signers::{SignerError, SignerResult};

const PRIVATE_KEY_VERSION: [u8; 2] = [0x5a, 0x01];
const PUBLIC_KEY_VERSION: [u8; 3] = [0xcb, 0x01, 0x01];
const PRIVATE_KEY_LEN: usize = PRIVATE_KEY_VERSION.len() + 32;
const PUBLIC_KEY_LEN: usize = PUBLIC_KEY_VERSION.len() + 32 + 1;

/// Pallas scalar. Top two bits are always clear so the value sits below the group order.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct MinaPrivateKey {
    scalar_le: [u8; 32],
}

impl MinaPrivateKey {
    /// Build a key from a BIP32 child secret (big-endian): mask the top two
    /// bits, then switch to little-endian.
    pub fn from_secret_bytes(secret_be: &[u8; 32]) -> Self {
        let mut scalar_le = *secret_be;
        scalar_le[0] &= 0x3f;
        scalar_le.reverse();
        Self { scalar_le }
    }

    pub fn from_base58(encoded: &str) -> SignerResult<Self> {
        let bytes = Zeroizing::new(
            base58::decode_check(encoded.trim())
                .map_err(|e| SignerError::InvalidKey(format!("base58: {e}")))?,
        );
        if bytes.len() != PRIVATE_KEY_LEN {
            return Err(SignerError::InvalidKey(format!(
                "expected {PRIVATE_KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        if bytes[..2] != PRIVATE_KEY_VERSION {
            return Err(SignerError::InvalidKey("not a Mina private key".into()));
        }
        let mut scalar_le = [0u8; 32];
        scalar_le.copy_from_slice(&bytes[2..]);
        if scalar_le[31] & 0xc0 != 0 {
            scalar_le.zeroize();
            return Err(SignerError::InvalidKey("scalar out of range".into()));
        }
        Ok(Self { scalar_le })
    }

    pub fn to_base58(&self) -> Zeroizing<String> {
        let mut bytes = Zeroizing::new(Vec::with_capacity(PRIVATE_KEY_LEN));
        bytes.extend_from_slice(&PRIVATE_KEY_VERSION);
        bytes.extend_from_slice(&self.scalar_le);
        Zeroizing::new(base58::encode_check(&bytes))
    }

    /// Scalar bytes in little-endian order, as the curve library expects them.
    pub fn scalar_le(&self) -> &[u8; 32] {
        &self.scalar_le
    }
}

impl fmt::Debug for MinaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MinaPrivateKey(<redacted>)")
    }
}

/// Check that `address` is a well-formed Mina public key (`B62…`).
pub fn validate_public_key(address: &str) -> Result<(), String> {
    let bytes = base58::decode_check(address).map_err(|e| format!("address {address}: {e}"))?;
    if bytes.len() != PUBLIC_KEY_LEN || bytes[..3] != PUBLIC_KEY_VERSION {
        return Err(format!("address {address}: not a Mina public key"));
    }
    if bytes[PUBLIC_KEY_LEN - 1] > 1 {
        return Err(format!("address {address}: bad parity byte"));
    }
    Ok(())
}
