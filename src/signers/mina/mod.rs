//! Mina Protocol signer.
//!
//! Key derivation (BIP32 walk, scalar masking, Mina key encoding) is done
//! here. Pallas curve arithmetic and Poseidon-based signing are delegated to
//! a [`MinaCrypto`] provider.

mod keys;
mod signer;
mod types;

pub use keys::{validate_public_key, MinaPrivateKey};
pub use signer::MinaSigner;
pub use types::{
    parse_fields, CryptoError, MinaCrypto, MinaNetwork, MinaPayment, MinaTransaction,
    MAX_MEMO_LEN, PALLAS_MODULUS,
};
