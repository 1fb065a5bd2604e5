//! Generic BIP32 tree walk shared by every network signer.

use bitcoin::bip32::{ChildNumber, Xpriv};
use bitcoin::secp256k1::Secp256k1;
use std::str::FromStr;
use zeroize::Zeroizing;

use super::{SignerError, SignerResult};
use crate::core::DerivationPath;

/// Parse root key material into a BIP32 master key.
///
/// Accepts an extended private key (`xprv…` / `tprv…`) or a hex-encoded
/// master seed of 16 to 64 bytes.
pub fn master_key(root_private_key: &str) -> SignerResult<Xpriv> {
    let root = root_private_key.trim();
    if root.starts_with("xprv") || root.starts_with("tprv") {
        return Xpriv::from_str(root)
            .map_err(|e| SignerError::InvalidKey(format!("extended key: {e}")));
    }

    let seed = Zeroizing::new(
        hex::decode(root).map_err(|e| SignerError::InvalidKey(format!("root seed: {e}")))?,
    );
    if !(16..=64).contains(&seed.len()) {
        return Err(SignerError::InvalidKey(format!(
            "root seed must be 16-64 bytes, got {}",
            seed.len()
        )));
    }
    Xpriv::new_master(bitcoin::Network::Bitcoin, &seed)
        .map_err(|e| SignerError::DerivationError(e.to_string()))
}

/// Walk `path` from the root key and return the child's 32-byte big-endian secret.
pub fn derive_secret(
    root_private_key: &str,
    path: &DerivationPath,
) -> SignerResult<Zeroizing<[u8; 32]>> {
    let master = master_key(root_private_key)?;
    let secp = Secp256k1::signing_only();
    let steps: Vec<ChildNumber> = path.indices().iter().map(|&index| ChildNumber::from(index)).collect();
    let child = master
        .derive_priv(&secp, &steps)
        .map_err(|e| SignerError::DerivationError(e.to_string()))?;
    Ok(Zeroizing::new(child.private_key.secret_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT_XPRV: &str = "xprv9s21ZrQH143K2qibXtqGd39wAWC6cho6YL2poXyZC1ah44GGFESc2D779kstN93jzVN5Vf68usCQnHkPMcXfjNRfBp1HkDnjadcbrYwRptF";

    #[test]
    fn test_derivation_is_deterministic() {
        let path: DerivationPath = "m/44'/12586'/0'/0/0".parse().unwrap();
        let first = derive_secret(ROOT_XPRV, &path).unwrap();
        let second = derive_secret(ROOT_XPRV, &path).unwrap();
        assert_eq!(*first, *second);
    }

    #[test]
    fn test_different_paths_differ() {
        let a = derive_secret(ROOT_XPRV, &"m/44'/12586'/0'/0/0".parse().unwrap()).unwrap();
        let b = derive_secret(ROOT_XPRV, &"m/44'/12586'/1'/0/0".parse().unwrap()).unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn test_empty_path_is_master() {
        let master = master_key(ROOT_XPRV).unwrap();
        let secret = derive_secret(ROOT_XPRV, &DerivationPath::default()).unwrap();
        assert_eq!(*secret, master.private_key.secret_bytes());
    }

    #[test]
    fn test_hex_seed_root() {
        let seed = "000102030405060708090a0b0c0d0e0f";
        let master = master_key(seed).unwrap();
        // BIP32 test vector 1 master key
        assert_eq!(
            master.to_string(),
            "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi"
        );
    }

    #[test]
    fn test_rejects_bad_root_material() {
        assert!(matches!(master_key("xprvnotakey"), Err(SignerError::InvalidKey(_))));
        assert!(matches!(master_key("zz"), Err(SignerError::InvalidKey(_))));
        assert!(matches!(master_key("0011"), Err(SignerError::InvalidKey(_))));
    }
}
