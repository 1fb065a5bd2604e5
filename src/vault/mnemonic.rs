//! BIP39 mnemonics: generation and conversion into root key material.

use bip39::{Language, Mnemonic};
use bitcoin::bip32::Xpriv;
use rand::RngCore;
use zeroize::Zeroizing;

use super::{VaultError, VaultResult};

/// Generate a fresh English mnemonic of `word_count` words.
pub fn generate_mnemonic(word_count: usize) -> VaultResult<Zeroizing<String>> {
    let entropy_len = match word_count {
        12 => 16,
        15 => 20,
        18 => 24,
        21 => 28,
        24 => 32,
        _ => {
            return Err(VaultError::InvalidMnemonic(format!(
                "word count must be 12, 15, 18, 21 or 24, got {word_count}"
            )))
        }
    };

    let mut entropy = Zeroizing::new(vec![0u8; entropy_len]);
    rand::thread_rng().fill_bytes(&mut entropy);

    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
        .map_err(|e| VaultError::InvalidMnemonic(format!("generation failed: {e}")))?;
    Ok(Zeroizing::new(mnemonic.to_string()))
}

/// Mnemonic (empty passphrase) -> BIP39 seed -> master extended private key.
pub fn root_key_from_mnemonic(phrase: &str) -> VaultResult<Zeroizing<String>> {
    let mnemonic = Mnemonic::parse_in(Language::English, phrase.trim())
        .map_err(|e| VaultError::InvalidMnemonic(e.to_string()))?;
    let seed = Zeroizing::new(mnemonic.to_seed(""));
    let master = Xpriv::new_master(bitcoin::Network::Bitcoin, &seed[..])
        .map_err(|e| VaultError::InvalidMnemonic(format!("master key: {e}")))?;
    Ok(Zeroizing::new(master.to_string()))
}
