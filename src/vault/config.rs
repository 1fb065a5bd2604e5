//! Vault configuration - passed from higher layers

/// Storage key the account registry is persisted under.
pub const DEFAULT_STORAGE_KEY: &str = "silex_vault";
/// Length of freshly generated mnemonics.
pub const DEFAULT_MNEMONIC_WORDS: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    pub storage_key: String,
    /// 12, 15, 18, 21 or 24.
    pub mnemonic_words: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self { storage_key: DEFAULT_STORAGE_KEY.into(), mnemonic_words: DEFAULT_MNEMONIC_WORDS }
    }
}

impl VaultConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self { self.storage_key = key.into(); self }
    pub fn with_mnemonic_words(mut self, words: usize) -> Self { self.mnemonic_words = words; self }
}
