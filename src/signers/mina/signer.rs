use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

use super::keys::MinaPrivateKey;
use super::types::{parse_fields, MinaCrypto, MinaNetwork, MinaTransaction};
use crate::core::{DerivationPath, SignerKind};
use crate::signers::{hd, SignArgs, SignPayload, Signer, SignerError, SignerResult};

pub struct MinaSigner {
    crypto: Arc<dyn MinaCrypto>,
}

impl MinaSigner {
    pub fn new(crypto: Arc<dyn MinaCrypto>) -> Self {
        Self { crypto }
    }
}

#[async_trait]
impl Signer for MinaSigner {
    fn kind(&self) -> SignerKind {
        SignerKind::Mina
    }

    fn name(&self) -> &'static str {
        "Mina Protocol"
    }

    async fn get_public_key(&self, private_key: &str) -> SignerResult<String> {
        let key = MinaPrivateKey::from_base58(private_key)?;
        Ok(self.crypto.public_key(&key).await?)
    }

    async fn derive_child_private_key(
        &self,
        root_private_key: &str,
        derivation_path: &DerivationPath,
    ) -> SignerResult<Zeroizing<String>> {
        let secret = hd::derive_secret(root_private_key, derivation_path)?;
        let key = MinaPrivateKey::from_secret_bytes(&secret);
        Ok(key.to_base58())
    }

    async fn sign(&self, args: SignArgs<'_>) -> SignerResult<String> {
        let selector = args.network.ok_or(SignerError::MissingNetworkSelector)?;
        let network = MinaNetwork::from_selector(selector)?;
        let key = MinaPrivateKey::from_base58(args.child_private_key)?;
        debug!(sign_type = ?args.payload.sign_type(), network = network.as_str(), "mina sign");

        let signature = match args.payload {
            SignPayload::Message(message) => {
                self.crypto.sign_message(&key, message, network).await?
            }
            SignPayload::Transaction(value) => {
                let transaction: MinaTransaction = serde_json::from_value(value.clone())
                    .map_err(|e| SignerError::InvalidRequest(format!("transaction: {e}")))?;
                let payment = transaction.normalize()?;
                self.crypto.sign_transaction(&key, &payment, network).await?
            }
            SignPayload::FieldArray(fields) => {
                let fields = parse_fields(fields)?;
                self.crypto.sign_fields(&key, &fields, network).await?
            }
        };
        Ok(signature)
    }
}
