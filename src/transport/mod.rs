//! Transport codec - compact text envelopes for QR codes, clipboard and deep links.
//!
//! # Wire format
//!
//! ```text
//! base64( zlib( cbor( message ) ) )
//! ```
//!
//! | Message | Fields |
//! |---------|--------|
//! | [`TransportAccount`] | `address`, `signerKind`, `derivationPath` |
//! | [`SignRequest`] | `payload`, `derivationPath`, `signerKind`, `type`, `options?` |
//! | [`Signature`] | `signature`, `publicKey` |
//!
//! Every schema is closed: unknown fields, unknown signer kinds and wrong
//! types are rejected. CBOR that `serde` would flatten without complaint
//! (tags, duplicate or non-text map keys, non-finite floats) is rejected
//! before the schema is applied. Inbound envelopes come from untrusted peers, so every
//! decoding failure collapses into the single [`TransportError::Decode`]
//! without saying which stage failed.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::io::Write;
use tracing::debug;

use crate::core::{SignRequest, Signature, TransportAccount};

/// Largest envelope accepted or produced, in characters.
pub const MAX_ENCODED_LEN: usize = 64 * 1024;
/// Largest decompressed message accepted, in bytes.
pub const MAX_DECODED_LEN: usize = 256 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to encode transport message: {0}")]
    Encode(String),
    #[error("Invalid transport data")]
    Decode,
}

pub type TransportResult<T> = Result<T, TransportError>;

/// A message that can cross the transport boundary.
pub trait Transportable: Serialize + DeserializeOwned {
    /// Message name, for diagnostics only.
    const MESSAGE: &'static str;

    fn to_transport(&self) -> TransportResult<String> {
        encode(self)
    }

    fn from_transport(encoded: &str) -> TransportResult<Self> {
        decode(encoded)
    }
}

impl Transportable for TransportAccount {
    const MESSAGE: &'static str = "account";
}

impl Transportable for SignRequest {
    const MESSAGE: &'static str = "sign-request";
}

impl Transportable for Signature {
    const MESSAGE: &'static str = "signature";
}

pub fn encode<T: Transportable>(message: &T) -> TransportResult<String> {
    let mut cbor = Vec::new();
    ciborium::ser::into_writer(message, &mut cbor)
        .map_err(|e| TransportError::Encode(format!("cbor: {e}")))?;
    if cbor.len() > MAX_DECODED_LEN {
        return Err(TransportError::Encode(format!(
            "{} exceeds {MAX_DECODED_LEN} bytes",
            T::MESSAGE
        )));
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(&cbor)
        .map_err(|e| TransportError::Encode(format!("zlib: {e}")))?;
    let compressed = encoder
        .finish()
        .map_err(|e| TransportError::Encode(format!("zlib: {e}")))?;

    let encoded = STANDARD.encode(compressed);
    if encoded.len() > MAX_ENCODED_LEN {
        return Err(TransportError::Encode(format!(
            "{} exceeds {MAX_ENCODED_LEN} characters",
            T::MESSAGE
        )));
    }
    Ok(encoded)
}

pub fn decode<T: Transportable>(encoded: &str) -> TransportResult<T> {
    unpack(encoded).map_err(|reason| {
        debug!(message = T::MESSAGE, %reason, "rejected transport data");
        TransportError::Decode
    })
}

pub fn encode_account(account: &TransportAccount) -> TransportResult<String> {
    encode(account)
}

pub fn decode_account(encoded: &str) -> TransportResult<TransportAccount> {
    decode(encoded)
}

pub fn encode_sign_request(request: &SignRequest) -> TransportResult<String> {
    encode(request)
}

pub fn decode_sign_request(encoded: &str) -> TransportResult<SignRequest> {
    decode(encoded)
}

pub fn encode_signature(signature: &Signature) -> TransportResult<String> {
    encode(signature)
}

pub fn decode_signature(encoded: &str) -> TransportResult<Signature> {
    decode(encoded)
}

fn unpack<T: DeserializeOwned>(encoded: &str) -> Result<T, String> {
    if encoded.len() > MAX_ENCODED_LEN {
        return Err("envelope too large".into());
    }
    let compressed = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| format!("base64: {e}"))?;
    let cbor = inflate(&compressed)?;

    let mut reader = cbor.as_slice();
    let item: ciborium::Value =
        ciborium::de::from_reader(&mut reader).map_err(|e| format!("cbor: {e}"))?;
    if !reader.is_empty() {
        return Err(format!("{} trailing bytes after message", reader.len()));
    }
    check_item(&item)?;
    item.deserialized().map_err(|e| format!("schema: {e}"))
}

/// Reject CBOR that has no faithful JSON-model reading.
fn check_item(item: &ciborium::Value) -> Result<(), String> {
    use ciborium::Value;

    match item {
        Value::Tag(tag, _) => Err(format!("tag {tag}")),
        Value::Float(f) if !f.is_finite() => Err("non-finite float".into()),
        Value::Array(items) => items.iter().try_for_each(check_item),
        Value::Map(entries) => {
            let mut keys = HashSet::with_capacity(entries.len());
            for (key, value) in entries {
                let Value::Text(key) = key else {
                    return Err("non-text map key".into());
                };
                if !keys.insert(key.as_str()) {
                    return Err(format!("duplicate map key {key:?}"));
                }
                check_item(value)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Inflate a complete zlib stream. Truncated streams, checksum mismatches,
/// trailing bytes and oversized output are all errors.
fn inflate(compressed: &[u8]) -> Result<Vec<u8>, String> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity((compressed.len() * 4).clamp(64, MAX_DECODED_LEN));

    loop {
        let consumed = inflater.total_in() as usize;
        let produced = inflater.total_out();
        let status = inflater
            .decompress_vec(&compressed[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| format!("zlib: {e}"))?;

        if status == Status::StreamEnd {
            break;
        }
        if out.len() > MAX_DECODED_LEN {
            return Err("decompressed message too large".into());
        }
        if out.len() == out.capacity() {
            out.reserve(out.len().min(MAX_DECODED_LEN + 1 - out.len()).max(64));
            continue;
        }
        if inflater.total_in() as usize == consumed && inflater.total_out() == produced {
            return Err("truncated zlib stream".into());
        }
    }

    if out.len() > MAX_DECODED_LEN {
        return Err("decompressed message too large".into());
    }
    if inflater.total_in() as usize != compressed.len() {
        return Err("trailing bytes after zlib stream".into());
    }
    Ok(out)
}
