//! Derivation path codec
//!
//! Converts between the textual BIP32 form (`m/44'/12586'/0'/0/0`) and the
//! index array carried on the wire (`[2147483692, 2147496234, 2147483648, 0, 0]`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Offset added to an index to mark it hardened.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Errors while parsing textual derivation paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("Invalid derivation path '{path}': {reason}")]
    Format { path: String, reason: String },
}

impl PathError {
    fn format(path: &str, reason: impl Into<String>) -> Self {
        Self::Format { path: path.to_string(), reason: reason.into() }
    }
}

/// Parse `m/i1'/i2/...` into raw indices, hardened ones offset by [`HARDENED_OFFSET`].
pub fn path_to_array(path: &str) -> Result<Vec<u32>, PathError> {
    let mut segments = path.split('/');
    match segments.next() {
        Some("m") => {}
        _ => return Err(PathError::format(path, "must start with 'm'")),
    }

    segments
        .map(|segment| {
            let (digits, hardened) = match segment.strip_suffix('\'') {
                Some(digits) => (digits, true),
                None => (segment, false),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(PathError::format(path, format!("segment '{segment}' is not an index")));
            }
            let index: u32 = digits
                .parse()
                .map_err(|_| PathError::format(path, format!("segment '{segment}' out of range")))?;
            // Raw indices live below the hardened range either way, otherwise
            // the textual form would not round-trip.
            if index >= HARDENED_OFFSET {
                return Err(PathError::format(path, format!("segment '{segment}' out of range")));
            }
            Ok(if hardened { index + HARDENED_OFFSET } else { index })
        })
        .collect()
}

/// Render raw indices back into `m/...` form.
pub fn array_to_path(indices: &[u32]) -> String {
    let mut path = String::from("m");
    for &index in indices {
        path.push('/');
        if index >= HARDENED_OFFSET {
            path.push_str(&(index - HARDENED_OFFSET).to_string());
            path.push('\'');
        } else {
            path.push_str(&index.to_string());
        }
    }
    path
}

/// Ordered derivation indices. Serialized as a plain array of integers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivationPath(Vec<u32>);

impl DerivationPath {
    pub fn new(indices: Vec<u32>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[u32] {
        &self.0
    }
}

impl From<Vec<u32>> for DerivationPath {
    fn from(indices: Vec<u32>) -> Self {
        Self(indices)
    }
}

impl AsRef<[u32]> for DerivationPath {
    fn as_ref(&self) -> &[u32] {
        &self.0
    }
}

impl FromStr for DerivationPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        path_to_array(s).map(Self)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&array_to_path(&self.0))
    }
}
