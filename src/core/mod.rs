//! Core data model and the derivation path codec.

pub mod path;
pub mod types;

pub use path::{array_to_path, path_to_array, DerivationPath, PathError, HARDENED_OFFSET};
pub use types::{Account, SignRequest, Signature, SignerKind, TransportAccount};
