//! SHA-256 checksums of wire documents.

use sha2::{Digest, Sha256};

use super::error::SaveError;
use crate::transform::WireDocument;

/// Hex-encoded SHA-256 over the document's canonical bytes.
///
/// Any checksum already present is ignored, so recomputing over a
/// document that carries one gives the same value.
pub fn checksum(document: &WireDocument) -> Result<String, SaveError> {
    let bytes = document.canonical_bytes().map_err(SaveError::serialize)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Whether the checksum a document carries matches its content.
/// Documents without one never verify.
pub fn verify(document: &WireDocument) -> Result<bool, SaveError> {
    match document.checksum() {
        Some(expected) => Ok(checksum(document)? == expected),
        None => Ok(false),
    }
}
