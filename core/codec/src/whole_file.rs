//! Whole-file encryption.
//!
//! Format: the literal `ENVI_ENCRYPTED_V1\n` followed by the base64 blob.

use tracing::debug;

use crate::{blob, legacy};
use envi_common::{Error, Result};
use envi_crypto::Key;

/// Marker that starts every V1 whole-file encrypted document.
pub const ENCRYPTED_MARKER: &str = "ENVI_ENCRYPTED_V1\n";

/// Encrypt an entire file's bytes as one blob.
pub fn encrypt_file(key: &Key, content: &[u8]) -> Result<Vec<u8>> {
    let encoded = blob::seal(key, content)?;

    let mut out = Vec::with_capacity(ENCRYPTED_MARKER.len() + encoded.len());
    out.extend_from_slice(ENCRYPTED_MARKER.as_bytes());
    out.extend_from_slice(encoded.as_bytes());

    debug!(input = content.len(), output = out.len(), "File encrypted");
    Ok(out)
}

/// Decrypt a whole-file encrypted document.
///
/// Whitespace around the base64 body is ignored. Legacy
/// `ENVI_ENCRYPTED:` documents are accepted as well.
///
/// # Errors
/// - `NotEncrypted` if the marker is missing
/// - `InvalidEncoding` if the body is not base64
/// - `MalformedCiphertext` / `AuthenticationFailed` from the cipher engine
pub fn decrypt_file(key: &Key, content: &[u8]) -> Result<Vec<u8>> {
    let body = if let Some(body) = content.strip_prefix(ENCRYPTED_MARKER.as_bytes()) {
        body
    } else if let Some(body) = legacy::encrypted_payload(content) {
        debug!("Decrypting legacy whole-file format");
        body
    } else {
        return Err(Error::NotEncrypted);
    };

    let plaintext = blob::open(key, body.trim_ascii())?;
    debug!(input = content.len(), output = plaintext.len(), "File decrypted");
    Ok(plaintext)
}

/// True if `content` starts with a whole-file marker (V1 or legacy).
pub fn is_encrypted(content: &[u8]) -> bool {
    content.starts_with(ENCRYPTED_MARKER.as_bytes()) || legacy::encrypted_payload(content).is_some()
}
