//! Base64 transport encoding of encrypted blobs.
//!
//! A blob is `nonce || ciphertext || tag` as produced by the cipher engine;
//! both the whole-file and the masking formats carry it as standard,
//! padded base64.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use envi_common::{Error, Result};
use envi_crypto::{decrypt, encrypt, Key};

/// Encrypt `plaintext` and return the blob as base64 text.
pub fn seal(key: &Key, plaintext: &[u8]) -> Result<String> {
    let blob = encrypt(key, plaintext)?;
    Ok(STANDARD.encode(blob))
}

/// Decode base64 text and decrypt the blob inside it.
///
/// # Errors
/// - `InvalidEncoding` if `encoded` is not valid base64
/// - `MalformedCiphertext` / `AuthenticationFailed` from the cipher engine
pub fn open(key: &Key, encoded: &[u8]) -> Result<Vec<u8>> {
    let blob = STANDARD
        .decode(encoded)
        .map_err(|e| Error::InvalidEncoding(e.to_string()))?;
    decrypt(key, &blob)
}
