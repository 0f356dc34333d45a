//! Common error types for envi.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for envi encryption and masking operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Password is shorter than the minimum accepted length.
    #[error("Weak secret: password must be at least {min_len} characters long")]
    WeakSecret { min_len: usize },

    /// Key file does not exist.
    #[error("Key file not found: {}", .0.display())]
    KeyFileNotFound(PathBuf),

    /// Key file content cannot be turned into a key.
    #[error("Invalid key file: {0}")]
    InvalidKeyFile(String),

    /// Key file generation refused to overwrite an existing file.
    #[error("Key file already exists: {}", .0.display())]
    KeyFileExists(PathBuf),

    /// Authentication tag did not verify (wrong key, tampering or truncation).
    #[error("Authentication failed: wrong key or corrupted data")]
    AuthenticationFailed,

    /// Ciphertext is too short to contain a nonce.
    #[error("Malformed ciphertext: input is shorter than a nonce")]
    MalformedCiphertext,

    /// Content lacks the expected encryption marker.
    #[error("Content is not encrypted or uses an unsupported format")]
    NotEncrypted,

    /// Base64 transport encoding could not be decoded.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Cipher construction or encryption failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
