//! Single entry point for callers: bytes in, bytes out.

use tracing::debug;

use crate::detect::classify;
use crate::mask::{mask_document, unmask_document};
use crate::whole_file::{decrypt_file, encrypt_file};
use envi_common::{Error, KeyFileMode, KeySource, Operation, Result};
use envi_crypto::{derive_key, Key};

/// Everything one transformation needs, passed by value.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// What to do with the content.
    pub operation: Operation,
    /// Where the key comes from.
    pub key_source: KeySource,
    /// How key files are interpreted.
    pub key_file_mode: KeyFileMode,
}

impl CodecConfig {
    /// Create a config with permissive key-file handling.
    pub fn new(operation: Operation, key_source: KeySource) -> Self {
        Self {
            operation,
            key_source,
            key_file_mode: KeyFileMode::default(),
        }
    }

    /// Set the key-file mode.
    pub fn with_key_file_mode(mut self, mode: KeyFileMode) -> Self {
        self.key_file_mode = mode;
        self
    }
}

/// Derive the key once and apply the configured operation to `content`.
///
/// Decoding operations check the content's format before touching key
/// material, so plaintext input fails with `NotEncrypted` without reading
/// a key file.
///
/// # Errors
/// Any key-derivation, encoding or cipher error. No partial output is
/// ever returned.
pub fn transform(config: CodecConfig, content: &[u8]) -> Result<Vec<u8>> {
    if !config.operation.is_encoding()
        && Operation::decoder_for(classify(content)) != Some(config.operation)
    {
        return Err(Error::NotEncrypted);
    }

    debug!(operation = %config.operation, size = content.len(), "Deriving key");
    let key = derive_key(&config.key_source, config.key_file_mode)?;
    apply(config.operation, &key, content)
}

/// Apply `operation` with an already-derived key.
pub fn apply(operation: Operation, key: &Key, content: &[u8]) -> Result<Vec<u8>> {
    match operation {
        Operation::Encrypt => encrypt_file(key, content),
        Operation::Decrypt => decrypt_file(key, content),
        Operation::Mask => mask_document(key, content),
        Operation::Unmask => unmask_document(key, content),
    }
}

/// Classify `content` and reverse whatever protection it carries.
///
/// Plaintext is returned unchanged without deriving a key.
pub fn decode(key_source: KeySource, key_file_mode: KeyFileMode, content: &[u8]) -> Result<Vec<u8>> {
    match Operation::decoder_for(classify(content)) {
        Some(operation) => {
            let config = CodecConfig::new(operation, key_source).with_key_file_mode(key_file_mode);
            transform(config, content)
        }
        None => Ok(content.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use std::fs;
    use tempfile::TempDir;

    const CONTENT: &[u8] = b"API_KEY=abc123\n# a comment\n\nDB_HOST=localhost\n";

    fn password() -> KeySource {
        KeySource::password("correct-horse-battery")
    }

    #[test]
    fn test_all_operations_roundtrip() {
        let encrypted = transform(CodecConfig::new(Operation::Encrypt, password()), CONTENT).unwrap();
        let decrypted = transform(CodecConfig::new(Operation::Decrypt, password()), &encrypted).unwrap();
        assert_eq!(decrypted, CONTENT);

        let masked = transform(CodecConfig::new(Operation::Mask, password()), CONTENT).unwrap();
        let unmasked = transform(CodecConfig::new(Operation::Unmask, password()), &masked).unwrap();
        assert_eq!(unmasked, CONTENT);
    }

    #[test]
    fn test_wrong_password_unmask() {
        let masked = transform(CodecConfig::new(Operation::Mask, password()), CONTENT).unwrap();
        let result = transform(
            CodecConfig::new(Operation::Unmask, KeySource::password("wrong-password")),
            &masked,
        );

        assert!(matches!(result, Err(Error::AuthenticationFailed)));
    }

    #[test]
    fn test_weak_password_rejected() {
        let result = transform(CodecConfig::new(Operation::Encrypt, KeySource::password("short")), CONTENT);
        assert!(matches!(result, Err(Error::WeakSecret { .. })));
    }

    #[test]
    fn test_decode_checks_format_before_key() {
        let temp = TempDir::new().unwrap();
        let missing = KeySource::key_file(temp.path().join("missing.key"));

        let result = transform(CodecConfig::new(Operation::Decrypt, missing.clone()), CONTENT);
        assert!(matches!(result, Err(Error::NotEncrypted)));

        let result = transform(CodecConfig::new(Operation::Unmask, missing.clone()), CONTENT);
        assert!(matches!(result, Err(Error::NotEncrypted)));

        let result = transform(CodecConfig::new(Operation::Encrypt, missing), CONTENT);
        assert!(matches!(result, Err(Error::KeyFileNotFound(_))));
    }

    #[test]
    fn test_cross_format_decode_rejected() {
        let masked = transform(CodecConfig::new(Operation::Mask, password()), CONTENT).unwrap();
        let result = transform(CodecConfig::new(Operation::Decrypt, password()), &masked);
        assert!(matches!(result, Err(Error::NotEncrypted)));
    }

    #[test]
    fn test_three_key_file_shapes() {
        let temp = TempDir::new().unwrap();

        let raw = temp.path().join("raw.key");
        fs::write(&raw, [0x11u8; 32]).unwrap();

        let encoded = temp.path().join("b64.key");
        fs::write(&encoded, format!("{}\n", STANDARD.encode([0x22u8; 32]))).unwrap();

        let arbitrary = temp.path().join("short.key");
        fs::write(&arbitrary, b"0123456789").unwrap();

        for path in [raw, encoded, arbitrary] {
            let source = KeySource::key_file(&path);
            let masked = transform(CodecConfig::new(Operation::Mask, source.clone()), CONTENT).unwrap();
            let unmasked = transform(CodecConfig::new(Operation::Unmask, source), &masked).unwrap();
            assert_eq!(unmasked, CONTENT, "key file {}", path.display());
        }
    }

    #[test]
    fn test_strict_mode_rejects_arbitrary_key_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("short.key");
        fs::write(&path, b"0123456789").unwrap();

        let config = CodecConfig::new(Operation::Encrypt, KeySource::key_file(&path))
            .with_key_file_mode(KeyFileMode::Strict);
        assert!(matches!(transform(config, CONTENT), Err(Error::InvalidKeyFile(_))));
    }

    #[test]
    fn test_decode_dispatches_on_format() {
        let encrypted = transform(CodecConfig::new(Operation::Encrypt, password()), CONTENT).unwrap();
        let masked = transform(CodecConfig::new(Operation::Mask, password()), CONTENT).unwrap();

        assert_eq!(decode(password(), KeyFileMode::Permissive, &encrypted).unwrap(), CONTENT);
        assert_eq!(decode(password(), KeyFileMode::Permissive, &masked).unwrap(), CONTENT);

        // Plaintext needs no key at all.
        let weak = KeySource::password("x");
        assert_eq!(decode(weak, KeyFileMode::Permissive, CONTENT).unwrap(), CONTENT);
    }
}
