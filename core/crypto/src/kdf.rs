//! Key derivation from passwords and key-file contents.
//!
//! Passwords are hashed with SHA-256 into a 256-bit key. This is a single
//! fast hash, kept for compatibility with files already written in the
//! `ENVI_*_V1` formats.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::keyfile::read_key_file;
use crate::keys::{Key, KEY_LENGTH};
use envi_common::{Error, KeyFileMode, KeySource, Password, Result};

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Derive the key for one operation from its key source.
///
/// # Errors
/// - `WeakSecret` for passwords shorter than MIN_PASSWORD_LENGTH
/// - `KeyFileNotFound` if the key file does not exist
/// - `InvalidKeyFile` if the key file content is unusable under `mode`
pub fn derive_key(source: &KeySource, mode: KeyFileMode) -> Result<Key> {
    match source {
        KeySource::Password(password) => key_from_password(password),
        KeySource::KeyFile(path) => {
            let contents = Zeroizing::new(read_key_file(path)?);
            key_from_key_material(&contents, mode)
        }
    }
}

/// Derive a key from password text.
///
/// Deterministic: the same password always yields the same key.
pub fn key_from_password(password: &Password) -> Result<Key> {
    if password.char_len() < MIN_PASSWORD_LENGTH {
        return Err(Error::WeakSecret {
            min_len: MIN_PASSWORD_LENGTH,
        });
    }

    Ok(hash_to_key(password.as_bytes()))
}

/// Turn key-file contents into a key.
///
/// Surrounding ASCII whitespace is ignored. The trimmed content is tried
/// as base64 of exactly KEY_LENGTH bytes, then as KEY_LENGTH raw bytes.
/// In permissive mode anything else is hashed down to a key; in strict
/// mode it is rejected.
pub fn key_from_key_material(contents: &[u8], mode: KeyFileMode) -> Result<Key> {
    let trimmed = contents.trim_ascii();
    if trimmed.is_empty() {
        return Err(Error::InvalidKeyFile("key file is empty".to_string()));
    }

    if let Ok(decoded) = STANDARD.decode(trimmed) {
        let decoded = Zeroizing::new(decoded);
        if let Some(key) = Key::from_slice(&decoded) {
            return Ok(key);
        }
        if mode == KeyFileMode::Strict && trimmed.len() != KEY_LENGTH {
            return Err(Error::InvalidKeyFile(format!(
                "expected base64 of {} bytes, decoded {} bytes",
                KEY_LENGTH,
                decoded.len()
            )));
        }
    }

    if let Some(key) = Key::from_slice(trimmed) {
        return Ok(key);
    }

    match mode {
        KeyFileMode::Permissive => Ok(hash_to_key(trimmed)),
        KeyFileMode::Strict => Err(Error::InvalidKeyFile(format!(
            "expected {} bytes, got {}",
            KEY_LENGTH,
            trimmed.len()
        ))),
    }
}

fn hash_to_key(material: &[u8]) -> Key {
    let digest = Sha256::digest(material);
    let mut key = [0u8; KEY_LENGTH];
    key.copy_from_slice(&digest);
    Key::from_bytes(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_derivation_deterministic() {
        let password = Password::new("correct-horse-battery");

        let key1 = key_from_password(&password).unwrap();
        let key2 = key_from_password(&password).unwrap();

        assert_eq!(key1, key2);
    }

    #[test]
    fn test_password_derivation_matches_sha256() {
        let key = key_from_password(&Password::new("password")).unwrap();
        let expected: [u8; KEY_LENGTH] = [
            0x5e, 0x88, 0x48, 0x98, 0xda, 0x28, 0x04, 0x71, 0x51, 0xd0, 0xe5, 0x6f, 0x8d, 0xc6,
            0x29, 0x27, 0x73, 0x60, 0x3d, 0x0d, 0x6a, 0xab, 0xbd, 0xd6, 0x2a, 0x11, 0xef, 0x72,
            0x1d, 0x15, 0x42, 0xd8,
        ];
        assert_eq!(key.as_bytes(), &expected);
    }

    #[test]
    fn test_different_passwords_different_keys() {
        let key1 = key_from_password(&Password::new("password1")).unwrap();
        let key2 = key_from_password(&Password::new("password2")).unwrap();

        assert_ne!(key1, key2);
    }

    #[test]
    fn test_short_password_is_weak() {
        for short in ["", "a", "1234567"] {
            let result = key_from_password(&Password::new(short));
            assert!(matches!(result, Err(Error::WeakSecret { min_len: 8 })));
        }
        assert!(key_from_password(&Password::new("12345678")).is_ok());
    }

    #[test]
    fn test_password_length_counts_characters() {
        // 7 characters, 14 bytes
        assert!(matches!(
            key_from_password(&Password::new("ééééééé")),
            Err(Error::WeakSecret { .. })
        ));
    }

    #[test]
    fn test_key_material_base64() {
        let raw = [9u8; KEY_LENGTH];
        let encoded = format!("{}\n", STANDARD.encode(raw));

        let key = key_from_key_material(encoded.as_bytes(), KeyFileMode::Strict).unwrap();
        assert_eq!(key.as_bytes(), &raw);
    }

    #[test]
    fn test_key_material_raw_bytes() {
        let raw = [0xC3u8; KEY_LENGTH];

        let key = key_from_key_material(&raw, KeyFileMode::Strict).unwrap();
        assert_eq!(key.as_bytes(), &raw);
    }

    #[test]
    fn test_key_material_raw_ascii_32_that_is_also_base64() {
        // 32 ASCII characters decode as base64 to 24 bytes, so the raw path wins.
        let raw = b"abcdefghijklmnopqrstuvwxyzABCDEF";

        let key = key_from_key_material(raw, KeyFileMode::Strict).unwrap();
        assert_eq!(key.as_bytes(), raw);
    }

    #[test]
    fn test_key_material_arbitrary_is_hashed() {
        let secret = b"ten-bytes!";

        let key = key_from_key_material(secret, KeyFileMode::Permissive).unwrap();
        assert_eq!(key, hash_to_key(secret));
    }

    #[test]
    fn test_key_material_trailing_whitespace_ignored() {
        let a = key_from_key_material(b"my-shared-secret\n", KeyFileMode::Permissive).unwrap();
        let b = key_from_key_material(b"  my-shared-secret  ", KeyFileMode::Permissive).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_strict_rejects_wrong_length() {
        let result = key_from_key_material(b"ten-bytes!", KeyFileMode::Strict);
        assert!(matches!(result, Err(Error::InvalidKeyFile(_))));

        let short_b64 = STANDARD.encode([1u8; 16]);
        let result = key_from_key_material(short_b64.as_bytes(), KeyFileMode::Strict);
        assert!(matches!(result, Err(Error::InvalidKeyFile(_))));
    }

    #[test]
    fn test_empty_key_material_rejected() {
        for mode in [KeyFileMode::Permissive, KeyFileMode::Strict] {
            let result = key_from_key_material(b" \n\t", mode);
            assert!(matches!(result, Err(Error::InvalidKeyFile(_))));
        }
    }

    #[test]
    fn test_derive_key_from_password_source() {
        let source = KeySource::password("correct-horse-battery");
        let key = derive_key(&source, KeyFileMode::Permissive).unwrap();
        assert_eq!(key, key_from_password(&Password::new("correct-horse-battery")).unwrap());
    }
}
