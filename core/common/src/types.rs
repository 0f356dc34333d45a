//! Common types used throughout envi.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use zeroize::Zeroize;

/// Password text obtained by a caller, zeroized on drop.
///
/// The core never prompts for it; callers hand over text they already
/// collected from a terminal, a flag or a test fixture.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Password(String);

impl Password {
    /// Wrap already-obtained password text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Get the password text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the password bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Number of characters (Unicode scalar values).
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password([REDACTED])")
    }
}

/// Where the key for one operation comes from.
///
/// Exactly one source is active per operation.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Derive the key from password text.
    Password(Password),
    /// Load the key from a key file (a leading `~/` is expanded).
    KeyFile(PathBuf),
}

impl KeySource {
    /// Convenience constructor for password sources.
    pub fn password(text: impl Into<String>) -> Self {
        Self::Password(Password::new(text))
    }

    /// Convenience constructor for key-file sources.
    pub fn key_file(path: impl Into<PathBuf>) -> Self {
        Self::KeyFile(path.into())
    }
}

/// How strictly key-file contents are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyFileMode {
    /// Base64 of 32 bytes, raw 32 bytes, or any other content hashed down to a key.
    #[default]
    Permissive,
    /// Only base64 of 32 bytes or raw 32 bytes are accepted.
    Strict,
}

/// Structural classification of a file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvFormat {
    /// Ordinary `.env` text.
    Plaintext,
    /// Entire file encrypted as one blob.
    WholeFileEncrypted,
    /// Values of assignment lines encrypted individually.
    Masked,
}

impl EnvFormat {
    /// True for any format that needs a key to read.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Self::Plaintext)
    }
}

impl fmt::Display for EnvFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Plaintext => "plaintext",
            Self::WholeFileEncrypted => "encrypted",
            Self::Masked => "masked",
        };
        f.write_str(name)
    }
}

/// Transformation applied to file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Whole-file encryption.
    Encrypt,
    /// Whole-file decryption.
    Decrypt,
    /// Per-value masking.
    Mask,
    /// Per-value unmasking.
    Unmask,
}

impl Operation {
    /// The operation that reverses content of the given format, if any.
    pub fn decoder_for(format: EnvFormat) -> Option<Self> {
        match format {
            EnvFormat::Plaintext => None,
            EnvFormat::WholeFileEncrypted => Some(Self::Decrypt),
            EnvFormat::Masked => Some(Self::Unmask),
        }
    }

    /// True for operations that produce protected content.
    pub fn is_encoding(&self) -> bool {
        matches!(self, Self::Encrypt | Self::Mask)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Encrypt => "encrypt",
            Self::Decrypt => "decrypt",
            Self::Mask => "mask",
            Self::Unmask => "unmask",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new("hunter2hunter2");
        assert_eq!(format!("{:?}", password), "Password([REDACTED])");
        let source = KeySource::Password(password);
        assert!(!format!("{:?}", source).contains("hunter2"));
    }

    #[test]
    fn test_password_char_len_counts_scalars() {
        assert_eq!(Password::new("pässwörd").char_len(), 8);
        assert_eq!(Password::new("pässwörd").as_bytes().len(), 10);
    }

    #[test]
    fn test_decoder_for_format() {
        assert_eq!(Operation::decoder_for(EnvFormat::Plaintext), None);
        assert_eq!(
            Operation::decoder_for(EnvFormat::WholeFileEncrypted),
            Some(Operation::Decrypt)
        );
        assert_eq!(
            Operation::decoder_for(EnvFormat::Masked),
            Some(Operation::Unmask)
        );
    }

    #[test]
    fn test_operation_is_encoding() {
        assert!(Operation::Encrypt.is_encoding());
        assert!(Operation::Mask.is_encoding());
        assert!(!Operation::Decrypt.is_encoding());
        assert!(!Operation::Unmask.is_encoding());
    }

    #[test]
    fn test_key_file_mode_serde() {
        let json = serde_json::to_string(&KeyFileMode::Strict).unwrap();
        assert_eq!(json, "\"strict\"");
        assert_eq!(KeyFileMode::default(), KeyFileMode::Permissive);
    }

    #[test]
    fn test_format_display() {
        assert_eq!(EnvFormat::Masked.to_string(), "masked");
        assert!(EnvFormat::Masked.is_protected());
        assert!(!EnvFormat::Plaintext.is_protected());
    }
}
