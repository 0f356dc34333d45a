//! Read-only support for the pre-V1 framing.
//!
//! Older files used the same cipher and key derivation but different
//! markers: a whole file was `ENVI_ENCRYPTED:<base64>` with no newline,
//! and masked values were `KEY=ENVI_MASKED:<base64>` with no header line.
//! These are only ever decoded; encoding always produces V1.

/// Prefix of a legacy whole-file encrypted document.
pub const LEGACY_ENCRYPTED_PREFIX: &str = "ENVI_ENCRYPTED:";

/// Prefix of a legacy masked value.
pub const LEGACY_MASKED_PREFIX: &str = "ENVI_MASKED:";

/// Base64 payload of a legacy whole-file document, if `content` is one.
pub fn encrypted_payload(content: &[u8]) -> Option<&[u8]> {
    content.strip_prefix(LEGACY_ENCRYPTED_PREFIX.as_bytes())
}

/// Base64 payload of a legacy masked value, if `value` is one.
pub fn masked_payload(value: &[u8]) -> Option<&[u8]> {
    value.strip_prefix(LEGACY_MASKED_PREFIX.as_bytes())
}
