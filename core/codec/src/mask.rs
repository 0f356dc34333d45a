//! Per-value masking of `.env` documents.
//!
//! Masking encrypts only the value side of assignment lines. Keys,
//! comments, blank lines, unparseable lines, line order and line
//! terminators are left exactly as they were, and a header line marks the
//! document as masked:
//!
//! ```text
//! # ENVI_MASKED_ENCRYPTION_V1
//! # database
//! DB_HOST=ENVI_MASKED[<base64 blob>]
//! DB_PASSWORD=
//! ```

use tracing::debug;

use crate::detect::classify;
use crate::document::{EnvDocument, Line, LineKind};
use crate::{blob, legacy};
use envi_common::{EnvFormat, Error, Result};
use envi_crypto::Key;

/// Header line prepended to every masked document.
pub const MASKED_HEADER: &str = "# ENVI_MASKED_ENCRYPTION_V1";

/// Opening of a masked value.
pub const MASKED_VALUE_PREFIX: &str = "ENVI_MASKED[";

/// Closing of a masked value.
pub const MASKED_VALUE_SUFFIX: &str = "]";

/// Mask every non-empty assignment value in `content`.
///
/// Empty values are left as they are.
pub fn mask_document(key: &Key, content: &[u8]) -> Result<Vec<u8>> {
    let document = EnvDocument::parse(content);

    let mut out = Vec::with_capacity(content.len() * 2 + MASKED_HEADER.len() + 1);
    out.extend_from_slice(MASKED_HEADER.as_bytes());
    out.push(b'\n');

    let mut masked = 0usize;
    for line in document.lines() {
        match line.kind() {
            LineKind::Assignment(assignment) if !assignment.value().is_empty() => {
                let sealed = blob::seal(key, assignment.value())?;
                out.extend_from_slice(assignment.key_part());
                out.extend_from_slice(MASKED_VALUE_PREFIX.as_bytes());
                out.extend_from_slice(sealed.as_bytes());
                out.extend_from_slice(MASKED_VALUE_SUFFIX.as_bytes());
                out.extend_from_slice(line.ending().as_bytes());
                masked += 1;
            }
            _ => line.write_to(&mut out),
        }
    }

    debug!(lines = document.len(), masked, "Document masked");
    Ok(out)
}

/// Reverse [`mask_document`].
///
/// The first header line is dropped and every masked value is decrypted
/// back in place. Legacy `ENVI_MASKED:` values are decrypted too. The
/// whole document fails on the first value that cannot be recovered.
///
/// # Errors
/// - `NotEncrypted` if the content is not a masked document
/// - `InvalidEncoding` if a masked value is not base64
/// - `MalformedCiphertext` / `AuthenticationFailed` from the cipher engine
pub fn unmask_document(key: &Key, content: &[u8]) -> Result<Vec<u8>> {
    if classify(content) != EnvFormat::Masked {
        return Err(Error::NotEncrypted);
    }

    let document = EnvDocument::parse(content);
    let mut out = Vec::with_capacity(content.len());
    let mut header_seen = false;
    let mut unmasked = 0usize;

    for (index, line) in document.lines().iter().enumerate() {
        if !header_seen && is_header(line) {
            header_seen = true;
            continue;
        }

        match line.kind() {
            LineKind::Assignment(assignment) => match masked_payload(assignment.value()) {
                Some((payload, trailing)) => {
                    let plaintext = blob::open(key, payload).inspect_err(|e| {
                        debug!(line = index + 1, error = %e, "Masked value could not be recovered");
                    })?;
                    out.extend_from_slice(assignment.key_part());
                    out.extend_from_slice(&plaintext);
                    out.extend_from_slice(trailing);
                    out.extend_from_slice(line.ending().as_bytes());
                    unmasked += 1;
                }
                None if assignment.value().starts_with(MASKED_VALUE_PREFIX.as_bytes()) => {
                    debug!(line = index + 1, "Masked value is missing its closing bracket");
                    return Err(Error::InvalidEncoding(format!(
                        "unterminated masked value on line {}",
                        index + 1
                    )));
                }
                None => line.write_to(&mut out),
            },
            _ => line.write_to(&mut out),
        }
    }

    debug!(lines = document.len(), unmasked, "Document unmasked");
    Ok(out)
}

/// True if `line` is the masked-document header.
pub(crate) fn is_header(line: &Line<'_>) -> bool {
    matches!(line.kind(), LineKind::Comment(text) if text.trim_ascii() == MASKED_HEADER.as_bytes())
}

/// Split a masked value (V1 or legacy) into its base64 payload and the
/// bytes that follow it, such as trailing spaces or a `# comment`.
///
/// Base64 never contains `]`, so a V1 payload ends at the first one.
pub(crate) fn masked_payload(value: &[u8]) -> Option<(&[u8], &[u8])> {
    if let Some(rest) = value.strip_prefix(MASKED_VALUE_PREFIX.as_bytes()) {
        let suffix = MASKED_VALUE_SUFFIX.as_bytes();
        let end = rest.windows(suffix.len()).position(|w| w == suffix)?;
        return Some((&rest[..end], &rest[end + suffix.len()..]));
    }

    legacy::masked_payload(value).map(|payload| payload.split_at(payload.trim_ascii_end().len()))
}
