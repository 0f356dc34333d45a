//! Format detection without key material.

use crate::document::{EnvDocument, LineKind};
use crate::mask::{is_header, masked_payload};
use crate::whole_file;
use envi_common::EnvFormat;

/// Classify `content` as plaintext, whole-file encrypted or masked.
///
/// The whole-file marker must sit at offset zero and wins over everything
/// else. Otherwise a masked header line anywhere in the content, or any
/// assignment carrying a masked value, makes the document masked.
pub fn classify(content: &[u8]) -> EnvFormat {
    if whole_file::is_encrypted(content) {
        return EnvFormat::WholeFileEncrypted;
    }

    let document = EnvDocument::parse(content);
    let masked = document.lines().iter().any(|line| match line.kind() {
        LineKind::Comment(_) => is_header(line),
        LineKind::Assignment(assignment) => masked_payload(assignment.value()).is_some(),
        _ => false,
    });

    if masked {
        EnvFormat::Masked
    } else {
        EnvFormat::Plaintext
    }
}
