//! File formats for envi: whole-file encryption, per-value masking and
//! format detection.
//!
//! All functions take the content as bytes and return new bytes; none of
//! them read or write the file being transformed. A failed call returns
//! no output at all.
//!
//! | Form | Layout |
//! |---|---|
//! | Whole-file | `ENVI_ENCRYPTED_V1\n` + base64(nonce ‖ ciphertext ‖ tag) |
//! | Masked | `# ENVI_MASKED_ENCRYPTION_V1` line, then the original lines with each non-empty value replaced by `ENVI_MASKED[base64(...)]` |

pub mod blob;
pub mod detect;
pub mod document;
pub mod legacy;
pub mod mask;
pub mod ops;
pub mod whole_file;

pub use detect::classify;
pub use document::{Assignment, EnvDocument, Line, LineEnding, LineKind};
pub use mask::{mask_document, unmask_document, MASKED_HEADER};
pub use ops::{apply, decode, transform, CodecConfig};
pub use whole_file::{decrypt_file, encrypt_file, ENCRYPTED_MARKER};
