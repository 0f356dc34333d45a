//! Cryptographic primitives for envi.
//!
//! This module provides:
//! - Key derivation from passwords and key files
//! - Authenticated encryption using AES-256-GCM
//! - A key type with automatic zeroization
//! - Key file generation with owner-only permissions
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged
//! - Every encryption uses a fresh random nonce

pub mod aead;
pub mod kdf;
pub mod keyfile;
pub mod keys;

pub use aead::{decrypt, encrypt, NONCE_SIZE, TAG_SIZE};
pub use kdf::{derive_key, key_from_key_material, key_from_password, MIN_PASSWORD_LENGTH};
pub use keyfile::{expand_home, generate_key_file, read_key_file};
pub use keys::{Key, KEY_LENGTH};
