//! Common utilities and types shared across envi crates.
//!
//! This module provides the error taxonomy and the small set of value types
//! that flow between the crypto core, the codecs and the command line.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{EnvFormat, KeyFileMode, KeySource, Operation, Password};
