//! Persistent CLI defaults stored as JSON.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use envi_common::KeyFileMode;

/// Directory under the home directory holding envi state.
pub const CONFIG_DIRNAME: &str = ".envi";

/// Config file name inside CONFIG_DIRNAME.
pub const CONFIG_FILENAME: &str = "config.json";

/// Key file used when neither a flag nor the config names one.
pub const DEFAULT_KEY_FILE: &str = ".envi.key";

/// Defaults applied when the corresponding flags are absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// `protect` applies protection at all.
    pub encrypt_by_default: bool,
    /// `protect` masks values instead of encrypting the whole file.
    pub use_masked_encryption: bool,
    /// Use a key file instead of prompting for a password.
    pub use_key_file_by_default: bool,
    /// Key file path used when `--key-file` is absent.
    pub default_key_file: Option<PathBuf>,
    /// Only accept key files holding exactly 32 bytes.
    pub strict_key_file: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            encrypt_by_default: true,
            use_masked_encryption: true,
            use_key_file_by_default: false,
            default_key_file: None,
            strict_key_file: false,
        }
    }
}

impl CliConfig {
    /// Default location: `~/.envi/config.json`.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(CONFIG_DIRNAME).join(CONFIG_FILENAME))
    }

    /// Load the config, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Write the config, creating its directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_private_dir(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut data = serde_json::to_string_pretty(self)?;
        data.push('\n');
        write_private(path, data.as_bytes())
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    /// Update one field from its textual form.
    pub fn set(&mut self, field: &str, value: &str) -> Result<()> {
        match field {
            "encrypt_by_default" => self.encrypt_by_default = parse_bool(value)?,
            "use_masked_encryption" => self.use_masked_encryption = parse_bool(value)?,
            "use_key_file_by_default" => self.use_key_file_by_default = parse_bool(value)?,
            "strict_key_file" => self.strict_key_file = parse_bool(value)?,
            "default_key_file" => {
                self.default_key_file = match value.trim() {
                    "" | "none" => None,
                    path => Some(PathBuf::from(path)),
                };
            }
            other => bail!(
                "Unknown config field '{}'. Fields: encrypt_by_default, use_masked_encryption, \
                 use_key_file_by_default, default_key_file, strict_key_file",
                other
            ),
        }
        Ok(())
    }

    /// Key file path from the config, or the built-in default.
    pub fn key_file(&self) -> PathBuf {
        self.default_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_FILE))
    }

    pub fn key_file_mode(&self) -> KeyFileMode {
        if self.strict_key_file {
            KeyFileMode::Strict
        } else {
            KeyFileMode::Permissive
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => bail!("Expected a boolean (true/false), got '{}'", other),
    }
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new().recursive(true).mode(0o700).create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)
}

/// Replace `path` with `content` atomically.
///
/// The bytes go to an owner-only temporary file in the same directory,
/// which is then renamed over `path`. If anything fails the existing file
/// is left as it was.
pub fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::Builder::new().prefix(".envi-").tempfile_in(dir)?;
    file.write_all(content)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
