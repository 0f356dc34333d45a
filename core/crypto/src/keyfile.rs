//! Key file access: reading with permission repair, and generation.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::keys::Key;
use envi_common::{Error, Result};

/// Expand a leading `~/` to the current user's home directory.
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home = dirs::home_dir().ok_or_else(|| {
                Error::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    "home directory could not be determined",
                ))
            })?;
            Ok(home.join(rest))
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}

/// Read the raw contents of a key file.
///
/// A key file readable by group or others is narrowed to owner-only
/// access; failure to do so is reported as a warning and does not stop
/// the read.
///
/// # Errors
/// - `KeyFileNotFound` if the file does not exist
/// - `Io` for any other access failure
pub fn read_key_file(path: &Path) -> Result<Vec<u8>> {
    let path = expand_home(path)?;

    let metadata = match fs::metadata(&path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::KeyFileNotFound(path));
        }
        Err(e) => return Err(e.into()),
    };

    repair_permissions(&path, &metadata);

    let contents = fs::read(&path)?;
    debug!(path = %path.display(), "Key file read");
    Ok(contents)
}

#[cfg(unix)]
fn repair_permissions(path: &Path, metadata: &fs::Metadata) {
    use std::os::unix::fs::PermissionsExt;

    let mode = metadata.permissions().mode() & 0o777;
    if mode & 0o077 == 0 {
        return;
    }

    warn!(
        path = %path.display(),
        mode = %format!("{:o}", mode),
        "Key file has loose permissions, restricting to 0600"
    );
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        warn!(
            path = %path.display(),
            error = %e,
            "Could not fix key file permissions"
        );
    }
}

#[cfg(not(unix))]
fn repair_permissions(_path: &Path, _metadata: &fs::Metadata) {}

/// Generate a new random key and store it base64-encoded at `path`.
///
/// The file is created exclusively with owner-only permissions.
///
/// # Errors
/// - `KeyFileExists` if something already exists at `path`
/// - `Io` if the file cannot be written
pub fn generate_key_file(path: &Path) -> Result<(Key, PathBuf)> {
    let path = expand_home(path)?;
    let key = Key::generate();
    let encoded = Zeroizing::new(format!("{}\n", STANDARD.encode(key.as_bytes())));

    let mut file = match create_exclusive(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(Error::KeyFileExists(path));
        }
        Err(e) => return Err(e.into()),
    };
    file.write_all(encoded.as_bytes())?;
    file.sync_all()?;

    debug!(path = %path.display(), "Key file generated");
    Ok((key, path))
}

#[cfg(unix)]
fn create_exclusive(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_exclusive(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new().write(true).create_new(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::key_from_key_material;
    use envi_common::KeyFileMode;
    use tempfile::TempDir;

    #[test]
    fn test_missing_key_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.key");

        let result = read_key_file(&path);
        assert!(matches!(result, Err(Error::KeyFileNotFound(p)) if p == path));
    }

    #[test]
    fn test_generate_then_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".envi.key");

        let (key, written) = generate_key_file(&path).unwrap();
        assert_eq!(written, path);

        let contents = read_key_file(&path).unwrap();
        let loaded = key_from_key_material(&contents, KeyFileMode::Strict).unwrap();
        assert_eq!(loaded, key);
    }

    #[test]
    fn test_generate_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".envi.key");
        fs::write(&path, b"existing").unwrap();

        let result = generate_key_file(&path);
        assert!(matches!(result, Err(Error::KeyFileExists(_))));
        assert_eq!(fs::read(&path).unwrap(), b"existing");
    }

    #[cfg(unix)]
    #[test]
    fn test_generated_key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".envi.key");
        generate_key_file(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_loose_permissions_are_repaired() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("loose.key");
        fs::write(&path, [5u8; 32]).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let contents = read_key_file(&path).unwrap();
        assert_eq!(contents, vec![5u8; 32]);

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_expand_home() {
        let plain = expand_home(Path::new("keys/.envi.key")).unwrap();
        assert_eq!(plain, PathBuf::from("keys/.envi.key"));

        if let Some(home) = dirs::home_dir() {
            let expanded = expand_home(Path::new("~/.envi.key")).unwrap();
            assert_eq!(expanded, home.join(".envi.key"));
        }
    }
}
