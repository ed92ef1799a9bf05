//! File-based recipient key provider for `sealdoc`.
//!
//! Public keys are stored one file per recipient and the provider is
//! suitable for development, testing and air-gapped setups.

#![warn(clippy::pedantic, clippy::nursery)]

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use crypto_box::aead::OsRng;
use crypto_box::SecretKey;
use sealdoc::error::KeyProviderError;
use sealdoc::key_provider::KeyProvider;
use sealdoc::recipient::RecipientKey;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-based key provider.
///
/// Keys are stored in the filesystem with the following structure:
/// ```text
/// keys/
/// ├── acme.example.pub    (base64 X25519 public key)
/// ├── acme.example.key    (base64 X25519 secret key, 0600 permissions)
/// └── zeta.example.pub
/// ```
/// Only `.pub` files are read by the provider; `.key` files exist so
/// locally generated recipients can later decrypt.
pub struct FileKeyProvider {
    key_dir: PathBuf,
}

impl FileKeyProvider {
    /// Creates a provider over an existing key directory.
    ///
    /// # Errors
    ///
    /// Returns `KeyProviderError::FetchFailed` if the directory does
    /// not exist.
    pub fn new(key_dir: impl Into<PathBuf>) -> Result<Self, KeyProviderError> {
        let key_dir = key_dir.into();
        if !key_dir.is_dir() {
            return Err(KeyProviderError::FetchFailed(format!(
                "key directory does not exist: {}",
                key_dir.display()
            )));
        }
        Ok(Self { key_dir })
    }

    fn public_key_path(&self, recipient: &str) -> PathBuf {
        self.key_dir.join(format!("{}.pub", recipient.to_ascii_lowercase()))
    }
}

impl KeyProvider for FileKeyProvider {
    fn fetch_public_key(&self, recipient: &str) -> Result<RecipientKey, KeyProviderError> {
        let path = self.public_key_path(recipient);
        if !path.is_file() {
            return Err(KeyProviderError::KeyNotFound(recipient.to_string()));
        }
        debug!(recipient, path = %path.display(), "loading public key file");
        let encoded = fs::read_to_string(&path)?;
        RecipientKey::from_base64(&encoded)
    }
}

/// Generates a fresh X25519 keypair for a recipient and writes both
/// halves into `key_dir`. Returns the public key.
///
/// # Errors
///
/// Returns `KeyProviderError::Io` if the files cannot be written.
pub fn generate_keypair(
    key_dir: impl AsRef<Path>,
    recipient: &str,
) -> Result<RecipientKey, KeyProviderError> {
    let key_dir = key_dir.as_ref();
    fs::create_dir_all(key_dir)?;

    let secret = SecretKey::generate(&mut OsRng);
    let public = RecipientKey::from_bytes(secret.public_key().as_bytes())?;
    let recipient = recipient.to_ascii_lowercase();

    let secret_path = key_dir.join(format!("{recipient}.key"));
    fs::write(&secret_path, BASE64.encode(secret.to_bytes()))?;
    restrict_permissions(&secret_path)?;

    fs::write(key_dir.join(format!("{recipient}.pub")), public.to_base64())?;
    debug!(recipient = %recipient, dir = %key_dir.display(), "generated recipient keypair");
    Ok(public)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generated_key_round_trips_through_provider() {
        let dir = TempDir::new().expect("temp dir");
        let public = generate_keypair(dir.path(), "acme.example").expect("keygen failed");

        let provider = FileKeyProvider::new(dir.path()).expect("provider");
        let fetched = provider.fetch_public_key("acme.example").expect("fetch failed");
        assert_eq!(fetched, public);
    }

    #[test]
    fn test_recipient_lookup_is_case_insensitive() {
        let dir = TempDir::new().expect("temp dir");
        generate_keypair(dir.path(), "Acme.Example").expect("keygen failed");

        let provider = FileKeyProvider::new(dir.path()).expect("provider");
        assert!(provider.fetch_public_key("ACME.EXAMPLE").is_ok());
    }

    #[test]
    fn test_unknown_recipient_is_key_not_found() {
        let dir = TempDir::new().expect("temp dir");
        let provider = FileKeyProvider::new(dir.path()).expect("provider");
        let result = provider.fetch_public_key("nobody.example");
        assert!(matches!(result, Err(KeyProviderError::KeyNotFound(_))));
    }

    #[test]
    fn test_corrupted_key_file_is_invalid_material() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("acme.example.pub"), "!!! not base64 !!!").unwrap();

        let provider = FileKeyProvider::new(dir.path()).expect("provider");
        let result = provider.fetch_public_key("acme.example");
        assert!(matches!(result, Err(KeyProviderError::InvalidKeyMaterial(_))));
    }

    #[test]
    fn test_missing_directory_is_rejected() {
        let result = FileKeyProvider::new("/does/not/exist");
        assert!(matches!(result, Err(KeyProviderError::FetchFailed(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_secret_key_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("temp dir");
        generate_keypair(dir.path(), "acme.example").expect("keygen failed");

        let mode = fs::metadata(dir.path().join("acme.example.key"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
