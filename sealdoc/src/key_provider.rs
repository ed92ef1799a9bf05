//! Key provider abstraction for resolving recipient public keys.

use crate::error::KeyProviderError;
use crate::recipient::{RecipientKey, RecipientSet};

/// Resolves a recipient identifier to that recipient's public key
/// material.
///
/// How the material is obtained (network, disk, configuration) is the
/// implementation's concern; the transform itself only ever sees an
/// already-resolved [`RecipientSet`]. Implementations must be
/// thread-safe (`Send + Sync`) so callers may fan out fetches across
/// recipients.
pub trait KeyProvider: Send + Sync {
    /// Fetches the public key for one recipient.
    ///
    /// # Errors
    ///
    /// Returns `KeyProviderError::KeyNotFound` if the recipient is
    /// unknown, `FetchFailed` if retrieval fails, or
    /// `InvalidKeyMaterial` if the retrieved material is unusable.
    fn fetch_public_key(&self, recipient: &str) -> Result<RecipientKey, KeyProviderError>;
}

/// Resolves a list of recipient identifiers into a [`RecipientSet`]
/// using the given provider. One failed fetch fails the whole
/// resolution; no recipient is silently dropped.
///
/// # Errors
///
/// Propagates the first [`KeyProviderError`] encountered.
pub fn resolve_recipients<P: KeyProvider + ?Sized>(
    provider: &P,
    recipients: &[String],
) -> Result<RecipientSet, KeyProviderError> {
    let mut set = RecipientSet::new();
    for recipient in recipients {
        let key = provider.fetch_public_key(recipient)?;
        set.insert(recipient.clone(), key);
    }
    Ok(set)
}
