//! Error types for `sealdoc` operations.

use std::fmt;

/// Main error type for the document encryption transform.
///
/// Every variant aborts the whole transform: either the fully encrypted
/// document is returned, or one of these, never partial output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input document is not well-formed markup
    #[error("parse error: {0}")]
    Parse(String),

    /// No protected sections were found in the document body
    #[error("no protected sections found in document")]
    NoProtectedSections,

    /// Recipient set is empty, so the content key could not be sealed for anyone
    #[error("recipient set is empty")]
    NoRecipients,

    /// Section content is not validly encodable as UTF-8 text
    #[error("invalid section content: {0}")]
    InvalidContent(String),

    /// Content key generation or keyset serialization failed
    #[error("content key generation failed: {0}")]
    KeyGeneration(String),

    /// Section encryption failed
    #[error("section encryption failed: {0}")]
    Encryption(String),

    /// Sealing the content key for a recipient failed
    #[error("key sealing failed for recipient: {0}")]
    KeySeal(String),

    /// Document has no head element to carry the key manifest
    #[error("document has no head element for the key manifest")]
    MissingHead,

    /// Key provider operation failed
    #[error("key provider error: {0}")]
    KeyProvider(#[from] KeyProviderError),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors specific to key provider operations.
#[derive(Debug)]
pub enum KeyProviderError {
    /// No public key known for the recipient
    KeyNotFound(String),

    /// Retrieval of the key material failed (network, disk, ...)
    FetchFailed(String),

    /// Retrieved key material is empty or malformed
    InvalidKeyMaterial(String),

    /// I/O operation failed
    Io(std::io::Error),
}

impl fmt::Display for KeyProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyNotFound(id) => write!(f, "public key not found for recipient: {id}"),
            Self::FetchFailed(msg) => write!(f, "public key fetch failed: {msg}"),
            Self::InvalidKeyMaterial(msg) => write!(f, "invalid public key material: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for KeyProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for KeyProviderError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
