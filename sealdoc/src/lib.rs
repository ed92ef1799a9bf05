//! # `sealdoc`
//!
//! Selective envelope encryption for HTML documents: protected sections
//! are encrypted under one per-document content key, and that key is
//! sealed once per trusted recipient so each recipient organization can
//! recover it with its own private key.
//!
//! ## Features
//!
//! - AEAD content encryption (AES-128-GCM)
//! - Hybrid per-recipient key sealing (X25519 + XSalsa20-Poly1305)
//! - Access-requirement tag carried inside every sealed payload
//! - All-or-nothing transform: full output or an error, never both
//! - Pluggable recipient key providers
//!
//! ## Example
//!
//! ```rust,ignore
//! use sealdoc::prelude::*;
//!
//! let provider = FileKeyProvider::new("./keys")?;
//! let recipients = resolve_recipients(&provider, &["acme.example".to_string()])?;
//!
//! let encryptor = DocumentEncryptor::new();
//! let output = encryptor.encrypt_document(&html, "acme.example:premium", &recipients)?;
//! ```

#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cipher;
pub mod content_key;
pub mod dom;
pub mod envelope;
pub mod error;
pub mod key_provider;
pub mod locate;
pub mod recipient;
pub mod seal;
pub mod transform;

pub mod prelude {
    //! Convenience re-exports for common use.
    pub use crate::content_key::{KeyAlgorithm, KeyConfig};
    pub use crate::error::{Error, KeyProviderError};
    pub use crate::key_provider::{resolve_recipients, KeyProvider};
    pub use crate::recipient::{RecipientKey, RecipientSet};
    pub use crate::transform::DocumentEncryptor;
}
