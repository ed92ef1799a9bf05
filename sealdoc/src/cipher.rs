//! Authenticated encryption of protected section contents.
//!
//! Each section's direct children are serialized in document order into
//! one plaintext, encrypted under the per-document content key with
//! AES-128-GCM, and replaced by a single
//! `<script type="application/octet-stream" ciphertext>` child holding
//! the base64 ciphertext.

use crate::content_key::ContentKey;
use crate::dom::{Attribute, Document, NodeId};
use crate::error::Error;
use aes_gcm::aead::{rand_core::RngCore, Aead, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Nonce size for AES-GCM (96 bits).
const NONCE_SIZE: usize = 12;

/// Media type of the ciphertext carrier element.
pub const CIPHERTEXT_TYPE: &str = "application/octet-stream";

/// Flag attribute marking the carrier element as holding ciphertext.
pub const CIPHERTEXT_ATTR: &str = "ciphertext";

/// Cipher over one document's content key.
///
/// Every section of a document is encrypted with the same key; a fresh
/// nonce is drawn per section and prepended to the ciphertext, so the
/// stored form is `base64(nonce || ciphertext)`.
pub struct SectionCipher {
    cipher: Aes128Gcm,
}

impl SectionCipher {
    /// Instantiates the AEAD cipher for a content key.
    ///
    /// # Errors
    ///
    /// Returns `Error::Encryption` if the key length does not match the
    /// cipher.
    pub fn new(key: &ContentKey) -> Result<Self, Error> {
        let cipher = Aes128Gcm::new_from_slice(key.expose_raw())
            .map_err(|e| Error::Encryption(format!("invalid content key: {e}")))?;
        Ok(Self { cipher })
    }

    /// Encrypts one protected section in place.
    ///
    /// The section's children are removed and replaced by exactly one
    /// ciphertext carrier element.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidContent` if the serialized content is not
    /// valid UTF-8 text, or `Error::Encryption` if the AEAD primitive
    /// fails. The caller must discard the document on error; the
    /// section may already have lost its children.
    pub fn encrypt_section(&self, doc: &mut Document, section: NodeId) -> Result<(), Error> {
        let mut plaintext = Vec::new();
        for &child in doc.children(section) {
            plaintext.extend_from_slice(doc.serialize_node(child).as_bytes());
        }
        validate_plaintext(&plaintext)?;
        doc.detach_children(section);

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from(nonce_bytes);

        // no associated data; the manifest binds keys to the document
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|e| Error::Encryption(format!("AES-GCM encryption failed: {e}")))?;

        let mut stored = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        stored.extend_from_slice(&nonce_bytes);
        stored.extend_from_slice(&ciphertext);

        let carrier = doc.create_element(
            "script",
            vec![Attribute::new("type", CIPHERTEXT_TYPE), Attribute::flag(CIPHERTEXT_ATTR)],
        );
        let text = doc.create_text(BASE64.encode(stored));
        doc.append_child(carrier, text);
        doc.append_child(section, carrier);
        Ok(())
    }
}

/// Section plaintext must be valid UTF-8 text before encryption.
fn validate_plaintext(bytes: &[u8]) -> Result<(), Error> {
    std::str::from_utf8(bytes)
        .map(|_| ())
        .map_err(|e| Error::InvalidContent(format!("content is not valid UTF-8: {e}")))
}
