//! The end-to-end document encryption transform.
//!
//! Parse, locate, generate the content key, encrypt every protected
//! section, seal the key per recipient, inject the manifest, serialize.
//! Any failure at any stage aborts the whole transform and the
//! partially mutated tree is dropped; output exists only when every
//! stage has succeeded.

use crate::cipher::SectionCipher;
use crate::content_key::{ContentKey, KeyConfig};
use crate::dom::Document;
use crate::envelope::inject_key_manifest;
use crate::error::Error;
use crate::locate::find_protected_sections;
use crate::recipient::RecipientSet;
use crate::seal::seal_content_key;
use std::collections::BTreeMap;
use tracing::debug;

/// Encrypts protected sections of HTML documents.
///
/// # Example
///
/// ```ignore
/// use sealdoc::prelude::*;
///
/// let mut recipients = RecipientSet::new();
/// recipients.insert("acme.example", RecipientKey::from_base64(&key_b64)?);
///
/// let encryptor = DocumentEncryptor::new();
/// let output = encryptor.encrypt_document(&html, "acme.example:premium", &recipients)?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentEncryptor {
    key_config: KeyConfig,
}

impl DocumentEncryptor {
    /// Creates an encryptor with the default key configuration
    /// (AES-128-GCM).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an encryptor with an explicit key configuration.
    #[must_use]
    pub const fn with_config(key_config: KeyConfig) -> Self {
        Self { key_config }
    }

    /// Runs the whole transform over one document.
    ///
    /// # Arguments
    ///
    /// * `html` - Complete input document text
    /// * `access_requirement` - Entitlement string sealed alongside the
    ///   content key; opaque to this crate
    /// * `recipients` - Already-resolved, non-empty recipient set
    ///
    /// # Errors
    ///
    /// Any error from the underlying stages aborts the transform:
    /// `Parse`, `NoProtectedSections`, `NoRecipients`,
    /// `InvalidContent`, `KeyGeneration`, `Encryption`, `KeySeal`,
    /// `MissingHead`. No partial output is ever produced.
    pub fn encrypt_document(
        &self,
        html: &str,
        access_requirement: &str,
        recipients: &RecipientSet,
    ) -> Result<String, Error> {
        let mut doc = Document::parse(html)?;

        let sections = find_protected_sections(&doc);
        if sections.is_empty() {
            return Err(Error::NoProtectedSections);
        }
        debug!(sections = sections.len(), "located protected sections");

        // checked after section location: a document with nothing to
        // protect is reported as such for any recipient set
        if recipients.is_empty() {
            return Err(Error::NoRecipients);
        }

        let content_key = ContentKey::generate(&self.key_config)?;
        debug!(algorithm = content_key.algorithm().name(), "generated content key");

        let cipher = SectionCipher::new(&content_key)?;
        for &section in &sections {
            cipher.encrypt_section(&mut doc, section)?;
        }
        debug!(sections = sections.len(), "encrypted section contents");

        let mut sealed_keys = BTreeMap::new();
        for (recipient, key) in recipients.iter() {
            let sealed = seal_content_key(content_key.keyset_base64(), access_requirement, key)
                .map_err(|e| match e {
                    Error::KeySeal(msg) => Error::KeySeal(format!("{recipient}: {msg}")),
                    other => other,
                })?;
            sealed_keys.insert(recipient.to_string(), sealed);
        }
        debug!(recipients = sealed_keys.len(), "sealed content key per recipient");

        inject_key_manifest(&mut doc, &sealed_keys)?;

        Ok(doc.serialize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipient::RecipientKey;
    use crypto_box::aead::OsRng;
    use crypto_box::SecretKey;

    const DOC: &str = concat!(
        "<!doctype html><html amp><head><title>t</title></head><body>",
        r#"<section subscriptions-section="content" encrypted><p>Secret</p></section>"#,
        "</body></html>"
    );

    fn one_recipient() -> RecipientSet {
        let secret = SecretKey::generate(&mut OsRng);
        let mut set = RecipientSet::new();
        set.insert("acme.example", RecipientKey::from_bytes(secret.public_key().as_bytes()).unwrap());
        set
    }

    #[test]
    fn test_transform_succeeds_on_valid_input() {
        let output = DocumentEncryptor::new()
            .encrypt_document(DOC, "acme.example:premium", &one_recipient())
            .expect("transform failed");

        assert!(output.contains(r#"<script type="application/octet-stream" ciphertext>"#));
        assert!(output.contains(r#"<script type="application/json" cryptokeys>"#));
        assert!(!output.contains("Secret"));
    }

    #[test]
    fn test_empty_recipient_set_fails() {
        let result =
            DocumentEncryptor::new().encrypt_document(DOC, "req", &RecipientSet::new());
        assert!(matches!(result, Err(Error::NoRecipients)));
    }

    #[test]
    fn test_no_protected_sections_fails() {
        let html = "<html amp><head></head><body><p>free</p></body></html>";
        let result = DocumentEncryptor::new().encrypt_document(html, "req", &one_recipient());
        assert!(matches!(result, Err(Error::NoProtectedSections)));
    }

    #[test]
    fn test_no_protected_sections_fails_regardless_of_recipients() {
        let html = "<html amp><head></head><body><p>free</p></body></html>";
        // zero sections wins over zero recipients
        let result =
            DocumentEncryptor::new().encrypt_document(html, "req", &RecipientSet::new());
        assert!(matches!(result, Err(Error::NoProtectedSections)));
        let result = DocumentEncryptor::new().encrypt_document(html, "req", &one_recipient());
        assert!(matches!(result, Err(Error::NoProtectedSections)));
    }

    #[test]
    fn test_missing_head_fails_and_suppresses_output() {
        let html = concat!(
            "<html amp><body>",
            r#"<section subscriptions-section="content" encrypted><p>Secret</p></section>"#,
            "</body></html>"
        );
        let result = DocumentEncryptor::new().encrypt_document(html, "req", &one_recipient());
        assert!(matches!(result, Err(Error::MissingHead)));
    }

    #[test]
    fn test_malformed_input_fails_with_parse_error() {
        let result =
            DocumentEncryptor::new().encrypt_document("<html amp><p>", "req", &one_recipient());
        assert!(matches!(result, Err(Error::Parse(_))));
    }
}
