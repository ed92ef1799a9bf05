//! Recipient identities and their public key material.

use crate::error::KeyProviderError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::collections::BTreeMap;

/// Length of an X25519 public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// A recipient's X25519 public key.
#[derive(Debug, Clone)]
pub struct RecipientKey {
    public: crypto_box::PublicKey,
}

impl PartialEq for RecipientKey {
    fn eq(&self, other: &Self) -> bool {
        self.public.as_bytes() == other.public.as_bytes()
    }
}

impl Eq for RecipientKey {}

impl RecipientKey {
    /// Builds a recipient key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `KeyProviderError::InvalidKeyMaterial` if the material is
    /// empty or not exactly [`PUBLIC_KEY_SIZE`] bytes. Empty key sets
    /// are invalid input, never silently skipped.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyProviderError> {
        if bytes.is_empty() {
            return Err(KeyProviderError::InvalidKeyMaterial("key material is empty".to_string()));
        }
        let raw: [u8; PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| {
            KeyProviderError::InvalidKeyMaterial(format!(
                "expected {PUBLIC_KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { public: crypto_box::PublicKey::from(raw) })
    }

    /// Builds a recipient key from base64-encoded raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `KeyProviderError::InvalidKeyMaterial` on bad base64 or
    /// wrong key length.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyProviderError> {
        let bytes = BASE64.decode(encoded.trim()).map_err(|e| {
            KeyProviderError::InvalidKeyMaterial(format!("invalid base64 key material: {e}"))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Raw public key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        self.public.as_bytes()
    }

    /// Base64 of the raw public key bytes.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.public.as_bytes())
    }

    pub(crate) const fn public(&self) -> &crypto_box::PublicKey {
        &self.public
    }
}

impl From<crypto_box::PublicKey> for RecipientKey {
    fn from(public: crypto_box::PublicKey) -> Self {
        Self { public }
    }
}

/// Mapping from recipient identifier (case-normalized domain name) to
/// that recipient's public key.
///
/// Iteration order is the sorted identifier order, which also fixes the
/// manifest entry order in the output document.
#[derive(Debug, Clone, Default)]
pub struct RecipientSet {
    keys: BTreeMap<String, RecipientKey>,
}

impl RecipientSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a recipient, lowercasing the identifier. A repeated
    /// identifier replaces the earlier key.
    pub fn insert(&mut self, recipient: impl Into<String>, key: RecipientKey) {
        self.keys.insert(recipient.into().to_ascii_lowercase(), key);
    }

    /// Whether the set holds no recipients.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of recipients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Looks up a recipient's key by normalized identifier.
    #[must_use]
    pub fn get(&self, recipient: &str) -> Option<&RecipientKey> {
        self.keys.get(&recipient.to_ascii_lowercase())
    }

    /// Iterates recipients in sorted identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecipientKey)> {
        self.keys.iter().map(|(id, key)| (id.as_str(), key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key(byte: u8) -> RecipientKey {
        RecipientKey::from_bytes(&[byte; PUBLIC_KEY_SIZE]).unwrap()
    }

    #[test]
    fn test_from_bytes_rejects_empty_material() {
        let result = RecipientKey::from_bytes(&[]);
        assert!(matches!(result, Err(KeyProviderError::InvalidKeyMaterial(_))));
    }

    #[test]
    fn test_from_bytes_rejects_wrong_length() {
        let result = RecipientKey::from_bytes(&[1u8; 16]);
        assert!(matches!(result, Err(KeyProviderError::InvalidKeyMaterial(_))));
    }

    #[test]
    fn test_base64_round_trip() {
        let key = test_key(7);
        let decoded = RecipientKey::from_base64(&key.to_base64()).unwrap();
        assert_eq!(key, decoded);
    }

    #[test]
    fn test_from_base64_rejects_garbage() {
        let result = RecipientKey::from_base64("not-base64!!");
        assert!(matches!(result, Err(KeyProviderError::InvalidKeyMaterial(_))));
    }

    #[test]
    fn test_recipient_ids_are_case_normalized() {
        let mut set = RecipientSet::new();
        set.insert("Acme.Example", test_key(1));
        assert!(set.get("acme.example").is_some());
        assert!(set.get("ACME.EXAMPLE").is_some());
    }

    #[test]
    fn test_duplicate_recipient_replaces_key() {
        let mut set = RecipientSet::new();
        set.insert("acme.example", test_key(1));
        set.insert("ACME.example", test_key(2));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("acme.example"), Some(&test_key(2)));
    }

    #[test]
    fn test_iteration_is_sorted() {
        let mut set = RecipientSet::new();
        set.insert("zeta.example", test_key(1));
        set.insert("acme.example", test_key(2));
        let ids: Vec<_> = set.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["acme.example", "zeta.example"]);
    }
}
