//! Content key generation and its serialized keyset form.
//!
//! One content key is generated per document and used for every
//! protected section. Alongside the raw bytes, the key carries a
//! self-describing keyset (algorithm identifier, key id, key material)
//! so a recipient can re-instantiate the cipher from the sealed payload
//! alone.

use crate::error::Error;
use aes_gcm::aead::{rand_core::RngCore, OsRng};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use secrecy::{ExposeSecret, SecretVec};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Key id assigned to the single key in a document keyset.
const PRIMARY_KEY_ID: u32 = 1;

/// Symmetric algorithm for content encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// AES-128-GCM AEAD cipher (default).
    Aes128Gcm,
}

impl KeyAlgorithm {
    /// Key length in bytes.
    #[must_use]
    pub const fn key_size(self) -> usize {
        match self {
            Self::Aes128Gcm => 16,
        }
    }

    /// Identifier written into the serialized keyset.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Aes128Gcm => "AES128_GCM",
        }
    }
}

impl Default for KeyAlgorithm {
    fn default() -> Self {
        Self::Aes128Gcm
    }
}

/// Explicit configuration for content key generation, passed into the
/// components that need it rather than read from ambient state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyConfig {
    pub algorithm: KeyAlgorithm,
}

/// Serialized, self-describing form of a content key.
///
/// This is the transport form embedded (base64-encoded) inside every
/// sealed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentKeyset {
    /// Id of the (single) key in this keyset.
    pub primary_key_id: u32,
    /// Algorithm identifier, see [`KeyAlgorithm::name`].
    pub algorithm: String,
    /// Base64-encoded raw key bytes.
    pub key: String,
}

/// A fresh per-document symmetric key plus its keyset form.
pub struct ContentKey {
    raw: SecretVec<u8>,
    algorithm: KeyAlgorithm,
    keyset_base64: String,
}

impl ContentKey {
    /// Generates a statistically independent fresh key from the OS
    /// CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns `Error::KeyGeneration` if the random source fails or the
    /// keyset cannot be serialized. There is no degraded fallback.
    pub fn generate(config: &KeyConfig) -> Result<Self, Error> {
        let mut raw = vec![0u8; config.algorithm.key_size()];
        OsRng
            .try_fill_bytes(&mut raw)
            .map_err(|e| Error::KeyGeneration(format!("random source failed: {e}")))?;

        let keyset = DocumentKeyset {
            primary_key_id: PRIMARY_KEY_ID,
            algorithm: config.algorithm.name().to_string(),
            key: BASE64.encode(&raw),
        };
        let mut keyset_json = serde_json::to_vec(&keyset)
            .map_err(|e| Error::KeyGeneration(format!("keyset serialization failed: {e}")))?;
        let keyset_base64 = BASE64.encode(&keyset_json);
        keyset_json.zeroize();

        Ok(Self { raw: SecretVec::new(raw), algorithm: config.algorithm, keyset_base64 })
    }

    /// Raw key bytes.
    #[must_use]
    pub fn expose_raw(&self) -> &[u8] {
        self.raw.expose_secret()
    }

    /// Algorithm this key was generated for.
    #[must_use]
    pub const fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Base64 of the serialized keyset, ready for embedding in a sealed
    /// payload.
    #[must_use]
    pub fn keyset_base64(&self) -> &str {
        &self.keyset_base64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key_length() {
        let key = ContentKey::generate(&KeyConfig::default()).expect("generation failed");
        assert_eq!(key.expose_raw().len(), 16);
        assert_eq!(key.algorithm(), KeyAlgorithm::Aes128Gcm);
    }

    #[test]
    fn test_generated_keys_are_independent() {
        let key1 = ContentKey::generate(&KeyConfig::default()).unwrap();
        let key2 = ContentKey::generate(&KeyConfig::default()).unwrap();
        assert_ne!(key1.expose_raw(), key2.expose_raw());
    }

    #[test]
    fn test_keyset_round_trips_through_base64_json() {
        let key = ContentKey::generate(&KeyConfig::default()).unwrap();
        let json = BASE64.decode(key.keyset_base64()).expect("invalid base64");
        let keyset: DocumentKeyset = serde_json::from_slice(&json).expect("invalid keyset JSON");

        assert_eq!(keyset.primary_key_id, 1);
        assert_eq!(keyset.algorithm, "AES128_GCM");
        assert_eq!(BASE64.decode(&keyset.key).unwrap(), key.expose_raw());
    }

    #[test]
    fn test_keyset_field_names_are_camel_case() {
        let key = ContentKey::generate(&KeyConfig::default()).unwrap();
        let json = BASE64.decode(key.keyset_base64()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert!(value.get("primaryKeyId").is_some());
        assert!(value.get("algorithm").is_some());
        assert!(value.get("key").is_some());
    }
}
