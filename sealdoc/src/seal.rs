//! Hybrid sealing of the content key, once per recipient.
//!
//! The sealed plaintext is the JSON payload
//! `{"accessRequirements":[<requirement>],"key":<base64 keyset>}`.
//! Sealing uses an ephemeral X25519 key agreement with the recipient's
//! public key and XSalsa20-Poly1305 for the data encapsulation. The
//! wire form, base64-encoded for the manifest, is
//! `ephemeral_public_key(32) || nonce(24) || ciphertext`.

use crate::error::Error;
use crate::recipient::RecipientKey;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use crypto_box::aead::{Aead, AeadCore, OsRng};
use crypto_box::{SalsaBox, SecretKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Payload sealed for each recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedKeyPayload {
    /// Entitlements a decrypting party must satisfy. Opaque to this
    /// crate; carried verbatim.
    pub access_requirements: Vec<String>,
    /// Base64 of the serialized content keyset.
    pub key: String,
}

/// Seals the content keyset for one recipient.
///
/// A pure function of its inputs plus fresh randomness: each call draws
/// a new ephemeral keypair and nonce, so sealing the same keyset twice
/// yields different ciphertexts that decrypt to the same payload.
///
/// # Errors
///
/// Returns `Error::KeySeal` if payload serialization or the hybrid
/// primitive fails. Invalid recipient key material is rejected earlier,
/// when the [`RecipientKey`] is constructed.
pub fn seal_content_key(
    keyset_base64: &str,
    access_requirement: &str,
    recipient: &RecipientKey,
) -> Result<String, Error> {
    let payload = SealedKeyPayload {
        access_requirements: vec![access_requirement.to_string()],
        key: keyset_base64.to_string(),
    };
    let mut payload_json = serde_json::to_vec(&payload)
        .map_err(|e| Error::KeySeal(format!("payload serialization failed: {e}")))?;

    let ephemeral = SecretKey::generate(&mut OsRng);
    let ephemeral_public = ephemeral.public_key();
    let sealer = SalsaBox::new(recipient.public(), &ephemeral);
    let nonce = SalsaBox::generate_nonce(&mut OsRng);

    let ciphertext = sealer
        .encrypt(&nonce, payload_json.as_slice())
        .map_err(|e| Error::KeySeal(format!("hybrid encryption failed: {e}")))?;
    payload_json.zeroize();

    let mut sealed = Vec::with_capacity(32 + 24 + ciphertext.len());
    sealed.extend_from_slice(ephemeral_public.as_bytes());
    sealed.extend_from_slice(nonce.as_slice());
    sealed.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(sealed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto_box::PublicKey;

    /// Inverse of the sealing wire format, for round-trip verification.
    fn unseal(sealed_base64: &str, secret: &SecretKey) -> SealedKeyPayload {
        let sealed = BASE64.decode(sealed_base64).expect("invalid base64");
        let (ephemeral, rest) = sealed.split_at(32);
        let (nonce, ciphertext) = rest.split_at(24);

        let ephemeral_raw: [u8; 32] = ephemeral.try_into().unwrap();
        let opener = SalsaBox::new(&PublicKey::from(ephemeral_raw), secret);
        let payload_json = opener
            .decrypt(crypto_box::Nonce::from_slice(nonce), ciphertext)
            .expect("unsealing failed");
        serde_json::from_slice(&payload_json).expect("invalid payload JSON")
    }

    #[test]
    fn test_seal_round_trip() {
        let secret = SecretKey::generate(&mut OsRng);
        let recipient = RecipientKey::from_bytes(secret.public_key().as_bytes()).unwrap();

        let sealed =
            seal_content_key("a2V5c2V0", "acme.example:premium", &recipient).expect("seal failed");
        let payload = unseal(&sealed, &secret);

        assert_eq!(payload.access_requirements, vec!["acme.example:premium".to_string()]);
        assert_eq!(payload.key, "a2V5c2V0");
    }

    #[test]
    fn test_sealing_is_randomized() {
        let secret = SecretKey::generate(&mut OsRng);
        let recipient = RecipientKey::from_bytes(secret.public_key().as_bytes()).unwrap();

        let sealed1 = seal_content_key("a2V5c2V0", "req", &recipient).unwrap();
        let sealed2 = seal_content_key("a2V5c2V0", "req", &recipient).unwrap();
        assert_ne!(sealed1, sealed2);

        // both still decrypt to the identical payload
        assert_eq!(unseal(&sealed1, &secret), unseal(&sealed2, &secret));
    }

    #[test]
    fn test_payload_json_uses_camel_case_names() {
        let payload = SealedKeyPayload {
            access_requirements: vec!["acme.example:premium".to_string()],
            key: "a2V5c2V0".to_string(),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(
            json,
            r#"{"accessRequirements":["acme.example:premium"],"key":"a2V5c2V0"}"#
        );
    }

    #[test]
    fn test_wrong_secret_cannot_unseal() {
        let secret = SecretKey::generate(&mut OsRng);
        let other = SecretKey::generate(&mut OsRng);
        let recipient = RecipientKey::from_bytes(secret.public_key().as_bytes()).unwrap();

        let sealed = seal_content_key("a2V5c2V0", "req", &recipient).unwrap();
        let bytes = BASE64.decode(&sealed).unwrap();
        let (ephemeral, rest) = bytes.split_at(32);
        let (nonce, ciphertext) = rest.split_at(24);
        let ephemeral_raw: [u8; 32] = ephemeral.try_into().unwrap();
        let opener = SalsaBox::new(&PublicKey::from(ephemeral_raw), &other);
        assert!(opener.decrypt(crypto_box::Nonce::from_slice(nonce), ciphertext).is_err());
    }
}
