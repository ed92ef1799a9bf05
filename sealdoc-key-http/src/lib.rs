//! HTTP recipient key provider for `sealdoc`.
//!
//! Each recipient maps to a URL serving its public key document:
//!
//! ```json
//! {"algorithm": "X25519", "key": "<base64 of 32 raw bytes>"}
//! ```
//!
//! Fetching is blocking and sequential; timeouts are configured on the
//! underlying HTTP client, not in the core transform.

#![warn(clippy::pedantic, clippy::nursery)]

use sealdoc::error::KeyProviderError;
use sealdoc::key_provider::KeyProvider;
use sealdoc::recipient::RecipientKey;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Default request timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Expected `algorithm` value in a key document.
const KEY_ALGORITHM: &str = "X25519";

/// Hosted public key document.
#[derive(Debug, Deserialize)]
struct PublicKeyDocument {
    algorithm: String,
    key: String,
}

/// Parses a public key document into a [`RecipientKey`].
///
/// # Errors
///
/// Returns `KeyProviderError::InvalidKeyMaterial` on malformed JSON, an
/// unexpected algorithm, or bad key bytes.
pub fn parse_key_document(body: &str) -> Result<RecipientKey, KeyProviderError> {
    let document: PublicKeyDocument = serde_json::from_str(body).map_err(|e| {
        KeyProviderError::InvalidKeyMaterial(format!("malformed key document: {e}"))
    })?;
    if document.algorithm != KEY_ALGORITHM {
        return Err(KeyProviderError::InvalidKeyMaterial(format!(
            "unsupported key algorithm: {}",
            document.algorithm
        )));
    }
    RecipientKey::from_base64(&document.key)
}

/// Key provider that fetches recipient public keys over HTTP(S).
pub struct HttpKeyProvider {
    client: reqwest::blocking::Client,
    endpoints: HashMap<String, String>,
}

impl HttpKeyProvider {
    /// Creates a provider with no registered recipients.
    ///
    /// # Errors
    ///
    /// Returns `KeyProviderError::FetchFailed` if the HTTP client
    /// cannot be constructed.
    pub fn new() -> Result<Self, KeyProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| KeyProviderError::FetchFailed(format!("HTTP client setup: {e}")))?;
        Ok(Self { client, endpoints: HashMap::new() })
    }

    /// Registers the key URL for a recipient, replacing any earlier
    /// registration.
    pub fn register(&mut self, recipient: impl Into<String>, url: impl Into<String>) {
        self.endpoints.insert(recipient.into().to_ascii_lowercase(), url.into());
    }
}

impl KeyProvider for HttpKeyProvider {
    fn fetch_public_key(&self, recipient: &str) -> Result<RecipientKey, KeyProviderError> {
        let url = self
            .endpoints
            .get(&recipient.to_ascii_lowercase())
            .ok_or_else(|| KeyProviderError::KeyNotFound(recipient.to_string()))?;
        debug!(recipient, url = %url, "fetching public key document");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| KeyProviderError::FetchFailed(format!("{url}: {e}")))?;
        if !response.status().is_success() {
            return Err(KeyProviderError::FetchFailed(format!(
                "{url}: HTTP {}",
                response.status()
            )));
        }
        let body = response
            .text()
            .map_err(|e| KeyProviderError::FetchFailed(format!("{url}: {e}")))?;
        parse_key_document(&body)
    }
}
