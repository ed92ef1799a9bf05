//! Minimal usage: encrypt a document for one locally generated
//! recipient keypair.
//!
//! Run with: `cargo run --example encrypt_document`

use crypto_box::aead::OsRng;
use crypto_box::SecretKey;
use sealdoc::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let html = concat!(
        "<!doctype html><html amp><head><title>Article</title></head><body>",
        "<p>Free teaser paragraph.</p>",
        r#"<section subscriptions-section="content" encrypted>"#,
        "<p>Paywalled body text.</p>",
        "</section>",
        "</body></html>"
    );

    // In production the recipient's public key comes from a key
    // provider; here we generate a throwaway keypair.
    let secret = SecretKey::generate(&mut OsRng);
    let mut recipients = RecipientSet::new();
    recipients.insert(
        "acme.example",
        RecipientKey::from_bytes(secret.public_key().as_bytes())?,
    );

    let encryptor = DocumentEncryptor::new();
    let output = encryptor.encrypt_document(html, "acme.example:premium", &recipients)?;

    println!("{output}");
    Ok(())
}
