//! Injecting the sealed-key manifest into the document head.

use crate::dom::{Attribute, Document};
use crate::error::Error;
use std::collections::BTreeMap;

/// Media type of the manifest carrier element.
pub const MANIFEST_TYPE: &str = "application/json";

/// Flag attribute marking the carrier element as the key manifest.
pub const MANIFEST_ATTR: &str = "cryptokeys";

/// Appends one `<script type="application/json" cryptokeys>` element to
/// the document head, holding the JSON object that maps each recipient
/// identifier to its sealed content-key ciphertext.
///
/// # Errors
///
/// Returns `Error::MissingHead` if the document has no `html` > `head`
/// element; an encrypted document without a recoverable key would be
/// useless, so this aborts the transform.
pub fn inject_key_manifest(
    doc: &mut Document,
    sealed_keys: &BTreeMap<String, String>,
) -> Result<(), Error> {
    let head = doc
        .find_child_element(doc.root(), "html")
        .and_then(|html| doc.find_child_element(html, "head"))
        .ok_or(Error::MissingHead)?;

    let manifest_json = serde_json::to_string(sealed_keys)
        .map_err(|e| Error::KeySeal(format!("manifest serialization failed: {e}")))?;

    let carrier = doc.create_element(
        "script",
        vec![Attribute::new("type", MANIFEST_TYPE), Attribute::flag(MANIFEST_ATTR)],
    );
    let text = doc.create_text(manifest_json);
    doc.append_child(carrier, text);
    doc.append_child(head, carrier);
    Ok(())
}
