//! Locating protected sections in a parsed document.
//!
//! A protected section is a `<section>` element under `<body>` carrying
//! `subscriptions-section="content"` together with an `encrypted`
//! attribute. The `encrypted` attribute only needs to be present; its
//! value, if any, is ignored.

use crate::dom::{Document, NodeId};

/// Tag name of candidate elements.
pub const SECTION_TAG: &str = "section";

/// Attribute marking an element as subscription content.
pub const CONTENT_SECTION_ATTR: &str = "subscriptions-section";

/// Required value of [`CONTENT_SECTION_ATTR`].
pub const CONTENT_SECTION_VALUE: &str = "content";

/// Attribute marking a content section for encryption.
pub const ENCRYPTED_ATTR: &str = "encrypted";

/// Returns all protected section elements in the document body, in
/// depth-first order. An empty result is not an error here; the
/// orchestrator treats zero sections as a failure of the whole
/// transform.
#[must_use]
pub fn find_protected_sections(doc: &Document) -> Vec<NodeId> {
    let Some(body) = doc
        .find_child_element(doc.root(), "html")
        .and_then(|html| doc.find_child_element(html, "body"))
    else {
        return Vec::new();
    };

    let mut sections = Vec::new();
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        if is_protected_section(doc, node) {
            sections.push(node);
        }
        for &child in doc.children(node).iter().rev() {
            stack.push(child);
        }
    }
    sections
}

/// Predicate: is this node a protected section element?
#[must_use]
pub fn is_protected_section(doc: &Document, node: NodeId) -> bool {
    doc.tag(node) == Some(SECTION_TAG)
        && is_content_section(doc, node)
        && is_marked_encrypted(doc, node)
}

/// Sub-condition: `subscriptions-section="content"`.
fn is_content_section(doc: &Document, node: NodeId) -> bool {
    doc.attr(node, CONTENT_SECTION_ATTR)
        .is_some_and(|a| a.value.as_deref() == Some(CONTENT_SECTION_VALUE))
}

/// Sub-condition: the `encrypted` attribute is present, any value.
fn is_marked_encrypted(doc: &Document, node: NodeId) -> bool {
    doc.attr(node, ENCRYPTED_ATTR).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Document {
        let html = format!("<html amp><head></head><body>{body}</body></html>");
        Document::parse(&html).expect("parse failed")
    }

    #[test]
    fn test_finds_marked_section() {
        let doc = doc(r#"<section subscriptions-section="content" encrypted><p>x</p></section>"#);
        assert_eq!(find_protected_sections(&doc).len(), 1);
    }

    #[test]
    fn test_finds_nested_section() {
        let doc = doc(concat!(
            r#"<div><article><section subscriptions-section="content" encrypted>"#,
            "<p>deep</p></section></article></div>"
        ));
        assert_eq!(find_protected_sections(&doc).len(), 1);
    }

    #[test]
    fn test_encrypted_attribute_value_is_ignored() {
        let doc =
            doc(r#"<section subscriptions-section="content" encrypted="true"><p>x</p></section>"#);
        assert_eq!(find_protected_sections(&doc).len(), 1);
    }

    #[test]
    fn test_section_without_encrypted_attribute_is_skipped() {
        let doc = doc(r#"<section subscriptions-section="content"><p>x</p></section>"#);
        assert!(find_protected_sections(&doc).is_empty());
    }

    #[test]
    fn test_section_with_wrong_marker_value_is_skipped() {
        let doc = doc(r#"<section subscriptions-section="teaser" encrypted><p>x</p></section>"#);
        assert!(find_protected_sections(&doc).is_empty());
    }

    #[test]
    fn test_non_section_element_is_skipped() {
        let doc = doc(r#"<div subscriptions-section="content" encrypted><p>x</p></div>"#);
        assert!(find_protected_sections(&doc).is_empty());
    }

    #[test]
    fn test_section_in_head_is_skipped() {
        let html = concat!(
            r#"<html amp><head><section subscriptions-section="content" encrypted>"#,
            "</section></head><body></body></html>"
        );
        let doc = Document::parse(html).expect("parse failed");
        assert!(find_protected_sections(&doc).is_empty());
    }

    #[test]
    fn test_multiple_sections_found() {
        let doc = doc(concat!(
            r#"<section subscriptions-section="content" encrypted><p>a</p></section>"#,
            r#"<p>free</p>"#,
            r#"<section subscriptions-section="content" encrypted><p>b</p></section>"#
        ));
        assert_eq!(find_protected_sections(&doc).len(), 2);
    }

    #[test]
    fn test_document_without_body_yields_nothing() {
        let doc = Document::parse("<html amp><head></head></html>").expect("parse failed");
        assert!(find_protected_sections(&doc).is_empty());
    }
}
