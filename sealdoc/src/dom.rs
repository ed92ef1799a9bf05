//! Owned arena document tree with a well-formed-markup codec.
//!
//! Nodes live in a single `Vec` and are addressed by [`NodeId`]; parent
//! and child links are indices, so mutation (child removal/insertion) is
//! index-list splicing rather than pointer surgery. The parser accepts
//! well-formed HTML-shaped markup: doctype, comments, void elements,
//! raw-text elements (`script`, `style`) and quoted/unquoted/bare
//! attributes. Entity references in text nodes pass through untouched;
//! attribute values decode `&amp;` and `&quot;` when parsed and
//! re-encode `&` and `"` when serialized, so any value round-trips.

use crate::error::Error;

/// Elements that never carry children and have no closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text, never scanned for tags.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

/// Index of a node within its [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A single element attribute. `value: None` is a bare (valueless)
/// attribute such as `encrypted` in `<section encrypted>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

impl Attribute {
    /// Creates a key/value attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: Some(value.into()) }
    }

    /// Creates a bare attribute with no value.
    pub fn flag(name: impl Into<String>) -> Self {
        Self { name: name.into(), value: None }
    }
}

/// Node payload variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Synthetic document root; its children are the top-level nodes.
    Root,
    /// Element with a lowercased tag name and ordered attributes.
    Element {
        tag: String,
        attrs: Vec<Attribute>,
    },
    /// Character data, stored verbatim.
    Text(String),
    /// Comment contents (without the `<!--`/`-->` delimiters).
    Comment(String),
    /// Doctype contents (without the `<!`/`>` delimiters).
    Doctype(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A mutable, owned document tree.
///
/// The tree is exclusively owned by one transform invocation; nothing
/// here is shared or thread-safe by design.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    fn empty() -> Self {
        Self {
            nodes: vec![Node { data: NodeData::Root, parent: None, children: Vec::new() }],
            root: NodeId(0),
        }
    }

    /// Parses markup text into a document tree.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` if the input is not well-formed: mismatched
    /// or unclosed tags, unterminated comments or attribute values.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let mut doc = Self::empty();
        let mut stack = vec![doc.root];
        let bytes = input.as_bytes();
        let len = input.len();
        let mut p = 0usize;

        while p < len {
            if bytes[p] != b'<' {
                let next = input[p..].find('<').map_or(len, |i| p + i);
                let id = doc.push_node(NodeData::Text(input[p..next].to_string()));
                doc.append_child(*stack.last().expect("stack never empty"), id);
                p = next;
            } else if input[p..].starts_with("<!--") {
                let end = input[p + 4..]
                    .find("-->")
                    .ok_or_else(|| Error::Parse("unterminated comment".to_string()))?;
                let id = doc.push_node(NodeData::Comment(input[p + 4..p + 4 + end].to_string()));
                doc.append_child(*stack.last().expect("stack never empty"), id);
                p += 4 + end + 3;
            } else if input[p..].starts_with("<!") {
                let end = input[p..]
                    .find('>')
                    .ok_or_else(|| Error::Parse("unterminated doctype".to_string()))?;
                let id = doc.push_node(NodeData::Doctype(input[p + 2..p + end].to_string()));
                doc.append_child(*stack.last().expect("stack never empty"), id);
                p += end + 1;
            } else if input[p..].starts_with("</") {
                let end = input[p..]
                    .find('>')
                    .ok_or_else(|| Error::Parse("unterminated closing tag".to_string()))?;
                let name = input[p + 2..p + end].trim().to_ascii_lowercase();
                let top = *stack.last().expect("stack never empty");
                match doc.tag(top) {
                    Some(tag) if tag == name => {
                        stack.pop();
                    }
                    Some(tag) => {
                        return Err(Error::Parse(format!(
                            "mismatched closing tag </{name}>, expected </{tag}>"
                        )))
                    }
                    None => {
                        return Err(Error::Parse(format!("unexpected closing tag </{name}>")))
                    }
                }
                p += end + 1;
            } else {
                let (tag, attrs, self_closed, next) = parse_open_tag(input, p)?;
                let id = doc.push_node(NodeData::Element { tag: tag.clone(), attrs });
                doc.append_child(*stack.last().expect("stack never empty"), id);
                p = next;

                if self_closed || is_void(&tag) {
                    // leaf element, nothing to descend into
                } else if is_raw_text(&tag) {
                    let close = format!("</{tag}");
                    let idx = find_ascii_ci(&input[p..], &close)
                        .ok_or_else(|| Error::Parse(format!("unclosed <{tag}> element")))?;
                    if idx > 0 {
                        let text = doc.push_node(NodeData::Text(input[p..p + idx].to_string()));
                        doc.append_child(id, text);
                    }
                    let end = input[p + idx..].find('>').ok_or_else(|| {
                        Error::Parse(format!("unterminated closing tag for <{tag}>"))
                    })?;
                    p += idx + end + 1;
                } else {
                    stack.push(id);
                }
            }
        }

        if stack.len() > 1 {
            let top = *stack.last().expect("stack never empty");
            let tag = doc.tag(top).unwrap_or("?").to_string();
            return Err(Error::Parse(format!("unclosed <{tag}> element")));
        }
        Ok(doc)
    }

    /// Returns the synthetic root node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the ordered child list of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Returns the node payload.
    #[must_use]
    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    /// Returns the tag name if the node is an element.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Returns the attribute list of an element, or an empty slice for
    /// non-element nodes.
    #[must_use]
    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        match &self.nodes[id.0].data {
            NodeData::Element { attrs, .. } => attrs,
            _ => &[],
        }
    }

    /// Looks up an attribute by (lowercase) name.
    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&Attribute> {
        self.attrs(id).iter().find(|a| a.name == name)
    }

    /// Returns the first direct child element with the given tag.
    #[must_use]
    pub fn find_child_element(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.children(parent).iter().copied().find(|&c| self.tag(c) == Some(tag))
    }

    /// Allocates a new element node, initially detached.
    pub fn create_element(&mut self, tag: impl Into<String>, attrs: Vec<Attribute>) -> NodeId {
        self.push_node(NodeData::Element { tag: tag.into(), attrs })
    }

    /// Allocates a new text node, initially detached.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push_node(NodeData::Text(text.into()))
    }

    /// Appends `child` to the end of `parent`'s child list.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Detaches and returns all children of `parent`, preserving order.
    /// The detached nodes stay in the arena but are no longer reachable
    /// from the root.
    pub fn detach_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.nodes[parent.0].children);
        for &c in &children {
            self.nodes[c.0].parent = None;
        }
        children
    }

    /// Serializes the whole document back to markup text.
    #[must_use]
    pub fn serialize(&self) -> String {
        self.serialize_node(self.root)
    }

    /// Serializes the subtree rooted at `id`.
    #[must_use]
    pub fn serialize_node(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { data, parent: None, children: Vec::new() });
        id
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].data {
            NodeData::Root => {
                for &c in &self.nodes[id.0].children {
                    self.write_node(c, out);
                }
            }
            NodeData::Text(text) => out.push_str(text),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Doctype(text) => {
                out.push_str("<!");
                out.push_str(text);
                out.push('>');
            }
            NodeData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for attr in attrs {
                    out.push(' ');
                    out.push_str(&attr.name);
                    if let Some(value) = &attr.value {
                        out.push_str("=\"");
                        encode_attr_value(value, out);
                        out.push('"');
                    }
                }
                out.push('>');
                if is_void(tag) && self.nodes[id.0].children.is_empty() {
                    return;
                }
                for &c in &self.nodes[id.0].children {
                    self.write_node(c, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

/// Parses an opening tag starting at `start` (which points at `<`).
/// Returns (tag, attrs, self_closed, position after `>`).
fn parse_open_tag(
    input: &str,
    start: usize,
) -> Result<(String, Vec<Attribute>, bool, usize), Error> {
    let bytes = input.as_bytes();
    let len = input.len();
    let mut p = start + 1;

    let name_start = p;
    while p < len && (bytes[p].is_ascii_alphanumeric() || bytes[p] == b'-') {
        p += 1;
    }
    if p == name_start {
        return Err(Error::Parse(format!("malformed tag at byte {start}")));
    }
    let tag = input[name_start..p].to_ascii_lowercase();

    let mut attrs = Vec::new();
    let mut self_closed = false;
    loop {
        while p < len && bytes[p].is_ascii_whitespace() {
            p += 1;
        }
        if p >= len {
            return Err(Error::Parse(format!("unterminated <{tag}> tag")));
        }
        match bytes[p] {
            b'>' => {
                p += 1;
                break;
            }
            b'/' => {
                self_closed = true;
                p += 1;
            }
            _ => {
                let name_start = p;
                while p < len
                    && !bytes[p].is_ascii_whitespace()
                    && bytes[p] != b'='
                    && bytes[p] != b'>'
                    && bytes[p] != b'/'
                {
                    p += 1;
                }
                if p == name_start {
                    return Err(Error::Parse(format!("malformed attribute in <{tag}> tag")));
                }
                let name = input[name_start..p].to_ascii_lowercase();

                while p < len && bytes[p].is_ascii_whitespace() {
                    p += 1;
                }
                if p < len && bytes[p] == b'=' {
                    p += 1;
                    while p < len && bytes[p].is_ascii_whitespace() {
                        p += 1;
                    }
                    if p >= len {
                        return Err(Error::Parse(format!("unterminated <{tag}> tag")));
                    }
                    let value = if bytes[p] == b'"' || bytes[p] == b'\'' {
                        let quote = bytes[p];
                        p += 1;
                        let value_start = p;
                        while p < len && bytes[p] != quote {
                            p += 1;
                        }
                        if p >= len {
                            return Err(Error::Parse(format!(
                                "unterminated value for attribute {name}"
                            )));
                        }
                        let v = decode_attr_value(&input[value_start..p]);
                        p += 1;
                        v
                    } else {
                        let value_start = p;
                        while p < len && !bytes[p].is_ascii_whitespace() && bytes[p] != b'>' {
                            p += 1;
                        }
                        decode_attr_value(&input[value_start..p])
                    };
                    attrs.push(Attribute { name, value: Some(value) });
                } else {
                    attrs.push(Attribute { name, value: None });
                }
            }
        }
    }
    Ok((tag, attrs, self_closed, p))
}

/// Escapes `&` and `"` so any attribute value can be emitted inside
/// double quotes.
fn encode_attr_value(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Decodes the two entities the serializer emits; any other `&` is kept
/// literal.
fn decode_attr_value(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(i) = rest.find('&') {
        out.push_str(&rest[..i]);
        rest = &rest[i..];
        if let Some(tail) = rest.strip_prefix("&amp;") {
            out.push('&');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("&quot;") {
            out.push('"');
            rest = tail;
        } else {
            out.push('&');
            rest = &rest[1..];
        }
    }
    out.push_str(rest);
    out
}

/// ASCII case-insensitive substring search.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}
