//! Minimal markup reader and writer for the document tree.
//!
//! Only what the editor itself produces is supported: elements with quoted or
//! bare attributes, void elements and entity-encoded text. Comments, doctype
//! and raw-text elements are out of scope.
//!
//! A `<` directly followed by a letter always starts a tag, so literal angle
//! brackets in text must be written as entities. A `<` followed by anything
//! else stays text.

use std::sync::LazyLock;

use regex::Regex;

use crate::editing::tree::{NodeData, NodeId, Tree};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\s*(/)?\s*([A-Za-z][A-Za-z0-9-]*)([^>]*?)\s*(/)?\s*>").expect("valid tag regex")
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#,
    )
    .expect("valid attribute regex")
});

/// Elements that never have children
pub const VOID_TAGS: &[&str] = &["br", "img", "hr", "input", "wbr"];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarkupError {
    #[error("Unexpected closing tag </{tag}> at byte {position}")]
    UnexpectedClose { tag: String, position: usize },
    #[error("Closing tag </{found}> at byte {position} does not match open <{expected}>")]
    MismatchedClose {
        expected: String,
        found: String,
        position: usize,
    },
    #[error("Unclosed tag <{0}>")]
    UnclosedTag(String),
}

pub fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

impl Tree {
    /// Build a tree whose root holds the given markup
    pub fn from_markup(markup: &str) -> Result<Self, MarkupError> {
        let mut tree = Tree::new();
        let nodes = tree.parse_fragment(markup)?;
        let root = tree.root();
        for node in nodes {
            // Freshly parsed nodes are alive and detached
            let _ = tree.append_child(root, node);
        }
        Ok(tree)
    }

    /// Parse markup into detached top-level nodes.
    ///
    /// Nothing is attached to the document, so a parse error leaves the
    /// visible tree untouched (orphans are freed before returning).
    pub fn parse_fragment(&mut self, markup: &str) -> Result<Vec<NodeId>, MarkupError> {
        let mut top = Vec::new();
        match self.parse_into(markup, &mut top) {
            Ok(()) => Ok(top),
            Err(err) => {
                for node in top {
                    self.remove(node);
                }
                Err(err)
            }
        }
    }

    fn parse_into(&mut self, markup: &str, top: &mut Vec<NodeId>) -> Result<(), MarkupError> {
        let mut stack: Vec<NodeId> = Vec::new();
        let mut cursor = 0;

        for caps in TAG_RE.captures_iter(markup) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            self.push_text(&markup[cursor..whole.start()], &stack, top);
            cursor = whole.end();

            let closing = caps.get(1).is_some();
            let tag = caps[2].to_ascii_lowercase();
            let self_closing = caps.get(4).is_some();

            if closing {
                if tag == "br" {
                    // `</br>` is read as a line break, as browsers do
                    let node = self.create_element("br");
                    self.attach(node, &stack, top);
                    continue;
                }
                match stack.last() {
                    Some(&open) if self.name(open) == Some(tag.as_str()) => {
                        stack.pop();
                    }
                    Some(&open) => {
                        return Err(MarkupError::MismatchedClose {
                            expected: self.name(open).unwrap_or_default().to_string(),
                            found: tag,
                            position: whole.start(),
                        });
                    }
                    None => {
                        return Err(MarkupError::UnexpectedClose {
                            tag,
                            position: whole.start(),
                        });
                    }
                }
                continue;
            }

            let node = self.create_element(&tag);
            for attr in ATTR_RE.captures_iter(&caps[3]) {
                let value = attr
                    .get(2)
                    .or_else(|| attr.get(3))
                    .or_else(|| attr.get(4))
                    .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned())
                    .unwrap_or_default();
                self.set_attr(node, &attr[1].to_ascii_lowercase(), &value);
            }
            self.attach(node, &stack, top);
            if !self_closing && !is_void(&tag) {
                stack.push(node);
            }
        }
        self.push_text(&markup[cursor..], &stack, top);

        match stack.last() {
            Some(&open) => Err(MarkupError::UnclosedTag(
                self.name(open).unwrap_or_default().to_string(),
            )),
            None => Ok(()),
        }
    }

    fn push_text(&mut self, raw: &str, stack: &[NodeId], top: &mut Vec<NodeId>) {
        if raw.is_empty() {
            return;
        }
        let text = html_escape::decode_html_entities(raw);
        let node = self.create_text(&text);
        self.attach(node, stack, top);
    }

    fn attach(&mut self, node: NodeId, stack: &[NodeId], top: &mut Vec<NodeId>) {
        match stack.last() {
            Some(&parent) => {
                let _ = self.append_child(parent, node);
            }
            None => top.push(node),
        }
    }

    /// Serialise the node's children
    pub fn inner_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serialise the node itself, including its own tag
    pub fn outer_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serialise the document content (everything under the root)
    pub fn to_markup(&self) -> String {
        self.inner_markup(self.root())
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            Some(NodeData::Text(text)) => out.push_str(&html_escape::encode_text(text)),
            Some(NodeData::Element { tag, attrs }) => {
                out.push('<');
                out.push_str(tag);
                for (key, value) in attrs {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                if is_void(tag) {
                    out.push_str(" />");
                    return;
                }
                out.push('>');
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            None => {}
        }
    }
}
