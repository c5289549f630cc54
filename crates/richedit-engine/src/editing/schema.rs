use std::collections::HashSet;

use richedit_config::SchemaConfig;

use crate::editing::tree::{NodeId, Tree};

/// Tag name of the line-break marker
pub const LINE_BREAK: &str = "br";

/// Attribute carried by the root element of an embedded card
pub const CARD_KEY_ATTR: &str = "data-card-key";

/// Zero-width space, used by renderers as a caret placeholder
const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// Tree-context queries that are not stored on nodes: block-ness and
/// meaningful content.
#[derive(Debug, Clone)]
pub struct Schema {
    block_tags: HashSet<String>,
    content_tags: HashSet<String>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::from_config(&SchemaConfig::default())
    }
}

impl Schema {
    pub fn from_config(config: &SchemaConfig) -> Self {
        Self {
            block_tags: config
                .block_tags
                .iter()
                .map(|t| t.to_ascii_lowercase())
                .collect(),
            content_tags: config
                .content_tags
                .iter()
                .map(|t| t.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Whether the node is a block-level element
    pub fn is_block(&self, tree: &Tree, id: NodeId) -> bool {
        tree.is_element(id)
            && tree
                .name(id)
                .is_some_and(|name| self.block_tags.contains(name))
    }

    /// Whether the node is a line-break marker
    pub fn is_line_break(&self, tree: &Tree, id: NodeId) -> bool {
        tree.is_named(id, LINE_BREAK)
    }

    /// Nearest block element containing the node (inclusive)
    pub fn closest_block(&self, tree: &Tree, id: NodeId) -> Option<NodeId> {
        tree.ancestors(id)
            .into_iter()
            .find(|&n| self.is_block(tree, n))
    }

    /// Whether the subtree holds anything a reader would see as content:
    /// non-blank text, a content element such as an image, or a card.
    pub fn has_content(&self, tree: &Tree, id: NodeId) -> bool {
        tree.descendants(id).into_iter().any(|n| {
            if let Some(text) = tree.text(n) {
                return text.chars().any(|c| c != ZERO_WIDTH_SPACE);
            }
            tree.attr(n, CARD_KEY_ATTR).is_some()
                || tree
                    .name(n)
                    .is_some_and(|name| self.content_tags.contains(name))
        })
    }
}
