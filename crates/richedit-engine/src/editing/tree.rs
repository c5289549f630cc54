use std::cmp::Ordering;

use crate::editing::EditError;

/// Attribute that marks an element as an editable root (the editor container,
/// or an editable region inside a card).
pub const EDITABLE_ATTR: &str = "contenteditable";

/// Name reported for text nodes by [`Tree::name`].
pub const TEXT_NAME: &str = "#text";

/// Non-owning handle to a node in a [`Tree`].
///
/// Handles stay valid while their node is attached or detached; removing a
/// node bumps the generation of every slot in its subtree, so stale handles to
/// removed nodes are detected instead of aliasing reused slots.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// Payload of a tree node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Entry {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Arena-allocated document tree.
///
/// The root is an editable `div` that is never removed. All positions
/// handed out by ranges refer to nodes of this arena.
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding only an empty editable root
    pub fn new() -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        };
        let root = tree.create_element("div");
        tree.set_attr(root, EDITABLE_ATTR, "true");
        tree.root = root;
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let entry = Entry {
            data,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    fn entry(&self, id: NodeId) -> Option<&Entry> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    fn entry_mut(&mut self, id: NodeId) -> Option<&mut Entry> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    /// Create a detached element node
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    /// Whether the handle still refers to a live node
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.entry(id).is_some()
    }

    /// Whether the node is alive and reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_alive(id) && self.contains(self.root, id)
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.entry(id).map(|e| &e.data)
    }

    /// Tag name for elements, `#text` for text nodes
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            NodeData::Text(_) => Some(TEXT_NAME),
        }
    }

    /// Whether the node is alive and named `name`
    pub fn is_named(&self, id: NodeId, name: &str) -> bool {
        self.name(id) == Some(name)
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Text(_)))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Element { .. }))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Text(text) => Some(text.as_str()),
            NodeData::Element { .. } => None,
        }
    }

    /// Replace the content of a text node
    pub fn set_text(&mut self, id: NodeId, text: String) -> Result<(), EditError> {
        match self.entry_mut(id).map(|e| &mut e.data) {
            Some(NodeData::Text(current)) => {
                *current = text;
                Ok(())
            }
            _ => Err(EditError::StaleNode(id)),
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            NodeData::Text(_) => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(NodeData::Element { attrs, .. }) = self.entry_mut(id).map(|e| &mut e.data) {
            match attrs.iter_mut().find(|(key, _)| key == name) {
                Some((_, current)) => *current = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    /// Whether the node is itself an editable root (`contenteditable="true"`)
    pub fn is_editable_root(&self, id: NodeId) -> bool {
        self.attr(id, EDITABLE_ATTR) == Some("true")
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id)?.parent
    }

    /// Children of the node; empty for text nodes and stale handles
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.entry(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Previous sibling
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index.checked_sub(1).and_then(|i| self.child(parent, i))
    }

    /// Next sibling
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.child(parent, index + 1)
    }

    /// Length used for range offsets: characters for text, children otherwise
    pub fn len(&self, id: NodeId) -> usize {
        match self.data(id) {
            Some(NodeData::Text(text)) => text.chars().count(),
            Some(NodeData::Element { .. }) => self.child_count(id),
            None => 0,
        }
    }

    /// Node and its ancestors, innermost first
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = Some(id).filter(|&n| self.is_alive(n));
        while let Some(node) = current {
            chain.push(node);
            current = self.parent(node);
        }
        chain
    }

    /// Whether `node` is `ancestor` or lies inside it
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).contains(&ancestor)
    }

    /// Deepest node containing both `a` and `b`
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let chain_b = self.ancestors(b);
        self.ancestors(a).into_iter().find(|n| chain_b.contains(n))
    }

    /// Pre-order list of the node and everything under it
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if !self.is_alive(node) {
                continue;
            }
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Concatenated text of the subtree
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Insert a node (detaching it first if needed) as child `index` of `parent`
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), EditError> {
        if !self.is_element(parent) || !self.is_alive(child) {
            return Err(EditError::StaleNode(if self.is_alive(child) {
                parent
            } else {
                child
            }));
        }
        if self.contains(child, parent) {
            return Err(EditError::Cycle(child));
        }
        self.detach(child);
        let entry = self.entry_mut(parent).ok_or(EditError::StaleNode(parent))?;
        let index = index.min(entry.children.len());
        entry.children.insert(index, child);
        if let Some(child_entry) = self.entry_mut(child) {
            child_entry.parent = Some(parent);
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), EditError> {
        let index = self.child_count(parent);
        self.insert_child(parent, index, child)
    }

    /// Unlink a node from its parent without freeing it.
    ///
    /// Returns the former parent and index.
    pub fn detach(&mut self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        if let Some(entry) = self.entry_mut(parent) {
            entry.children.remove(index);
        }
        if let Some(entry) = self.entry_mut(id) {
            entry.parent = None;
        }
        Some((parent, index))
    }

    /// Remove a node and free its whole subtree.
    ///
    /// Returns the former parent and index, or `None` for the root and stale
    /// handles. Handles to unrelated nodes stay valid.
    pub fn remove(&mut self, id: NodeId) -> Option<(NodeId, usize)> {
        if id == self.root || !self.is_alive(id) {
            return None;
        }
        let location = self.detach(id);
        for node in self.descendants(id) {
            let slot = &mut self.slots[node.index as usize];
            slot.entry = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(node.index);
        }
        location
    }

    /// Compare two boundary points in document order
    pub fn compare_points(&self, a: (NodeId, usize), b: (NodeId, usize)) -> Ordering {
        let (node_a, offset_a) = a;
        let (node_b, offset_b) = b;
        if node_a == node_b {
            return offset_a.cmp(&offset_b);
        }
        if let Some(child) = self.child_toward(node_a, node_b) {
            // b lies inside a's child at `child`
            return if child < offset_a {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        if let Some(child) = self.child_toward(node_b, node_a) {
            return if child < offset_b {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        self.path(node_a).cmp(&self.path(node_b))
    }

    /// Index of the child of `ancestor` that contains `node`
    pub(crate) fn child_toward(&self, ancestor: NodeId, node: NodeId) -> Option<usize> {
        let chain = self.ancestors(node);
        let pos = chain.iter().position(|&n| n == ancestor)?;
        let child = *chain.get(pos.checked_sub(1)?)?;
        self.index_in_parent(child)
    }

    /// Child indices from the root down to the node
    fn path(&self, id: NodeId) -> Vec<usize> {
        let mut path: Vec<usize> = self
            .ancestors(id)
            .into_iter()
            .filter_map(|n| self.index_in_parent(n))
            .collect();
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paragraph_with(tree: &mut Tree, parts: &[&str]) -> (NodeId, Vec<NodeId>) {
        let p = tree.create_element("p");
        tree.append_child(tree.root(), p).unwrap();
        let mut ids = Vec::new();
        for part in parts {
            let node = if *part == "br" {
                tree.create_element("br")
            } else {
                tree.create_text(part)
            };
            tree.append_child(p, node).unwrap();
            ids.push(node);
        }
        (p, ids)
    }

    #[test]
    fn test_new_tree_has_editable_root() {
        let tree = Tree::new();
        let root = tree.root();

        assert!(tree.is_editable_root(root));
        assert_eq!(tree.name(root), Some("div"));
        assert_eq!(tree.child_count(root), 0);
    }

    #[test]
    fn test_siblings_and_indices() {
        let mut tree = Tree::new();
        let (p, ids) = paragraph_with(&mut tree, &["ab", "br", "br"]);

        assert_eq!(tree.children(p), ids.as_slice());
        assert_eq!(tree.prev(ids[1]), Some(ids[0]));
        assert_eq!(tree.next(ids[1]), Some(ids[2]));
        assert_eq!(tree.next(ids[2]), None);
        assert_eq!(tree.prev(ids[0]), None);
        assert_eq!(tree.index_in_parent(ids[2]), Some(2));
        assert_eq!(tree.name(ids[0]), Some(TEXT_NAME));
    }

    #[test]
    fn test_remove_invalidates_only_subtree() {
        let mut tree = Tree::new();
        let (p, ids) = paragraph_with(&mut tree, &["ab", "br"]);
        let (q, other) = paragraph_with(&mut tree, &["cd"]);

        assert_eq!(tree.remove(p), Some((tree.root(), 0)));

        assert!(!tree.is_alive(p));
        assert!(ids.iter().all(|&id| !tree.is_alive(id)));
        assert!(tree.is_alive(q));
        assert_eq!(tree.text(other[0]), Some("cd"));
        assert_eq!(tree.index_in_parent(q), Some(0));
    }

    #[test]
    fn test_reused_slot_does_not_revive_stale_handle() {
        let mut tree = Tree::new();
        let (_, ids) = paragraph_with(&mut tree, &["ab"]);
        tree.remove(ids[0]);

        let fresh = tree.create_text("new");

        assert_ne!(fresh, ids[0]);
        assert_eq!(tree.text(ids[0]), None);
        assert_eq!(tree.text(fresh), Some("new"));
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let mut tree = Tree::new();
        let root = tree.root();

        assert_eq!(tree.remove(root), None);
        assert!(tree.is_alive(root));
    }

    #[test]
    fn test_insert_rejects_cycles() {
        let mut tree = Tree::new();
        let (p, _) = paragraph_with(&mut tree, &["ab"]);
        let span = tree.create_element("span");
        tree.append_child(p, span).unwrap();

        assert!(matches!(
            tree.append_child(span, p),
            Err(EditError::Cycle(_))
        ));
    }

    #[test]
    fn test_common_ancestor_and_text_content() {
        let mut tree = Tree::new();
        let (p, a) = paragraph_with(&mut tree, &["ab", "br"]);
        let (_, b) = paragraph_with(&mut tree, &["cd"]);

        assert_eq!(tree.common_ancestor(a[0], a[1]), Some(p));
        assert_eq!(tree.common_ancestor(a[0], b[0]), Some(tree.root()));
        assert_eq!(tree.text_content(tree.root()), "abcd");
        assert_eq!(tree.len(a[0]), 2);
        assert_eq!(tree.len(p), 2);
    }

    #[test]
    fn test_compare_points_in_document_order() {
        let mut tree = Tree::new();
        let (p, a) = paragraph_with(&mut tree, &["ab", "br"]);
        let (_, b) = paragraph_with(&mut tree, &["cd"]);

        assert_eq!(tree.compare_points((a[0], 1), (a[0], 2)), Ordering::Less);
        assert_eq!(tree.compare_points((a[0], 2), (b[0], 0)), Ordering::Less);
        // (p, 1) sits after the text node at index 0
        assert_eq!(tree.compare_points((p, 1), (a[0], 2)), Ordering::Greater);
        assert_eq!(tree.compare_points((p, 0), (a[0], 0)), Ordering::Less);
        assert_eq!(
            tree.compare_points((b[0], 0), (tree.root(), 1)),
            Ordering::Greater
        );
    }
}
