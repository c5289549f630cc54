use std::cmp::Ordering;

use crate::editing::range::{Position, Range};
use crate::editing::schema::{LINE_BREAK, Schema};
use crate::editing::tree::{NodeId, Tree};
use crate::editing::{EditError, Patch};

/// Editing session state and the sole gatekeeper for document mutations.
///
/// `Change` owns the document tree and the live range. Commands and listeners
/// read through it and write through it; every structural edit keeps the live
/// range pointing at valid positions the way a DOM live range would.
#[derive(Debug, Clone)]
pub struct Change {
    tree: Tree,
    schema: Schema,
    /// The one live range of the session
    range: Range,
    /// Snapshot taken at the top of the last command
    cached: Option<Range>,
    /// Incremented on every commit
    version: u64,
}

impl Change {
    /// Start a session over an existing tree, caret at the start of the root
    pub fn new(tree: Tree, schema: Schema) -> Self {
        let range = Range::caret(tree.root(), 0);
        Self {
            tree,
            schema,
            range,
            cached: None,
            version: 0,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The session's live range
    pub fn range(&self) -> &Range {
        &self.range
    }

    /// Mutable access to the live range, for hosts syncing their selection
    pub fn range_mut(&mut self) -> &mut Range {
        &mut self.range
    }

    /// Range saved by the last [`cache_range_before_command`](Self::cache_range_before_command)
    pub fn cached_range(&self) -> Option<&Range> {
        self.cached.as_ref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Follow a selection change made by the host (click, arrow keys).
    ///
    /// Unlike [`apply`](Self::apply) this does not count as a document change.
    pub fn set_range(&mut self, range: Range) {
        self.range = range.normalized(&self.tree);
    }

    /// Whether the document has no meaningful content
    pub fn is_empty(&self) -> bool {
        !self.schema.has_content(&self.tree, self.tree.root())
    }

    /// Reset the document to its minimal valid shape: one paragraph holding
    /// one line-break marker, caret inside the paragraph.
    pub fn init_value(&mut self) {
        self.empty_container();
        let root = self.tree.root();
        let paragraph = self.empty_paragraph();
        if let Err(err) = self.insert_node(root, 0, paragraph) {
            log::warn!("init_value could not attach paragraph: {err}");
            return;
        }
        self.range = Range::caret(paragraph, 0);
    }

    /// Remove everything under the root
    pub fn empty_container(&mut self) {
        let root = self.tree.root();
        for child in self.tree.children(root).to_vec() {
            self.remove_node(child);
        }
        self.range = Range::caret(root, 0);
    }

    /// Snapshot the live range; overwrites the previous snapshot
    pub fn cache_range_before_command(&mut self) {
        self.cached = Some(self.range.clone());
    }

    /// Put the live range back to the last snapshot, if it still fits the tree
    pub fn restore_cached_range(&mut self) -> bool {
        match self.cached.clone() {
            Some(cached) => {
                self.range = cached.normalized(&self.tree);
                true
            }
            None => false,
        }
    }

    /// Commit `range` as the live range and record a document change.
    ///
    /// Ranges that no longer fit the tree are repaired rather than rejected.
    pub fn apply(&mut self, range: Range) -> Patch {
        let range = range.normalized(&self.tree);
        self.range = range.clone();
        self.version += 1;
        log::trace!("apply v{}: {:?}", self.version, range);
        Patch {
            range,
            version: self.version,
        }
    }

    /// Create a detached element, ready for [`insert_node`](Self::insert_node)
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.create_element(tag)
    }

    /// Create a detached text node, ready for [`insert_node`](Self::insert_node)
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.tree.create_text(text)
    }

    /// Insert `node` as child `index` of `parent`, shifting the live range
    pub fn insert_node(
        &mut self,
        parent: NodeId,
        index: usize,
        node: NodeId,
    ) -> Result<(), EditError> {
        let index = index.min(self.tree.child_count(parent));
        self.tree.insert_child(parent, index, node)?;
        self.range.adjust_for_insertion(parent, index);
        Ok(())
    }

    /// Remove a node and its subtree; the live range moves out of it
    pub fn remove_node(&mut self, node: NodeId) -> bool {
        match self.tree.remove(node) {
            Some((parent, index)) => {
                self.range.adjust_for_removal(&self.tree, parent, index);
                true
            }
            None => false,
        }
    }

    /// Replace the node's children with parsed markup.
    ///
    /// The markup is parsed before anything is touched, so an error leaves
    /// the document unchanged.
    pub fn set_inner_markup(&mut self, node: NodeId, markup: &str) -> Result<(), EditError> {
        if !self.tree.is_element(node) {
            return Err(EditError::StaleNode(node));
        }
        let nodes = self.tree.parse_fragment(markup)?;
        self.clear_children(node);
        for (index, child) in nodes.into_iter().enumerate() {
            self.insert_node(node, index, child)?;
        }
        Ok(())
    }

    /// Replace the node's children with an empty paragraph (`<p><br /></p>`)
    pub fn reset_to_empty_paragraph(&mut self, node: NodeId) -> bool {
        if !self.tree.is_element(node) {
            return false;
        }
        self.clear_children(node);
        let paragraph = self.empty_paragraph();
        self.insert_node(node, 0, paragraph).is_ok()
    }

    fn clear_children(&mut self, node: NodeId) {
        for child in self.tree.children(node).to_vec() {
            self.remove_node(child);
        }
    }

    fn empty_paragraph(&mut self) -> NodeId {
        let paragraph = self.tree.create_element("p");
        let line_break = self.tree.create_element(LINE_BREAK);
        // both nodes are fresh, so this cannot fail
        let _ = self.tree.append_child(paragraph, line_break);
        paragraph
    }

    /// Delete the content spanned by `range` and collapse it onto the
    /// deletion point.
    ///
    /// When the range spans two blocks the end block is merged into the start
    /// block. A start block left without content gets a line-break marker; a
    /// root left empty is reinitialised.
    ///
    /// The live range behaves like a DOM live range: if it sat inside the
    /// deleted span it collapses onto the deletion point, otherwise it only
    /// follows the node removals.
    pub fn delete(&mut self, range: &mut Range) {
        let normalized = range.normalized(&self.tree);
        if normalized.is_collapsed() {
            *range = normalized;
            return;
        }
        let start = normalized.start();
        let end = normalized.end();
        let live_inside = self.contains_range(&normalized, &self.range.clone());

        let start_block = self.schema.closest_block(&self.tree, start.node);
        let end_block = self.schema.closest_block(&self.tree, end.node);

        self.delete_contents(start, end);
        self.merge_blocks(start_block, end_block, start.node, end.node);

        let mut point = start;
        let root = self.tree.root();
        if self.tree.child_count(root) == 0 {
            self.init_value();
            point = self.range.start();
        } else if let Some(block) = start_block.filter(|&b| self.tree.is_attached(b)) {
            self.fill_empty_block(block);
        }

        *range = Range::caret(point.node, point.offset).normalized(&self.tree);
        if live_inside {
            self.range = range.clone();
        } else {
            self.range = self.range.normalized(&self.tree);
        }
    }

    fn contains_range(&self, outer: &Range, inner: &Range) -> bool {
        let tree = &self.tree;
        let starts_after = tree.compare_points(
            (outer.start_node(), outer.start_offset()),
            (inner.start_node(), inner.start_offset()),
        ) != Ordering::Greater;
        let ends_before = tree.compare_points(
            (inner.end_node(), inner.end_offset()),
            (outer.end_node(), outer.end_offset()),
        ) != Ordering::Greater;
        starts_after && ends_before
    }

    fn delete_contents(&mut self, start: Position, end: Position) {
        if start.node == end.node {
            if self.tree.is_text(start.node) {
                self.edit_text(start.node, |chars| {
                    chars.drain(start.offset..end.offset.min(chars.len()));
                });
            } else {
                let doomed: Vec<NodeId> = self
                    .tree
                    .children(start.node)
                    .iter()
                    .skip(start.offset)
                    .take(end.offset.saturating_sub(start.offset))
                    .copied()
                    .collect();
                for node in doomed {
                    self.remove_node(node);
                }
            }
            return;
        }

        let Some(ancestor) = self.tree.common_ancestor(start.node, end.node) else {
            return;
        };
        let mut doomed = Vec::new();

        // partially selected nodes on the start side keep their head
        let start_top = if start.node == ancestor {
            None
        } else {
            if self.tree.is_text(start.node) {
                self.edit_text(start.node, |chars| chars.truncate(start.offset));
            } else {
                doomed.extend(self.tree.children(start.node).iter().skip(start.offset));
            }
            let mut current = start.node;
            while let Some(parent) = self.tree.parent(current).filter(|&p| p != ancestor) {
                let mut sibling = self.tree.next(current);
                while let Some(node) = sibling {
                    doomed.push(node);
                    sibling = self.tree.next(node);
                }
                current = parent;
            }
            Some(current)
        };

        // ... and on the end side keep their tail
        let end_top = if end.node == ancestor {
            None
        } else {
            if self.tree.is_text(end.node) {
                self.edit_text(end.node, |chars| {
                    chars.drain(..end.offset.min(chars.len()));
                });
            } else {
                doomed.extend(self.tree.children(end.node).iter().take(end.offset));
            }
            let mut current = end.node;
            while let Some(parent) = self.tree.parent(current).filter(|&p| p != ancestor) {
                let mut sibling = self.tree.prev(current);
                while let Some(node) = sibling {
                    doomed.push(node);
                    sibling = self.tree.prev(node);
                }
                current = parent;
            }
            Some(current)
        };

        let from = match start_top {
            Some(top) => self.tree.index_in_parent(top).map_or(0, |i| i + 1),
            None => start.offset,
        };
        let to = match end_top {
            Some(top) => self.tree.index_in_parent(top).unwrap_or(from),
            None => end.offset,
        };
        if from < to {
            doomed.extend(
                self.tree
                    .children(ancestor)
                    .iter()
                    .skip(from)
                    .take(to - from),
            );
        }

        for node in doomed {
            self.remove_node(node);
        }
    }

    /// Move the end block's children into the start block, then drop the end
    /// block and any wrappers left empty by the move.
    fn merge_blocks(
        &mut self,
        start_block: Option<NodeId>,
        end_block: Option<NodeId>,
        start_node: NodeId,
        end_node: NodeId,
    ) {
        let (Some(target), Some(source)) = (start_block, end_block) else {
            return;
        };
        let tree = &self.tree;
        if target == source
            || source == tree.root()
            || !tree.is_attached(target)
            || !tree.is_attached(source)
            || tree.contains(target, source)
            || tree.contains(source, target)
        {
            return;
        }
        let Some(ancestor) = tree.common_ancestor(start_node, end_node) else {
            return;
        };

        for child in self.tree.children(source).to_vec() {
            let index = self.tree.child_count(target);
            if let Err(err) = self.insert_node(target, index, child) {
                log::warn!("merge could not move {child:?}: {err}");
            }
        }
        let mut current = Some(source);
        while let Some(node) = current {
            if node == ancestor || self.tree.child_count(node) > 0 || self.tree.contains(node, target)
            {
                break;
            }
            current = self.tree.parent(node);
            self.remove_node(node);
        }
    }

    fn fill_empty_block(&mut self, block: NodeId) {
        let has_break = self
            .tree
            .descendants(block)
            .into_iter()
            .any(|n| self.schema.is_line_break(&self.tree, n));
        if !has_break && !self.schema.has_content(&self.tree, block) {
            let line_break = self.tree.create_element(LINE_BREAK);
            let index = self.tree.child_count(block);
            if let Err(err) = self.insert_node(block, index, line_break) {
                log::warn!("could not refill empty block: {err}");
            }
        }
    }

    fn edit_text(&mut self, node: NodeId, edit: impl FnOnce(&mut Vec<char>)) {
        let Some(text) = self.tree.text(node) else {
            return;
        };
        let mut chars: Vec<char> = text.chars().collect();
        edit(&mut chars);
        let _ = self.tree.set_text(node, chars.into_iter().collect());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session(markup: &str) -> Change {
        Change::new(Tree::from_markup(markup).unwrap(), Schema::default())
    }

    /// Node at a child-index path below the root
    fn at(change: &Change, path: &[usize]) -> NodeId {
        let tree = change.tree();
        path.iter()
            .fold(tree.root(), |node, &i| tree.child(node, i).unwrap())
    }

    #[test]
    fn test_is_empty() {
        assert!(session("").is_empty());
        assert!(session("<p><br /></p>").is_empty());
        assert!(!session("<p>x</p>").is_empty());
    }

    #[test]
    fn test_init_value_is_minimal_shape() {
        let mut change = session("<p>old</p><p>content</p>");

        change.init_value();

        assert_eq!(change.tree().to_markup(), "<p><br /></p>");
        assert_eq!(*change.range(), Range::caret(at(&change, &[0]), 0));
    }

    #[test]
    fn test_cache_overwrites_previous_snapshot() {
        let mut change = session("<p>ab</p>");
        let text = at(&change, &[0, 0]);

        change.set_range(Range::caret(text, 1));
        change.cache_range_before_command();
        change.set_range(Range::caret(text, 2));
        change.cache_range_before_command();
        change.set_range(Range::caret(text, 0));

        assert_eq!(change.cached_range(), Some(&Range::caret(text, 2)));
        assert!(change.restore_cached_range());
        assert_eq!(*change.range(), Range::caret(text, 2));
    }

    #[test]
    fn test_apply_bumps_version_and_repairs_range() {
        let mut change = session("<p>ab</p>");
        let text = at(&change, &[0, 0]);

        let patch = change.apply(Range::caret(text, 10));

        assert_eq!(patch.version, 1);
        assert_eq!(patch.range, Range::caret(text, 2));
        assert_eq!(*change.range(), Range::caret(text, 2));
    }

    #[test]
    fn test_remove_node_tracks_live_range() {
        let mut change = session("<p>ab<br /><br /></p>");
        let p = at(&change, &[0]);
        change.set_range(Range::caret(p, 2));

        change.remove_node(at(&change, &[0, 1]));

        assert_eq!(*change.range(), Range::caret(p, 1));
        assert_eq!(change.tree().to_markup(), "<p>ab<br /></p>");
    }

    #[test]
    fn test_set_inner_markup_keeps_tree_on_error() {
        let mut change = session("<p>ab</p>");
        let p = at(&change, &[0]);

        assert!(change.set_inner_markup(p, "<b>unclosed").is_err());
        assert_eq!(change.tree().to_markup(), "<p>ab</p>");

        change.set_inner_markup(p, "x<br />y").unwrap();
        assert_eq!(change.tree().to_markup(), "<p>x<br />y</p>");
    }

    #[test]
    fn test_delete_within_text() {
        let mut change = session("<p>abcd</p>");
        let text = at(&change, &[0, 0]);
        let mut range = Range::new(
            change.tree(),
            Position::new(text, 1),
            Position::new(text, 3),
        );
        change.set_range(range.clone());

        change.delete(&mut range);

        assert_eq!(change.tree().to_markup(), "<p>ad</p>");
        assert_eq!(range, Range::caret(text, 1));
        assert_eq!(*change.range(), range);
    }

    #[test]
    fn test_delete_keeps_live_range_outside_span() {
        let mut change = session("<p>ab</p><p>cd</p>");
        let first = at(&change, &[0, 0]);
        let second = at(&change, &[1, 0]);
        change.set_range(Range::caret(second, 1));
        let mut range = Range::new(
            change.tree(),
            Position::new(first, 0),
            Position::new(first, 1),
        );

        change.delete(&mut range);

        assert_eq!(change.tree().to_markup(), "<p>b</p><p>cd</p>");
        assert_eq!(range, Range::caret(first, 0));
        assert_eq!(*change.range(), Range::caret(second, 1));
    }

    #[test]
    fn test_delete_across_blocks_merges() {
        let mut change = session("<p>abc</p><p>mid</p><p>xyz</p>");
        let first = at(&change, &[0, 0]);
        let last = at(&change, &[2, 0]);
        let mut range = Range::new(
            change.tree(),
            Position::new(first, 1),
            Position::new(last, 2),
        );

        change.delete(&mut range);

        assert_eq!(change.tree().to_markup(), "<p>az</p>");
        assert_eq!(range, Range::caret(first, 1));
    }

    #[test]
    fn test_delete_across_inline_wrappers() {
        let mut change = session("<p>a<b>bc</b>d<i>ef</i>g</p>");
        let bold_text = at(&change, &[0, 1, 0]);
        let italic_text = at(&change, &[0, 3, 0]);
        let mut range = Range::new(
            change.tree(),
            Position::new(bold_text, 1),
            Position::new(italic_text, 1),
        );

        change.delete(&mut range);

        assert_eq!(change.tree().to_markup(), "<p>a<b>b</b><i>f</i>g</p>");
        assert_eq!(range, Range::caret(bold_text, 1));
    }

    #[test]
    fn test_delete_whole_block_content_leaves_line_break() {
        let mut change = session("<p>ab</p><p>cd</p>");
        let p = at(&change, &[0]);
        let mut range = Range::new(change.tree(), Position::new(p, 0), Position::new(p, 1));

        change.delete(&mut range);

        assert_eq!(change.tree().to_markup(), "<p><br /></p><p>cd</p>");
        assert_eq!(range, Range::caret(p, 0));
    }

    #[test]
    fn test_delete_everything_reinitialises() {
        let mut change = session("<p>ab</p><p>cd</p>");
        let root = change.tree().root();
        let mut range = Range::new(
            change.tree(),
            Position::new(root, 0),
            Position::new(root, 2),
        );

        change.delete(&mut range);

        assert_eq!(change.tree().to_markup(), "<p><br /></p>");
        assert_eq!(range, Range::caret(at(&change, &[0]), 0));
        assert!(range.is_collapsed());
    }

    #[test]
    fn test_delete_collapsed_is_noop() {
        let mut change = session("<p>ab</p>");
        let text = at(&change, &[0, 0]);
        let mut range = Range::caret(text, 1);

        change.delete(&mut range);

        assert_eq!(change.tree().to_markup(), "<p>ab</p>");
        assert_eq!(change.version(), 0);
    }
}
