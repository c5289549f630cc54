use std::cmp::Ordering;

use crate::editing::tree::{NodeId, Tree};

/// A boundary point: a node plus a child index (elements) or character index
/// (text nodes).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    fn as_point(self) -> (NodeId, usize) {
        (self.node, self.offset)
    }

    fn is_valid(self, tree: &Tree) -> bool {
        tree.is_attached(self.node) && self.offset <= tree.len(self.node)
    }

    /// Move the point the way a DOM live range moves when the node at
    /// `parent[index]` has been removed.
    fn after_removal(&mut self, tree: &Tree, parent: NodeId, index: usize) {
        if !tree.is_attached(self.node) {
            *self = Position::new(parent, index);
        } else if self.node == parent && self.offset > index {
            self.offset -= 1;
        }
    }
}

/// Cursor position or selection span over the document tree.
///
/// Ranges hold non-owning handles; they never keep nodes alive. A range is
/// collapsed iff start and end are the identical point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Range {
    start: Position,
    end: Position,
}

impl Range {
    /// Range between two points, reordered if `start` comes after `end`
    pub fn new(tree: &Tree, start: Position, end: Position) -> Self {
        if tree.compare_points(start.as_point(), end.as_point()) == Ordering::Greater {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    /// Collapsed range (a caret) at the given point
    pub fn caret(node: NodeId, offset: usize) -> Self {
        let point = Position::new(node, offset);
        Self {
            start: point,
            end: point,
        }
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn end(&self) -> Position {
        self.end
    }

    pub fn start_node(&self) -> NodeId {
        self.start.node
    }

    pub fn start_offset(&self) -> usize {
        self.start.offset
    }

    pub fn end_node(&self) -> NodeId {
        self.end.node
    }

    pub fn end_offset(&self) -> usize {
        self.end.offset
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Deepest node containing both boundaries, computed on demand
    pub fn common_ancestor(&self, tree: &Tree) -> Option<NodeId> {
        tree.common_ancestor(self.start.node, self.end.node)
    }

    /// Independent copy that can be changed without touching the original
    pub fn clone_range(&self) -> Range {
        self.clone()
    }

    pub fn set_start(&mut self, tree: &Tree, node: NodeId, offset: usize) -> &mut Self {
        self.start = Position::new(node, offset);
        if tree.compare_points(self.start.as_point(), self.end.as_point()) == Ordering::Greater {
            self.end = self.start;
        }
        self
    }

    pub fn set_end(&mut self, tree: &Tree, node: NodeId, offset: usize) -> &mut Self {
        self.end = Position::new(node, offset);
        if tree.compare_points(self.start.as_point(), self.end.as_point()) == Ordering::Greater {
            self.start = self.end;
        }
        self
    }

    /// Select a node: its contents when `contents` is set, otherwise the node
    /// itself as seen from its parent. Stale nodes leave the range unchanged.
    pub fn select(&mut self, tree: &Tree, node: NodeId, contents: bool) -> &mut Self {
        if contents {
            if tree.is_alive(node) {
                self.start = Position::new(node, 0);
                self.end = Position::new(node, tree.len(node));
            }
        } else if let (Some(parent), Some(index)) = (tree.parent(node), tree.index_in_parent(node))
        {
            self.start = Position::new(parent, index);
            self.end = Position::new(parent, index + 1);
        }
        self
    }

    /// Collapse onto one boundary
    pub fn collapse(&mut self, to_start: bool) -> &mut Self {
        if to_start {
            self.end = self.start;
        } else {
            self.start = self.end;
        }
        self
    }

    /// Narrow element boundaries onto an adjacent text node.
    ///
    /// A boundary sitting between children moves to the end of the text
    /// before it, or failing that to the start of the text after it. Inline
    /// wrappers are entered: the text is the deepest last (or first)
    /// descendant of the neighbouring child.
    pub fn shrink_to_text_node(&mut self, tree: &Tree) -> &mut Self {
        let collapsed = self.is_collapsed();
        self.start = shrink_point(tree, self.start);
        self.end = if collapsed {
            self.start
        } else {
            shrink_point(tree, self.end)
        };
        self
    }

    /// Update the range after `parent[index]` was removed from the tree
    pub fn adjust_for_removal(&mut self, tree: &Tree, parent: NodeId, index: usize) {
        self.start.after_removal(tree, parent, index);
        self.end.after_removal(tree, parent, index);
    }

    /// Update the range after a node was inserted at `parent[index]`
    pub fn adjust_for_insertion(&mut self, parent: NodeId, index: usize) {
        for point in [&mut self.start, &mut self.end] {
            if point.node == parent && point.offset > index {
                point.offset += 1;
            }
        }
    }

    /// Best-effort repair of a range that no longer fits the tree.
    ///
    /// Offsets are clamped to node lengths; a boundary on a removed node falls
    /// back to the other boundary, and with neither usable the range collapses
    /// at the end of the root.
    pub fn normalized(&self, tree: &Tree) -> Range {
        let clamp = |p: Position| {
            if tree.is_attached(p.node) {
                Some(Position::new(p.node, p.offset.min(tree.len(p.node))))
            } else {
                None
            }
        };
        match (clamp(self.start), clamp(self.end)) {
            (Some(start), Some(end)) => Range::new(tree, start, end),
            (Some(point), None) | (None, Some(point)) => Range::caret(point.node, point.offset),
            (None, None) => {
                let root = tree.root();
                Range::caret(root, tree.child_count(root))
            }
        }
    }

    /// Whether both boundaries refer to live, attached nodes with in-bounds offsets
    pub fn is_valid(&self, tree: &Tree) -> bool {
        self.start.is_valid(tree) && self.end.is_valid(tree)
    }
}

fn shrink_point(tree: &Tree, point: Position) -> Position {
    if !tree.is_element(point.node) {
        return point;
    }
    let before = point
        .offset
        .checked_sub(1)
        .and_then(|i| tree.child(point.node, i))
        .and_then(|n| edge_text(tree, n, Edge::Last));
    if let Some(text) = before {
        return Position::new(text, tree.len(text));
    }
    match tree
        .child(point.node, point.offset)
        .and_then(|n| edge_text(tree, n, Edge::First))
    {
        Some(text) => Position::new(text, 0),
        None => point,
    }
}

#[derive(Copy, Clone)]
enum Edge {
    First,
    Last,
}

/// Text node reached by following first (or last) children down from `node`
fn edge_text(tree: &Tree, node: NodeId, edge: Edge) -> Option<NodeId> {
    let mut current = node;
    loop {
        if tree.is_text(current) {
            return Some(current);
        }
        current = match edge {
            Edge::First => tree.children(current).first(),
            Edge::Last => tree.children(current).last(),
        }
        .copied()?;
    }
}
