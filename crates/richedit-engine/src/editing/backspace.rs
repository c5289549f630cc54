use crate::editing::change::Change;
use crate::editing::event::{Hotkey, KeyEvent, KeyPhase, Outcome};
use crate::editing::listeners::{Flow, Listener, ListenerChain, ListenerId};
use crate::editing::schema::LINE_BREAK;
use crate::editing::tree::NodeId;
use crate::editing::typing::{EditorContext, TypingHandle};

pub const BACKSPACE: &str = "backspace";

/// The backspace typing command.
///
/// Each trigger walks a fixed list of document states in priority order and
/// the first one that matches decides the outcome:
///
/// 1. empty document: reset to the minimal shape
/// 2. editable card with selected sub-nodes: clear each of them
/// 3. line break right before the caret in an editable root: drop it
/// 4. listener veto: stop
/// 5. expanded selection: delete it
/// 6. caret next to paired line breaks: drop the pair
///
/// Anything else defers to the host's native deletion.
#[derive(Debug)]
pub struct Backspace {
    hotkeys: Vec<Hotkey>,
    listeners: ListenerChain,
    destroyed: bool,
}

impl Default for Backspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Backspace {
    pub fn new() -> Self {
        Self::with_hotkeys(vec![Hotkey::plain(BACKSPACE)])
    }

    pub fn with_hotkeys(hotkeys: Vec<Hotkey>) -> Self {
        Self {
            hotkeys,
            listeners: ListenerChain::new(),
            destroyed: false,
        }
    }

    fn run(&mut self, event: &KeyEvent, ctx: &mut EditorContext) -> Outcome {
        ctx.change.cache_range_before_command();
        let change = &mut ctx.change;

        if change.is_empty() {
            log::debug!("backspace: empty document, resetting");
            change.empty_container();
            change.init_value();
            let range = change.range().clone();
            change.apply(range);
            return Outcome::Handled;
        }

        if let Some(first) = clear_card_selection(ctx) {
            let change = &mut ctx.change;
            let mut range = change.range().clone_range();
            range.select(change.tree(), first, true).collapse(true);
            change.apply(range);
            return Outcome::Handled;
        }

        let change = &mut ctx.change;
        if let Some(marker) = trailing_break_in_editable_root(change) {
            log::debug!("backspace: removing line break before caret in editable root");
            change.remove_node(marker);
            let range = change.range().clone();
            change.apply(range);
            return Outcome::Handled;
        }

        if let Flow::Veto { suppress_default } = self.listeners.run(event, change) {
            return Outcome::Vetoed { suppress_default };
        }

        let change = &mut ctx.change;
        if !change.range().is_collapsed() {
            log::debug!("backspace: deleting expanded selection");
            let start = change.range().start_node();
            if let Some(prev) = change.tree().prev(start)
                && change.schema().is_line_break(change.tree(), prev)
            {
                change.remove_node(prev);
            }
            let mut range = change.range().clone();
            change.delete(&mut range);
            change.apply(range);
            return Outcome::Handled;
        }

        remove_paired_breaks(change)
    }
}

impl TypingHandle for Backspace {
    fn name(&self) -> &str {
        BACKSPACE
    }

    fn phase(&self) -> KeyPhase {
        KeyPhase::KeyDown
    }

    fn hotkeys(&self) -> &[Hotkey] {
        &self.hotkeys
    }

    fn trigger(&mut self, event: &KeyEvent, ctx: &mut EditorContext) -> Outcome {
        if self.destroyed {
            return Outcome::Deferred;
        }
        self.run(event, ctx)
    }

    fn on(&mut self, listener: Listener) -> ListenerId {
        self.listeners.push(listener)
    }

    fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.off(id)
    }

    fn destroy(&mut self) {
        self.listeners.clear();
        self.destroyed = true;
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

/// Reset every selected sub-node of the editable card around the range.
///
/// Returns the first cleared node, or `None` when no card selection applies.
fn clear_card_selection(ctx: &mut EditorContext) -> Option<NodeId> {
    let change = &ctx.change;
    let ancestor = change.range().common_ancestor(change.tree())?;
    let card = ctx.cards.find(change.tree(), ancestor)?;
    if !card.is_editable() {
        return None;
    }
    let nodes = card.multi_select()?.selection_nodes(change.tree());
    let first = *nodes.first()?;
    log::debug!(
        "backspace: clearing {} selected nodes in card {}",
        nodes.len(),
        card.key()
    );
    for node in nodes {
        ctx.change.reset_to_empty_paragraph(node);
    }
    Some(first)
}

fn trailing_break_in_editable_root(change: &Change) -> Option<NodeId> {
    let tree = change.tree();
    let start = change.range().start();
    if !tree.is_editable_root(start.node) {
        return None;
    }
    let child = tree.child(start.node, start.offset.checked_sub(1)?)?;
    change.schema().is_line_break(tree, child).then_some(child)
}

/// Drop a line break together with its partner when the pair only exists to
/// render one blank line:
///
/// - `content <br> | <br> (no br)`: the break before the caret and the one after
/// - `(no br) <br> | <br> content`: mirrored, the caret's break and the one before
fn remove_paired_breaks(change: &mut Change) -> Outcome {
    let tree = change.tree();
    let schema = change.schema();
    let start = change.range().start();
    let candidate = if schema.is_block(tree, start.node) {
        start
            .offset
            .checked_sub(1)
            .and_then(|i| tree.child(start.node, i))
    } else if schema.is_line_break(tree, start.node) {
        Some(start.node)
    } else {
        None
    };
    let Some(marker) = candidate.filter(|&n| schema.is_line_break(tree, n)) else {
        return Outcome::Deferred;
    };

    let is_break = |node: Option<NodeId>| node.is_some_and(|n| schema.is_line_break(tree, n));
    let prev = tree.prev(marker);
    let next = tree.next(marker);
    let after_next = next.and_then(|n| tree.next(n));
    let before_prev = prev.and_then(|n| tree.prev(n));

    let partner = if !is_break(prev) && is_break(next) && !is_break(after_next) {
        next
    } else if !is_break(next) && is_break(prev) && !is_break(before_prev) {
        prev
    } else {
        None
    };
    let Some(partner) = partner else {
        log::debug!("backspace: single line break, deferring to host");
        return Outcome::Deferred;
    };

    log::debug!("backspace: removing paired line breaks");
    let block = tree.parent(marker);
    change.remove_node(marker);
    change.remove_node(partner);
    if let Some(block) = block
        && change.tree().child_count(block) == 0
    {
        let line_break = change.create_element(LINE_BREAK);
        if let Err(err) = change.insert_node(block, 0, line_break) {
            log::warn!("backspace: could not refill emptied block: {err}");
        }
    }
    let mut range = change.range().clone_range();
    range.shrink_to_text_node(change.tree());
    change.apply(range);
    Outcome::Handled
}
