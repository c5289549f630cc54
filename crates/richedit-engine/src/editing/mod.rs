/*!
 * # Editing Core Module
 *
 * Turns one keyboard event into one validated mutation of the document tree.
 *
 * ## Architecture Overview
 *
 * ### 1. Arena Document Tree
 * - The document is a **`Tree`** of element and text nodes stored in an arena
 * - Nodes are addressed through copyable **`NodeId`** handles carrying a generation
 * - Removing a subtree invalidates only that subtree's handles
 *
 * ### 2. Live Range
 * - A **`Range`** is a pair of (node, offset) boundary points
 * - The session's live range is adjusted on every structural edit the way a
 *   DOM live range is, so it never dangles
 * - Commands work on clones (`clone_range`) and commit through `Change::apply`
 *
 * ### 3. Change Engine
 * - **`Change`** owns the tree and the live range and is the only writer of either
 * - `apply` normalises the committed range, bumps the version and returns a **`Patch`**
 * - `cache_range_before_command` snapshots the range at the top of every command
 *
 * ### 4. Typing Commands
 * - Commands implement **`TypingHandle`** and are registered in the **`Typing`** table
 * - Each command owns a **`ListenerChain`**; a listener can veto the default behaviour
 * - `trigger` returns an explicit **`Outcome`** instead of touching the host event
 *
 * ## Module Structure
 *
 * - **`tree`** / **`markup`**: arena tree and its markup reader/writer
 * - **`schema`**: block and content classification of tag names
 * - **`range`**: boundary points, live-range adjustment and normalisation
 * - **`change`**: the `Change` engine
 * - **`card`**: embedded widget lookup and the multi-select capability
 * - **`event`**: key events, hotkeys and command outcomes
 * - **`listeners`**: per-command listener chains
 * - **`typing`**: command trait, dispatcher and session context
 * - **`backspace`**: the backspace command
 *
 * ## Usage Pattern
 *
 * ```rust
 * use richedit_engine::editing::*;
 *
 * let tree = Tree::from_markup("<p>ab<br /><br /></p>").unwrap();
 * let mut ctx = EditorContext::new(Change::new(tree, Schema::default()));
 * let p = ctx.change.tree().child(ctx.change.tree().root(), 0).unwrap();
 * ctx.change.set_range(Range::caret(p, 2));
 *
 * let mut typing = Typing::new();
 * typing.register(Box::new(Backspace::new()));
 * let dispatch = typing.trigger(&KeyEvent::key_down("backspace"), &mut ctx);
 *
 * assert!(dispatch.suppresses_default());
 * assert_eq!(ctx.change.tree().to_markup(), "<p>ab</p>");
 * ```
 */

pub mod backspace;
pub mod card;
pub mod change;
pub mod error;
pub mod event;
pub mod listeners;
pub mod markup;
pub mod patch;
pub mod range;
pub mod schema;
pub mod tree;
pub mod typing;

pub use backspace::Backspace;
pub use card::{Card, CardKey, CardRegistry, EditableCard, MultiSelect};
pub use change::Change;
pub use error::EditError;
pub use event::{Hotkey, HotkeyError, KeyEvent, KeyPhase, Modifiers, Outcome};
pub use listeners::{Flow, Listener, ListenerChain, ListenerId};
pub use markup::MarkupError;
pub use patch::Patch;
pub use range::{Position, Range};
pub use schema::Schema;
pub use tree::{NodeData, NodeId, Tree};
pub use typing::{Dispatch, EditorContext, Typing, TypingHandle};
