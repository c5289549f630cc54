use crate::editing::event::HotkeyError;
use crate::editing::markup::MarkupError;
use crate::editing::tree::NodeId;

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("Node handle {0:?} is stale or of the wrong kind")]
    StaleNode(NodeId),
    #[error("Inserting {0:?} would make it its own ancestor")]
    Cycle(NodeId),
    #[error("Invalid markup: {0}")]
    Markup(#[from] MarkupError),
    #[error("Invalid hotkey: {0}")]
    Hotkey(#[from] HotkeyError),
}
