use richedit_config::Config;

use crate::editing::{
    Backspace, Card, CardRegistry, Change, Dispatch, EditError, EditorContext, Hotkey, KeyEvent,
    Listener, ListenerId, Schema, Tree, Typing, TypingHandle, backspace::BACKSPACE,
};

/// An editor instance: one document session plus its typing commands.
///
/// `handle_key` is the single entry point for keyboard input.
#[derive(Debug)]
pub struct Engine {
    ctx: EditorContext,
    typing: Typing,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Empty document in its minimal shape, default schema and hotkeys
    pub fn new() -> Self {
        let mut change = Change::new(Tree::new(), Schema::default());
        change.init_value();
        Self::with_change(change, Backspace::new())
    }

    /// Load a document from markup, caret at the start of the root
    pub fn from_markup(markup: &str) -> anyhow::Result<Self> {
        let tree = Tree::from_markup(markup)?;
        Ok(Self::with_change(
            Change::new(tree, Schema::default()),
            Backspace::new(),
        ))
    }

    /// Load a document using the schema and hotkeys of a [`Config`]
    pub fn from_config(markup: &str, config: &Config) -> Result<Self, EditError> {
        let tree = Tree::from_markup(markup)?;
        let hotkeys = config
            .typing
            .backspace
            .iter()
            .map(|combo| Hotkey::parse(combo))
            .collect::<Result<Vec<_>, _>>()?;
        let schema = Schema::from_config(&config.schema);
        Ok(Self::with_change(
            Change::new(tree, schema),
            Backspace::with_hotkeys(hotkeys),
        ))
    }

    fn with_change(change: Change, backspace: Backspace) -> Self {
        let mut typing = Typing::new();
        typing.register(Box::new(backspace));
        Self {
            ctx: EditorContext::new(change),
            typing,
        }
    }

    /// Dispatch a key event to every matching typing command
    pub fn handle_key(&mut self, event: &KeyEvent) -> Dispatch {
        self.typing.trigger(event, &mut self.ctx)
    }

    pub fn change(&self) -> &Change {
        &self.ctx.change
    }

    pub fn change_mut(&mut self) -> &mut Change {
        &mut self.ctx.change
    }

    pub fn cards(&self) -> &CardRegistry {
        &self.ctx.cards
    }

    pub fn register_card(&mut self, card: Box<dyn Card>) {
        self.ctx.cards.register(card);
    }

    /// Add a further typing command next to the built-in ones
    pub fn register_command(&mut self, handle: Box<dyn TypingHandle>) {
        self.typing.register(handle);
    }

    pub fn command_mut(&mut self, name: &str) -> Option<&mut (dyn TypingHandle + 'static)> {
        self.typing.get_mut(name)
    }

    /// Attach a listener to the backspace command
    pub fn on_backspace(&mut self, listener: Listener) -> Option<ListenerId> {
        self.command_mut(BACKSPACE).map(|c| c.on(listener))
    }

    pub fn off_backspace(&mut self, id: ListenerId) -> bool {
        self.command_mut(BACKSPACE).is_some_and(|c| c.off(id))
    }

    /// Serialised document content
    pub fn to_markup(&self) -> String {
        self.ctx.change.tree().to_markup()
    }
}
