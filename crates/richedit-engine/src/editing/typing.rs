use serde::Serialize;

use crate::editing::card::CardRegistry;
use crate::editing::change::Change;
use crate::editing::event::{Hotkey, KeyEvent, KeyPhase, Outcome};
use crate::editing::listeners::{Listener, ListenerId};

/// Everything a typing command may read or mutate while handling one key
#[derive(Debug)]
pub struct EditorContext {
    pub change: Change,
    pub cards: CardRegistry,
}

impl EditorContext {
    pub fn new(change: Change) -> Self {
        Self {
            change,
            cards: CardRegistry::new(),
        }
    }
}

/// A named, hotkey-bound command reacting to one press phase.
///
/// Listeners are boxed here so commands can live in one table behind
/// `dyn TypingHandle`.
pub trait TypingHandle {
    fn name(&self) -> &str;

    /// Press phase the command reacts to
    fn phase(&self) -> KeyPhase;

    fn hotkeys(&self) -> &[Hotkey];

    fn trigger(&mut self, event: &KeyEvent, ctx: &mut EditorContext) -> Outcome;

    fn on(&mut self, listener: Listener) -> ListenerId;

    fn off(&mut self, id: ListenerId) -> bool;

    /// Drop every listener and stop reacting to triggers
    fn destroy(&mut self);

    fn is_destroyed(&self) -> bool;
}

/// What the dispatcher did with one key event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dispatch {
    /// `(command name, outcome)` per invoked command, in registration order
    pub outcomes: Vec<(String, Outcome)>,
}

impl Dispatch {
    /// Whether any invoked command asked the host to skip its native action
    pub fn suppresses_default(&self) -> bool {
        self.outcomes.iter().any(|(_, o)| o.suppresses_default())
    }

    /// Whether no command matched the event
    pub fn is_unmatched(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn outcome(&self, name: &str) -> Option<Outcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, o)| *o)
    }
}

/// Hotkey table mapping key events to typing commands
#[derive(Default)]
pub struct Typing {
    handles: Vec<Box<dyn TypingHandle>>,
}

impl Typing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command; commands sharing a hotkey run in registration order
    pub fn register(&mut self, handle: Box<dyn TypingHandle>) {
        log::debug!(
            "registering '{}' for {:?}",
            handle.name(),
            handle
                .hotkeys()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
        );
        self.handles.push(handle);
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn TypingHandle + 'static)> {
        self.handles
            .iter_mut()
            .find(|h| h.name() == name)
            .map(|h| h.as_mut())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Invoke every command whose phase and hotkeys match the event.
    ///
    /// Commands and listeners only ever see the session, never the table, so
    /// a command cannot re-enter dispatch while it runs.
    pub fn trigger(&mut self, event: &KeyEvent, ctx: &mut EditorContext) -> Dispatch {
        let mut dispatch = Dispatch::default();
        for handle in self.handles.iter_mut() {
            let matched = handle.phase() == event.phase
                && handle.hotkeys().iter().any(|h| h.matches(event));
            if !matched {
                continue;
            }
            let outcome = handle.trigger(event, ctx);
            dispatch.outcomes.push((handle.name().to_string(), outcome));
        }
        if dispatch.is_unmatched() {
            log::trace!("no typing command for '{}' ({:?})", event.key, event.phase);
        }
        dispatch
    }
}

impl std::fmt::Debug for Typing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Typing")
            .field(
                "handles",
                &self.handles.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
