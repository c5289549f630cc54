use crate::editing::change::Change;
use crate::editing::event::KeyEvent;

/// What a listener wants to happen after it ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep going: next listener, then the command's default behaviour
    Continue,
    /// Stop the chain and skip the command's default behaviour
    Veto { suppress_default: bool },
}

impl From<bool> for Flow {
    /// Only `false` vetoes
    fn from(value: bool) -> Self {
        if value {
            Flow::Continue
        } else {
            Flow::Veto {
                suppress_default: false,
            }
        }
    }
}

impl From<()> for Flow {
    fn from(_: ()) -> Self {
        Flow::Continue
    }
}

/// Handle returned by [`ListenerChain::on`], used to unregister
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&KeyEvent, &mut Change) -> Flow>;

/// Ordered observers attached to one typing command
#[derive(Default)]
pub struct ListenerChain {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
}

impl ListenerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener; it runs after every listener registered before it
    pub fn on<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&KeyEvent, &mut Change) -> Flow + 'static,
    {
        self.push(Box::new(listener))
    }

    /// Append an already boxed listener
    pub fn push(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Remove the first listener registered under `id`
    pub fn off(&mut self, id: ListenerId) -> bool {
        match self.listeners.iter().position(|(lid, _)| *lid == id) {
            Some(index) => {
                self.listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Run listeners in registration order until one vetoes.
    ///
    /// Returns the veto, or `Flow::Continue` when every listener let it pass.
    pub fn run(&mut self, event: &KeyEvent, change: &mut Change) -> Flow {
        for (id, listener) in self.listeners.iter_mut() {
            let flow = listener(event, &mut *change);
            if let Flow::Veto { .. } = flow {
                log::debug!("listener {id:?} vetoed '{}'", event.key);
                return flow;
            }
        }
        Flow::Continue
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for ListenerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerChain")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
