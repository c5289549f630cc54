use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

use crate::editing::schema::CARD_KEY_ATTR;
use crate::editing::tree::{NodeId, Tree};

/// Identifier stored in the `data-card-key` attribute of a card's root
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CardKey(pub Uuid);

impl CardKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl Default for CardKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An embedded widget occupying a subtree of the document.
///
/// The typing core only reads cards; their lifecycle belongs to the card
/// framework.
pub trait Card {
    fn key(&self) -> CardKey;

    /// Root element of the widget, carrying the `data-card-key` attribute
    fn root(&self) -> NodeId;

    /// Whether the widget opts into editing of its content
    fn is_editable(&self) -> bool;

    /// Multi-node selection capability, if the widget has one
    fn multi_select(&self) -> Option<&dyn MultiSelect> {
        None
    }
}

/// Capability of cards whose content can be selected as a set of sub-nodes
/// (table cells, list rows, ...).
pub trait MultiSelect {
    /// Currently selected sub-nodes, in document order
    fn selection_nodes(&self, tree: &Tree) -> Vec<NodeId>;
}

/// Live card instances, keyed by the attribute on their root element
#[derive(Default)]
pub struct CardRegistry {
    cards: HashMap<CardKey, Box<dyn Card>>,
}

impl CardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a card instance, replacing any previous one with the same key
    pub fn register(&mut self, card: Box<dyn Card>) -> Option<Box<dyn Card>> {
        self.cards.insert(card.key(), card)
    }

    pub fn unregister(&mut self, key: CardKey) -> Option<Box<dyn Card>> {
        self.cards.remove(&key)
    }

    pub fn get(&self, key: CardKey) -> Option<&dyn Card> {
        self.cards.get(&key).map(|card| card.as_ref())
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Innermost registered card whose subtree contains `node`.
    ///
    /// Editable cards are included: callers decide what editability means
    /// for them.
    pub fn find(&self, tree: &Tree, node: NodeId) -> Option<&dyn Card> {
        tree.ancestors(node).into_iter().find_map(|ancestor| {
            let key = CardKey::parse(tree.attr(ancestor, CARD_KEY_ATTR)?)?;
            self.get(key)
        })
    }
}

impl fmt::Debug for CardRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardRegistry")
            .field("cards", &self.cards.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Ready-made card with an editable body and an optional set of selected
/// sub-nodes.
#[derive(Debug, Clone)]
pub struct EditableCard {
    key: CardKey,
    root: NodeId,
    editable: bool,
    selected: Vec<NodeId>,
}

impl EditableCard {
    pub fn new(key: CardKey, root: NodeId) -> Self {
        Self {
            key,
            root,
            editable: true,
            selected: Vec::new(),
        }
    }

    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    pub fn with_selection(mut self, nodes: Vec<NodeId>) -> Self {
        self.selected = nodes;
        self
    }
}

impl Card for EditableCard {
    fn key(&self) -> CardKey {
        self.key
    }

    fn root(&self) -> NodeId {
        self.root
    }

    fn is_editable(&self) -> bool {
        self.editable
    }

    fn multi_select(&self) -> Option<&dyn MultiSelect> {
        Some(self)
    }
}

impl MultiSelect for EditableCard {
    fn selection_nodes(&self, tree: &Tree) -> Vec<NodeId> {
        self.selected
            .iter()
            .copied()
            .filter(|&n| tree.is_alive(n) && tree.contains(self.root, n))
            .collect()
    }
}
