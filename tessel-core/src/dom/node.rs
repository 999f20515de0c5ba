//! Tree Nodes
//!
//! This module defines the node types that live in a [`Document`](super::Document).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use crate::value::{EventHandler, Value};

/// Unique identifier for a node in the host tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies one listener registration on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// The kind of node in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with a tag name, attributes and children.
    Element { tag: String },

    /// A text leaf.
    Text { content: String },

    /// A parentless container, used for document roots and detached content.
    Fragment,
}

/// An event delivered to listeners.
#[derive(Debug, Clone)]
pub struct Event {
    /// Event name, e.g. `click`.
    pub name: String,
    /// The node the event was dispatched on.
    pub target: NodeId,
    /// Payload supplied by whoever dispatched the event.
    pub detail: Value,
}

/// A node in the host tree.
#[derive(Clone)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: IndexMap<String, String>,

    /// Direct fields set through `.name` bindings. Not markup.
    properties: IndexMap<String, Value>,

    listeners: Vec<(ListenerId, String, EventHandler)>,
}

impl Node {
    /// Create a new detached node of the given kind.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            parent: None,
            children: Vec::new(),
            attributes: IndexMap::new(),
            properties: IndexMap::new(),
            listeners: Vec::new(),
        }
    }

    /// Create a new element node.
    pub fn element(tag: impl Into<String>) -> Self {
        Self::new(NodeKind::Element { tag: tag.into() })
    }

    /// Create a new text node.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeKind::Text {
            content: content.into(),
        })
    }

    /// Create a new fragment node.
    pub fn fragment() -> Self {
        Self::new(NodeKind::Fragment)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Tag name, for elements.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag } => Some(tag),
            _ => None,
        }
    }

    /// Content, for text nodes.
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text { content } => Some(content),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text { .. })
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .iter()
            .filter(|(_, name, _)| name == event)
            .count()
    }

    /// A copy with a fresh ID, no parent and no children.
    ///
    /// Attributes and text are copied; properties and listeners are not,
    /// matching how markup clones behave.
    pub(crate) fn shallow_clone(&self) -> Self {
        let mut copy = Self::new(self.kind.clone());
        copy.attributes = self.attributes.clone();
        copy
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.children
    }

    pub(crate) fn set_content(&mut self, content: String) {
        if let NodeKind::Text { content: current } = &mut self.kind {
            *current = content;
        }
    }

    pub(crate) fn set_attribute(&mut self, name: &str, value: String) {
        self.attributes.insert(name.to_string(), value);
    }

    pub(crate) fn remove_attribute(&mut self, name: &str) -> bool {
        self.attributes.shift_remove(name).is_some()
    }

    pub(crate) fn set_property(&mut self, name: &str, value: Value) {
        self.properties.insert(name.to_string(), value);
    }

    pub(crate) fn add_listener(&mut self, event: &str, handler: EventHandler) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.push((id, event.to_string(), handler));
        id
    }

    pub(crate) fn remove_listener(&mut self, listener: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(id, _, _)| *id != listener);
        self.listeners.len() != before
    }

    pub(crate) fn handlers_for(&self, event: &str) -> Vec<EventHandler> {
        self.listeners
            .iter()
            .filter(|(_, name, _)| name == event)
            .map(|(_, _, handler)| handler.clone())
            .collect()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("attributes", &self.attributes)
            .field("properties", &self.properties)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
