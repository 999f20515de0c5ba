//! Document
//!
//! The document owns every node of one host tree and provides the
//! primitives the binding engine needs: creation, insertion at an index,
//! removal, deep cloning, attributes, direct properties and listeners.
//!
//! # Design
//!
//! Nodes live in an arena indexed by [`NodeId`] for O(1) lookups. Each node
//! stores its parent and its ordered children, so both directions can be
//! walked without searching.
//!
//! Handles are cheap to clone and share the same arena. Locks are only held
//! inside a single primitive: listeners run after the arena is released, so
//! a handler may freely mutate the document.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use super::node::{Event, ListenerId, Node, NodeId};
use crate::value::{EventHandler, Value};

/// A host tree.
#[derive(Clone)]
pub struct Document {
    inner: Arc<RwLock<Arena>>,
}

struct Arena {
    /// All nodes, attached or detached, indexed by ID.
    nodes: HashMap<NodeId, Node>,

    root: NodeId,

    /// Count of structural, attribute, property and text changes.
    mutations: u64,
}

impl Arena {
    fn add(&mut self, node: Node) -> NodeId {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes.get(&id).and_then(Node::parent) else {
            return false;
        };
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children_mut().retain(|child| *child != id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.set_parent(None);
        }
        self.mutations += 1;
        true
    }

    fn drop_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend_from_slice(node.children());
            }
        }
    }

    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.nodes.get(&scope) {
            Some(node) => node.children().iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                out.push(id);
                stack.extend(node.children().iter().rev().copied());
            }
        }
        out
    }
}

impl Document {
    /// Create an empty document with a fragment root.
    pub fn new() -> Self {
        let root = Node::fragment();
        let root_id = root.id();
        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);

        Self {
            inner: Arc::new(RwLock::new(Arena {
                nodes,
                root: root_id,
                mutations: 0,
            })),
        }
    }

    /// The document root.
    pub fn root(&self) -> NodeId {
        self.inner.read().root
    }

    /// Check whether two handles refer to the same document.
    pub fn ptr_eq(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.inner.write().add(Node::element(tag))
    }

    /// Create a detached text node.
    pub fn create_text(&self, content: &str) -> NodeId {
        self.inner.write().add(Node::text(content))
    }

    /// Create a detached fragment.
    pub fn create_fragment(&self) -> NodeId {
        self.inner.write().add(Node::fragment())
    }

    /// Get a copy of a node.
    pub fn node(&self, id: NodeId) -> Option<Node> {
        self.inner.read().nodes.get(&id).cloned()
    }

    /// Run `f` against a node without copying it.
    pub fn with_node<R>(&self, id: NodeId, f: impl FnOnce(&Node) -> R) -> Option<R> {
        self.inner.read().nodes.get(&id).map(f)
    }

    /// Check if the node still exists in the arena.
    pub fn contains(&self, id: NodeId) -> bool {
        self.inner.read().nodes.contains_key(&id)
    }

    /// Check if the node is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let arena = self.inner.read();
        let mut current = Some(id);
        while let Some(next) = current {
            if next == arena.root {
                return true;
            }
            current = arena.nodes.get(&next).and_then(Node::parent);
        }
        false
    }

    /// Get the total number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.inner.read().nodes.len()
    }

    /// Number of mutations applied so far.
    pub fn mutation_count(&self) -> u64 {
        self.inner.read().mutations
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.with_node(id, Node::parent).flatten()
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.with_node(id, |node| node.children().to_vec())
            .unwrap_or_default()
    }

    /// Position of the node among its parent's children.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let arena = self.inner.read();
        let parent = arena.nodes.get(&id)?.parent()?;
        arena
            .nodes
            .get(&parent)?
            .children()
            .iter()
            .position(|child| *child == id)
    }

    /// Tag name of an element.
    pub fn tag(&self, id: NodeId) -> Option<String> {
        self.with_node(id, |node| node.tag().map(str::to_string))
            .flatten()
    }

    /// Concatenated text of the node and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let arena = self.inner.read();
        let mut out = String::new();
        if let Some(content) = arena.nodes.get(&id).and_then(Node::content) {
            out.push_str(content);
        }
        for descendant in arena.descendants(id) {
            if let Some(content) = arena.nodes.get(&descendant).and_then(Node::content) {
                out.push_str(content);
            }
        }
        out
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        self.insert_child(parent, usize::MAX, child);
    }

    /// Insert `child` at `index` among `parent`'s children.
    ///
    /// The child is first detached from wherever it is. An index past the
    /// end appends.
    pub fn insert_child(&self, parent: NodeId, index: usize, child: NodeId) {
        let mut arena = self.inner.write();
        if parent == child || !arena.nodes.contains_key(&parent) || !arena.nodes.contains_key(&child) {
            return;
        }
        arena.detach(child);

        if let Some(parent_node) = arena.nodes.get_mut(&parent) {
            let children = parent_node.children_mut();
            let index = index.min(children.len());
            children.insert(index, child);
        }
        if let Some(child_node) = arena.nodes.get_mut(&child) {
            child_node.set_parent(Some(parent));
        }
        arena.mutations += 1;
        trace!(%parent, %child, index, "inserted node");
    }

    /// Take the node out of its parent. It stays in the arena.
    pub fn detach(&self, id: NodeId) -> bool {
        self.inner.write().detach(id)
    }

    /// Detach the node and drop it and its descendants from the arena.
    pub fn remove(&self, id: NodeId) {
        let mut arena = self.inner.write();
        if !arena.nodes.contains_key(&id) {
            return;
        }
        arena.detach(id);
        arena.drop_subtree(id);
        trace!(node = %id, "removed node");
    }

    /// Deep-clone a subtree. The copy is detached.
    ///
    /// Attributes and text are copied; properties and listeners are not.
    pub fn clone_subtree(&self, id: NodeId) -> Option<NodeId> {
        let mut arena = self.inner.write();
        let source = arena.nodes.get(&id)?;
        let copy = source.shallow_clone();
        let copy_id = copy.id();
        let mut pending: Vec<(NodeId, NodeId)> = source
            .children()
            .iter()
            .map(|child| (*child, copy_id))
            .collect();
        arena.add(copy);

        let mut index = 0;
        while index < pending.len() {
            let (original, parent) = pending[index];
            index += 1;
            let Some(node) = arena.nodes.get(&original) else {
                continue;
            };
            let mut child = node.shallow_clone();
            let child_id = child.id();
            child.set_parent(Some(parent));
            pending.extend(node.children().iter().map(|grandchild| (*grandchild, child_id)));
            arena.add(child);
            if let Some(parent_node) = arena.nodes.get_mut(&parent) {
                parent_node.children_mut().push(child_id);
            }
        }
        Some(copy_id)
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.with_node(id, |node| node.attribute(name).map(str::to_string))
            .flatten()
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.with_node(id, |node| node.has_attribute(name))
            .unwrap_or(false)
    }

    pub fn set_attribute(&self, id: NodeId, name: &str, value: &str) {
        let mut arena = self.inner.write();
        if let Some(node) = arena.nodes.get_mut(&id) {
            node.set_attribute(name, value.to_string());
            arena.mutations += 1;
        }
    }

    pub fn remove_attribute(&self, id: NodeId, name: &str) -> bool {
        let mut arena = self.inner.write();
        let removed = arena
            .nodes
            .get_mut(&id)
            .is_some_and(|node| node.remove_attribute(name));
        if removed {
            arena.mutations += 1;
        }
        removed
    }

    pub fn property(&self, id: NodeId, name: &str) -> Option<Value> {
        self.with_node(id, |node| node.property(name).cloned())
            .flatten()
    }

    pub fn set_property(&self, id: NodeId, name: &str, value: Value) {
        let mut arena = self.inner.write();
        if let Some(node) = arena.nodes.get_mut(&id) {
            node.set_property(name, value);
            arena.mutations += 1;
        }
    }

    /// Replace the content of a text node.
    pub fn set_text(&self, id: NodeId, content: &str) {
        let mut arena = self.inner.write();
        if let Some(node) = arena.nodes.get_mut(&id) {
            node.set_content(content.to_string());
            arena.mutations += 1;
        }
    }

    pub fn add_listener(&self, id: NodeId, event: &str, handler: EventHandler) -> Option<ListenerId> {
        self.inner
            .write()
            .nodes
            .get_mut(&id)
            .map(|node| node.add_listener(event, handler))
    }

    pub fn remove_listener(&self, id: NodeId, listener: ListenerId) -> bool {
        self.inner
            .write()
            .nodes
            .get_mut(&id)
            .is_some_and(|node| node.remove_listener(listener))
    }

    /// Invoke every listener for `name` on the node, in registration order.
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch_event(&self, target: NodeId, name: &str, detail: Value) -> usize {
        let handlers = self
            .with_node(target, |node| node.handlers_for(name))
            .unwrap_or_default();
        let event = Event {
            name: name.to_string(),
            target,
            detail,
        };
        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }

    /// Descendants of `scope` in document order, excluding `scope`.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        self.inner.read().descendants(scope)
    }

    /// Descendants of `scope` matching `predicate`, in document order.
    pub fn find_all(&self, scope: NodeId, predicate: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        let arena = self.inner.read();
        arena
            .descendants(scope)
            .into_iter()
            .filter(|id| arena.nodes.get(id).is_some_and(&predicate))
            .collect()
    }

    /// Descendant elements with the given tag.
    pub fn elements_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.find_all(scope, |node| node.tag() == Some(tag))
    }

    /// Descendant elements carrying the given attribute.
    pub fn elements_with_attribute(&self, scope: NodeId, name: &str) -> Vec<NodeId> {
        self.find_all(scope, |node| node.is_element() && node.has_attribute(name))
    }

    /// First descendant element with the given tag and `id` attribute.
    pub fn element_by_id(&self, scope: NodeId, tag: &str, id: &str) -> Option<NodeId> {
        self.find_all(scope, |node| {
            node.tag() == Some(tag) && node.attribute("id") == Some(id)
        })
        .into_iter()
        .next()
    }

    /// The `<head>` element under the root, created on first use.
    pub fn head(&self) -> NodeId {
        let root = self.root();
        let existing = self
            .children(root)
            .into_iter()
            .find(|child| self.tag(*child).as_deref() == Some("head"));
        match existing {
            Some(head) => head,
            None => {
                let head = self.create_element("head");
                self.insert_child(root, 0, head);
                head
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root())
            .field("node_count", &self.node_count())
            .field("mutations", &self.mutation_count())
            .finish()
    }
}
