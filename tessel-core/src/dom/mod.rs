//! # Host Tree
//!
//! A minimal in-memory render tree for the binding engine to drive.
//!
//! It provides exactly what bindings need from a host: element and text
//! creation, insertion at an index, removal, deep cloning, markup
//! attributes, direct properties and event listeners. There is no layout,
//! styling or parsing; subtrees are authored with the [`markup`] builder.
//!
//! ## Core Types
//!
//! - [`Document`]: owns all nodes of one tree in an arena
//! - [`Node`]: an element, text node or fragment
//! - [`NodeId`]: stable handle to a node
//! - [`Event`]: payload delivered to listeners

pub mod document;
pub mod markup;
pub mod node;

pub use document::Document;
pub use markup::{el, text, Markup};
pub use node::{Event, ListenerId, Node, NodeId, NodeKind};
