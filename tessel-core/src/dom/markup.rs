//! Markup Builder
//!
//! A small declarative description of a subtree, used to author templates
//! and hosts without a parser:
//!
//! ```rust,ignore
//! let list = el("ul")
//!     .attr("class", "todos")
//!     .child(el("data--todos").attr("each", "data--todo"));
//! let id = document.build(document.root(), &list);
//! ```
//!
//! [`Document::to_markup`] goes the other way and serializes a subtree,
//! which keeps assertions about rendered output readable.

use std::fmt::Write as _;

use super::document::Document;
use super::node::{NodeId, NodeKind};

/// Description of a subtree to build.
#[derive(Debug, Clone, PartialEq)]
pub enum Markup {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<Markup>,
    },
    Text(String),
}

/// Start an element description.
pub fn el(tag: &str) -> Markup {
    Markup::Element {
        tag: tag.to_string(),
        attributes: Vec::new(),
        children: Vec::new(),
    }
}

/// A text description.
pub fn text(content: &str) -> Markup {
    Markup::Text(content.to_string())
}

impl Markup {
    /// Add an attribute. Ignored on text.
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        if let Markup::Element { attributes, .. } = &mut self {
            attributes.push((name.to_string(), value.to_string()));
        }
        self
    }

    /// Append a child. Ignored on text.
    pub fn child(mut self, child: impl Into<Markup>) -> Self {
        if let Markup::Element { children, .. } = &mut self {
            children.push(child.into());
        }
        self
    }

    /// Append several children.
    pub fn children<I>(self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Markup>,
    {
        children
            .into_iter()
            .fold(self, |markup, child| markup.child(child))
    }
}

impl From<&str> for Markup {
    fn from(content: &str) -> Self {
        text(content)
    }
}

impl Document {
    /// Create the described subtree without attaching it.
    pub fn create(&self, markup: &Markup) -> NodeId {
        match markup {
            Markup::Text(content) => self.create_text(content),
            Markup::Element {
                tag,
                attributes,
                children,
            } => {
                let id = self.create_element(tag);
                for (name, value) in attributes {
                    self.set_attribute(id, name, value);
                }
                for child in children {
                    let child = self.create(child);
                    self.append_child(id, child);
                }
                id
            }
        }
    }

    /// Create the described subtree and append it to `parent`.
    pub fn build(&self, parent: NodeId, markup: &Markup) -> NodeId {
        let id = self.create(markup);
        self.append_child(parent, id);
        id
    }

    /// Serialize a subtree. Fragments serialize as their children.
    pub fn to_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    /// Serialize the children of a node.
    pub fn inner_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_markup(child, &mut out);
        }
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match node.kind() {
            NodeKind::Text { content } => out.push_str(content),
            NodeKind::Fragment => {
                for child in node.children() {
                    self.write_markup(*child, out);
                }
            }
            NodeKind::Element { tag } => {
                let _ = write!(out, "<{tag}");
                for (name, value) in node.attributes() {
                    if value.is_empty() {
                        let _ = write!(out, " {name}");
                    } else {
                        let _ = write!(out, " {name}=\"{}\"", value.replace('"', "&quot;"));
                    }
                }
                out.push('>');
                for child in node.children() {
                    self.write_markup(*child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}
