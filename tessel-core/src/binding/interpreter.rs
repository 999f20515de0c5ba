//! Directive Interpreter
//!
//! Turns a host element into a live instance of a template:
//!
//! 1. The host's existing children are set aside and the template content
//!    is cloned into the host.
//! 2. Set-aside children are projected into the template's `<slot>`
//!    elements.
//! 3. Every declared property gets its effective value: the per-instance
//!    override, else the component default, else the markup attribute
//!    (the host's `data--<name>` attribute, else the template's).
//! 4. Property by property, attribute consumers are bound, then content
//!    consumers.
//!
//! Declared properties are the template element's `data--<name>`
//! attributes; their values are the markup defaults.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::attributes::bind_attributes;
use super::naming::PropertyName;
use super::reconcile::bind_content;
use super::registry::{ReactionRegistry, Scope};
use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::props::{DataContext, Prop, Props};
use crate::reactive::{Effect, Runtime};
use crate::value::Value;

/// A property declared on a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declared {
    pub name: PropertyName,
    /// The template's markup value for the property.
    pub default: String,
}

/// Properties declared on `template`, in attribute order.
pub fn declared_properties(document: &Document, template: NodeId) -> Vec<Declared> {
    document
        .with_node(template, |node| {
            node.attributes()
                .filter_map(|(attribute, value)| {
                    PropertyName::from_marker(attribute).map(|name| Declared {
                        name,
                        default: value.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// The live state of one instantiated host.
pub(crate) struct Rendered {
    pub(crate) context: DataContext,
    pub(crate) registry: ReactionRegistry,
    pub(crate) effects: Vec<Effect>,
}

/// What an instantiation needs to know about its component.
pub(crate) struct Blueprint<'a> {
    pub(crate) runtime: &'a Runtime,
    pub(crate) document: &'a Document,
    pub(crate) template: NodeId,
    pub(crate) declared: &'a [Declared],
    pub(crate) defaults: Props,
}

impl Blueprint<'_> {
    /// Render the template into `host` and bind it.
    pub(crate) fn instantiate(self, host: NodeId, overrides: &Props) -> Result<Rendered> {
        let document = self.document;

        let slotted = document.create_fragment();
        for child in document.children(host) {
            document.append_child(slotted, child);
        }
        for child in document.children(self.template) {
            if let Some(copy) = document.clone_subtree(child) {
                document.append_child(host, copy);
            }
        }
        project_slots(document, host, slotted);

        let template_nodes: HashSet<NodeId> = document.descendants(host).into_iter().collect();
        let context = self.context(host, overrides);
        let registry = ReactionRegistry::new();
        let mut scope = Scope::new(
            self.runtime.clone(),
            document.clone(),
            context.clone(),
            Some(registry.clone()),
        );
        scope.template_nodes = Some(Arc::new(template_nodes));
        scope.defaults = Some(Arc::new(self.defaults.clone()));

        let names: Vec<PropertyName> = self.declared.iter().map(|d| d.name.clone()).collect();
        let bound = names.iter().try_for_each(|name| {
            bind_attributes(&scope, host, name)?;
            bind_content(&scope, host, name, &names)
        });

        let effects = std::mem::take(&mut *scope.effects.lock());
        if let Err(err) = bound {
            for effect in &effects {
                effect.dispose();
            }
            return Err(err);
        }

        debug!(
            host = %host,
            properties = names.len(),
            reactions = registry.len(),
            effects = effects.len(),
            "instantiated template"
        );
        Ok(Rendered {
            context,
            registry,
            effects,
        })
    }

    /// Build the instance data context by precedence.
    fn context(&self, host: NodeId, overrides: &Props) -> DataContext {
        let mut props = self.defaults.clone();
        for (name, prop) in overrides.iter() {
            props.insert(name.clone(), prop.clone());
        }
        let context = DataContext::new(props);

        for declared in self.declared {
            let markup = self
                .document
                .attribute(host, &declared.name.marker())
                .unwrap_or_else(|| declared.default.clone());
            context.insert_default(declared.name.as_str(), || {
                Prop::Value(Value::Text(markup.trim().to_string()))
            });
        }
        context
    }
}

/// Move the children of `slotted` into the `<slot>` elements below `host`.
///
/// Children carrying `slot="<name>"` go to the slot of that name; the rest
/// go to the first unnamed slot. Slot elements are removed, and so is
/// whatever found no slot.
fn project_slots(document: &Document, host: NodeId, slotted: NodeId) {
    let mut default_slot = None;
    for slot in document.elements_by_tag(host, "slot") {
        let name = document
            .attribute(slot, "name")
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        match name {
            Some(name) => {
                let assigned = document.find_all(slotted, |node| {
                    node.attribute("slot").map(str::trim) == Some(name.as_str())
                });
                insert_before(document, slot, &assigned);
                document.remove(slot);
            }
            None if default_slot.is_none() => default_slot = Some(slot),
            None => document.remove(slot),
        }
    }

    if let Some(slot) = default_slot {
        insert_before(document, slot, &document.children(slotted));
        document.remove(slot);
    }
    document.remove(slotted);
}

fn insert_before(document: &Document, anchor: NodeId, nodes: &[NodeId]) {
    let (Some(parent), Some(index)) = (document.parent(anchor), document.index_of(anchor)) else {
        return;
    };
    for (offset, node) in nodes.iter().enumerate() {
        document.insert_child(parent, index + offset, *node);
    }
}

/// Move `<style>` elements out of `template` into one
/// `<style data-for="<name>">` in the document head.
///
/// Returns false when the template has no styles.
pub(crate) fn hoist_styles(document: &Document, template: NodeId, name: &str) -> bool {
    let styles = document.elements_by_tag(template, "style");
    if styles.is_empty() {
        return false;
    }

    let mut css = String::new();
    for style in styles {
        css.push('\n');
        css.push_str(&document.text_content(style));
        document.remove(style);
    }

    let head = document.head();
    let element = document.create_element("style");
    document.set_attribute(element, "data-for", name);
    let text = document.create_text(&css);
    document.append_child(element, text);
    document.append_child(head, element);
    debug!(template = name, bytes = css.len(), "hoisted template styles");
    true
}
