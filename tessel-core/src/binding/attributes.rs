//! Attribute Binder
//!
//! An attribute consumer names a property with a marker attribute and lists
//! what to do with its value:
//!
//! ```text
//! <input data--title="value, .value, title">
//! <button data--on-save="event.click">
//! <dialog data--dialog="this">
//! ```
//!
//! Each comma-separated token is bound on its own:
//!
//! | token           | binding                                             |
//! |-----------------|-----------------------------------------------------|
//! | `this`          | writes the consumer node into the data context      |
//! | `event.<name>`  | installs the value as the `<name>` listener         |
//! | `.<name>`       | sets the direct property `<name>` on the node       |
//! | anything else   | sets or removes the markup attribute of that name   |

use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::warn;

use super::naming::PropertyName;
use super::registry::{ReactionCategory, Scope};
use crate::dom::{ListenerId, NodeId};
use crate::error::Result;
use crate::props::Prop;
use crate::value::Value;

/// One parsed attribute directive token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttributeDirective {
    Identity,
    Event(String),
    Property(String),
    Markup(String),
}

impl AttributeDirective {
    pub(crate) fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        let directive = if token == "this" {
            AttributeDirective::Identity
        } else if let Some(event) = token.strip_prefix("event.") {
            AttributeDirective::Event(event.trim().to_string())
        } else if let Some(field) = token.strip_prefix('.') {
            AttributeDirective::Property(field.trim().to_string())
        } else {
            AttributeDirective::Markup(token.to_string())
        };

        let unnamed = matches!(
            &directive,
            AttributeDirective::Event(name)
                | AttributeDirective::Property(name)
                | AttributeDirective::Markup(name) if name.is_empty()
        );
        (!unnamed).then_some(directive)
    }

    pub(crate) fn category(&self) -> ReactionCategory {
        match self {
            AttributeDirective::Identity => ReactionCategory::Identity,
            AttributeDirective::Event(_) => ReactionCategory::Event,
            AttributeDirective::Property(_) => ReactionCategory::Property,
            AttributeDirective::Markup(_) => ReactionCategory::MarkupAttribute,
        }
    }
}

/// Parse a comma-separated directive list, dropping empty tokens.
pub(crate) fn parse_directives(tokens: &str) -> SmallVec<[AttributeDirective; 2]> {
    tokens.split(',').filter_map(AttributeDirective::parse).collect()
}

/// Bind every attribute consumer of `property` below `root`.
pub(crate) fn bind_attributes(scope: &Scope, root: NodeId, property: &PropertyName) -> Result<()> {
    let marker = property.marker();
    let consumers = scope.scan(root, |node| node.is_element() && node.has_attribute(&marker));

    for consumer in consumers {
        let mut tokens = scope.document.attribute(consumer, &marker).unwrap_or_default();
        if tokens.trim().is_empty() {
            tokens = default_tokens(scope, property);
        }
        let directives = parse_directives(&tokens);
        if directives.is_empty() {
            warn!(node = %consumer, attribute = %marker, "attribute directive lists nothing to bind");
            continue;
        }
        for directive in directives {
            bind_directive(scope, consumer, property, directive)?;
        }
    }
    Ok(())
}

/// Token list taken from the component default of `property`, for
/// consumers whose marker attribute is blank.
fn default_tokens(scope: &Scope, property: &PropertyName) -> String {
    scope
        .defaults
        .as_ref()
        .and_then(|defaults| defaults.value(property.as_str()))
        .map(|value| value.to_string())
        .unwrap_or_default()
}

fn bind_directive(
    scope: &Scope,
    consumer: NodeId,
    property: &PropertyName,
    directive: AttributeDirective,
) -> Result<()> {
    let category = directive.category();
    let document = scope.document.clone();

    match directive {
        AttributeDirective::Identity => {
            let context = scope.context.clone();
            let name = property.as_str().to_string();
            scope
                .executor(category, property, Prop::Value(Value::Node(consumer)))
                .install(Arc::new(move |value| {
                    context.write(&name, value.clone());
                    Ok(())
                }))
        }
        AttributeDirective::Event(event) => {
            let installed: Mutex<Option<ListenerId>> = Mutex::new(None);
            scope
                .executor(category, property, scope.resolve(property))
                .install(Arc::new(move |value| {
                    let previous = installed.lock().take();
                    if let Some(previous) = previous {
                        document.remove_listener(consumer, previous);
                    }
                    match value {
                        Value::Handler(handler) => {
                            let listener = document.add_listener(consumer, &event, handler.clone());
                            *installed.lock() = listener;
                        }
                        Value::Null => {}
                        other => {
                            warn!(node = %consumer, event = %event, value = ?other, "event binding needs a handler");
                        }
                    }
                    Ok(())
                }))
        }
        AttributeDirective::Property(field) => scope
            .executor(category, property, scope.resolve(property))
            .install(Arc::new(move |value| {
                document.set_property(consumer, &field, value.clone());
                Ok(())
            })),
        AttributeDirective::Markup(attribute) => scope
            .executor(category, property, scope.resolve(property))
            .install(Arc::new(move |value| {
                match value.to_attribute() {
                    Some(text) => {
                        if document.attribute(consumer, &attribute).as_deref() != Some(text.as_str()) {
                            document.set_attribute(consumer, &attribute, &text);
                        }
                    }
                    None => {
                        document.remove_attribute(consumer, &attribute);
                    }
                }
                Ok(())
            })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::registry::ReactionRegistry;
    use crate::dom::{el, Document, Event};
    use crate::props::{DataContext, Props};
    use crate::reactive::Runtime;
    use std::sync::atomic::{AtomicI32, Ordering};

    fn scope_with(props: Props) -> (Scope, NodeId) {
        let document = Document::new();
        let root = document.create_element("root");
        let scope = Scope::new(
            Runtime::new(),
            document,
            DataContext::new(props),
            Some(ReactionRegistry::new()),
        );
        (scope, root)
    }

    #[test]
    fn parse_tokens() {
        let directives = parse_directives(" this, event.click ,.value,title,, ");
        assert_eq!(
            directives.as_slice(),
            &[
                AttributeDirective::Identity,
                AttributeDirective::Event("click".into()),
                AttributeDirective::Property("value".into()),
                AttributeDirective::Markup("title".into()),
            ]
        );
        assert!(AttributeDirective::parse("event.").is_none());
        assert!(AttributeDirective::parse(".").is_none());
    }

    #[test]
    fn markup_attribute_follows_cell() {
        let (scope, root) = scope_with(Props::new());
        let title = scope.runtime.signal(Value::from("first"));
        scope.context.insert_default("title", || Prop::from(title.clone()));
        let input = scope.document.build(root, &el("input").attr("data--title", "title"));

        bind_attributes(&scope, root, &PropertyName::new("title")).unwrap();
        assert_eq!(scope.document.attribute(input, "title").as_deref(), Some("first"));

        title.set(Value::from("second"));
        assert_eq!(scope.document.attribute(input, "title").as_deref(), Some("second"));

        title.set(Value::from(false));
        assert!(!scope.document.has_attribute(input, "title"));

        title.set(Value::from(true));
        assert_eq!(scope.document.attribute(input, "title").as_deref(), Some(""));
    }

    #[test]
    fn same_markup_value_is_not_rewritten() {
        let (scope, root) = scope_with(Props::new());
        let title = scope.runtime.signal(Value::from("same"));
        scope.context.insert_default("title", || Prop::from(title.clone()));
        scope.document.build(root, &el("p").attr("data--title", "title"));

        bind_attributes(&scope, root, &PropertyName::new("title")).unwrap();
        let after_first = scope.document.mutation_count();
        title.set(Value::from("same"));
        title.set(Value::from("same"));
        assert_eq!(scope.document.mutation_count(), after_first);
    }

    #[test]
    fn property_and_multiple_tokens() {
        let (scope, root) = scope_with(Props::new().with("label", "hello"));
        let input = scope
            .document
            .build(root, &el("input").attr("data--label", ".value, placeholder"));

        bind_attributes(&scope, root, &PropertyName::new("label")).unwrap();
        assert_eq!(scope.document.property(input, "value"), Some(Value::from("hello")));
        assert_eq!(scope.document.attribute(input, "placeholder").as_deref(), Some("hello"));

        let registry = scope.registry.as_ref().unwrap();
        assert_eq!(registry.count(ReactionCategory::Property), 1);
        assert_eq!(registry.count(ReactionCategory::MarkupAttribute), 1);
    }

    #[test]
    fn event_binding_replaces_its_listener() {
        let hits = Arc::new(AtomicI32::new(0));
        let hits_clone = hits.clone();
        let handler = Value::handler(move |_: &Event| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        let (scope, root) = scope_with(Props::new().with("onSave", handler.clone()));
        let button = scope
            .document
            .build(root, &el("button").attr("data--on-save", "event.click"));

        bind_attributes(&scope, root, &PropertyName::new("onSave")).unwrap();
        scope
            .registry
            .as_ref()
            .unwrap()
            .dispatch(ReactionCategory::Event, &Props::new().with("onSave", handler))
            .unwrap();

        assert_eq!(scope.document.node(button).unwrap().listener_count("click"), 1);
        scope.document.dispatch_event(button, "click", Value::Null);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn identity_writes_the_node_back() {
        let (scope, root) = scope_with(Props::new());
        let dialog = scope.document.build(root, &el("dialog").attr("data--dialog", "this"));

        bind_attributes(&scope, root, &PropertyName::new("dialog")).unwrap();
        assert_eq!(
            scope.context.resolve("dialog").map(|p| p.get_untracked()),
            Some(Value::Node(dialog))
        );
    }

    #[test]
    fn blank_directive_uses_component_default_tokens() {
        let (mut scope, root) = scope_with(Props::new().with("title", "Hello"));
        scope.defaults = Some(Arc::new(Props::new().with("title", "title, .label")));
        let heading = scope.document.build(root, &el("h1").attr("data--title", ""));

        bind_attributes(&scope, root, &PropertyName::new("title")).unwrap();
        assert_eq!(scope.document.attribute(heading, "title").as_deref(), Some("Hello"));
        assert_eq!(scope.document.property(heading, "label"), Some(Value::from("Hello")));
    }

    #[test]
    fn empty_directive_is_skipped() {
        let (scope, root) = scope_with(Props::new().with("title", "x"));
        scope.document.build(root, &el("p").attr("data--title", " "));

        bind_attributes(&scope, root, &PropertyName::new("title")).unwrap();
        assert!(scope.registry.as_ref().unwrap().is_empty());
    }
}
