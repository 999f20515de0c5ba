//! Content Reconciler
//!
//! A content consumer is an element whose tag is a property marker. It is
//! taken out of the tree at setup and replaced by content managed from then
//! on at the consumer's original sibling index:
//!
//! ```text
//! <data--open whence>...</data--open>                   gate
//! <data--todos each="data--todo" key="data--by-id">     keyed list
//!     <li data--todo="title"><data--todo></data--todo></li>
//! </data--todos>
//! <data--label when="!data--hidden"></data--label>      text
//! ```
//!
//! # Gates
//!
//! A gate toggles a static copy of the consumer's children. The value must
//! be a boolean; anything else fails before the tree is touched.
//!
//! # Lists and text
//!
//! A list or text site renders from two local cells: a visibility flag fed
//! by the optional `when` clause, and a mirror of the bound property. One
//! render effect reads both, so either changing re-renders the site.
//!
//! List passes replace rather than move: every key present in the new pass
//! gets a fresh render, and keys missing from it are removed. Bindings
//! inside item renders are owned by the render effect and disposed with the
//! render they belong to.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::{trace, warn};

use super::attributes::bind_attributes;
use super::naming::PropertyName;
use super::registry::{ReactionCategory, Scope};
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::value::{ItemKey, KeyExtractor, Value};

/// Root nodes of one rendered list item.
pub(crate) type ItemRoots = SmallVec<[NodeId; 1]>;

/// Where managed content goes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Site {
    /// The consumer, kept detached as the source of clones.
    consumer: NodeId,
    parent: NodeId,
    /// Sibling index of the consumer before it was taken out.
    index: usize,
}

/// A parsed `when="[!]data--<name>"` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WhenClause {
    property: PropertyName,
    negated: bool,
}

impl WhenClause {
    /// Parse a `when` value. An empty value means there is no clause.
    pub(crate) fn parse(element: &str, raw: &str) -> Result<Option<Self>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let (negated, marker) = match raw.strip_prefix('!') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, raw),
        };
        let property = PropertyName::from_marker(marker).ok_or_else(|| Error::InvalidDirective {
            element: element.to_string(),
            attribute: "when".to_string(),
            value: raw.to_string(),
        })?;
        Ok(Some(Self { property, negated }))
    }
}

/// The `each`, `index` and `key` attributes of a list consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListDirective {
    item: PropertyName,
    index: Option<PropertyName>,
    key: Option<PropertyName>,
}

impl ListDirective {
    /// Read the list attributes of `consumer`. `None` when there is no `each`.
    pub(crate) fn parse(document: &Document, consumer: NodeId, element: &str) -> Result<Option<Self>> {
        let Some(item) = directive_reference(document, consumer, element, "each")? else {
            return Ok(None);
        };
        Ok(Some(Self {
            item,
            index: directive_reference(document, consumer, element, "index")?,
            key: directive_reference(document, consumer, element, "key")?,
        }))
    }
}

/// A `data--<name>` reference held in `attribute`, if present and non-empty.
fn directive_reference(
    document: &Document,
    consumer: NodeId,
    element: &str,
    attribute: &str,
) -> Result<Option<PropertyName>> {
    let Some(raw) = document.attribute(consumer, attribute) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    PropertyName::from_marker(raw)
        .map(Some)
        .ok_or_else(|| Error::InvalidDirective {
            element: element.to_string(),
            attribute: attribute.to_string(),
            value: raw.to_string(),
        })
}

/// Bind every content consumer of `property` below `root`.
///
/// Consumers are handled last to first so the sibling indices captured for
/// earlier consumers stay valid.
pub(crate) fn bind_content(
    scope: &Scope,
    root: NodeId,
    property: &PropertyName,
    declared: &[PropertyName],
) -> Result<()> {
    let marker = property.marker();
    let consumers = scope.scan(root, |node| node.tag() == Some(marker.as_str()));

    for consumer in consumers.into_iter().rev() {
        let document = &scope.document;
        let (Some(parent), Some(index)) = (document.parent(consumer), document.index_of(consumer)) else {
            continue;
        };
        let site = Site {
            consumer,
            parent,
            index,
        };

        if document.has_attribute(consumer, "whence") {
            bind_gate(scope, site, property)?;
            continue;
        }

        let when = match document.attribute(consumer, "when") {
            Some(raw) => WhenClause::parse(&marker, &raw)?,
            None => None,
        };
        match ListDirective::parse(document, consumer, &marker)? {
            Some(directive) => {
                bind_list(scope, site, property, when, directive, declared)?;
            }
            None => bind_text(scope, site, property, when)?,
        }
    }
    Ok(())
}

/// Bind a `whence` gate.
pub(crate) fn bind_gate(scope: &Scope, site: Site, property: &PropertyName) -> Result<()> {
    let element = property.marker();
    let name = property.as_str().to_string();
    let not_boolean = move || Error::GateNotBoolean {
        element: element.clone(),
        property: name.clone(),
    };

    let source = scope.resolve(property);
    if source.get_untracked().as_bool().is_none() {
        return Err(not_boolean());
    }
    scope.document.detach(site.consumer);

    let document = scope.document.clone();
    let inserted: Mutex<Vec<NodeId>> = Mutex::new(Vec::new());
    scope
        .executor(ReactionCategory::Gate, property, source)
        .install(Arc::new(move |value| {
            let open = value.as_bool().ok_or_else(&not_boolean)?;

            let previous = std::mem::take(&mut *inserted.lock());
            for node in previous {
                document.remove(node);
            }
            if open {
                let mut copies = Vec::new();
                for (offset, child) in document.children(site.consumer).into_iter().enumerate() {
                    if let Some(copy) = document.clone_subtree(child) {
                        document.insert_child(site.parent, site.index + offset, copy);
                        copies.push(copy);
                    }
                }
                *inserted.lock() = copies;
            }
            Ok(())
        }))
}

/// Wire a list or text site: the optional `when` clause and the bound
/// property each feed a local cell, and `render` runs whenever either does.
fn bind_site<R>(
    scope: &Scope,
    property: &PropertyName,
    when: Option<WhenClause>,
    category: ReactionCategory,
    render: R,
) -> Result<()>
where
    R: Fn(bool, &Value) -> Result<()> + Send + Sync + 'static,
{
    let visible = scope.runtime.signal(true);
    if let Some(when) = when {
        let flag = visible.clone();
        let negated = when.negated;
        scope
            .executor(ReactionCategory::Conditional, &when.property, scope.resolve(&when.property))
            .install(Arc::new(move |value| {
                flag.set(value.is_truthy() != negated);
                Ok(())
            }))?;
    }

    let current = scope.runtime.signal(Value::Null);
    let mirror = current.clone();
    scope
        .executor(category, property, scope.resolve(property))
        .install(Arc::new(move |value| {
            mirror.set(value.clone());
            Ok(())
        }))?;

    scope.watch(category.as_str(), move || {
        let visible = visible.get();
        let value = current.get();
        render(visible, &value)
    })
}

/// Bind a text site: one text node holding the value's display form.
pub(crate) fn bind_text(
    scope: &Scope,
    site: Site,
    property: &PropertyName,
    when: Option<WhenClause>,
) -> Result<()> {
    scope.document.remove(site.consumer);

    let document = scope.document.clone();
    let current: Mutex<Option<NodeId>> = Mutex::new(None);
    bind_site(scope, property, when, ReactionCategory::Text, move |visible, value| {
        let previous = current.lock().take();
        if let Some(previous) = previous {
            document.remove(previous);
        }
        if visible {
            let node = document.create_text(&value.to_string());
            document.insert_child(site.parent, site.index, node);
            *current.lock() = Some(node);
        }
        Ok(())
    })
}

/// Bind a keyed list site.
pub(crate) fn bind_list(
    scope: &Scope,
    site: Site,
    property: &PropertyName,
    when: Option<WhenClause>,
    directive: ListDirective,
    declared: &[PropertyName],
) -> Result<Arc<ListSite>> {
    let key_fn = directive.key.as_ref().and_then(|key| {
        match scope.resolve(key).get_untracked() {
            Value::KeyFn(key_fn) => Some(key_fn),
            Value::Null => None,
            other => {
                warn!(key = %key, value = ?other, "list key is not a key function, keying by position");
                None
            }
        }
    });

    let mut names = declared.to_vec();
    for name in std::iter::once(&directive.item).chain(directive.index.as_ref()) {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }

    scope.document.detach(site.consumer);

    let list = Arc::new(ListSite {
        scope: scope.item(scope.context.clone()),
        site,
        directive,
        names,
        key_fn,
        rendered: Mutex::new(IndexMap::new()),
    });
    let renderer = Arc::clone(&list);
    bind_site(scope, property, when, ReactionCategory::List, move |visible, value| {
        renderer.render(visible, value)
    })?;
    Ok(list)
}

/// One list site and its keyed render map.
pub(crate) struct ListSite {
    /// Unregistered scope sharing the instance context.
    scope: Scope,
    site: Site,
    directive: ListDirective,

    /// Properties bound inside each item render.
    names: Vec<PropertyName>,

    key_fn: Option<KeyExtractor>,

    /// Roots of the current render of each key, in render order.
    rendered: Mutex<IndexMap<ItemKey, ItemRoots>>,
}

impl ListSite {
    /// Keys currently rendered, in order.
    #[cfg(test)]
    pub(crate) fn keys(&self) -> Vec<ItemKey> {
        self.rendered.lock().keys().cloned().collect()
    }

    /// Nodes currently rendered, in order.
    #[cfg(test)]
    pub(crate) fn nodes(&self) -> Vec<NodeId> {
        self.rendered.lock().values().flatten().copied().collect()
    }

    fn render(&self, visible: bool, collection: &Value) -> Result<()> {
        let document = &self.scope.document;
        let mut previous = std::mem::take(&mut *self.rendered.lock());

        if !visible {
            for node in previous.into_values().flatten() {
                document.remove(node);
            }
            return Ok(());
        }

        let items: &[Value] = match collection {
            Value::List(items) => items,
            Value::Null => &[],
            other => {
                warn!(node = %self.site.consumer, value = ?other, "list binding needs a list, rendering nothing");
                &[]
            }
        };

        let mut next = IndexMap::with_capacity(items.len());
        let outcome = self.pass(items, &mut previous, &mut next);
        match outcome {
            Ok(()) => {
                for node in previous.into_values().flatten() {
                    document.remove(node);
                }
            }
            // Keep what is still in the tree tracked.
            Err(_) => next.extend(previous),
        }

        trace!(node = %self.site.consumer, items = items.len(), keys = next.len(), "list reconciled");
        *self.rendered.lock() = next;
        outcome
    }

    fn pass(
        &self,
        items: &[Value],
        previous: &mut IndexMap<ItemKey, ItemRoots>,
        next: &mut IndexMap<ItemKey, ItemRoots>,
    ) -> Result<()> {
        let document = &self.scope.document;
        // Nodes inserted so far in this pass, all placed at or after the site index.
        let mut offset = 0;

        for (position, item) in items.iter().enumerate() {
            let key = match &self.key_fn {
                Some(key_fn) => key_fn(item, position, items),
                None => ItemKey::Index(position),
            };

            if let Some(stale) = previous.shift_remove(&key) {
                for node in stale {
                    document.remove(node);
                }
            } else if let Some(replaced) = next.shift_remove(&key) {
                // Duplicate key in this pass: the later item wins.
                offset -= replaced.len();
                for node in replaced {
                    document.remove(node);
                }
            }

            let roots = self.render_item(item, position)?;
            for root in &roots {
                document.insert_child(self.site.parent, self.site.index + offset, *root);
                offset += 1;
            }
            next.insert(key, roots);
        }
        Ok(())
    }

    /// Render one item into detached roots.
    fn render_item(&self, item: &Value, position: usize) -> Result<ItemRoots> {
        let document = &self.scope.document;
        let Some(copy) = document.clone_subtree(self.site.consumer) else {
            return Ok(ItemRoots::new());
        };

        let index = Value::from(position);
        let mut overrides = vec![(self.directive.item.as_str().to_string(), item.clone())];
        if let Some(name) = &self.directive.index {
            overrides.push((name.as_str().to_string(), index.clone()));
        }
        let scope = self.scope.item(self.scope.context.shadow(overrides));

        let bound = self
            .names
            .iter()
            .try_for_each(|name| bind_attributes(&scope, copy, name));
        if let Err(err) = bound {
            document.remove(copy);
            return Err(err);
        }

        replace_placeholders(document, copy, &self.directive.item, item);
        if let Some(name) = &self.directive.index {
            replace_placeholders(document, copy, name, &index);
        }

        let roots: ItemRoots = document.children(copy).into_iter().collect();
        for root in &roots {
            document.detach(*root);
        }
        document.remove(copy);
        Ok(roots)
    }
}

/// Replace every `<data--name>` element below `root` with a text node.
fn replace_placeholders(document: &Document, root: NodeId, name: &PropertyName, value: &Value) {
    let marker = name.marker();
    for placeholder in document.elements_by_tag(root, &marker) {
        let (Some(parent), Some(index)) = (document.parent(placeholder), document.index_of(placeholder)) else {
            continue;
        };
        let text = document.create_text(&value.to_string());
        document.insert_child(parent, index, text);
        document.remove(placeholder);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::registry::ReactionRegistry;
    use crate::dom::{el, Markup};
    use crate::props::{DataContext, Prop, Props};
    use crate::reactive::Runtime;
    use serde_json::json;

    fn setup(runtime: &Runtime, props: Props, body: Markup) -> (Scope, NodeId) {
        let document = Document::new();
        let host = document.build(document.root(), &el("host").child(body));
        let scope = Scope::new(
            runtime.clone(),
            document,
            DataContext::new(props),
            Some(ReactionRegistry::new()),
        );
        (scope, host)
    }

    fn site_of(scope: &Scope, host: NodeId, tag: &str) -> Site {
        let consumer = scope.document.elements_by_tag(host, tag)[0];
        Site {
            consumer,
            parent: scope.document.parent(consumer).unwrap(),
            index: scope.document.index_of(consumer).unwrap(),
        }
    }

    fn list_value(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn text_follows_cell() {
        let runtime = Runtime::new();
        let label = runtime.signal(Value::from("x"));
        let (scope, host) = setup(
            &runtime,
            Props::new().with("label", label.clone()),
            el("p").child(el("data--label")),
        );

        bind_content(&scope, host, &PropertyName::new("label"), &[]).unwrap();
        assert_eq!(scope.document.inner_markup(host), "<p>x</p>");

        label.set(Value::from("y"));
        let paragraph = scope.document.children(host)[0];
        assert_eq!(scope.document.children(paragraph).len(), 1);
        assert_eq!(scope.document.inner_markup(host), "<p>y</p>");
    }

    #[test]
    fn text_keeps_its_position_among_siblings() {
        let runtime = Runtime::new();
        let name = runtime.signal(Value::from("Ada"));
        let (scope, host) = setup(
            &runtime,
            Props::new().with("name", name.clone()),
            el("p").children([Markup::from("Hi "), el("data--name"), Markup::from("!")]),
        );

        bind_content(&scope, host, &PropertyName::new("name"), &[]).unwrap();
        name.set(Value::from("Grace"));
        assert_eq!(scope.document.inner_markup(host), "<p>Hi Grace!</p>");
    }

    #[test]
    fn negated_when_recreates_content() {
        let runtime = Runtime::new();
        let hidden = runtime.signal(Value::from(false));
        let (scope, host) = setup(
            &runtime,
            Props::new().with("hidden", hidden.clone()).with("label", "shown"),
            el("data--label").attr("when", "! data--hidden"),
        );

        bind_content(&scope, host, &PropertyName::new("label"), &[]).unwrap();
        let first = scope.document.children(host);
        assert_eq!(scope.document.inner_markup(host), "shown");

        hidden.set(Value::from(true));
        assert_eq!(scope.document.inner_markup(host), "");

        hidden.set(Value::from(false));
        let second = scope.document.children(host);
        assert_eq!(scope.document.inner_markup(host), "shown");
        assert_ne!(first, second);
    }

    #[test]
    fn missing_when_property_hides() {
        let runtime = Runtime::new();
        let (scope, host) = setup(
            &runtime,
            Props::new().with("label", "x"),
            el("data--label").attr("when", "data--ready"),
        );

        bind_content(&scope, host, &PropertyName::new("label"), &[]).unwrap();
        assert_eq!(scope.document.inner_markup(host), "");
    }

    #[test]
    fn invalid_when_is_rejected() {
        let runtime = Runtime::new();
        let (scope, host) = setup(
            &runtime,
            Props::new().with("label", "x"),
            el("data--label").attr("when", "ready"),
        );

        let err = bind_content(&scope, host, &PropertyName::new("label"), &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidDirective { ref attribute, .. } if attribute == "when"));
    }

    #[test]
    fn gate_rejects_non_boolean_without_mutation() {
        let runtime = Runtime::new();
        let (scope, host) = setup(
            &runtime,
            Props::new().with("open", "yes"),
            el("data--open").attr("whence", "").child(el("b")),
        );
        let before = scope.document.mutation_count();

        let err = bind_content(&scope, host, &PropertyName::new("open"), &[]).unwrap_err();
        assert!(matches!(err, Error::GateNotBoolean { .. }));
        assert_eq!(scope.document.mutation_count(), before);
        assert_eq!(scope.document.children(host).len(), 1);
    }

    #[test]
    fn gate_toggles_copies_in_order() {
        let runtime = Runtime::new();
        let open = runtime.signal(Value::from(true));
        let (scope, host) = setup(
            &runtime,
            Props::new().with("open", open.clone()),
            el("data--open")
                .attr("whence", "")
                .children([el("h1").child("a"), el("p").child("b")]),
        );

        bind_content(&scope, host, &PropertyName::new("open"), &[]).unwrap();
        assert_eq!(scope.document.inner_markup(host), "<h1>a</h1><p>b</p>");

        open.set(Value::from(false));
        assert_eq!(scope.document.inner_markup(host), "");

        open.set(Value::from(true));
        assert_eq!(scope.document.inner_markup(host), "<h1>a</h1><p>b</p>");
    }

    #[test]
    fn list_with_positional_keys() {
        let runtime = Runtime::new();
        let items = runtime.signal(list_value(json!([1, 2, 3])));
        let (scope, host) = setup(
            &runtime,
            Props::new().with("items", items.clone()),
            el("data--items")
                .attr("each", "data--item")
                .child(el("li").child(el("data--item"))),
        );
        let site = site_of(&scope, host, "data--items");
        let directive = ListDirective::parse(&scope.document, site.consumer, "data--items")
            .unwrap()
            .unwrap();

        let list = bind_list(&scope, site, &PropertyName::new("items"), None, directive, &[]).unwrap();
        assert_eq!(scope.document.inner_markup(host), "<li>1</li><li>2</li><li>3</li>");

        items.set(list_value(json!([1, 3])));
        assert_eq!(scope.document.inner_markup(host), "<li>1</li><li>3</li>");
        assert_eq!(list.keys(), vec![ItemKey::Index(0), ItemKey::Index(1)]);
        assert_eq!(list.nodes(), scope.document.children(host));
    }

    #[test]
    fn duplicate_keys_keep_the_later_item() {
        let runtime = Runtime::new();
        let by_id = Value::key_fn(|item, _, _| ItemKey::from_value(item.get("id").unwrap_or(&Value::Null)));
        let (scope, host) = setup(
            &runtime,
            Props::new()
                .with("byId", by_id)
                .with("rows", list_value(json!([
                    { "id": 1, "name": "a" },
                    { "id": 2, "name": "b" },
                    { "id": 1, "name": "c" },
                ]))),
            el("data--rows")
                .attr("each", "data--row")
                .attr("key", "data--by-id")
                .child(el("li").attr("data--row", "title")),
        );
        let site = site_of(&scope, host, "data--rows");
        let directive = ListDirective::parse(&scope.document, site.consumer, "data--rows")
            .unwrap()
            .unwrap();

        let list = bind_list(&scope, site, &PropertyName::new("rows"), None, directive, &[]).unwrap();
        assert_eq!(list.keys(), vec![ItemKey::Int(2), ItemKey::Int(1)]);
        assert_eq!(scope.document.children(host).len(), 2);
    }

    #[test]
    fn list_items_bind_item_and_index() {
        let runtime = Runtime::new();
        let (scope, host) = setup(
            &runtime,
            Props::new().with("todos", list_value(json!(["milk", "eggs"]))),
            el("ul").child(
                el("data--todos")
                    .attr("each", "data--todo")
                    .attr("index", "data--i")
                    .child(
                        el("li")
                            .attr("data--todo", "title")
                            .children([el("data--i"), Markup::from(". "), el("data--todo")]),
                    ),
            ),
        );

        bind_content(&scope, host, &PropertyName::new("todos"), &[]).unwrap();
        assert_eq!(
            scope.document.inner_markup(host),
            "<ul><li data--todo=\"title\" title=\"milk\">0. milk</li>\
             <li data--todo=\"title\" title=\"eggs\">1. eggs</li></ul>"
        );
        // Item bindings are rebuilt per pass, never registered.
        let registry = scope.registry.as_ref().unwrap();
        assert_eq!(registry.count(ReactionCategory::MarkupAttribute), 0);
        assert_eq!(registry.count(ReactionCategory::List), 1);
    }

    #[test]
    fn item_bindings_are_released_between_passes() {
        let runtime = Runtime::new();
        let theme = runtime.signal(Value::from("dark"));
        let items = runtime.signal(list_value(json!([1, 2])));
        let (scope, host) = setup(
            &runtime,
            Props::new().with("theme", theme.clone()).with("items", items.clone()),
            el("data--items")
                .attr("each", "data--item")
                .child(el("li").attr("data--theme", "class")),
        );
        let theme_name = PropertyName::new("theme");

        bind_content(&scope, host, &PropertyName::new("items"), std::slice::from_ref(&theme_name)).unwrap();
        assert_eq!(theme.subscriber_count(), 2);

        items.set(list_value(json!([1, 2, 3])));
        items.set(list_value(json!([1])));
        assert_eq!(theme.subscriber_count(), 1);

        theme.set(Value::from("light"));
        assert_eq!(scope.document.inner_markup(host), "<li data--theme=\"class\" class=\"light\"></li>");
    }

    #[test]
    fn when_hides_and_restores_list() {
        let runtime = Runtime::new();
        let ready = runtime.signal(Value::from(true));
        let (scope, host) = setup(
            &runtime,
            Props::new()
                .with("ready", ready.clone())
                .with("items", list_value(json!(["a", "b"]))),
            el("data--items")
                .attr("each", "data--item")
                .attr("when", "data--ready")
                .child(el("data--item")),
        );

        bind_content(&scope, host, &PropertyName::new("items"), &[]).unwrap();
        assert_eq!(scope.document.inner_markup(host), "ab");

        ready.set(Value::from(false));
        assert_eq!(scope.document.inner_markup(host), "");

        ready.set(Value::from(true));
        assert_eq!(scope.document.inner_markup(host), "ab");
    }

    #[test]
    fn scalar_collection_renders_nothing() {
        let runtime = Runtime::new();
        let (scope, host) = setup(
            &runtime,
            Props::new().with("items", 5),
            el("data--items").attr("each", "data--item").child(el("data--item")),
        );

        bind_content(&scope, host, &PropertyName::new("items"), &[]).unwrap();
        assert_eq!(scope.document.inner_markup(host), "");
    }

    #[test]
    fn list_prefixes_are_checked() {
        for (attribute, value) in [("each", "item"), ("index", "i"), ("key", "data-key")] {
            let runtime = Runtime::new();
            let mut consumer = el("data--items").attr("each", "data--item");
            if attribute == "each" {
                consumer = el("data--items").attr("each", value);
            } else {
                consumer = consumer.attr(attribute, value);
            }
            let (scope, host) = setup(&runtime, Props::new().with("items", Prop::from(Value::Null)), consumer);

            let err = bind_content(&scope, host, &PropertyName::new("items"), &[]).unwrap_err();
            match err {
                Error::InvalidDirective {
                    attribute: found, ..
                } => assert_eq!(found, attribute),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn when_clause_parsing() {
        let clause = WhenClause::parse("data--x", "!  data--is-ready").unwrap().unwrap();
        assert!(clause.negated);
        assert_eq!(clause.property.as_str(), "isReady");

        assert!(WhenClause::parse("data--x", "  ").unwrap().is_none());
        assert!(WhenClause::parse("data--x", "!ready").is_err());
    }
}
