//! Reaction Registry & Executor
//!
//! Every binding installed while an instance is set up is also recorded in
//! that instance's [`ReactionRegistry`], under one of eight
//! [`ReactionCategory`] values. Hosts re-trigger the recorded reactions by
//! property name with [`ReactionRegistry::dispatch`], which is how
//! `Component::create` pushes new values into an already rendered instance.
//!
//! # Installing a binding
//!
//! Binding code never calls a reaction directly. It asks the [`Scope`] for
//! an [`Installer`] over the property's current source and hands it the
//! reaction. Installing then:
//!
//! 1. records the reaction in the registry (when the scope has one),
//! 2. applies it once to the source's current value, and
//! 3. when the source is a cell, keeps re-applying it on every write.
//!
//! Every recorded reaction is retained; dispatching a property reaches all
//! of them in registration order.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, error};

use super::naming::PropertyName;
use crate::dom::{Document, Node, NodeId};
use crate::error::{Error, Result};
use crate::props::{DataContext, Prop, Props};
use crate::reactive::{Effect, Runtime};
use crate::value::Value;

/// The class of a live binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReactionCategory {
    /// `this`: writes the consumer node back into the data context.
    Identity,
    /// `event.<name>`: installs the value as a listener.
    Event,
    /// `.<name>`: sets a direct field on the consumer node.
    Property,
    /// `<name>`: sets or removes a markup attribute.
    MarkupAttribute,
    /// `whence`: toggles a static copy of the consumer's children.
    Gate,
    /// `when`: visibility of a list or text site.
    Conditional,
    /// `each`: keyed list reconciliation.
    List,
    /// Plain content consumer: a single text node.
    Text,
}

impl ReactionCategory {
    /// Every category, in dispatch order.
    pub const ALL: [ReactionCategory; 8] = [
        ReactionCategory::Identity,
        ReactionCategory::Event,
        ReactionCategory::Property,
        ReactionCategory::MarkupAttribute,
        ReactionCategory::Gate,
        ReactionCategory::Conditional,
        ReactionCategory::List,
        ReactionCategory::Text,
    ];

    /// Stable label, used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionCategory::Identity => "this-attr",
            ReactionCategory::Event => "event-attr",
            ReactionCategory::Property => "js-attr",
            ReactionCategory::MarkupAttribute => "html-attr",
            ReactionCategory::Gate => "whence-nodes",
            ReactionCategory::Conditional => "when-nodes",
            ReactionCategory::List => "each-nodes",
            ReactionCategory::Text => "text-nodes",
        }
    }
}

impl std::fmt::Display for ReactionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reaction applies a property value to the tree.
pub type Reaction = Arc<dyn Fn(&Value) -> Result<()> + Send + Sync>;

/// A recorded reaction and the property it reacts to.
#[derive(Clone)]
pub struct BindingRecord {
    property: String,
    reaction: Reaction,
}

impl BindingRecord {
    pub fn property(&self) -> &str {
        &self.property
    }
}

impl std::fmt::Debug for BindingRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingRecord")
            .field("property", &self.property)
            .finish_non_exhaustive()
    }
}

/// Per-instance record of installed reactions. Clones share the records.
#[derive(Clone, Default)]
pub struct ReactionRegistry {
    records: Arc<Mutex<IndexMap<ReactionCategory, Vec<BindingRecord>>>>,
}

impl ReactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reaction. Earlier records for the same property are kept.
    pub fn register(&self, category: ReactionCategory, property: &str, reaction: Reaction) {
        self.records
            .lock()
            .entry(category)
            .or_default()
            .push(BindingRecord {
                property: property.to_string(),
                reaction,
            });
    }

    /// Records of one category, in registration order.
    pub fn records(&self, category: ReactionCategory) -> Vec<BindingRecord> {
        self.records
            .lock()
            .get(&category)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of records in one category.
    pub fn count(&self, category: ReactionCategory) -> usize {
        self.records.lock().get(&category).map_or(0, Vec::len)
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.records.lock().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every record of `category` whose property is present in
    /// `props`, passing the prop's current value.
    ///
    /// Records for absent properties are skipped. Returns the number of
    /// reactions invoked; the first failing reaction aborts the dispatch.
    pub fn dispatch(&self, category: ReactionCategory, props: &Props) -> Result<usize> {
        let records = self.records(category);
        let mut invoked = 0;
        for record in &records {
            let Some(prop) = props.get(&record.property) else {
                continue;
            };
            let value = prop.get_untracked();
            (record.reaction)(&value)?;
            invoked += 1;
        }
        if invoked > 0 {
            debug!(category = category.as_str(), invoked, "dispatched reactions");
        }
        Ok(invoked)
    }
}

impl std::fmt::Debug for ReactionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let records = self.records.lock();
        f.debug_map()
            .entries(records.iter().map(|(category, list)| (category.as_str(), list.len())))
            .finish()
    }
}

/// Everything a binding needs while it is installed.
#[derive(Clone)]
pub(crate) struct Scope {
    pub(crate) runtime: Runtime,
    pub(crate) document: Document,
    pub(crate) context: DataContext,

    /// `None` while rendering list items: those bindings are rebuilt by
    /// every list pass and are not dispatch targets.
    pub(crate) registry: Option<ReactionRegistry>,

    /// Root effects installed through this scope.
    pub(crate) effects: Arc<Mutex<Vec<Effect>>>,

    /// Nodes directive scans may visit. Content the bindings themselves
    /// insert later is not part of the template and is never re-scanned.
    pub(crate) template_nodes: Option<Arc<HashSet<NodeId>>>,

    /// Component default props. A blank attribute directive falls back to
    /// the default's text as its token list.
    pub(crate) defaults: Option<Arc<Props>>,
}

impl Scope {
    pub(crate) fn new(
        runtime: Runtime,
        document: Document,
        context: DataContext,
        registry: Option<ReactionRegistry>,
    ) -> Self {
        Self {
            runtime,
            document,
            context,
            registry,
            effects: Arc::new(Mutex::new(Vec::new())),
            template_nodes: None,
            defaults: None,
        }
    }

    /// An unregistered scope over `context`, used for list rendering.
    ///
    /// Effects installed through it are owned by the list's render effect,
    /// so it does not share the instance's effect list.
    pub(crate) fn item(&self, context: DataContext) -> Self {
        let mut scope = Self::new(self.runtime.clone(), self.document.clone(), context, None);
        scope.defaults = self.defaults.clone();
        scope
    }

    /// Current source of a property. Unknown properties read as `Null`.
    pub(crate) fn resolve(&self, property: &PropertyName) -> Prop {
        self.context
            .resolve(property.as_str())
            .unwrap_or(Prop::Value(Value::Null))
    }

    /// Descendants of `root` matching `predicate` that belong to the template.
    pub(crate) fn scan(&self, root: NodeId, predicate: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        let found = self.document.find_all(root, predicate);
        match &self.template_nodes {
            Some(nodes) => found.into_iter().filter(|id| nodes.contains(id)).collect(),
            None => found,
        }
    }

    pub(crate) fn executor(
        &self,
        category: ReactionCategory,
        property: &PropertyName,
        source: Prop,
    ) -> Installer<'_> {
        Installer {
            scope: self,
            category,
            property: property.as_str().to_string(),
            source,
        }
    }

    /// Run `render` in an effect.
    ///
    /// An error from the first run is returned and the effect is dropped.
    /// Errors from later runs have no caller to return to and are logged.
    pub(crate) fn watch<F>(&self, label: &'static str, render: F) -> Result<()>
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        let seed_error: Arc<Mutex<Option<Error>>> = Arc::new(Mutex::new(None));
        let seeded = Arc::new(AtomicBool::new(false));
        let owned = self.runtime.has_owner();

        let (slot, flag) = (Arc::clone(&seed_error), Arc::clone(&seeded));
        let effect = self.runtime.effect(move || {
            if let Err(err) = render() {
                if flag.load(Ordering::SeqCst) {
                    error!(binding = label, error = %err, "reactive binding failed");
                } else {
                    *slot.lock() = Some(err);
                }
            }
            flag.store(true, Ordering::SeqCst);
        });

        let failed = seed_error.lock().take();
        if let Some(err) = failed {
            effect.dispose();
            return Err(err);
        }
        if !owned {
            self.effects.lock().push(effect);
        }
        Ok(())
    }
}

/// Installs one reaction over one property source.
pub(crate) struct Installer<'a> {
    scope: &'a Scope,
    category: ReactionCategory,
    property: String,
    source: Prop,
}

impl Installer<'_> {
    pub(crate) fn install(self, reaction: Reaction) -> Result<()> {
        if let Some(registry) = &self.scope.registry {
            registry.register(self.category, &self.property, Arc::clone(&reaction));
        }
        match self.source {
            Prop::Value(value) => reaction(&value),
            Prop::Cell(cell) => self
                .scope
                .watch(self.category.as_str(), move || reaction(&cell.get())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    fn scope() -> Scope {
        Scope::new(
            Runtime::new(),
            Document::new(),
            DataContext::default(),
            Some(ReactionRegistry::new()),
        )
    }

    fn counter(hits: &Arc<AtomicI32>) -> Reaction {
        let hits = hits.clone();
        Arc::new(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn categories_in_dispatch_order() {
        let labels: Vec<_> = ReactionCategory::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "this-attr",
                "event-attr",
                "js-attr",
                "html-attr",
                "whence-nodes",
                "when-nodes",
                "each-nodes",
                "text-nodes"
            ]
        );
    }

    #[test]
    fn dispatch_reaches_every_record() {
        let registry = ReactionRegistry::new();
        let hits = Arc::new(AtomicI32::new(0));
        registry.register(ReactionCategory::Text, "label", counter(&hits));
        registry.register(ReactionCategory::Text, "label", counter(&hits));
        registry.register(ReactionCategory::Text, "other", counter(&hits));

        let invoked = registry
            .dispatch(ReactionCategory::Text, &Props::new().with("label", "x"))
            .unwrap();
        assert_eq!(invoked, 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dispatch_skips_missing_properties() {
        let registry = ReactionRegistry::new();
        let hits = Arc::new(AtomicI32::new(0));
        registry.register(ReactionCategory::Event, "onClick", counter(&hits));

        let invoked = registry
            .dispatch(ReactionCategory::Event, &Props::new().with("label", "x"))
            .unwrap();
        assert_eq!(invoked, 0);
        assert_eq!(registry.count(ReactionCategory::Event), 1);
    }

    #[test]
    fn dispatch_unwraps_cells() {
        let runtime = Runtime::new();
        let registry = ReactionRegistry::new();
        let seen = Arc::new(Mutex::new(Value::Null));
        let seen_clone = seen.clone();
        registry.register(
            ReactionCategory::Property,
            "count",
            Arc::new(move |value| {
                *seen_clone.lock() = value.clone();
                Ok(())
            }),
        );

        let props = Props::new().with("count", runtime.signal(Value::from(7)));
        registry.dispatch(ReactionCategory::Property, &props).unwrap();
        assert_eq!(*seen.lock(), Value::from(7));
    }

    #[test]
    fn install_literal_applies_once() {
        let scope = scope();
        let hits = Arc::new(AtomicI32::new(0));
        scope
            .executor(ReactionCategory::Text, &PropertyName::new("label"), Prop::from("x"))
            .install(counter(&hits))
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(scope.effects.lock().is_empty());
        assert_eq!(scope.registry.as_ref().unwrap().count(ReactionCategory::Text), 1);
    }

    #[test]
    fn install_cell_reapplies_on_write() {
        let scope = scope();
        let cell = scope.runtime.signal(Value::from(1));
        let hits = Arc::new(AtomicI32::new(0));
        scope
            .executor(ReactionCategory::Text, &PropertyName::new("label"), Prop::from(cell.clone()))
            .install(counter(&hits))
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        cell.set(Value::from(2));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(scope.effects.lock().len(), 1);
    }

    #[test]
    fn seed_error_is_returned_and_binding_dropped() {
        let scope = scope();
        let cell = scope.runtime.signal(Value::from(1));
        let failing: Reaction = Arc::new(|_| {
            Err(Error::GateNotBoolean {
                element: "data--open".into(),
                property: "open".into(),
            })
        });

        let result = scope
            .executor(ReactionCategory::Gate, &PropertyName::new("open"), Prop::from(cell.clone()))
            .install(failing);
        assert!(matches!(result, Err(Error::GateNotBoolean { .. })));
        assert!(scope.effects.lock().is_empty());
        assert_eq!(cell.subscriber_count(), 0);
    }

    #[test]
    fn later_errors_are_not_returned() {
        let scope = scope();
        let cell = scope.runtime.signal(Value::from(true));
        let reaction: Reaction = Arc::new(|value| match value.as_bool() {
            Some(_) => Ok(()),
            None => Err(Error::GateNotBoolean {
                element: "data--open".into(),
                property: "open".into(),
            }),
        });
        scope
            .executor(ReactionCategory::Gate, &PropertyName::new("open"), Prop::from(cell.clone()))
            .install(reaction)
            .unwrap();

        // Logged, not propagated.
        cell.set(Value::from("yes"));
        assert_eq!(scope.effects.lock().len(), 1);
    }

    #[test]
    fn item_scopes_do_not_register() {
        let scope = scope();
        let item = scope.item(DataContext::default());
        let hits = Arc::new(AtomicI32::new(0));
        item.executor(ReactionCategory::Text, &PropertyName::new("label"), Prop::from("x"))
            .install(counter(&hits))
            .unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(scope.registry.as_ref().unwrap().is_empty());
    }
}
