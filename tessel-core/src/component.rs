//! Components
//!
//! The host-facing surface of the engine.
//!
//! An [`Engine`] owns a document and a reactive runtime. Defining a
//! component binds a `<template id="..">` in that document to a set of
//! default props and upgrades every host element already carrying the
//! template's name. Each upgraded host is an [`Instance`] with its own data
//! context and reaction registry.
//!
//! ```rust,ignore
//! let engine = Engine::new(document);
//! let todos = engine.define(
//!     Definition::new("todo-list").prop("todos", engine.runtime().signal(items)),
//! )?;
//! todos.create("main", Props::new().with("title", "Groceries"))?;
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::binding::interpreter::{declared_properties, hoist_styles, Blueprint, Declared};
use crate::binding::registry::{ReactionCategory, ReactionRegistry};
use crate::config::EngineConfig;
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::props::{DataContext, Prop, Props};
use crate::reactive::{Effect, Runtime};
use crate::value::Value;

/// What to register: a template name and its default props.
#[derive(Debug, Clone, Default)]
pub struct Definition {
    /// The `id` of the `<template>` element. Must contain a `-`.
    pub template: String,
    pub props: Props,
}

impl Definition {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            props: Props::new(),
        }
    }

    /// Builder-style default prop.
    pub fn prop(mut self, name: impl Into<String>, prop: impl Into<Prop>) -> Self {
        self.props.insert(name, prop);
        self
    }

    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }
}

/// Owns a document, its reactive runtime and the components defined on it.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    runtime: Runtime,
    document: Document,
    config: EngineConfig,
    components: Mutex<IndexMap<String, Component>>,
}

impl Engine {
    /// Create an engine with the default configuration.
    pub fn new(document: Document) -> Self {
        Self::with_config(document, EngineConfig::default())
    }

    pub fn with_config(document: Document, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                runtime: Runtime::with_config(config.reactive.clone()),
                document,
                config,
                components: Mutex::new(IndexMap::new()),
            }),
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.inner.runtime
    }

    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// A component defined earlier, by template name.
    pub fn component(&self, name: &str) -> Option<Component> {
        self.inner.components.lock().get(name.trim()).cloned()
    }

    /// Define a component and upgrade the hosts already in the document.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidTemplateName`] if the name has no `-`.
    /// - [`Error::TemplateNotFound`] if there is no `<template>` with that id.
    /// - Any error raised while instantiating an existing host.
    pub fn define(&self, definition: Definition) -> Result<Component> {
        let name = definition.template.trim().to_string();
        if !name.contains('-') {
            return Err(Error::InvalidTemplateName(name));
        }
        if let Some(existing) = self.component(&name) {
            warn!(template = %name, "component already defined, keeping the first definition");
            return Ok(existing);
        }

        let document = &self.inner.document;
        let template = document
            .element_by_id(document.root(), "template", &name)
            .ok_or_else(|| Error::TemplateNotFound(name.clone()))?;
        if self.inner.config.hoist_styles {
            hoist_styles(document, template, &name);
        }
        let declared = declared_properties(document, template);

        let component = Component {
            inner: Arc::new(ComponentInner {
                name: name.clone(),
                template,
                declared,
                defaults: DataContext::new(definition.props),
                instances: Mutex::new(IndexMap::new()),
                runtime: self.inner.runtime.clone(),
                document: document.clone(),
            }),
        };
        self.inner
            .components
            .lock()
            .insert(name.clone(), component.clone());
        debug!(
            template = %name,
            properties = component.inner.declared.len(),
            "defined component"
        );

        for host in component.hosts() {
            component.upgrade(host)?;
        }
        Ok(component)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("document", &self.inner.document)
            .field("components", &self.inner.components.lock().keys().collect::<Vec<_>>())
            .field("config", &self.inner.config)
            .finish()
    }
}

/// A defined template with its default props and live instances.
#[derive(Clone)]
pub struct Component {
    inner: Arc<ComponentInner>,
}

struct ComponentInner {
    name: String,
    template: NodeId,
    declared: Vec<Declared>,
    defaults: DataContext,
    instances: Mutex<IndexMap<NodeId, Instance>>,
    runtime: Runtime,
    document: Document,
}

impl Component {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The `<template>` element.
    pub fn template(&self) -> NodeId {
        self.inner.template
    }

    /// Declared properties, in declaration order.
    pub fn declared(&self) -> &[Declared] {
        &self.inner.declared
    }

    /// Snapshot of the default props, including writes made by `create`.
    pub fn props(&self) -> Props {
        self.inner.defaults.snapshot()
    }

    /// Instantiate an existing host element. Upgrading twice returns the
    /// existing instance.
    pub fn upgrade(&self, host: NodeId) -> Result<Instance> {
        self.instantiate(host, &Props::new())
    }

    /// Create a host element with the given `id` under `parent` and
    /// instantiate it with per-instance overrides.
    pub fn mount(&self, parent: NodeId, id: &str, overrides: Props) -> Result<Instance> {
        let document = &self.inner.document;
        let host = document.create_element(&self.inner.name);
        document.set_attribute(host, "id", id.trim());
        document.append_child(parent, host);
        self.instantiate(host, &overrides)
    }

    fn instantiate(&self, host: NodeId, overrides: &Props) -> Result<Instance> {
        if let Some(existing) = self.inner.instances.lock().get(&host) {
            return Ok(existing.clone());
        }

        let rendered = Blueprint {
            runtime: &self.inner.runtime,
            document: &self.inner.document,
            template: self.inner.template,
            declared: &self.inner.declared,
            defaults: self.inner.defaults.snapshot(),
        }
        .instantiate(host, overrides)?;

        let instance = Instance {
            inner: Arc::new(InstanceInner {
                host,
                context: rendered.context,
                registry: rendered.registry,
                effects: Mutex::new(rendered.effects),
            }),
        };
        self.inner.instances.lock().insert(host, instance.clone());
        Ok(instance)
    }

    /// The connected instance whose host has the given `id`.
    pub fn instance(&self, id: &str) -> Result<Instance> {
        let id = id.trim();
        let document = &self.inner.document;
        self.instances()
            .into_iter()
            .find(|instance| {
                document.is_connected(instance.host())
                    && document.attribute(instance.host(), "id").as_deref().map(str::trim) == Some(id)
            })
            .ok_or_else(|| Error::InstanceNotFound {
                template: self.inner.name.clone(),
                id: id.to_string(),
            })
    }

    pub fn instances(&self) -> Vec<Instance> {
        self.inner.instances.lock().values().cloned().collect()
    }

    /// Push props into the instance with the given `id`.
    ///
    /// Each prop is merged into the component defaults and into the
    /// instance context: a cell slot takes the new value, any other slot is
    /// replaced. Then every reaction category is dispatched, in order,
    /// against `props`.
    pub fn create(&self, id: &str, props: Props) -> Result<()> {
        let instance = self.instance(id)?;
        let defaults = &self.inner.defaults;
        let context = instance.context();

        for (name, prop) in props.iter() {
            let shared = matches!(
                (defaults.resolve(name), context.resolve(name)),
                (Some(Prop::Cell(a)), Some(Prop::Cell(b))) if a.ptr_eq(&b)
            );
            defaults.merge(name, prop);
            if !shared {
                context.merge(name, prop);
            }
        }

        let invoked = instance.dispatch(&props)?;
        debug!(template = %self.inner.name, id, props = props.len(), invoked, "pushed props");
        Ok(())
    }

    /// Hosts in the document carrying this component's tag, outside templates.
    fn hosts(&self) -> Vec<NodeId> {
        let document = &self.inner.document;
        document
            .elements_by_tag(document.root(), &self.inner.name)
            .into_iter()
            .filter(|host| !inside_template(document, *host))
            .collect()
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.inner.name)
            .field("template", &self.inner.template)
            .field("declared", &self.inner.declared)
            .field("instances", &self.inner.instances.lock().len())
            .finish()
    }
}

fn inside_template(document: &Document, node: NodeId) -> bool {
    let mut current = document.parent(node);
    while let Some(parent) = current {
        if document.tag(parent).as_deref() == Some("template") {
            return true;
        }
        current = document.parent(parent);
    }
    false
}

/// One instantiated host.
#[derive(Clone)]
pub struct Instance {
    inner: Arc<InstanceInner>,
}

struct InstanceInner {
    host: NodeId,
    context: DataContext,
    registry: ReactionRegistry,
    effects: Mutex<Vec<Effect>>,
}

impl Instance {
    pub fn host(&self) -> NodeId {
        self.inner.host
    }

    /// Current value of a property, without subscribing anyone.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.inner
            .context
            .resolve(name)
            .map(|prop| prop.get_untracked())
    }

    pub fn context(&self) -> &DataContext {
        &self.inner.context
    }

    pub fn registry(&self) -> &ReactionRegistry {
        &self.inner.registry
    }

    /// Dispatch every category, in order, against `props`.
    ///
    /// Returns the number of reactions invoked.
    pub fn dispatch(&self, props: &Props) -> Result<usize> {
        let mut invoked = 0;
        for category in ReactionCategory::ALL {
            invoked += self.inner.registry.dispatch(category, props)?;
        }
        Ok(invoked)
    }

    /// Number of live root effects.
    pub fn effect_count(&self) -> usize {
        self.inner
            .effects
            .lock()
            .iter()
            .filter(|effect| !effect.is_disposed())
            .count()
    }

    /// Stop every binding of this instance. The rendered tree is left as is.
    pub fn dispose(&self) {
        let effects = std::mem::take(&mut *self.inner.effects.lock());
        for effect in &effects {
            effect.dispose();
        }
        debug!(host = %self.inner.host, effects = effects.len(), "disposed instance");
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("host", &self.inner.host)
            .field("registry", &self.inner.registry)
            .field("effects", &self.effect_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::el;

    fn engine_with(template: crate::dom::Markup) -> Engine {
        let document = Document::new();
        document.build(document.root(), &template);
        Engine::new(document)
    }

    #[test]
    fn name_must_have_a_dash() {
        let engine = engine_with(el("template").attr("id", "card"));
        let err = engine.define(Definition::new("card")).unwrap_err();
        assert!(matches!(err, Error::InvalidTemplateName(name) if name == "card"));
    }

    #[test]
    fn template_must_exist() {
        let engine = engine_with(el("template").attr("id", "x-card"));
        let err = engine.define(Definition::new("x-missing")).unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound(name) if name == "x-missing"));
    }

    #[test]
    fn existing_hosts_are_upgraded() {
        let engine = engine_with(
            el("template")
                .attr("id", "x-greeting")
                .attr("data--name", "world")
                .child(el("p").children([el("data--name")])),
        );
        let document = engine.document().clone();
        let host = document.build(document.root(), &el("x-greeting").attr("id", "a"));

        let component = engine.define(Definition::new(" x-greeting ")).unwrap();
        assert_eq!(component.instances().len(), 1);
        assert_eq!(document.inner_markup(host), "<p>world</p>");
        assert_eq!(component.instance("a").unwrap().host(), host);
    }

    #[test]
    fn hosts_inside_templates_are_left_alone() {
        let engine = engine_with(el("template").attr("id", "x-inner").child(el("b")));
        let document = engine.document().clone();
        document.build(
            document.root(),
            &el("template").attr("id", "x-outer").child(el("x-inner")),
        );

        let component = engine.define(Definition::new("x-inner")).unwrap();
        assert!(component.instances().is_empty());
    }

    #[test]
    fn redefinition_keeps_the_first() {
        let engine = engine_with(el("template").attr("id", "x-card"));
        let first = engine.define(Definition::new("x-card").prop("a", 1)).unwrap();
        let second = engine.define(Definition::new("x-card").prop("a", 2)).unwrap();
        assert_eq!(second.props().value("a"), Some(Value::from(1)));
        assert_eq!(first.name(), second.name());
    }

    #[test]
    fn unknown_instance_is_an_error() {
        let engine = engine_with(el("template").attr("id", "x-card"));
        let component = engine.define(Definition::new("x-card")).unwrap();
        let err = component.create("nope", Props::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "custom element <x-card id=\"nope\"> cannot be found"
        );
    }

    #[test]
    fn mount_creates_a_host() {
        let engine = engine_with(
            el("template")
                .attr("id", "x-badge")
                .attr("data--count", "0")
                .child(el("data--count")),
        );
        let component = engine.define(Definition::new("x-badge")).unwrap();
        let root = engine.document().root();

        let instance = component
            .mount(root, "b1", Props::new().with("count", 3))
            .unwrap();
        assert_eq!(engine.document().tag(instance.host()).as_deref(), Some("x-badge"));
        assert_eq!(engine.document().inner_markup(instance.host()), "3");
        assert_eq!(instance.get("count"), Some(Value::from(3)));
    }

    #[test]
    fn dispose_stops_bindings() {
        let engine = engine_with(
            el("template")
                .attr("id", "x-label")
                .attr("data--label", "")
                .child(el("data--label")),
        );
        let label = engine.runtime().signal(Value::from("a"));
        let component = engine
            .define(Definition::new("x-label").prop("label", label.clone()))
            .unwrap();
        let instance = component
            .mount(engine.document().root(), "l", Props::new())
            .unwrap();
        assert!(instance.effect_count() > 0);

        instance.dispose();
        label.set(Value::from("b"));
        assert_eq!(engine.document().inner_markup(instance.host()), "a");
        assert_eq!(label.subscriber_count(), 0);
    }
}
