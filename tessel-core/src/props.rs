//! Props and data contexts.
//!
//! A prop is either a literal [`Value`] or a reactive cell holding one.
//! Bindings to a literal apply once; bindings to a cell re-apply on every
//! write. A [`DataContext`] is the shared, mutable prop map of one rendered
//! instance.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::warn;

use crate::reactive::Signal;
use crate::value::Value;

/// A literal value or a reactive cell.
#[derive(Clone, Debug)]
pub enum Prop {
    Value(Value),
    Cell(Signal<Value>),
}

impl Prop {
    /// Current value. Reading a cell subscribes the running effect.
    pub fn get(&self) -> Value {
        match self {
            Prop::Value(value) => value.clone(),
            Prop::Cell(cell) => cell.get(),
        }
    }

    /// Current value without subscribing anyone.
    pub fn get_untracked(&self) -> Value {
        match self {
            Prop::Value(value) => value.clone(),
            Prop::Cell(cell) => cell.get_untracked(),
        }
    }

    pub fn as_cell(&self) -> Option<&Signal<Value>> {
        match self {
            Prop::Cell(cell) => Some(cell),
            Prop::Value(_) => None,
        }
    }
}

impl From<Value> for Prop {
    fn from(value: Value) -> Self {
        Prop::Value(value)
    }
}

impl From<Signal<Value>> for Prop {
    fn from(cell: Signal<Value>) -> Self {
        Prop::Cell(cell)
    }
}

macro_rules! prop_from_literal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Prop {
                fn from(value: $ty) -> Self {
                    Prop::Value(Value::from(value))
                }
            }
        )*
    };
}

prop_from_literal!(bool, i32, i64, usize, f64, &str, String, serde_json::Value);

/// An ordered map from logical property name to prop.
#[derive(Clone, Debug, Default)]
pub struct Props(IndexMap<String, Prop>);

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, prop: impl Into<Prop>) -> Self {
        self.insert(name, prop);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, prop: impl Into<Prop>) -> Option<Prop> {
        self.0.insert(name.into(), prop.into())
    }

    pub fn get(&self, name: &str) -> Option<&Prop> {
        self.0.get(name)
    }

    /// Current value of a prop, unwrapping cells without tracking.
    pub fn value(&self, name: &str) -> Option<Value> {
        self.0.get(name).map(Prop::get_untracked)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Prop> {
        self.0.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Prop)> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Props from the entries of a JSON object.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Object(map) => map
                .into_iter()
                .map(|(name, value)| (name, Prop::Value(Value::from(value))))
                .collect(),
            other => {
                warn!(json = %other, "props must be a JSON object, ignoring");
                Self::default()
            }
        }
    }
}

impl FromIterator<(String, Prop)> for Props {
    fn from_iter<I: IntoIterator<Item = (String, Prop)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Props {
    type Item = (String, Prop);
    type IntoIter = indexmap::map::IntoIter<String, Prop>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// The shared data context of one rendered instance.
///
/// Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct DataContext {
    props: Arc<RwLock<Props>>,
}

impl DataContext {
    pub fn new(props: Props) -> Self {
        Self {
            props: Arc::new(RwLock::new(props)),
        }
    }

    /// The prop stored under `name`, if any.
    pub fn resolve(&self, name: &str) -> Option<Prop> {
        self.props.read().get(name).cloned()
    }

    /// Store `prop` under `name` unless something is already there.
    pub fn insert_default(&self, name: &str, prop: impl FnOnce() -> Prop) {
        let mut props = self.props.write();
        if !props.contains(name) {
            props.insert(name, prop());
        }
    }

    /// Write a value through to the slot: a cell slot is set, anything else
    /// is replaced by the literal.
    pub fn write(&self, name: &str, value: Value) {
        match self.resolve(name) {
            Some(Prop::Cell(cell)) => cell.set(value),
            _ => {
                self.props.write().insert(name, Prop::Value(value));
            }
        }
    }

    /// Merge an incoming prop: a cell slot takes the incoming current value,
    /// anything else is replaced by the incoming prop itself.
    pub fn merge(&self, name: &str, incoming: &Prop) {
        match self.resolve(name) {
            Some(Prop::Cell(cell)) => {
                if incoming.as_cell().is_some_and(|other| other.ptr_eq(&cell)) {
                    return;
                }
                cell.set(incoming.get_untracked());
            }
            _ => {
                self.props.write().insert(name, incoming.clone());
            }
        }
    }

    /// A new context with the same props plus `overrides`.
    ///
    /// Cells are shared with this context; literals are copied.
    pub fn shadow<I>(&self, overrides: I) -> DataContext
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut props = self.snapshot();
        for (name, value) in overrides {
            props.insert(name, Prop::Value(value));
        }
        DataContext::new(props)
    }

    /// Copy of the current props.
    pub fn snapshot(&self) -> Props {
        self.props.read().clone()
    }
}
