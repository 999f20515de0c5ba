//! Dynamic values carried by data contexts.
//!
//! Templates bind to loosely typed data: strings for text, booleans for
//! gates, lists for repetition, callables for event handlers and key
//! extractors, and node references written back by identity bindings.
//! [`Value`] covers all of them. Plain data converts to and from
//! `serde_json::Value`, so hosts can push JSON straight into an instance.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::dom::{Event, NodeId};

/// Callable bound with an `event.<name>` directive.
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Computes the key of a list item from `(item, index, collection)`.
pub type KeyExtractor = Arc<dyn Fn(&Value, usize, &[Value]) -> ItemKey + Send + Sync>;

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    /// Reference to a node in the host tree.
    Node(NodeId),
    Handler(EventHandler),
    KeyFn(KeyExtractor),
}

impl Value {
    /// Wrap a closure as an event handler value.
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        Value::Handler(Arc::new(f))
    }

    /// Wrap a closure as a key extractor value.
    pub fn key_fn<F>(f: F) -> Self
    where
        F: Fn(&Value, usize, &[Value]) -> ItemKey + Send + Sync + 'static,
    {
        Value::KeyFn(Arc::new(f))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Strict boolean view, used by gates.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Loose boolean view, used by conditionals.
    ///
    /// `Null`, `false`, zero, `NaN` and the empty string are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::List(_)
            | Value::Map(_)
            | Value::Node(_)
            | Value::Handler(_)
            | Value::KeyFn(_) => true,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            Value::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    pub fn as_key_fn(&self) -> Option<&KeyExtractor> {
        match self {
            Value::KeyFn(key_fn) => Some(key_fn),
            _ => None,
        }
    }

    /// Look up a field of a map value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(field),
            _ => None,
        }
    }

    /// The markup attribute this value should produce.
    ///
    /// `None` means the attribute is absent: `Null` and `false` remove it,
    /// `true` sets it empty, anything else sets its display form.
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            Value::Null | Value::Bool(false) => None,
            Value::Bool(true) => Some(String::new()),
            other => Some(other.to_string()),
        }
    }

    /// Plain-data view of the value. Callables become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Handler(_) | Value::KeyFn(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            Value::Node(id) => serde_json::Value::from(id.raw()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 => {
                write!(f, "{}", *x as i64)
            }
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Map(_) => write!(f, "{}", self.to_json()),
            Value::Node(id) => write!(f, "{id}"),
            Value::Handler(_) => f.write_str("[handler]"),
            Value::KeyFn(_) => f.write_str("[key]"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Value::Node(id) => f.debug_tuple("Node").field(id).finish(),
            Value::Handler(_) => f.write_str("Handler(..)"),
            Value::KeyFn(_) => f.write_str("KeyFn(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a == b,
            (Value::Handler(a), Value::Handler(b)) => Arc::ptr_eq(a, b),
            (Value::KeyFn(a), Value::KeyFn(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::Node(id)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// Identity of a rendered list item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
    /// Positional key, produced by the default extractor.
    Index(usize),
    Int(i64),
    Text(String),
}

impl ItemKey {
    /// Key derived from a scalar item value. Non-scalars key by display form.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Int(n) => ItemKey::Int(*n),
            Value::Text(s) => ItemKey::Text(s.clone()),
            other => ItemKey::Text(other.to_string()),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Index(i) => write!(f, "{i}"),
            ItemKey::Int(n) => write!(f, "{n}"),
            ItemKey::Text(s) => f.write_str(s),
        }
    }
}

impl From<usize> for ItemKey {
    fn from(i: usize) -> Self {
        ItemKey::Index(i)
    }
}

impl From<i64> for ItemKey {
    fn from(n: i64) -> Self {
        ItemKey::Int(n)
    }
}

impl From<&str> for ItemKey {
    fn from(s: &str) -> Self {
        ItemKey::Text(s.to_string())
    }
}

impl From<String> for ItemKey {
    fn from(s: String) -> Self {
        ItemKey::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_matches_rendered_text() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from(3.0).to_string(), "3");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from(vec![1, 2, 3]).to_string(), "1,2,3");
        assert_eq!(Value::from("hi").to_string(), "hi");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from(f64::NAN).is_truthy());
        assert!(Value::from("no").is_truthy());
        assert!(Value::List(Vec::new()).is_truthy());
    }

    #[test]
    fn attributes_from_values() {
        assert_eq!(Value::Null.to_attribute(), None);
        assert_eq!(Value::from(false).to_attribute(), None);
        assert_eq!(Value::from(true).to_attribute(), Some(String::new()));
        assert_eq!(Value::from(7).to_attribute(), Some("7".to_string()));
    }

    #[test]
    fn json_conversion() {
        let value = Value::from(json!({ "title": "milk", "done": false, "qty": 2, "tags": ["a"] }));
        assert_eq!(value.get("title"), Some(&Value::from("milk")));
        assert_eq!(value.get("qty"), Some(&Value::Int(2)));
        assert_eq!(
            value.to_json(),
            json!({ "title": "milk", "done": false, "qty": 2, "tags": ["a"] })
        );

        let parsed: Value = serde_json::from_str("[1, 2.5, null]").unwrap();
        assert_eq!(
            parsed,
            Value::List(vec![Value::Int(1), Value::Float(2.5), Value::Null])
        );
    }

    #[test]
    fn callables_compare_by_identity() {
        let handler = Value::handler(|_| {});
        assert_eq!(handler, handler.clone());
        assert_ne!(handler, Value::handler(|_| {}));
    }
}
