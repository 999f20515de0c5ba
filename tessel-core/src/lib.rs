//! Tessel Core
//!
//! This crate provides the runtime for the Tessel reactive template engine.
//! It implements:
//!
//! - Reactive primitives (signals, derived cells, effects)
//! - An in-memory document tree with a small markup builder
//! - A directive interpreter binding `data--` markers in templates to data
//! - Keyed list, gate and text reconciliation
//! - Component definition and the `create` entry point
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Signals, effects and dependency tracking on an owned runtime
//! - `dom`: Arena-backed document tree and markup
//! - `binding`: Directive parsing, the reaction registry and reconciliation
//! - `component`: Engine, components and instances
//! - `props`, `value`: Data contexts and the dynamic value type
//!
//! # Example
//!
//! ```rust,ignore
//! use tessel_core::{el, Definition, Document, Engine, Props};
//!
//! let document = Document::new();
//! document.build(
//!     document.root(),
//!     &el("template")
//!         .attr("id", "hello-card")
//!         .attr("data--name", "world")
//!         .child(el("p").children(["Hello ".into(), el("data--name")])),
//! );
//!
//! let engine = Engine::new(document);
//! let card = engine.define(Definition::new("hello-card"))?;
//! let host = engine.document().root();
//! card.mount(host, "greeting", Props::new())?;
//!
//! // Pushing a prop re-renders only the text it feeds.
//! card.create("greeting", Props::new().with("name", "Tessel"))?;
//! ```

pub mod binding;
pub mod component;
pub mod config;
pub mod dom;
pub mod error;
pub mod props;
pub mod reactive;
pub mod value;

pub use binding::{Declared, PropertyName, ReactionCategory, ReactionRegistry};
pub use component::{Component, Definition, Engine, Instance};
pub use config::{EngineConfig, ReactiveConfig};
pub use dom::{el, text, Document, Event, Markup, NodeId};
pub use error::{Error, Result};
pub use props::{DataContext, Prop, Props};
pub use reactive::{Effect, Runtime, Signal, Write};
pub use value::{EventHandler, ItemKey, KeyExtractor, Value};
