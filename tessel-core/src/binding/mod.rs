//! # Template Bindings
//!
//! The directive interpreter and everything it installs.
//!
//! ## Layout
//!
//! - [`naming`]: property names in their markup and logical spellings
//! - [`registry`]: reaction categories, the per-instance registry and the
//!   installer every binding goes through
//! - `attributes`: `this`, `event.<name>`, `.<name>` and markup attribute
//!   bindings
//! - `reconcile`: gates, conditionals, keyed lists and text
//! - [`interpreter`]: instantiation of a template into a host

mod attributes;
pub mod interpreter;
pub mod naming;
mod reconcile;
pub mod registry;

pub use interpreter::{declared_properties, Declared};
pub use naming::PropertyName;
pub use registry::{BindingRecord, Reaction, ReactionCategory, ReactionRegistry};
