//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, effects and
//! derived cells. These primitives drive every live binding in Tessel.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! while an effect runs, the signal automatically registers that effect as a
//! dependent. When the signal's value is written, all dependents re-run
//! synchronously.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change. Effects are used to synchronize reactive state with
//! the host tree: setting attributes, inserting text, reconciling lists.
//!
//! ## Derived cells
//!
//! A derived cell is a signal written by an effect over other signals. It is
//! recomputed eagerly whenever one of its sources is written.
//!
//! # Implementation Notes
//!
//! Dependency tracking goes through an explicit [`Runtime`] that owns the
//! stack of running effects. When a signal is read, it asks its runtime for
//! the innermost running effect and, if there is one, subscribes it.

mod context;
mod derived;
mod effect;
mod runtime;
mod signal;
mod subscriber;

pub use effect::Effect;
pub use runtime::Runtime;
pub use signal::{Signal, Write};
pub use subscriber::{Subscriber, SubscriberId};
