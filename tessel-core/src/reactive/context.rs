//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a signal is read,
//! we can register the current computation as a dependent.
//!
//! # Implementation
//!
//! Each [`Runtime`] owns a stack of frames. When entering a reactive context
//! (running an effect), we push a frame for the subscriber onto the stack.
//! When the computation completes, we pop it and hand the collected
//! dependencies and child effects back to the caller.
//!
//! This design supports nested reactive contexts (an effect created inside
//! another effect's run): reads only ever subscribe the innermost frame.

use std::sync::Arc;

use indexmap::IndexMap;

use super::effect::Effect;
use super::runtime::Runtime;
use super::subscriber::{Source, Subscriber, SubscriberId};

/// An entry in the reactive context stack.
pub(crate) struct Frame {
    /// The computation collecting dependencies, or `None` for an untracked
    /// section.
    pub(crate) observer: Option<Arc<dyn Subscriber>>,
    /// Sources read during this computation, in first-read order.
    pub(crate) dependencies: IndexMap<u64, Arc<dyn Source>>,
    /// Effects created while this computation ran. They are owned by it.
    pub(crate) children: Vec<Effect>,
}

impl Frame {
    pub(crate) fn new(observer: Option<Arc<dyn Subscriber>>) -> Self {
        Self {
            observer,
            dependencies: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub(crate) fn subscriber_id(&self) -> Option<SubscriberId> {
        self.observer.as_ref().map(|observer| observer.subscriber_id())
    }
}

/// Guard that pops the context when dropped.
///
/// This ensures the context stack is properly maintained even if
/// the computation panics. Use [`ReactiveContext::finish`] on the normal
/// path to retrieve what the computation collected.
pub(crate) struct ReactiveContext {
    runtime: Runtime,
    subscriber_id: Option<SubscriberId>,
    finished: bool,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given observer.
    ///
    /// While this context is active, any signals that are read will
    /// register the observer as a dependent.
    pub(crate) fn enter(runtime: &Runtime, observer: Option<Arc<dyn Subscriber>>) -> Self {
        let frame = Frame::new(observer);
        let subscriber_id = frame.subscriber_id();
        runtime.frames().push(frame);

        Self {
            runtime: runtime.clone(),
            subscriber_id,
            finished: false,
        }
    }

    /// Leave the context and return the frame it collected.
    pub(crate) fn finish(mut self) -> Frame {
        self.finished = true;
        self.pop().unwrap_or_else(|| Frame::new(None))
    }

    fn pop(&self) -> Option<Frame> {
        let popped = self.runtime.frames().pop();

        // Verify we're popping the right context.
        if let Some(frame) = &popped {
            debug_assert_eq!(
                frame.subscriber_id(),
                self.subscriber_id,
                "ReactiveContext mismatch: expected {:?}, got {:?}",
                self.subscriber_id,
                frame.subscriber_id()
            );
        }
        popped
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        if !self.finished {
            // Unwinding out of a computation: discard what it collected.
            self.pop();
        }
    }
}
