//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. When any dependency is written, the signal calls the effect directly
//!    and it re-runs before the write returns.
//!
//! 3. Each run records what it read. Dependencies from the previous run that
//!    were not read again are unsubscribed, so an effect's subscriptions
//!    follow its current reads instead of accumulating.
//!
//! # Ownership
//!
//! Effects created while another effect runs are children of that effect.
//! Before the parent re-runs (and when it is disposed) its children are
//! disposed. Rendering code relies on this: bindings installed inside a
//! re-rendered subtree go away with the subtree's previous render.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::trace;

use super::context::ReactiveContext;
use super::runtime::Runtime;
use super::subscriber::{Source, Subscriber, SubscriberId};

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = Runtime::new();
/// let count = runtime.signal(0);
///
/// let c = count.clone();
/// let effect = runtime.effect(move || {
///     println!("Count is: {}", c.get());
/// });
///
/// count.set(5);  // Prints: "Count is: 5"
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Arc<EffectInner>,
}

struct EffectInner {
    /// The subscriber ID used for dependency tracking.
    subscriber_id: SubscriberId,

    runtime: Runtime,

    /// The effect function.
    run: Box<dyn Fn() + Send + Sync>,

    /// Sources read by the latest run.
    dependencies: Mutex<IndexMap<u64, Arc<dyn Source>>>,

    /// Effects created by the latest run.
    children: Mutex<Vec<Effect>>,

    /// Whether the effect has been disposed.
    disposed: AtomicBool,

    /// Number of times the effect has run.
    run_count: AtomicUsize,

    this: Weak<EffectInner>,
}

impl Effect {
    /// Create a new effect with the given function.
    ///
    /// The function runs immediately to establish initial dependencies. If
    /// another effect is running, the new effect becomes its child.
    pub fn new<F>(runtime: &Runtime, run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let effect = Self {
            inner: Arc::new_cyclic(|this| EffectInner {
                subscriber_id: SubscriberId::new(),
                runtime: runtime.clone(),
                run: Box::new(run),
                dependencies: Mutex::new(IndexMap::new()),
                children: Mutex::new(Vec::new()),
                disposed: AtomicBool::new(false),
                run_count: AtomicUsize::new(0),
                this: this.clone(),
            }),
        };

        runtime.adopt(&effect);

        // Run immediately to establish dependencies
        effect.execute();

        effect
    }

    /// Get the subscriber ID for this effect.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.inner.subscriber_id
    }

    /// Execute the effect function.
    ///
    /// This runs the function within a reactive context to track dependencies.
    pub fn execute(&self) {
        self.inner.execute();
    }

    /// Dispose of the effect.
    ///
    /// After disposal, the effect will not run again. It is unsubscribed from
    /// everything it read and its children are disposed.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::SeqCst)
    }

    /// Get the number of dependencies.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.lock().len()
    }

    /// Get the number of live child effects created by the latest run.
    pub fn child_count(&self) -> usize {
        self.inner.children.lock().len()
    }
}

impl EffectInner {
    fn execute(&self) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        let Some(this) = self.this.upgrade() else {
            return;
        };
        let _drive = self.runtime.drive();

        // Children belong to the previous run.
        let stale_children = std::mem::take(&mut *self.children.lock());
        for child in stale_children {
            child.dispose();
        }

        // Enter a reactive context to track dependencies
        let ctx = ReactiveContext::enter(&self.runtime, Some(this as Arc<dyn Subscriber>));
        (self.run)();
        let frame = ctx.finish();

        let stale: Vec<Arc<dyn Source>> = {
            let mut dependencies = self.dependencies.lock();
            let stale = dependencies
                .iter()
                .filter(|(id, _)| !frame.dependencies.contains_key(*id))
                .map(|(_, source)| Arc::clone(source))
                .collect();
            *dependencies = frame.dependencies;
            stale
        };
        for source in &stale {
            source.unsubscribe(self.subscriber_id);
        }
        *self.children.lock() = frame.children;

        let runs = self.run_count.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(
            effect = self.subscriber_id.raw(),
            runs,
            dropped = stale.len(),
            "effect ran"
        );

        // Disposed mid-run: drop whatever the run just subscribed to.
        if self.disposed.load(Ordering::SeqCst) {
            self.release();
        }
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.release();
    }

    fn release(&self) {
        let dependencies = std::mem::take(&mut *self.dependencies.lock());
        for source in dependencies.values() {
            source.unsubscribe(self.subscriber_id);
        }
        let children = std::mem::take(&mut *self.children.lock());
        for child in children {
            child.dispose();
        }
    }
}

impl Subscriber for EffectInner {
    fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    fn notify(&self) {
        self.execute();
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("subscriber_id", &self.subscriber_id())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
