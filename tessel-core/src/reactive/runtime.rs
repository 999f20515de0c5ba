//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals and effects.
//! It owns the stack of active readers and the configuration that bounds
//! update propagation.
//!
//! # How It Works
//!
//! 1. When an effect runs, it pushes a frame onto its runtime's stack.
//!
//! 2. When a signal is read, the runtime hands it the innermost observer
//!    so the signal can subscribe it, and records the signal on the frame.
//!
//! 3. When the effect finishes, the frame is popped and the effect diffs the
//!    recorded dependencies against its previous run.
//!
//! 4. When a signal is written, it notifies its subscribers directly and
//!    synchronously. There is no queue and no batching.
//!
//! # Isolation
//!
//! There is no process-wide state: every runtime has its own stack, so
//! independent render roots (and tests) never observe each other's reads.
//! Handles are `Send + Sync`, but a runtime is driven by one thread at a
//! time: writes and effect runs take a re-entrant drive lock.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, ReentrantMutex, ReentrantMutexGuard};

use super::context::{Frame, ReactiveContext};
use super::effect::Effect;
use super::signal::Signal;
use super::subscriber::{Source, Subscriber, SubscriberId};
use crate::config::ReactiveConfig;

/// Handle to a reactive runtime. Clones share the same runtime.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

struct RuntimeInner {
    config: ReactiveConfig,
    stack: Mutex<Vec<Frame>>,
    drive: ReentrantMutex<()>,
}

impl Runtime {
    /// Create a runtime with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ReactiveConfig::default())
    }

    /// Create a runtime with the given configuration.
    pub fn with_config(config: ReactiveConfig) -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                config,
                stack: Mutex::new(Vec::new()),
                drive: ReentrantMutex::new(()),
            }),
        }
    }

    /// The configuration this runtime was created with.
    pub fn config(&self) -> &ReactiveConfig {
        &self.inner.config
    }

    /// Create a signal owned by this runtime.
    pub fn signal<T>(&self, value: T) -> Signal<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        Signal::new(self, value)
    }

    /// Create and immediately run an effect.
    pub fn effect<F>(&self, run: F) -> Effect
    where
        F: Fn() + Send + Sync + 'static,
    {
        Effect::new(self, run)
    }

    /// Run `f` without subscribing the current observer to anything it reads.
    pub fn untrack<R>(&self, f: impl FnOnce() -> R) -> R {
        let ctx = ReactiveContext::enter(self, None);
        let result = f();
        ctx.finish();
        result
    }

    /// Get the current subscriber being tracked, if any.
    pub fn current_subscriber(&self) -> Option<SubscriberId> {
        self.frames().last().and_then(Frame::subscriber_id)
    }

    /// Check if a read right now would subscribe someone.
    pub fn is_tracking(&self) -> bool {
        self.current_subscriber().is_some()
    }

    /// Number of frames on the reader stack.
    pub fn depth(&self) -> usize {
        self.frames().len()
    }

    /// Check whether two handles refer to the same runtime.
    pub fn ptr_eq(&self, other: &Runtime) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn frames(&self) -> MutexGuard<'_, Vec<Frame>> {
        self.inner.stack.lock()
    }

    pub(crate) fn drive(&self) -> ReentrantMutexGuard<'_, ()> {
        self.inner.drive.lock()
    }

    /// Record a read of `source` on the innermost frame.
    ///
    /// Returns the observer the source must subscribe, or `None` when the
    /// read is untracked.
    pub(crate) fn track<F>(&self, source: F) -> Option<Arc<dyn Subscriber>>
    where
        F: FnOnce() -> Arc<dyn Source>,
    {
        let mut frames = self.frames();
        let frame = frames.last_mut()?;
        let observer = frame.observer.clone()?;
        let source = source();
        frame
            .dependencies
            .entry(source.source_id())
            .or_insert(source);
        Some(observer)
    }

    /// Check whether an effect created now would be owned by a running effect.
    pub(crate) fn has_owner(&self) -> bool {
        self.frames().iter().any(|frame| frame.observer.is_some())
    }

    /// Hand `effect` to the innermost running effect as a child.
    ///
    /// Returns false when no effect is running; the effect is then a root
    /// and lives until disposed explicitly.
    pub(crate) fn adopt(&self, effect: &Effect) -> bool {
        let mut frames = self.frames();
        match frames.iter_mut().rev().find(|frame| frame.observer.is_some()) {
            Some(frame) => {
                frame.children.push(effect.clone());
                true
            }
            None => false,
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("depth", &self.depth())
            .field("config", &self.inner.config)
            .finish()
    }
}
