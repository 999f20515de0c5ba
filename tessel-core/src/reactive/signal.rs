//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which computations depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read while an effect runs, the signal adds that
//!    effect to its subscriber set. The set is insertion-ordered and keyed by
//!    subscriber ID, so reading twice from one run subscribes once.
//!
//! 2. When a signal is written, the new value is stored and every subscriber
//!    is invoked synchronously, in subscription order, before the write
//!    returns. Subscribers stay registered for later writes.
//!
//! 3. A write that happens while the same signal is still notifying (a
//!    subscriber writing back into the cell it reacts to) is stored at once
//!    but its notification is coalesced into one more pass that starts after
//!    the current pass finishes. Passes are capped by
//!    [`ReactiveConfig::max_notify_passes`](crate::config::ReactiveConfig).
//!
//! # Memory Layout
//!
//! Each signal consists of:
//! - A unique ID (8 bytes)
//! - The value, behind a `parking_lot::RwLock`
//! - An ordered map of subscribers (grows with number of dependents)

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::{error, trace};

use super::runtime::Runtime;
use super::subscriber::{Source, Subscriber, SubscriberId};

/// Counter for generating unique signal IDs.
static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique signal ID.
fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A write to a signal.
///
/// Storing a value and applying an updater are distinct variants, so a value
/// that happens to be callable is never mistaken for an updater.
pub enum Write<T> {
    /// Replace the value.
    Value(T),
    /// Compute the new value from the old one.
    Update(Box<dyn FnOnce(&T) -> T + Send>),
}

impl<T> Write<T> {
    /// Wrap an updater function.
    pub fn update<F>(f: F) -> Self
    where
        F: FnOnce(&T) -> T + Send + 'static,
    {
        Write::Update(Box::new(f))
    }
}

impl<T> From<T> for Write<T> {
    fn from(value: T) -> Self {
        Write::Value(value)
    }
}

/// A reactive signal holding a value of type T.
///
/// # Type Parameters
///
/// - `T`: The type of value stored in the signal. Must be Clone + Send + Sync.
///
/// # Example
///
/// ```rust,ignore
/// let runtime = Runtime::new();
/// let count = runtime.signal(0);
///
/// // Read the value
/// let value = count.get();
///
/// // Update the value (notifies subscribers)
/// count.set(5);
/// count.update(|n| n + 1);
/// ```
pub struct Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<SignalInner<T>>,
}

struct SignalInner<T> {
    /// Unique identifier for this signal.
    id: u64,

    runtime: Runtime,

    value: RwLock<T>,

    /// Subscribers in the order they first read this signal.
    subscribers: Mutex<IndexMap<SubscriberId, Arc<dyn Subscriber>>>,

    /// Set while a notification pass is running.
    notifying: AtomicBool,

    /// Set when a write arrives during a notification pass.
    pending: AtomicBool,
}

impl<T> Source for SignalInner<T>
where
    T: Send + Sync,
{
    fn source_id(&self) -> u64 {
        self.id
    }

    fn unsubscribe(&self, subscriber: SubscriberId) {
        self.subscribers.lock().shift_remove(&subscriber);
    }
}

/// Clears the notifying flag even if a subscriber panics.
struct NotifyGuard<'a>(&'a AtomicBool);

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(runtime: &Runtime, value: T) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                id: next_signal_id(),
                runtime: runtime.clone(),
                value: RwLock::new(value),
                subscribers: Mutex::new(IndexMap::new()),
                notifying: AtomicBool::new(false),
                pending: AtomicBool::new(false),
            }),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The runtime this signal belongs to.
    pub fn runtime(&self) -> &Runtime {
        &self.inner.runtime
    }

    /// Get the current value.
    ///
    /// If called while an effect runs, this also subscribes that effect.
    pub fn get(&self) -> T {
        self.track();
        self.inner.value.read().clone()
    }

    /// Borrow the current value, subscribing like [`get`](Self::get).
    ///
    /// `f` sees a snapshot taken before it runs, so it may write to this
    /// signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.get();
        f(&value)
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Set a new value and notify subscribers.
    pub fn set(&self, value: T) {
        self.write(Write::Value(value));
    }

    /// Update the value using a function of the old value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let current = self.get_untracked();
        self.set(f(&current));
    }

    /// Apply a write and notify subscribers.
    pub fn write(&self, write: Write<T>) {
        let runtime = self.inner.runtime.clone();
        let _drive = runtime.drive();

        let next = match write {
            Write::Value(value) => value,
            // No lock is held while the updater runs.
            Write::Update(f) => f(&self.get_untracked()),
        };
        *self.inner.value.write() = next;

        self.notify_subscribers();
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Check whether two handles refer to the same signal.
    pub fn ptr_eq(&self, other: &Signal<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn track(&self) {
        let inner = &self.inner;
        let observer = inner
            .runtime
            .track(|| Arc::clone(inner) as Arc<dyn Source>);

        if let Some(observer) = observer {
            inner
                .subscribers
                .lock()
                .entry(observer.subscriber_id())
                .or_insert(observer);
        }
    }

    /// Notify all subscribers that the value has changed.
    fn notify_subscribers(&self) {
        let inner = &self.inner;
        if inner.notifying.swap(true, Ordering::SeqCst) {
            inner.pending.store(true, Ordering::SeqCst);
            trace!(signal = inner.id, "coalescing re-entrant write");
            return;
        }
        let _guard = NotifyGuard(&inner.notifying);

        let max_passes = inner.runtime.config().max_notify_passes.max(1);
        let mut passes = 0;
        loop {
            passes += 1;

            // Snapshot so subscribers can (un)subscribe while we iterate.
            let subscribers: Vec<Arc<dyn Subscriber>> =
                inner.subscribers.lock().values().cloned().collect();
            trace!(
                signal = inner.id,
                pass = passes,
                subscribers = subscribers.len(),
                "notifying"
            );
            for subscriber in &subscribers {
                subscriber.notify();
            }

            if !inner.pending.swap(false, Ordering::SeqCst) {
                break;
            }
            if passes >= max_passes {
                error!(
                    signal = inner.id,
                    passes, "write cycle detected, dropping further notifications"
                );
                break;
            }
        }
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.read())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
