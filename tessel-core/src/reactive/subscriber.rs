//! Subscriber types for the reactive system.
//!
//! A Subscriber represents any computation that depends on reactive values.
//! In practice these are effects, including the effects that keep derived
//! cells up to date. A Source is the other end of the edge: something a
//! subscriber read from and may later need to unsubscribe from.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a subscriber.
///
/// Each subscriber gets a unique ID when created. Signals key their
/// subscriber sets by this ID, which is what collapses duplicate
/// subscriptions from the same computation into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscriber to reactive values.
///
/// Subscribers are notified synchronously when a cell they read is written.
pub trait Subscriber: Send + Sync {
    /// Get the subscriber's unique ID.
    fn subscriber_id(&self) -> SubscriberId;

    /// Notify the subscriber that one of its dependencies changed.
    fn notify(&self);
}

/// A reactive value that subscribers can depend on.
pub(crate) trait Source: Send + Sync {
    /// Unique identifier of the source.
    fn source_id(&self) -> u64;

    /// Drop the given subscriber from this source's subscriber set.
    fn unsubscribe(&self, subscriber: SubscriberId);
}
