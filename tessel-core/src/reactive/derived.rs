//! Derived Cells
//!
//! A derived cell is a signal whose value is written by an effect. The
//! effect reads the source signals, computes the result and stores it in the
//! derived signal, so the derived value is both:
//!
//! - a subscriber of its sources (it recomputes eagerly on every source
//!   write), and
//! - a source for downstream readers (writing it notifies them).
//!
//! Unlike a lazily cached memo there is no dirty state: after any source
//! write returns, reading the derived cell yields the recomputed value.

use std::sync::{Arc, OnceLock};

use super::runtime::Runtime;
use super::signal::Signal;

impl Runtime {
    /// Create a signal kept equal to `compute()` over the signals it reads.
    ///
    /// The computation runs once immediately to seed the value and establish
    /// dependencies. When called inside a running effect, the computing
    /// effect is owned by that effect like any other child.
    pub fn derive<T, F>(&self, compute: F) -> Signal<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let compute = Arc::new(compute);
        let slot: Arc<OnceLock<Signal<T>>> = Arc::new(OnceLock::new());

        let (target, run) = (Arc::clone(&slot), Arc::clone(&compute));
        let runtime = self.clone();
        self.effect(move || {
            let value = run();
            match target.get() {
                Some(cell) => cell.set(value),
                None => {
                    let _ = target.set(Signal::new(&runtime, value));
                }
            }
        });

        // Seeded by the first run unless that run was skipped.
        slot.get_or_init(|| Signal::new(self, self.untrack(|| compute())))
            .clone()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
