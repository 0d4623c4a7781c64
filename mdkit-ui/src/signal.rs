//! Synchronous, single-threaded event dispatch.
//!
//! A [`Signal`] holds a set of callbacks keyed by [`ObserverId`]. Emitting
//! snapshots the callback list before calling anything, so callbacks may
//! connect, disconnect or emit re-entrantly.

use std::{cell::RefCell, fmt, rc::Rc};

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Identifies one connected callback. Returned by `connect`/`bind` and
    /// used to disconnect.
    pub struct ObserverId;
}

type Slot<A> = Rc<dyn Fn(&A)>;

/// A list of callbacks invoked with `&A` on every emit.
pub struct Signal<A: ?Sized> {
    slots: Rc<RefCell<SlotMap<ObserverId, Slot<A>>>>,
}

impl<A: ?Sized> Clone for Signal<A> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<A: ?Sized> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("observers", &self.slots.borrow().len())
            .finish()
    }
}

impl<A: ?Sized + 'static> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized + 'static> Signal<A> {
    /// Creates a signal with no observers.
    pub fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(SlotMap::with_key())),
        }
    }

    /// Connects a callback.
    pub fn connect(&self, callback: impl Fn(&A) + 'static) -> ObserverId {
        self.slots.borrow_mut().insert(Rc::new(callback))
    }

    /// Disconnects a callback; returns `false` if it was already gone.
    pub fn disconnect(&self, id: ObserverId) -> bool {
        self.slots.borrow_mut().remove(id).is_some()
    }

    /// Number of connected callbacks.
    pub fn observer_count(&self) -> usize {
        self.slots.borrow().len()
    }

    /// Whether `id` is still connected.
    pub fn is_connected(&self, id: ObserverId) -> bool {
        self.slots.borrow().contains_key(id)
    }

    /// Calls every connected callback with `args`.
    pub fn emit(&self, args: &A) {
        let snapshot: Vec<(ObserverId, Slot<A>)> = self
            .slots
            .borrow()
            .iter()
            .map(|(id, slot)| (id, slot.clone()))
            .collect();
        for (id, slot) in snapshot {
            // Skip callbacks disconnected by an earlier callback of this emit.
            if self.slots.borrow().contains_key(id) {
                slot(args);
            }
        }
    }

    /// Disconnects everything.
    pub fn clear(&self) {
        self.slots.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn emit_reaches_all_observers() {
        let signal: Signal<u32> = Signal::new();
        let total = Rc::new(Cell::new(0));
        for _ in 0..3 {
            let total = total.clone();
            signal.connect(move |v| total.set(total.get() + *v));
        }
        signal.emit(&2);
        assert_eq!(total.get(), 6);
    }

    #[test]
    fn disconnect_during_emit_skips_removed() {
        let signal: Signal<()> = Signal::new();
        let calls = Rc::new(Cell::new(0));
        let second: Rc<Cell<Option<ObserverId>>> = Rc::new(Cell::new(None));

        let sig = signal.clone();
        let second_ref = second.clone();
        let calls_a = calls.clone();
        signal.connect(move |_| {
            calls_a.set(calls_a.get() + 1);
            if let Some(id) = second_ref.get() {
                sig.disconnect(id);
            }
        });
        let calls_b = calls.clone();
        second.set(Some(signal.connect(move |_| calls_b.set(calls_b.get() + 10))));

        signal.emit(&());
        assert_eq!(calls.get(), 1);
        assert_eq!(signal.observer_count(), 1);
    }
}
