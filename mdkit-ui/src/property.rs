//! Observable per-instance properties.
//!
//! A [`Property`] is a shared cell plus a [`Signal`] fired after the value
//! changes. Setting an equal value is a no-op, which is what stops observer
//! cascades (a color recompute that lands on the same color does not wake the
//! widgets bound to it).
//!
//! ```
//! use std::{cell::Cell, rc::Rc};
//!
//! use mdkit_ui::Property;
//!
//! let opacity = Property::new("opacity", 1.0_f32);
//! let seen = Rc::new(Cell::new(0.0));
//! let seen_in = seen.clone();
//! opacity.bind(move |v| seen_in.set(*v));
//! opacity.set(0.5);
//! assert_eq!(seen.get(), 0.5);
//! ```

use std::{cell::RefCell, fmt, rc::Rc};

use crate::signal::{ObserverId, Signal};

struct PropertyInner<T> {
    name: &'static str,
    value: RefCell<T>,
    changed: Signal<T>,
}

/// A named observable value. Cloning yields another handle to the same cell.
pub struct Property<T> {
    inner: Rc<PropertyInner<T>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.inner.name)
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Property<T> {
    /// Creates a property with an initial value.
    pub fn new(name: &'static str, value: T) -> Self {
        Self {
            inner: Rc::new(PropertyInner {
                name,
                value: RefCell::new(value),
                changed: Signal::new(),
            }),
        }
    }

    /// Property name, used for introspection and logging.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Returns a clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Reads the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Stores `value` and notifies observers if it differs from the current
    /// one. Returns whether observers were notified.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        self.dispatch();
        true
    }

    /// Stores `value` and notifies observers unconditionally.
    pub fn set_force(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.dispatch();
    }

    /// Stores `value` without notifying anyone.
    pub fn set_silent(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
    }

    /// Mutates the value in place and notifies if it changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    /// Notifies observers with the current value.
    pub fn dispatch(&self) {
        let value = self.get();
        self.inner.changed.emit(&value);
    }

    /// Registers an observer called after every change.
    pub fn bind(&self, callback: impl Fn(&T) + 'static) -> ObserverId {
        self.inner.changed.connect(callback)
    }

    /// Removes an observer registered with [`Property::bind`].
    pub fn unbind(&self, id: ObserverId) -> bool {
        self.inner.changed.disconnect(id)
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.inner.changed.observer_count()
    }

    /// Whether two handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn equal_value_does_not_notify() {
        let prop = Property::new("p", 3);
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        prop.bind(move |_| h.set(h.get() + 1));
        assert!(!prop.set(3));
        assert!(prop.set(4));
        prop.set_force(4);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn observer_may_set_another_property() {
        let a = Property::new("a", 0);
        let b = Property::new("b", 0);
        let b_in = b.clone();
        a.bind(move |v| {
            b_in.set(*v * 2);
        });
        a.set(21);
        assert_eq!(b.get(), 42);
    }

    #[test]
    fn unbind_stops_notifications() {
        let prop = Property::new("p", false);
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = prop.bind(move |_| h.set(h.get() + 1));
        assert_eq!(prop.observer_count(), 1);
        assert!(prop.unbind(id));
        assert!(!prop.unbind(id));
        prop.set(true);
        assert_eq!(hits.get(), 0);
        assert_eq!(prop.observer_count(), 0);
    }
}
