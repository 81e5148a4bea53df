//! Model - the single owned value a view renders from.
//!
//! A model is replaced wholesale, never patched. Every `set` is a new
//! snapshot; dependent selectors are notified on the next scheduler flush, and
//! several sets within one turn coalesce into a single notification carrying
//! the final value.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;

use super::scheduler::Scheduler;
use super::selector::{Selector, SelectorInner};

struct ModelInner {
    value: RefCell<Value>,
    version: Cell<u64>,
    scheduler: Scheduler,
    notify_queued: Cell<bool>,
    dependents: RefCell<Vec<Weak<SelectorInner>>>,
}

/// Cloneable handle to a model value.
///
/// Clones share the value. A view creates one model and never hands it out,
/// so all outside influence goes through the view's model setter.
#[derive(Clone)]
pub struct Model {
    inner: Rc<ModelInner>,
}

impl Model {
    /// Create an empty (`null`) model.
    pub fn new(scheduler: &Scheduler) -> Self {
        Self::with_value(scheduler, Value::Null)
    }

    /// Create a model holding `value`. No notification is scheduled.
    pub fn with_value(scheduler: &Scheduler, value: Value) -> Self {
        Self {
            inner: Rc::new(ModelInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                scheduler: scheduler.clone(),
                notify_queued: Cell::new(false),
                dependents: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Current value (cloned).
    pub fn get(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    /// Read the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value and schedule notification of dependent selectors.
    pub fn set(&self, value: Value) {
        *self.inner.value.borrow_mut() = value;
        self.inner.version.set(self.inner.version.get() + 1);
        self.schedule_notify();
    }

    /// Alias of [`Model::set`].
    pub fn import(&self, value: Value) {
        self.set(value);
    }

    /// Number of replacements so far.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Number of live selectors reading directly from this model.
    pub fn dependent_count(&self) -> usize {
        self.inner
            .dependents
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    fn schedule_notify(&self) {
        if self.inner.notify_queued.replace(true) {
            return;
        }
        let weak = Rc::downgrade(&self.inner);
        self.inner.scheduler.queue_microtask(move || {
            if let Some(inner) = weak.upgrade() {
                inner.notify_queued.set(false);
                Model { inner }.notify();
            }
        });
    }

    /// Evaluate every live dependent selector against the current value.
    pub(crate) fn notify(&self) {
        let dependents: Vec<Rc<SelectorInner>> = {
            let mut deps = self.inner.dependents.borrow_mut();
            deps.retain(|w| w.strong_count() > 0);
            deps.iter().filter_map(Weak::upgrade).collect()
        };
        tracing::trace!(
            version = self.version(),
            selectors = dependents.len(),
            "model notifying"
        );
        for dependent in dependents {
            Selector::from_inner(dependent).evaluate();
        }
    }

    pub(crate) fn attach(&self, dependent: Weak<SelectorInner>) {
        self.inner.dependents.borrow_mut().push(dependent);
    }

    pub(crate) fn detach(&self, dependent: &Rc<SelectorInner>) {
        let target = Rc::as_ptr(dependent);
        self.inner
            .dependents
            .borrow_mut()
            .retain(|w| w.strong_count() > 0 && !std::ptr::eq(w.as_ptr(), target));
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.version())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Delivery, select};
    use serde_json::json;

    #[test]
    fn test_set_replaces_value() {
        let scheduler = Scheduler::new();
        let model = Model::new(&scheduler);
        assert_eq!(model.get(), Value::Null);

        model.set(json!({"name": "Kip"}));
        assert_eq!(model.get(), json!({"name": "Kip"}));
        assert_eq!(model.version(), 1);

        model.import(json!([1, 2]));
        assert_eq!(model.get(), json!([1, 2]));
        assert_eq!(model.version(), 2);
    }

    #[test]
    fn test_notification_is_deferred_and_coalesced() {
        let scheduler = Scheduler::new();
        let model = Model::new(&scheduler);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let selector = select(&model, |v| Ok(v.clone()));
        let seen_clone = seen.clone();
        selector.apply(
            move |change| {
                seen_clone.borrow_mut().push(change.value.clone());
                Ok(Delivery::Applied)
            },
            false,
        );

        model.set(json!(1));
        model.set(json!(2));
        model.set(json!(3));
        assert!(seen.borrow().is_empty(), "set must not notify synchronously");
        assert_eq!(scheduler.pending_microtasks(), 1, "sets coalesce");

        scheduler.flush();
        assert_eq!(*seen.borrow(), vec![json!(3)]);
    }

    #[test]
    fn test_dropped_selectors_are_pruned() {
        let scheduler = Scheduler::new();
        let model = Model::new(&scheduler);

        let keep = select(&model, |v| Ok(v.clone()));
        {
            let _dropped = select(&model, |v| Ok(v.clone()));
            assert_eq!(model.dependent_count(), 2);
        }
        assert_eq!(model.dependent_count(), 1);

        keep.dispose();
        assert_eq!(model.dependent_count(), 0);
    }
}
