//! Selector - a cached, change-notifying projection of a model.
//!
//! A selector reads from a [`Model`] or from another selector (chaining),
//! projects the value through a pure function, and remembers the last result.
//! When its source changes it recomputes; if the new value is structurally
//! equal to the cached one nothing downstream runs.
//!
//! # Delivery and catch-up
//!
//! Callbacks report whether they actually applied a change. A callback that
//! answers [`Delivery::Deferred`] (for example because its element is
//! off-screen) is marked stale, and the next [`Selector::reselect`] delivers
//! the current value to it even if the projection did not change since.
//!
//! # Isolation
//!
//! A projection error or a callback error is logged and contained: the
//! remaining callbacks and sibling selectors are still notified.
//!
//! # Example
//!
//! ```ignore
//! let model = Model::new(&scheduler);
//! let name = select_key(&model, "name");
//!
//! name.apply(|change| {
//!     println!("name is now {}", change.value);
//!     Ok(Delivery::Applied)
//! }, true);
//!
//! model.set(json!({"name": "Kip"}));
//! scheduler.flush(); // prints: name is now "Kip"
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;

use super::equality::deep_equal;
use super::model::Model;
use crate::error::Result;
use crate::types::member;

// =============================================================================
// Types
// =============================================================================

/// Projection from the source value to the selected value.
pub type Projection = Rc<dyn Fn(&Value) -> Result<Value>>;

/// Equality used to suppress unchanged values.
pub type Equality = fn(&Value, &Value) -> bool;

/// Callback fired when the selected value changes.
pub type ChangeCallback = Rc<dyn Fn(&Change) -> Result<Delivery>>;

/// Why a callback is being invoked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// Immediate run at registration time.
    Initial,
    /// The source changed and the projection produced a different value.
    Update,
    /// A forced re-evaluation.
    Reselect,
}

/// A value change as seen by callbacks.
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
    /// The new selected value.
    pub value: Value,
    /// The previously cached value, if there was one.
    pub old_value: Option<Value>,
    /// What triggered the delivery.
    pub kind: ChangeKind,
}

/// What a callback did with a change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// The change was applied (or deliberately ignored).
    Applied,
    /// The change was skipped and should be re-delivered on the next reselect.
    Deferred,
}

/// Handle for a registered callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

/// Where a selector reads from.
#[derive(Clone)]
pub enum Source {
    /// Read the model value directly.
    Model(Model),
    /// Read another selector's cached value.
    Selector(Selector),
}

impl From<&Model> for Source {
    fn from(model: &Model) -> Self {
        Source::Model(model.clone())
    }
}

impl From<Model> for Source {
    fn from(model: Model) -> Self {
        Source::Model(model)
    }
}

impl From<&Selector> for Source {
    fn from(selector: &Selector) -> Self {
        Source::Selector(selector.clone())
    }
}

impl From<Selector> for Source {
    fn from(selector: Selector) -> Self {
        Source::Selector(selector)
    }
}

// =============================================================================
// Selector
// =============================================================================

struct Registration {
    id: CallbackId,
    callback: ChangeCallback,
    stale: bool,
}

pub(crate) struct SelectorInner {
    source: Source,
    project: Projection,
    equality: Equality,
    data: RefCell<Option<Value>>,
    callbacks: RefCell<Vec<Registration>>,
    next_callback: Cell<u64>,
    dependents: RefCell<Vec<Weak<SelectorInner>>>,
    disposed: Cell<bool>,
}

/// Cloneable handle to a selector. Clones share the cache and callbacks.
#[derive(Clone)]
pub struct Selector {
    inner: Rc<SelectorInner>,
}

/// Create a selector over `source` using structural equality.
pub fn select(
    source: impl Into<Source>,
    project: impl Fn(&Value) -> Result<Value> + 'static,
) -> Selector {
    select_with(source, project, deep_equal)
}

/// Create a selector with a custom equality test.
pub fn select_with(
    source: impl Into<Source>,
    project: impl Fn(&Value) -> Result<Value> + 'static,
    equality: Equality,
) -> Selector {
    let inner = Rc::new(SelectorInner {
        source: source.into(),
        project: Rc::new(project),
        equality,
        data: RefCell::new(None),
        callbacks: RefCell::new(Vec::new()),
        next_callback: Cell::new(0),
        dependents: RefCell::new(Vec::new()),
        disposed: Cell::new(false),
    });
    let weak = Rc::downgrade(&inner);
    match &inner.source {
        Source::Model(model) => model.attach(weak),
        Source::Selector(parent) => parent.inner.dependents.borrow_mut().push(weak),
    }
    Selector { inner }
}

/// Create a selector reading one member (`source[key]`) of its source.
pub fn select_key(source: impl Into<Source>, key: impl Into<String>) -> Selector {
    let key = key.into();
    select(source, move |value| Ok(member(value, &key)))
}

/// Dispose a selector: drop its callbacks and detach it from its source.
pub fn unbind(selector: &Selector) {
    selector.dispose();
}

impl Selector {
    pub(crate) fn from_inner(inner: Rc<SelectorInner>) -> Self {
        Self { inner }
    }

    /// Chain a new selector that reads from this one.
    pub fn select(&self, project: impl Fn(&Value) -> Result<Value> + 'static) -> Selector {
        select(self, project)
    }

    /// Chain a new selector reading one member of this one.
    pub fn select_key(&self, key: impl Into<String>) -> Selector {
        select_key(self, key)
    }

    /// Last computed value, without forcing evaluation.
    pub fn get_data(&self) -> Option<Value> {
        self.inner.data.borrow().clone()
    }

    /// Cached value, or a fresh computation if nothing is cached yet.
    pub fn value(&self) -> Result<Value> {
        if let Some(value) = self.get_data() {
            return Ok(value);
        }
        self.compute(false)
    }

    /// Compute and cache the current value if nothing is cached yet.
    pub(crate) fn prime(&self) {
        if self.get_data().is_some() {
            return;
        }
        match self.compute(false) {
            Ok(value) => *self.inner.data.borrow_mut() = Some(value),
            Err(e) => tracing::warn!(error = %e, "selector projection failed while priming"),
        }
    }

    /// Whether [`Selector::dispose`] has run.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Number of registered callbacks.
    pub fn callback_count(&self) -> usize {
        self.inner.callbacks.borrow().len()
    }

    /// Number of callbacks waiting for catch-up.
    pub fn stale_count(&self) -> usize {
        self.inner.callbacks.borrow().iter().filter(|r| r.stale).count()
    }

    /// Whether two handles refer to the same selector.
    pub fn ptr_eq(&self, other: &Selector) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Register a callback for value changes.
    ///
    /// With `run_immediately`, the callback also runs once right away with the
    /// current value ([`ChangeKind::Initial`]).
    pub fn apply(
        &self,
        callback: impl Fn(&Change) -> Result<Delivery> + 'static,
        run_immediately: bool,
    ) -> CallbackId {
        let id = CallbackId(self.inner.next_callback.get());
        self.inner.next_callback.set(id.0 + 1);

        if self.is_disposed() {
            tracing::trace!("apply on a disposed selector ignored");
            return id;
        }

        let callback: ChangeCallback = Rc::new(callback);
        self.inner.callbacks.borrow_mut().push(Registration {
            id,
            callback: callback.clone(),
            stale: false,
        });

        if run_immediately {
            match self.value() {
                Ok(value) => {
                    {
                        let mut data = self.inner.data.borrow_mut();
                        if data.is_none() {
                            *data = Some(value.clone());
                        }
                    }
                    let change = Change {
                        value,
                        old_value: None,
                        kind: ChangeKind::Initial,
                    };
                    self.deliver(id, &callback, &change);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "selector projection failed on initial run");
                }
            }
        }
        id
    }

    /// Remove one callback. Returns whether it was registered.
    pub fn remove_callback(&self, id: CallbackId) -> bool {
        let mut callbacks = self.inner.callbacks.borrow_mut();
        let before = callbacks.len();
        callbacks.retain(|r| r.id != id);
        callbacks.len() != before
    }

    /// Force re-evaluation from the latest source value.
    ///
    /// If the value changed, every callback is notified. Otherwise only
    /// callbacks whose last delivery was deferred receive the current value.
    pub fn reselect(&self) {
        if self.is_disposed() {
            return;
        }
        let next = match self.compute(true) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "selector projection failed on reselect");
                return;
            }
        };
        let previous = self.get_data();
        let changed = previous
            .as_ref()
            .is_none_or(|prev| !(self.inner.equality)(prev, &next));

        if changed {
            *self.inner.data.borrow_mut() = Some(next.clone());
        }
        let change = Change {
            value: next,
            old_value: previous,
            kind: ChangeKind::Reselect,
        };
        self.notify(&change, !changed);
        if changed {
            self.propagate();
        }
    }

    /// Drop all callbacks and detach from the source. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        self.inner.callbacks.borrow_mut().clear();
        match &self.inner.source {
            Source::Model(model) => model.detach(&self.inner),
            Source::Selector(parent) => {
                let target = Rc::as_ptr(&self.inner);
                parent
                    .inner
                    .dependents
                    .borrow_mut()
                    .retain(|w| w.strong_count() > 0 && !std::ptr::eq(w.as_ptr(), target));
            }
        }
    }

    /// Source notification: recompute, and notify if the value changed.
    pub(crate) fn evaluate(&self) {
        if self.is_disposed() {
            return;
        }
        let next = match self.compute(false) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "selector projection failed; keeping previous value");
                return;
            }
        };
        let previous = self.get_data();
        if let Some(prev) = &previous {
            if (self.inner.equality)(prev, &next) {
                return;
            }
        }
        *self.inner.data.borrow_mut() = Some(next.clone());
        let change = Change {
            value: next,
            old_value: previous,
            kind: ChangeKind::Update,
        };
        self.notify(&change, false);
        self.propagate();
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Read the source value. `fresh` recomputes parent selectors from the
    /// model instead of trusting their caches.
    fn read_source(&self, fresh: bool) -> Result<Value> {
        match &self.inner.source {
            Source::Model(model) => Ok(model.get()),
            Source::Selector(parent) => {
                if !fresh {
                    if let Some(value) = parent.get_data() {
                        return Ok(value);
                    }
                }
                parent.compute(fresh)
            }
        }
    }

    fn compute(&self, fresh: bool) -> Result<Value> {
        let input = self.read_source(fresh)?;
        (self.inner.project)(&input)
    }

    fn notify(&self, change: &Change, only_stale: bool) {
        let targets: Vec<(CallbackId, ChangeCallback)> = self
            .inner
            .callbacks
            .borrow()
            .iter()
            .filter(|r| !only_stale || r.stale)
            .map(|r| (r.id, r.callback.clone()))
            .collect();

        for (id, callback) in targets {
            if self.is_disposed() {
                break;
            }
            // A callback may have been removed by an earlier one in this pass.
            let registered = self.inner.callbacks.borrow().iter().any(|r| r.id == id);
            if registered {
                self.deliver(id, &callback, change);
            }
        }
    }

    fn deliver(&self, id: CallbackId, callback: &ChangeCallback, change: &Change) {
        let outcome = match callback(change) {
            Ok(delivery) => delivery,
            Err(e) => {
                tracing::warn!(error = %e, kind = ?change.kind, "selector callback failed");
                Delivery::Applied
            }
        };
        let mut callbacks = self.inner.callbacks.borrow_mut();
        if let Some(registration) = callbacks.iter_mut().find(|r| r.id == id) {
            registration.stale = outcome == Delivery::Deferred;
        }
    }

    fn propagate(&self) {
        let dependents: Vec<Rc<SelectorInner>> = {
            let mut deps = self.inner.dependents.borrow_mut();
            deps.retain(|w| w.strong_count() > 0);
            deps.iter().filter_map(Weak::upgrade).collect()
        };
        for dependent in dependents {
            Selector::from_inner(dependent).evaluate();
        }
    }
}

impl std::fmt::Debug for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("data", &self.inner.data.borrow())
            .field("callbacks", &self.callback_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
