//! Bound View - a drawable whose elements follow its model.
//!
//! A view owns one [`Model`]. Its element tree is built by the construction
//! engine with the view as the recursion hook, so every definition carrying a
//! `bind_to` gets a selector over the model and a callback that pushes the
//! selected value into the element.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──► Bound ──set_model()──► Notifying ──► Bound ──► ... ──erase()──► Erased
//! ```
//!
//! - `set_model` replaces the value wholesale; bindings update on the next
//!   scheduler flush, and only bindings whose selected value changed run.
//! - `draw` schedules a reselect sweep for the next paint so bindings skipped
//!   while hidden catch up.
//! - `erase` disposes every selector before the nodes go away. Callbacks hold
//!   the binder weakly and check the erased flag, so nothing runs afterwards.
//!
//! # Example
//!
//! ```ignore
//! let view = BoundView::new(&rt, |_| {
//!     ElementDefinition::new("div").children([
//!         ElementDefinition::new("span").key("name").bind_to("name"),
//!         ElementDefinition::new("span").key("count").bind_to("count"),
//!     ])
//! })?;
//!
//! view.set_update_function("count", Some(update_fn(|value, elem| {
//!     rt.document().set_text(elem.base(), &format!("Total: {value}"));
//!     Ok(())
//! })));
//!
//! view.draw(rt.document().body(), false)?;
//! view.set_model(json!({"name": "Kip", "count": 0}));
//! rt.settle();
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde_json::Value;

use super::binding::{resolve, Binding, BindingUpdate, UpdateFn};
use super::update::update_elem;
use crate::dom::{Document, NodeId};
use crate::drawable::{Component, Drawable, DrawableBase};
use crate::engine::{
    create_element_with, BuildContext, DrawableSource, Element, ElementDefinition, Recurse,
};
use crate::error::{Error, Result};
use crate::reactive::{select, CallbackId, Delivery, Model, Selector};
use crate::runtime::Runtime;
use crate::types::entries;

// =============================================================================
// Options
// =============================================================================

/// When a binding delivery is held back.
///
/// A skipped delivery is remembered and applied by the next reselect sweep
/// (after the view is drawn), provided the policy no longer skips it.
#[derive(Clone, Default)]
pub enum SkipPolicy {
    /// Always deliver.
    #[default]
    Never,
    /// Skip while the target node is not visible.
    WhenHidden,
    /// Skip when the predicate returns true for the target.
    Custom(Rc<dyn Fn(&Document, &Element) -> bool>),
}

impl SkipPolicy {
    /// A [`SkipPolicy::Custom`] from a closure.
    pub fn custom(f: impl Fn(&Document, &Element) -> bool + 'static) -> Self {
        SkipPolicy::Custom(Rc::new(f))
    }

    /// Skip every delivery.
    pub fn always() -> Self {
        Self::custom(|_, _| true)
    }

    fn should_skip(&self, doc: &Document, target: &Element) -> bool {
        match self {
            SkipPolicy::Never => false,
            SkipPolicy::WhenHidden => !doc.is_visible(target.base()),
            SkipPolicy::Custom(f) => f(doc, target),
        }
    }
}

impl std::fmt::Debug for SkipPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipPolicy::Never => f.write_str("Never"),
            SkipPolicy::WhenHidden => f.write_str("WhenHidden"),
            SkipPolicy::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Construction options for a view.
#[derive(Clone, Debug, Default)]
pub struct ViewOptions {
    skip: Option<SkipPolicy>,
    model: Option<Value>,
    legacy_bound_to: bool,
}

impl ViewOptions {
    /// Options with no skip policy, a `null` model and no legacy alias.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip policy. Without one, the runtime config decides between
    /// [`SkipPolicy::Never`] and [`SkipPolicy::WhenHidden`].
    pub fn skip(mut self, policy: SkipPolicy) -> Self {
        self.skip = Some(policy);
        self
    }

    /// Initial model value (default `null`).
    pub fn model(mut self, value: Value) -> Self {
        self.model = Some(value);
        self
    }

    /// Treat `bound_to` as `bind_to` on definitions that lack the latter.
    pub(crate) fn legacy_bound_to(mut self) -> Self {
        self.legacy_bound_to = true;
        self
    }
}

/// Where a view is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewState {
    /// Bindings registered, idle.
    Bound,
    /// A binding delivery is running.
    Notifying,
    /// Terminal; all selectors disposed.
    Erased,
}

// =============================================================================
// Binder - the shared binding core
// =============================================================================

/// Children one map binding materialized under its target node.
struct MappedChildren {
    key: String,
    target: NodeId,
    children: Vec<Component>,
}

/// State binding callbacks need. Callbacks hold it weakly.
pub(crate) struct Binder {
    rt: Runtime,
    model: Model,
    root: Selector,
    selectors: RefCell<Vec<Selector>>,
    update_functions: RefCell<HashMap<String, UpdateFn>>,
    bound_children: RefCell<Vec<MappedChildren>>,
    skip: SkipPolicy,
    erased: Cell<bool>,
    delivering: Cell<usize>,
}

impl Binder {
    fn new(rt: &Runtime, options: &ViewOptions) -> Rc<Self> {
        let model = rt.create_model(options.model.clone().unwrap_or(Value::Null));
        let root = select(&model, |v| Ok(v.clone()));
        root.prime();

        let skip = options.skip.clone().unwrap_or_else(|| {
            if rt.config().skip_hidden_updates {
                SkipPolicy::WhenHidden
            } else {
                SkipPolicy::Never
            }
        });

        Rc::new(Self {
            rt: rt.clone(),
            model,
            root,
            selectors: RefCell::new(Vec::new()),
            update_functions: RefCell::new(HashMap::new()),
            bound_children: RefCell::new(Vec::new()),
            skip,
            erased: Cell::new(false),
            delivering: Cell::new(0),
        })
    }

    /// A selector chained off the whole model, owned by this view.
    fn own_selector(&self, project: impl Fn(&Value) -> Result<Value> + 'static) -> Selector {
        let selector = self.root.select(project);
        self.selectors.borrow_mut().push(selector.clone());
        selector
    }

    /// Register one binding and run it once against the current model.
    fn bind(self: &Rc<Self>, binding: Binding, target: Element) {
        let key = binding.registry_key().to_string();
        tracing::debug!(key = %key, "binding registered");

        let selector = self.root.select(binding.projection());
        let weak: Weak<Binder> = Rc::downgrade(self);
        let update = binding.update;
        selector.apply(
            move |change| match weak.upgrade() {
                Some(binder) => binder.deliver(&key, &update, &change.value, &target),
                None => Ok(Delivery::Applied),
            },
            true,
        );
        self.selectors.borrow_mut().push(selector);
    }

    fn deliver(
        &self,
        key: &str,
        update: &BindingUpdate,
        value: &Value,
        target: &Element,
    ) -> Result<Delivery> {
        if self.erased.get() {
            return Ok(Delivery::Applied);
        }
        let doc = self.rt.document();
        if self.skip.should_skip(doc, target) {
            tracing::trace!(key, "binding update skipped");
            return Ok(Delivery::Deferred);
        }
        if value.is_null() {
            return Ok(Delivery::Applied);
        }

        self.delivering.set(self.delivering.get() + 1);
        let result = match update {
            BindingUpdate::Default => {
                let custom = self.update_functions.borrow().get(key).cloned();
                match custom {
                    Some(func) => func(value, target),
                    None => update_elem(doc, value, target),
                }
            }
            BindingUpdate::Explicit(func) => func(value, target),
            BindingUpdate::Map(source) => self.map_children(key, source, value, target),
        };
        self.delivering.set(self.delivering.get() - 1);

        result.map(|()| Delivery::Applied)
    }

    /// Replace the children the binding on `key` materialized under
    /// `target` with one per entry of `value`.
    fn map_children(
        &self,
        key: &str,
        source: &DrawableSource,
        value: &Value,
        target: &Element,
    ) -> Result<()> {
        let doc = self.rt.document();
        let parent = target.base();
        for child in self.take_mapped(key, parent) {
            child.release(doc);
        }

        let Some(items) = entries(value) else {
            tracing::debug!(key, "mapped value is not a collection; no children");
            return Ok(());
        };

        let mut created: Vec<Component> = Vec::with_capacity(items.len());
        for (_, item) in items {
            match self.materialize_child(source, item, parent) {
                Ok(child) => created.push(child),
                Err(e) => {
                    for child in &created {
                        child.release(doc);
                    }
                    return Err(e);
                }
            }
        }

        tracing::debug!(key, count = created.len(), "mapped children materialized");
        self.store_mapped(key, parent, created);
        Ok(())
    }

    /// Take the children of the `(key, target)` slot, leaving it empty.
    fn take_mapped(&self, key: &str, target: NodeId) -> Vec<Component> {
        self.bound_children
            .borrow_mut()
            .iter_mut()
            .find(|slot| slot.target == target && slot.key == key)
            .map(|slot| std::mem::take(&mut slot.children))
            .unwrap_or_default()
    }

    fn store_mapped(&self, key: &str, target: NodeId, children: Vec<Component>) {
        let mut slots = self.bound_children.borrow_mut();
        match slots
            .iter_mut()
            .find(|slot| slot.target == target && slot.key == key)
        {
            Some(slot) => slot.children = children,
            None => slots.push(MappedChildren {
                key: key.to_string(),
                target,
                children,
            }),
        }
    }

    fn materialize_child(
        &self,
        source: &DrawableSource,
        item: &Value,
        parent: NodeId,
    ) -> Result<Component> {
        let child = source.materialize(&self.rt)?;
        let seeded = update_elem(self.rt.document(), item, &Element::from(child.clone()))
            .and_then(|()| child.draw(parent, false));
        match seeded {
            Ok(()) => Ok(child),
            Err(e) => {
                child.release(self.rt.document());
                Err(e)
            }
        }
    }

    /// Dispose every selector and release every mapped child.
    fn dispose(&self) {
        self.erased.set(true);
        for selector in self.selectors.borrow_mut().drain(..) {
            selector.dispose();
        }
        self.root.dispose();
        let children: Vec<Component> = self
            .bound_children
            .borrow_mut()
            .drain(..)
            .flat_map(|slot| slot.children)
            .collect();
        let doc = self.rt.document();
        for child in children {
            child.release(doc);
        }
    }
}

// =============================================================================
// Construction scope and recursion
// =============================================================================

/// Handed to the build closure of a view.
pub struct ViewScope<'a> {
    binder: &'a Rc<Binder>,
}

impl ViewScope<'_> {
    pub fn runtime(&self) -> &Runtime {
        &self.binder.rt
    }

    /// Selector over the whole model.
    pub fn model(&self) -> Selector {
        self.binder.root.clone()
    }

    /// A selector over the model, disposed when the view is erased. Use it
    /// for reactive attributes, classes or styles that are not bindings.
    pub fn select(&self, project: impl Fn(&Value) -> Result<Value> + 'static) -> Selector {
        self.binder.own_selector(project)
    }

    /// A selector for one model key, disposed when the view is erased.
    pub fn select_key(&self, key: impl Into<String>) -> Selector {
        let key = key.into();
        self.binder
            .own_selector(move |v| Ok(crate::types::member(v, &key)))
    }
}

struct ViewRecurse<'a> {
    binder: &'a Rc<Binder>,
    legacy_bound_to: bool,
}

impl Recurse for ViewRecurse<'_> {
    fn create(&self, ctx: &mut BuildContext, mut def: ElementDefinition) -> Result<Element> {
        if self.legacy_bound_to && def.bind_to.is_none() {
            def.bind_to = def.bound_to.take();
        } else if def.bound_to.is_some() {
            tracing::trace!(element = %def.label(), "bound_to ignored");
        }

        // Resolve before building so a malformed declaration fails fast.
        let binding = match def.bind_to.take() {
            Some(bind_to) => Some(resolve(bind_to, &def.label())?),
            None => None,
        };

        let element = create_element_with(ctx, def, self)?;
        if let Some(binding) = binding {
            self.binder.bind(binding, element.clone());
        }
        Ok(element)
    }
}

// =============================================================================
// BoundView
// =============================================================================

struct ViewInner {
    binder: Rc<Binder>,
    base: DrawableBase,
    elems: HashMap<String, Element>,
    subscriptions: RefCell<Vec<(Selector, CallbackId)>>,
    owned: RefCell<Vec<Component>>,
}

/// Cloneable handle to a bound view. Clones are the same view.
#[derive(Clone)]
pub struct BoundView {
    inner: Rc<ViewInner>,
}

impl BoundView {
    /// Build a view whose element tree is returned by `build`.
    pub fn new(
        rt: &Runtime,
        build: impl FnOnce(&ViewScope<'_>) -> ElementDefinition,
    ) -> Result<Self> {
        Self::with_options(rt, ViewOptions::default(), build)
    }

    /// Build a view with explicit options.
    ///
    /// On error nothing is left behind: created nodes are released and every
    /// selector is disposed.
    pub fn with_options(
        rt: &Runtime,
        options: ViewOptions,
        build: impl FnOnce(&ViewScope<'_>) -> ElementDefinition,
    ) -> Result<Self> {
        let binder = Binder::new(rt, &options);
        let definition = build(&ViewScope { binder: &binder });

        let mut ctx = BuildContext::new(rt);
        let recurse = ViewRecurse {
            binder: &binder,
            legacy_bound_to: options.legacy_bound_to,
        };
        let root = match recurse.create(&mut ctx, definition) {
            Ok(root) => root,
            Err(e) => {
                tracing::debug!(error = %e, "view construction failed; rolling back");
                binder.dispose();
                ctx.abandon();
                return Err(e);
            }
        };

        let parts = ctx.into_parts();
        Ok(Self {
            inner: Rc::new(ViewInner {
                base: DrawableBase::new(rt.document(), root.base()),
                binder,
                elems: parts.keyed,
                subscriptions: RefCell::new(parts.subscriptions),
                owned: RefCell::new(parts.components),
            }),
        })
    }

    pub fn runtime(&self) -> &Runtime {
        &self.inner.binder.rt
    }

    /// Current model value.
    pub fn model(&self) -> Value {
        self.inner.binder.model.get()
    }

    /// Replace the model. Bindings update on the next flush.
    pub fn set_model(&self, value: Value) {
        if self.is_erased() {
            tracing::trace!("set_model on an erased view ignored");
            return;
        }
        self.inner.binder.model.set(value);
    }

    pub fn update_functions(&self) -> HashMap<String, UpdateFn> {
        self.inner.binder.update_functions.borrow().clone()
    }

    pub fn set_update_functions(&self, functions: HashMap<String, UpdateFn>) {
        *self.inner.binder.update_functions.borrow_mut() = functions;
    }

    /// Override the default update for bindings on `key`. `None` is a no-op.
    pub fn set_update_function(&self, key: impl Into<String>, func: Option<UpdateFn>) {
        if let Some(func) = func {
            self.inner
                .binder
                .update_functions
                .borrow_mut()
                .insert(key.into(), func);
        }
    }

    pub fn base(&self) -> NodeId {
        self.inner.base.base()
    }

    /// Element recorded under a definition `key`.
    pub fn elem(&self, key: &str) -> Option<Element> {
        self.inner.elems.get(key).cloned()
    }

    /// Children currently materialized by map bindings on `key`, across
    /// every bound element in binding order.
    pub fn bound_children(&self, key: &str) -> Vec<Component> {
        self.inner
            .binder
            .bound_children
            .borrow()
            .iter()
            .filter(|slot| slot.key == key)
            .flat_map(|slot| slot.children.iter().cloned())
            .collect()
    }

    /// Children the map binding on `key` materialized under `target`.
    pub fn bound_children_under(&self, key: &str, target: NodeId) -> Vec<Component> {
        self.inner
            .binder
            .bound_children
            .borrow()
            .iter()
            .find(|slot| slot.target == target && slot.key == key)
            .map(|slot| slot.children.clone())
            .unwrap_or_default()
    }

    pub fn bound_child_count(&self, key: &str) -> usize {
        self.inner
            .binder
            .bound_children
            .borrow()
            .iter()
            .filter(|slot| slot.key == key)
            .map(|slot| slot.children.len())
            .sum()
    }

    /// Number of live selectors owned by the view (bindings and scope
    /// selectors).
    pub fn selector_count(&self) -> usize {
        self.inner.binder.selectors.borrow().len()
    }

    pub fn state(&self) -> ViewState {
        if self.inner.binder.erased.get() {
            ViewState::Erased
        } else if self.inner.binder.delivering.get() > 0 {
            ViewState::Notifying
        } else {
            ViewState::Bound
        }
    }

    pub fn is_erased(&self) -> bool {
        self.inner.binder.erased.get()
    }

    pub(crate) fn model_selector(&self) -> Selector {
        self.inner.binder.root.clone()
    }

    /// Draw onto `parent` and schedule a reselect sweep for the next paint.
    pub fn draw(&self, parent: NodeId, force: bool) -> Result<()> {
        if self.is_erased() {
            return Err(Error::Erased);
        }
        self.inner.base.draw(parent, force)?;

        let weak = Rc::downgrade(&self.inner);
        self.runtime().scheduler().request_paint(move || {
            if let Some(inner) = weak.upgrade() {
                BoundView { inner }.reselect_all();
            }
        });
        Ok(())
    }

    /// Force every owned selector to re-evaluate against the model.
    pub fn reselect_all(&self) {
        if self.is_erased() {
            return;
        }
        let selectors = self.inner.binder.selectors.borrow().clone();
        tracing::trace!(selectors = selectors.len(), "reselect sweep");
        for selector in selectors {
            selector.reselect();
        }
    }

    /// Dispose every selector, release owned children and the view's nodes.
    pub fn erase(&self) {
        if self.is_erased() {
            return;
        }
        self.inner.binder.dispose();

        for (selector, id) in self.inner.subscriptions.borrow_mut().drain(..) {
            selector.remove_callback(id);
        }
        let owned: Vec<Component> = self.inner.owned.borrow_mut().drain(..).collect();
        let doc = self.runtime().document();
        for component in owned {
            component.release(doc);
        }
        self.inner.base.release();
        tracing::debug!("view erased");
    }

    pub fn is_drawn(&self) -> bool {
        !self.is_erased() && self.inner.base.is_drawn()
    }
}

impl Drawable for BoundView {
    fn base(&self) -> NodeId {
        BoundView::base(self)
    }

    fn draw(&self, parent: NodeId, force: bool) -> Result<()> {
        BoundView::draw(self, parent, force)
    }

    fn erase(&self) {
        BoundView::erase(self)
    }

    fn is_drawn(&self) -> bool {
        BoundView::is_drawn(self)
    }
}

impl std::fmt::Debug for BoundView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundView")
            .field("base", &self.base())
            .field("state", &self.state())
            .field("selectors", &self.selector_count())
            .finish()
    }
}
