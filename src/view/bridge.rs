//! Bound View Bridge - a bound view that speaks the older contract.
//!
//! - definitions may spell their binding `bound_to`; it is used as `bind_to`
//!   when the latter is absent
//! - a two-argument change hook receives `(new, old)` for every change of the
//!   whole model
//!
//! Everything else is the wrapped [`BoundView`].

use std::ops::Deref;

use serde_json::Value;

use super::bound::{BoundView, ViewOptions, ViewScope};
use crate::dom::NodeId;
use crate::drawable::{Component, Drawable};
use crate::engine::ElementDefinition;
use crate::error::Result;
use crate::reactive::{CallbackId, Delivery};
use crate::runtime::Runtime;

pub struct BoundViewBridge {
    view: BoundView,
    hook: Option<CallbackId>,
}

impl BoundViewBridge {
    /// A bridge with no change hook.
    pub fn new(
        rt: &Runtime,
        build: impl FnOnce(&ViewScope<'_>) -> ElementDefinition,
    ) -> Result<Self> {
        let view = BoundView::with_options(rt, ViewOptions::new().legacy_bound_to(), build)?;
        Ok(Self { view, hook: None })
    }

    /// A bridge whose `on_change(new, old)` runs after each model change.
    /// `old` is `None` only when no previous value was ever computed.
    pub fn with_handler(
        rt: &Runtime,
        options: ViewOptions,
        on_change: impl Fn(&Value, Option<&Value>) + 'static,
        build: impl FnOnce(&ViewScope<'_>) -> ElementDefinition,
    ) -> Result<Self> {
        let view = BoundView::with_options(rt, options.legacy_bound_to(), build)?;
        let hook = view.model_selector().apply(
            move |change| {
                on_change(&change.value, change.old_value.as_ref());
                Ok(Delivery::Applied)
            },
            false,
        );
        Ok(Self {
            view,
            hook: Some(hook),
        })
    }

    pub fn view(&self) -> &BoundView {
        &self.view
    }

    pub fn has_change_hook(&self) -> bool {
        self.hook.is_some()
    }
}

impl Deref for BoundViewBridge {
    type Target = BoundView;

    fn deref(&self) -> &BoundView {
        &self.view
    }
}

impl Drawable for BoundViewBridge {
    fn base(&self) -> NodeId {
        self.view.base()
    }

    fn draw(&self, parent: NodeId, force: bool) -> Result<()> {
        self.view.draw(parent, force)
    }

    fn erase(&self) {
        self.view.erase();
    }

    fn is_drawn(&self) -> bool {
        self.view.is_drawn()
    }
}

impl From<BoundViewBridge> for Component {
    fn from(bridge: BoundViewBridge) -> Self {
        Component::View(bridge.view)
    }
}
