//! Bound Identifiable View - swap the model by id.
//!
//! Wraps a [`BoundView`] with a [`Lookup`]. Setting a model id looks the id
//! up and assigns the result as the model; binding semantics are unchanged.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Deref;

use serde_json::Value;

use super::bound::{BoundView, ViewOptions, ViewScope};
use crate::dom::NodeId;
use crate::drawable::Drawable;
use crate::engine::ElementDefinition;
use crate::error::{Error, Result};
use crate::runtime::Runtime;

/// Resolves a model id to a model value.
pub trait Lookup {
    fn lookup(&self, id: &str) -> Option<Value>;
}

impl Lookup for HashMap<String, Value> {
    fn lookup(&self, id: &str) -> Option<Value> {
        self.get(id).cloned()
    }
}

impl<F> Lookup for F
where
    F: Fn(&str) -> Option<Value>,
{
    fn lookup(&self, id: &str) -> Option<Value> {
        self(id)
    }
}

pub struct BoundIdentifiableView<L: Lookup> {
    view: BoundView,
    lookup: L,
    model_id: RefCell<Option<String>>,
}

impl<L: Lookup> BoundIdentifiableView<L> {
    pub fn new(
        rt: &Runtime,
        lookup: L,
        build: impl FnOnce(&ViewScope<'_>) -> ElementDefinition,
    ) -> Result<Self> {
        Self::with_options(rt, lookup, ViewOptions::default(), build)
    }

    pub fn with_options(
        rt: &Runtime,
        lookup: L,
        options: ViewOptions,
        build: impl FnOnce(&ViewScope<'_>) -> ElementDefinition,
    ) -> Result<Self> {
        Ok(Self {
            view: BoundView::with_options(rt, options, build)?,
            lookup,
            model_id: RefCell::new(None),
        })
    }

    /// Look `id` up and make the result the model.
    ///
    /// An unknown id leaves the model and the current id untouched.
    pub fn set_model_id(&self, id: &str) -> Result<()> {
        let value = self
            .lookup
            .lookup(id)
            .ok_or_else(|| Error::UnknownModelId(id.to_string()))?;
        self.view.set_model(value);
        *self.model_id.borrow_mut() = Some(id.to_string());
        Ok(())
    }

    /// The id of the current model, if it was set by id.
    pub fn model_id(&self) -> Option<String> {
        self.model_id.borrow().clone()
    }

    pub fn view(&self) -> &BoundView {
        &self.view
    }
}

impl<L: Lookup> Deref for BoundIdentifiableView<L> {
    type Target = BoundView;

    fn deref(&self) -> &BoundView {
        &self.view
    }
}

impl<L: Lookup> Drawable for BoundIdentifiableView<L> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card(_: &ViewScope<'_>) -> ElementDefinition {
        ElementDefinition::new("span").key("name").bind_to("name")
    }

    #[test]
    fn test_model_id_swaps_model() {
        let rt = Runtime::new();
        let mut people = HashMap::new();
        people.insert("kip".to_string(), json!({"name": "Kip"}));
        people.insert("oscar".to_string(), json!({"name": "Oscar"}));

        let view = BoundIdentifiableView::new(&rt, people, card).unwrap();
        view.set_model_id("oscar").unwrap();
        rt.flush();

        assert_eq!(view.model_id().as_deref(), Some("oscar"));
        assert_eq!(rt.document().text(view.elem("name").unwrap().base()), "Oscar");
    }

    #[test]
    fn test_unknown_id_is_an_error() {
        let rt = Runtime::new();
        let view = BoundIdentifiableView::new(
            &rt,
            |id: &str| (id == "kip").then(|| json!({"name": "Kip"})),
            card,
        )
        .unwrap();

        view.set_model_id("kip").unwrap();
        let err = view.set_model_id("nobody").unwrap_err();
        assert!(matches!(err, Error::UnknownModelId(ref id) if id == "nobody"));
        assert_eq!(view.model_id().as_deref(), Some("kip"), "id unchanged on failure");
        assert_eq!(view.model(), json!({"name": "Kip"}));
    }
}
