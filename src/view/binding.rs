//! Binding declarations - how one element attaches to its view's model.

use std::rc::Rc;

use serde_json::Value;

use crate::engine::{DrawableSource, Element};
use crate::error::{Error, Result};
use crate::types::member;

/// Function applying a bound value to its element.
pub type UpdateFn = Rc<dyn Fn(&Value, &Element) -> Result<()>>;

/// Function extracting the bound value from the whole model.
pub type ValueFn = Rc<dyn Fn(&Value) -> Value>;

/// Binding key meaning "the whole model".
pub const WHOLE_MODEL: &str = "_";

/// Wrap a closure as an [`UpdateFn`].
pub fn update_fn(f: impl Fn(&Value, &Element) -> Result<()> + 'static) -> UpdateFn {
    Rc::new(f)
}

/// Wrap a closure as a [`ValueFn`].
pub fn value_fn(f: impl Fn(&Value) -> Value + 'static) -> ValueFn {
    Rc::new(f)
}

/// The `bind_to` field of a definition.
#[derive(Clone)]
pub enum BindTo {
    /// A model key, or [`WHOLE_MODEL`].
    Key(String),
    Details(BindingDetails),
}

impl From<&str> for BindTo {
    fn from(key: &str) -> Self {
        BindTo::Key(key.to_string())
    }
}

impl From<String> for BindTo {
    fn from(key: String) -> Self {
        BindTo::Key(key)
    }
}

impl From<BindingDetails> for BindTo {
    fn from(details: BindingDetails) -> Self {
        BindTo::Details(details)
    }
}

/// Full binding declaration.
///
/// - `value` overrides `key` for picking the bound value
/// - `func` replaces the default update dispatch
/// - `map_to_drawable` materializes one child per collection entry (used
///   only when there is no `func`)
#[derive(Clone, Default)]
pub struct BindingDetails {
    pub key: Option<String>,
    pub value: Option<ValueFn>,
    pub func: Option<UpdateFn>,
    pub map_to_drawable: Option<DrawableSource>,
}

impl BindingDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn value(mut self, f: impl Fn(&Value) -> Value + 'static) -> Self {
        self.value = Some(value_fn(f));
        self
    }

    pub fn func(mut self, f: impl Fn(&Value, &Element) -> Result<()> + 'static) -> Self {
        self.func = Some(update_fn(f));
        self
    }

    pub fn map_to_drawable(mut self, source: DrawableSource) -> Self {
        self.map_to_drawable = Some(source);
        self
    }
}

// =============================================================================
// Resolved binding
// =============================================================================

/// What a delivery does with the value.
#[derive(Clone)]
pub(crate) enum BindingUpdate {
    /// Registered override for the key, else the default dispatch.
    Default,
    Explicit(UpdateFn),
    Map(DrawableSource),
}

#[derive(Clone)]
pub(crate) struct Binding {
    pub key: Option<String>,
    pub value: Option<ValueFn>,
    pub update: BindingUpdate,
}

impl Binding {
    /// Key used for update-function overrides and the bound-child registry.
    pub fn registry_key(&self) -> &str {
        self.key.as_deref().unwrap_or(WHOLE_MODEL)
    }

    /// Projection from the whole model to the bound value.
    pub fn projection(&self) -> impl Fn(&Value) -> Result<Value> + 'static {
        let key = self.key.clone().filter(|k| k != WHOLE_MODEL);
        let value = self.value.clone();
        move |model: &Value| {
            Ok(match (&value, &key) {
                (Some(f), _) => f(model),
                (None, Some(key)) => member(model, key),
                (None, None) => model.clone(),
            })
        }
    }
}

/// Turn a declaration into a binding. `label` names the element in errors.
pub(crate) fn resolve(bind_to: BindTo, label: &str) -> Result<Binding> {
    match bind_to {
        BindTo::Key(key) => {
            if key.is_empty() {
                return Err(Error::MalformedBinding(label.to_string()));
            }
            Ok(Binding {
                key: Some(key),
                value: None,
                update: BindingUpdate::Default,
            })
        }
        BindTo::Details(details) => {
            if details.key.as_deref() == Some("") {
                return Err(Error::MalformedBinding(label.to_string()));
            }
            let update = match (details.func, details.map_to_drawable) {
                (Some(func), _) => BindingUpdate::Explicit(func),
                (None, Some(source)) => BindingUpdate::Map(source),
                (None, None) if details.key.is_some() || details.value.is_some() => {
                    BindingUpdate::Default
                }
                (None, None) => return Err(Error::MalformedBinding(label.to_string())),
            };
            Ok(Binding {
                key: details.key,
                value: details.value,
                update,
            })
        }
    }
}
