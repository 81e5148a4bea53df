//! # toolkip
//!
//! Model-bound views, reactive selectors and declarative element construction.
//!
//! ## Architecture
//!
//! A [`BoundView`] owns one [`Model`]. Its element tree is described by
//! [`ElementDefinition`]s and built into a [`Document`] by the construction
//! engine. Definitions that carry a `bind_to` get a [`Selector`] over the
//! model; when the model is replaced, each selector recomputes and only the
//! ones whose value changed push it into their element:
//!
//! ```text
//! set_model → Model → (next flush) → Selector per binding → equality check → update_elem
//! ```
//!
//! Deferred work goes through the [`Scheduler`] owned by the [`Runtime`], so
//! tests drive it with `flush()` / `paint()` / `settle()`.
//!
//! ## Modules
//!
//! - [`types`] - Model values, truthiness, string form, entry iteration
//! - [`reactive`] - Scheduler, Model, Selector, deep equality
//! - [`dom`] - In-memory document, events, focus and visibility
//! - [`engine`] - Element definitions and the construction engine
//! - [`drawable`] - Draw/erase lifecycle and component kinds
//! - [`view`] - Bound views, bridge, identifiable views
//! - [`config`] - Runtime configuration

pub mod config;
pub mod dom;
pub mod drawable;
pub mod engine;
pub mod error;
pub mod reactive;
pub mod runtime;
pub mod types;
pub mod view;

// Re-export commonly used items
pub use types::*;

pub use config::Config;
pub use error::{Error, Result};
pub use runtime::Runtime;

pub use dom::{Content, Document, Event, Listener, ListenerId, Namespace, NodeFlags, NodeId};

pub use drawable::{Component, Drawable, DrawableBase, Updatable};

pub use engine::{
    create_element, create_element_with, is_valid_tag, BuildContext, Child, DrawableSource,
    Element, ElementDefinition, Plain, Recurse, Selectable,
};

pub use reactive::{
    deep_equal, select, select_key, select_with, unbind, CallbackId, Change, ChangeKind,
    Delivery, Model, Scheduler, Selector, Source,
};

pub use view::{
    update_elem, update_fn, value_fn, BindTo, BindingDetails, BoundIdentifiableView,
    BoundView, BoundViewBridge, Lookup, SkipPolicy, UpdateFn, ValueFn, ViewOptions, ViewScope,
    ViewState, WHOLE_MODEL,
};
