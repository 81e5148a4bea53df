//! View Module - Model-bound views.
//!
//! - **BoundView** - element tree built from definitions, bindings driven by
//!   a private model
//! - **Binding** - `bind_to` declarations: key, value function, explicit
//!   update, map-to-drawable
//! - **Update** - default dispatch of a value onto a target element
//! - **BoundViewBridge** - legacy `bound_to` spelling and a `(new, old)` hook
//! - **BoundIdentifiableView** - model swapped by id through a lookup

mod binding;
mod bound;
mod bridge;
mod identifiable;
mod update;

pub use binding::{
    update_fn, value_fn, BindTo, BindingDetails, UpdateFn, ValueFn, WHOLE_MODEL,
};
pub use bound::{BoundView, SkipPolicy, ViewOptions, ViewScope, ViewState};
pub use bridge::BoundViewBridge;
pub use identifiable::{BoundIdentifiableView, Lookup};
pub use update::update_elem;
