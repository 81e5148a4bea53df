//! Reactive Module - Models, selectors and the deferred task queue.
//!
//! - **Scheduler** - microtask and next-paint queues, flushed explicitly
//! - **Model** - one owned value, replaced wholesale, notifying on the next flush
//! - **Selector** - cached projection with equality suppression and chaining
//! - **Equality** - structural comparison used for suppression

mod equality;
mod model;
mod scheduler;
mod selector;

pub use equality::deep_equal;
pub use model::Model;
pub use scheduler::{Scheduler, Task};
pub use selector::{
    select, select_key, select_with, unbind, CallbackId, Change, ChangeCallback, ChangeKind,
    Delivery, Equality, Projection, Selector, Source,
};
