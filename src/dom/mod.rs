//! DOM Module - In-memory document the construction engine writes into.
//!
//! - **Document** - node arena, structure, attributes, content, visibility, focus
//! - **Events** - event objects, listeners, bubbling dispatch

mod document;
mod events;

pub use document::{Content, Document, Namespace, NodeFlags, NodeId};
pub use events::{Event, Listener, ListenerId};
