//! Events - Event objects and listener handles for the document.
//!
//! Events bubble from their target up through its ancestors. A listener can
//! stop propagation or prevent the default action (for example the focus a
//! `mousedown` would otherwise give its target).

use std::cell::Cell;
use std::rc::Rc;

use super::document::NodeId;

/// An event listener.
pub type Listener = Rc<dyn Fn(&Event)>;

/// Handle returned by `add_event_listener`, scoped to one document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// A dispatched event.
#[derive(Debug)]
pub struct Event {
    kind: String,
    key: Option<String>,
    target: Cell<Option<NodeId>>,
    current_target: Cell<Option<NodeId>>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl Event {
    /// Create an event of the given kind (`"click"`, `"keydown"`, ...).
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            key: None,
            target: Cell::new(None),
            current_target: Cell::new(None),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    /// A `keydown` event for `key` (`"Enter"`, `" "`, `"a"`, ...).
    pub fn key_down(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::new("keydown")
        }
    }

    /// A `click` event.
    pub fn click() -> Self {
        Self::new("click")
    }

    /// A `mousedown` event.
    pub fn mouse_down() -> Self {
        Self::new("mousedown")
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Key for keyboard events.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Node the event was dispatched on.
    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    /// Node whose listeners are currently running.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub(crate) fn set_target(&self, target: NodeId) {
        if self.target.get().is_none() {
            self.target.set(Some(target));
        }
    }

    pub(crate) fn set_current_target(&self, node: NodeId) {
        self.current_target.set(Some(node));
    }
}
