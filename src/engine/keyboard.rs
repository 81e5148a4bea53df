//! Keyboard activation for click handlers.
//!
//! A click handler on a focusable element also answers `Enter` and `Space`,
//! and mouse-down on it no longer moves focus. Mouse-only behaviour becomes
//! keyboard-accessible without the definition asking for it.

use std::rc::Rc;

use crate::dom::{Document, Event, Listener, NodeId};

/// Keys that activate a focused element.
const ACTIVATION_KEYS: &[&str] = &["Enter", " ", "Space", "Spacebar"];

pub(crate) fn is_activation_key(key: &str) -> bool {
    ACTIVATION_KEYS.contains(&key)
}

/// Register the keyboard and focus-suppression companions of `on_click`.
pub(crate) fn add_keyboard_click(doc: &Document, node: NodeId, on_click: Listener) {
    let keydown: Listener = Rc::new(move |event: &Event| {
        let Some(key) = event.key() else { return };
        if !is_activation_key(key) {
            return;
        }
        event.prevent_default();
        let click = Event::click();
        click.set_target(node);
        click.set_current_target(node);
        on_click(&click);
    });
    doc.add_event_listener(node, "keydown", keydown);

    let mousedown: Listener = Rc::new(|event: &Event| event.prevent_default());
    doc.add_event_listener(node, "mousedown", mousedown);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Namespace;
    use std::cell::Cell;

    #[test]
    fn test_enter_and_space_trigger_click() {
        let doc = Document::new();
        let button = doc.create_element("button", Namespace::Html);
        doc.append_child(doc.body(), button).unwrap();

        let clicks = Rc::new(Cell::new(0));
        let c = clicks.clone();
        add_keyboard_click(&doc, button, Rc::new(move |_: &Event| c.set(c.get() + 1)));

        doc.dispatch(button, &Event::key_down("Enter"));
        doc.dispatch(button, &Event::key_down(" "));
        doc.dispatch(button, &Event::key_down("a"));
        assert_eq!(clicks.get(), 2, "only activation keys click");
    }

    #[test]
    fn test_activation_prevents_default() {
        let doc = Document::new();
        let button = doc.create_element("button", Namespace::Html);
        add_keyboard_click(&doc, button, Rc::new(|_: &Event| {}));

        assert!(!doc.dispatch(button, &Event::key_down("Enter")));
        assert!(doc.dispatch(button, &Event::key_down("Tab")));
    }

    #[test]
    fn test_mousedown_does_not_focus() {
        let doc = Document::new();
        let button = doc.create_element("button", Namespace::Html);
        doc.append_child(doc.body(), button).unwrap();
        add_keyboard_click(&doc, button, Rc::new(|_: &Event| {}));

        doc.dispatch(button, &Event::mouse_down());
        assert_eq!(doc.focused(), None);
    }
}
