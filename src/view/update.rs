//! Default update dispatch.
//!
//! | Target          | Effect                                  |
//! |-----------------|-----------------------------------------|
//! | plain node      | text content = string form of the value |
//! | updatable       | `update(value)`                         |
//! | nested view     | `set_model(value)`                      |
//! | other drawable  | base node text = string form            |
//!
//! Falsy values write the empty string.

use serde_json::Value;

use crate::dom::Document;
use crate::engine::Element;
use crate::error::Result;
use crate::types::content_for;

/// Apply `value` to `target` according to what the target is.
pub fn update_elem(doc: &Document, value: &Value, target: &Element) -> Result<()> {
    match target {
        Element::Node(node) => doc.set_text(*node, &content_for(value)),
        Element::Updatable(updatable) => updatable.update(value)?,
        Element::View(view) => view.set_model(value.clone()),
        Element::Drawable(drawable) => doc.set_text(drawable.base(), &content_for(value)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Namespace, NodeId};
    use crate::drawable::{Drawable, DrawableBase, Updatable};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Gauge {
        base: DrawableBase,
        seen: RefCell<Vec<Value>>,
    }

    impl Drawable for Gauge {
        fn base(&self) -> NodeId {
            self.base.base()
        }
        fn draw(&self, parent: NodeId, force: bool) -> Result<()> {
            self.base.draw(parent, force)
        }
        fn erase(&self) {
            self.base.erase();
        }
        fn is_drawn(&self) -> bool {
            self.base.is_drawn()
        }
    }

    impl Updatable for Gauge {
        fn update(&self, value: &Value) -> Result<()> {
            self.seen.borrow_mut().push(value.clone());
            Ok(())
        }
    }

    #[test]
    fn test_plain_node_gets_string_form() {
        let doc = Document::new();
        let node = doc.create_element("span", Namespace::Html);

        update_elem(&doc, &json!("Kip"), &Element::Node(node)).unwrap();
        assert_eq!(doc.text(node), "Kip");

        update_elem(&doc, &json!(12), &Element::Node(node)).unwrap();
        assert_eq!(doc.text(node), "12");

        update_elem(&doc, &json!(false), &Element::Node(node)).unwrap();
        assert_eq!(doc.text(node), "", "falsy values write empty content");
    }

    #[test]
    fn test_updatable_receives_value() {
        let doc = Document::new();
        let gauge = Rc::new(Gauge {
            base: DrawableBase::create(&doc, "meter"),
            seen: RefCell::new(Vec::new()),
        });

        update_elem(&doc, &json!(0.5), &Element::Updatable(gauge.clone())).unwrap();
        assert_eq!(*gauge.seen.borrow(), vec![json!(0.5)]);
        assert_eq!(doc.text(gauge.base()), "", "updatable handles its own content");
    }

    #[test]
    fn test_generic_drawable_falls_back_to_base_text() {
        let doc = Document::new();
        let gauge = Rc::new(Gauge {
            base: DrawableBase::create(&doc, "div"),
            seen: RefCell::new(Vec::new()),
        });

        update_elem(&doc, &json!(["a", "b"]), &Element::Drawable(gauge.clone())).unwrap();
        assert_eq!(doc.text(gauge.base()), "a,b");
        assert!(gauge.seen.borrow().is_empty());
    }
}
