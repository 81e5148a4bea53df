//! Construction Engine - Declarative definitions to document nodes.
//!
//! The engine turns an [`ElementDefinition`] tree into nodes:
//! - Definition: the declarative description (tag or drawable, attributes,
//!   classes, styles, content or children, listeners, binding)
//! - Selectable: a field that is either a literal or a selector
//! - Element: what a definition produced, resolved once into a closed set of
//!   target kinds
//! - Create: the builder itself, with a recursion hook so bound views can
//!   intercept nested definitions
//!
//! # Example
//!
//! ```ignore
//! let rt = Runtime::new();
//! let mut ctx = BuildContext::new(&rt);
//!
//! let card = create_element(&mut ctx, ElementDefinition::new("section")
//!     .key("card")
//!     .class("card")
//!     .child(ElementDefinition::new("h2").key("title").content("Hello"))
//!     .parent(rt.document().body()))?;
//!
//! let title = ctx.elem("title").unwrap().base();
//! ```

mod create;
mod definition;
mod element;
mod keyboard;

pub use create::{create_element, create_element_with, BuildContext, Plain, Recurse};
pub use definition::{Child, DrawableSource, ElementDefinition, Selectable};
pub use element::Element;

/// Whether `tag` is usable as an element name: an ASCII letter followed by
/// letters, digits or `-`.
pub fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_tags() {
        assert!(is_valid_tag("div"));
        assert!(is_valid_tag("h1"));
        assert!(is_valid_tag("my-widget"));
        assert!(is_valid_tag("foreignObject"));
    }

    #[test]
    fn test_invalid_tags() {
        assert!(!is_valid_tag(""));
        assert!(!is_valid_tag("1div"));
        assert!(!is_valid_tag("not a tag"));
        assert!(!is_valid_tag("-x"));
        assert!(!is_valid_tag("<div>"));
    }
}
