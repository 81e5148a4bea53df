//! Element - what a definition produced.
//!
//! Resolved once at construction into a closed set of target kinds. Update
//! dispatch matches on the kind.

use std::rc::Rc;

use crate::dom::{Document, NodeId};
use crate::drawable::{Component, Drawable, Updatable};
use crate::error::Result;
use crate::view::BoundView;

/// A built element.
#[derive(Clone)]
pub enum Element {
    /// A plain document node.
    Node(NodeId),
    /// A drawable that knows how to apply a value itself.
    Updatable(Rc<dyn Updatable>),
    /// A nested bound view; values become its model.
    View(BoundView),
    /// Any other drawable.
    Drawable(Rc<dyn Drawable>),
}

impl Element {
    /// The node that represents this element in the document.
    pub fn base(&self) -> NodeId {
        match self {
            Element::Node(id) => *id,
            Element::Updatable(u) => u.base(),
            Element::View(v) => v.base(),
            Element::Drawable(d) => d.base(),
        }
    }

    pub fn as_view(&self) -> Option<&BoundView> {
        match self {
            Element::View(v) => Some(v),
            _ => None,
        }
    }

    /// Attach onto `parent`: append plain nodes, draw drawables.
    pub(crate) fn attach(&self, doc: &Document, parent: NodeId) -> Result<()> {
        match self {
            Element::Node(id) => doc.append_child(parent, *id),
            Element::Updatable(u) => u.draw(parent, false),
            Element::View(v) => v.draw(parent, false),
            Element::Drawable(d) => d.draw(parent, false),
        }
    }
}

impl From<Component> for Element {
    fn from(component: Component) -> Self {
        match component {
            Component::View(v) => Element::View(v),
            Component::Updatable(u) => Element::Updatable(u),
            Component::Plain(d) => Element::Drawable(d),
        }
    }
}

impl From<NodeId> for Element {
    fn from(id: NodeId) -> Self {
        Element::Node(id)
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Node(id) => f.debug_tuple("Node").field(id).finish(),
            Element::Updatable(u) => f.debug_tuple("Updatable").field(&u.base()).finish(),
            Element::View(v) => f.debug_tuple("View").field(&v.base()).finish(),
            Element::Drawable(d) => f.debug_tuple("Drawable").field(&d.base()).finish(),
        }
    }
}
