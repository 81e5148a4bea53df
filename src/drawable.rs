//! Drawables - components that own a base node and can be drawn and erased.
//!
//! [`Drawable`] is the lifecycle every component shares. [`DrawableBase`] is
//! the reusable piece most implementations embed: it tracks the base node
//! and where it is drawn. [`Component`] is the closed set of shapes a
//! drawable can take when it is handed to the construction engine or
//! produced by a [`DrawableSource`](crate::engine::DrawableSource).

use std::cell::Cell;
use std::rc::Rc;

use serde_json::Value;

use crate::dom::{Document, Namespace, NodeId};
use crate::error::Result;
use crate::view::BoundView;

/// Draw/erase lifecycle around one base node.
pub trait Drawable {
    /// The node that represents this drawable in the document.
    fn base(&self) -> NodeId;

    /// Attach the base node under `parent`. With `force`, re-attach even if
    /// already drawn there.
    fn draw(&self, parent: NodeId, force: bool) -> Result<()>;

    /// Remove the drawable from the document.
    fn erase(&self);

    fn is_drawn(&self) -> bool;
}

/// A drawable that applies values itself.
pub trait Updatable: Drawable {
    fn update(&self, value: &Value) -> Result<()>;
}

// =============================================================================
// DrawableBase
// =============================================================================

/// Base node bookkeeping shared by drawable implementations.
#[derive(Debug)]
pub struct DrawableBase {
    doc: Document,
    base: NodeId,
    parent: Cell<Option<NodeId>>,
}

impl DrawableBase {
    /// Wrap an existing node. If it is already attached, that counts as drawn.
    pub fn new(doc: &Document, base: NodeId) -> Self {
        Self {
            doc: doc.clone(),
            base,
            parent: Cell::new(doc.parent(base)),
        }
    }

    /// Create a fresh `tag` node as the base.
    pub fn create(doc: &Document, tag: &str) -> Self {
        let base = doc.create_element(tag, Namespace::Html);
        Self::new(doc, base)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn base(&self) -> NodeId {
        self.base
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent.get()
    }

    pub fn draw(&self, parent: NodeId, force: bool) -> Result<()> {
        if !force && self.is_drawn() && self.parent.get() == Some(parent) {
            return Ok(());
        }
        self.doc.append_child(parent, self.base)?;
        self.parent.set(Some(parent));
        Ok(())
    }

    /// Detach the base node. It stays allocated and can be drawn again.
    pub fn erase(&self) {
        self.doc.detach(self.base);
        self.parent.set(None);
    }

    pub fn is_drawn(&self) -> bool {
        self.parent.get().is_some() && self.doc.parent(self.base) == self.parent.get()
    }

    /// Detach and release the base node with its subtree.
    pub fn release(&self) {
        self.doc.remove(self.base);
        self.parent.set(None);
    }
}

// =============================================================================
// Component
// =============================================================================

/// A constructed drawable, tagged by what it can do with a value.
#[derive(Clone)]
pub enum Component {
    View(BoundView),
    Updatable(Rc<dyn Updatable>),
    Plain(Rc<dyn Drawable>),
}

impl Component {
    pub fn base(&self) -> NodeId {
        match self {
            Component::View(v) => v.base(),
            Component::Updatable(u) => u.base(),
            Component::Plain(d) => d.base(),
        }
    }

    pub fn draw(&self, parent: NodeId, force: bool) -> Result<()> {
        match self {
            Component::View(v) => v.draw(parent, force),
            Component::Updatable(u) => u.draw(parent, force),
            Component::Plain(d) => d.draw(parent, force),
        }
    }

    pub fn erase(&self) {
        match self {
            Component::View(v) => v.erase(),
            Component::Updatable(u) => u.erase(),
            Component::Plain(d) => d.erase(),
        }
    }

    /// Erase and release the base node with its subtree. Views release their
    /// own tree on erase; other drawables only detach, so their base is
    /// removed from `doc` here.
    pub fn release(&self, doc: &Document) {
        match self {
            Component::View(v) => v.erase(),
            Component::Updatable(u) => {
                u.erase();
                doc.remove(u.base());
            }
            Component::Plain(d) => {
                d.erase();
                doc.remove(d.base());
            }
        }
    }

    pub fn is_drawn(&self) -> bool {
        match self {
            Component::View(v) => v.is_drawn(),
            Component::Updatable(u) => u.is_drawn(),
            Component::Plain(d) => d.is_drawn(),
        }
    }

    pub fn as_view(&self) -> Option<&BoundView> {
        match self {
            Component::View(v) => Some(v),
            _ => None,
        }
    }
}

impl From<BoundView> for Component {
    fn from(view: BoundView) -> Self {
        Component::View(view)
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Component::View(_) => "View",
            Component::Updatable(_) => "Updatable",
            Component::Plain(_) => "Plain",
        };
        f.debug_struct("Component")
            .field("kind", &kind)
            .field("base", &self.base())
            .finish()
    }
}
