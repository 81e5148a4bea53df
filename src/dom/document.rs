//! Document - Arena of element nodes.
//!
//! Nodes are NOT objects. They are indices into one arena owned by the
//! document:
//! - index allocation with a free list for reuse
//! - id ↔ node lookup
//! - parent/children links, attached under a single `body` root
//! - attributes, classes, styles and content per node
//! - listeners, focus and visibility
//!
//! Removing a node releases its whole subtree back to the free list. Calls on
//! a released node are no-ops (logged at trace level), so late callbacks that
//! still hold an id can never corrupt a reused slot's neighbours.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use bitflags::bitflags;

use super::events::{Event, Listener, ListenerId};
use crate::error::{Error, Result};

// =============================================================================
// Types
// =============================================================================

/// Index of a node in its document's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Element namespace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
}

/// Leaf content of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Html(String),
}

impl Default for Content {
    fn default() -> Self {
        Content::Text(String::new())
    }
}

impl Content {
    pub fn as_str(&self) -> &str {
        match self {
            Content::Text(s) | Content::Html(s) => s,
        }
    }
}

bitflags! {
    /// Per-node state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        const NONE = 0;
        /// Excluded from rendering (like the `hidden` attribute).
        const HIDDEN = 1 << 0;
        /// Can receive focus regardless of tag.
        const FOCUSABLE = 1 << 1;
    }
}

/// Tags that take focus without a tabindex.
const FOCUSABLE_TAGS: &[&str] = &["a", "button", "input", "select", "textarea"];

struct NodeData {
    tag: String,
    namespace: Namespace,
    id: Option<String>,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    styles: BTreeMap<String, String>,
    content: Content,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    flags: NodeFlags,
    listeners: Vec<(ListenerId, String, Listener)>,
}

impl NodeData {
    fn new(tag: &str, namespace: Namespace) -> Self {
        Self {
            tag: tag.to_string(),
            namespace,
            id: None,
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            styles: BTreeMap::new(),
            content: Content::default(),
            children: Vec::new(),
            parent: None,
            flags: NodeFlags::NONE,
            listeners: Vec::new(),
        }
    }

    fn is_hidden(&self) -> bool {
        self.flags.contains(NodeFlags::HIDDEN)
            || self.styles.get("display").is_some_and(|d| d == "none")
    }
}

struct DocumentInner {
    nodes: Vec<Option<NodeData>>,
    free: Vec<usize>,
    ids: HashMap<String, NodeId>,
    body: NodeId,
    focused: Option<NodeId>,
    next_listener: u64,
}

impl DocumentInner {
    fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node_mut(id).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != id);
        }
    }

    /// Release every child subtree of `id`. The node itself stays.
    fn release_children(&mut self, id: NodeId) {
        let children = match self.node_mut(id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            self.release(child);
        }
    }

    /// Release a node and its subtree. Children first.
    fn release(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id.0).and_then(Option::take) else {
            return;
        };
        for child in node.children {
            self.release(child);
        }
        if let Some(name) = node.id {
            if self.ids.get(&name) == Some(&id) {
                self.ids.remove(&name);
            }
        }
        if self.focused == Some(id) {
            self.focused = None;
        }
        self.free.push(id.0);
    }
}

// =============================================================================
// Document
// =============================================================================

/// Cloneable handle to a node arena. Clones share the same document.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing only `body`.
    pub fn new() -> Self {
        let body = NodeId(0);
        Self {
            inner: Rc::new(RefCell::new(DocumentInner {
                nodes: vec![Some(NodeData::new("body", Namespace::Html))],
                free: Vec::new(),
                ids: HashMap::new(),
                body,
                focused: None,
                next_listener: 0,
            })),
        }
    }

    /// The root node every visible node hangs under.
    pub fn body(&self) -> NodeId {
        self.inner.borrow().body
    }

    /// Allocate a new, detached element.
    pub fn create_element(&self, tag: &str, namespace: Namespace) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        let data = NodeData::new(tag, namespace);
        // Reuse free index or allocate new
        if let Some(index) = inner.free.pop() {
            inner.nodes[index] = Some(data);
            NodeId(index)
        } else {
            inner.nodes.push(Some(data));
            NodeId(inner.nodes.len() - 1)
        }
    }

    /// Whether `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.inner.borrow().node(id).is_some()
    }

    /// Number of live nodes, `body` included.
    pub fn node_count(&self) -> usize {
        self.inner.borrow().nodes.iter().filter(|n| n.is_some()).count()
    }

    fn read<R>(&self, id: NodeId, f: impl FnOnce(&NodeData) -> R) -> Option<R> {
        let inner = self.inner.borrow();
        let node = inner.node(id);
        if node.is_none() {
            tracing::trace!(node = id.0, "read on released node");
        }
        node.map(f)
    }

    fn write<R>(&self, id: NodeId, f: impl FnOnce(&mut NodeData) -> R) -> Option<R> {
        let mut inner = self.inner.borrow_mut();
        let node = inner.node_mut(id);
        if node.is_none() {
            tracing::trace!(node = id.0, "write on released node ignored");
        }
        node.map(f)
    }

    pub fn tag(&self, id: NodeId) -> Option<String> {
        self.read(id, |n| n.tag.clone())
    }

    pub fn namespace(&self, id: NodeId) -> Option<Namespace> {
        self.read(id, |n| n.namespace)
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    /// Give a node a document-unique id. A later node with the same id takes
    /// over the lookup.
    pub fn set_id(&self, id: NodeId, name: &str) {
        let mut inner = self.inner.borrow_mut();
        let Some(node) = inner.node_mut(id) else {
            return;
        };
        let previous = node.id.replace(name.to_string());
        if let Some(previous) = previous {
            inner.ids.remove(&previous);
        }
        inner.ids.insert(name.to_string(), id);
    }

    pub fn get_element_by_id(&self, name: &str) -> Option<NodeId> {
        self.inner.borrow().ids.get(name).copied()
    }

    // -------------------------------------------------------------------------
    // Attributes, classes, styles
    // -------------------------------------------------------------------------

    pub fn set_attribute(&self, id: NodeId, name: &str, value: &str) {
        self.write(id, |n| {
            n.attributes.insert(name.to_string(), value.to_string());
        });
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.read(id, |n| n.attributes.get(name).cloned()).flatten()
    }

    pub fn remove_attribute(&self, id: NodeId, name: &str) {
        self.write(id, |n| {
            n.attributes.remove(name);
        });
    }

    /// Add a class. Adding a class twice keeps one copy.
    pub fn add_class(&self, id: NodeId, class: &str) {
        if class.is_empty() {
            return;
        }
        self.write(id, |n| {
            if !n.classes.iter().any(|c| c == class) {
                n.classes.push(class.to_string());
            }
        });
    }

    pub fn remove_class(&self, id: NodeId, class: &str) {
        self.write(id, |n| n.classes.retain(|c| c != class));
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.read(id, |n| n.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn classes(&self, id: NodeId) -> Vec<String> {
        self.read(id, |n| n.classes.clone()).unwrap_or_default()
    }

    pub fn set_style(&self, id: NodeId, property: &str, value: &str) {
        self.write(id, |n| {
            n.styles.insert(property.to_string(), value.to_string());
        });
    }

    pub fn style(&self, id: NodeId, property: &str) -> Option<String> {
        self.read(id, |n| n.styles.get(property).cloned()).flatten()
    }

    pub fn remove_style(&self, id: NodeId, property: &str) {
        self.write(id, |n| {
            n.styles.remove(property);
        });
    }

    // -------------------------------------------------------------------------
    // Content
    // -------------------------------------------------------------------------

    /// Replace the node's content with text. Existing children are released.
    pub fn set_text(&self, id: NodeId, text: &str) {
        self.set_content(id, Content::Text(text.to_string()));
    }

    /// Replace the node's content with markup. Existing children are released.
    pub fn set_html(&self, id: NodeId, html: &str) {
        self.set_content(id, Content::Html(html.to_string()));
    }

    fn set_content(&self, id: NodeId, content: Content) {
        let mut inner = self.inner.borrow_mut();
        if inner.node(id).is_none() {
            tracing::trace!(node = id.0, "content write on released node ignored");
            return;
        }
        inner.release_children(id);
        if let Some(node) = inner.node_mut(id) {
            node.content = content;
        }
    }

    /// The node's own leaf content.
    pub fn content(&self, id: NodeId) -> Option<Content> {
        self.read(id, |n| n.content.clone())
    }

    /// Text of the node: its own content followed by its descendants' text.
    pub fn text(&self, id: NodeId) -> String {
        let inner = self.inner.borrow();
        let mut out = String::new();
        collect_text(&inner, id, &mut out);
        out
    }

    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------

    /// Append `child` as the last child of `parent`, moving it if it is
    /// already attached elsewhere.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.node(parent).is_none() {
            return Err(Error::UnknownNode(parent.0));
        }
        if inner.node(child).is_none() {
            return Err(Error::UnknownNode(child.0));
        }

        // Walk up from the new parent: the child must not be an ancestor.
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(Error::HierarchyCycle {
                    parent: parent.0,
                    child: child.0,
                });
            }
            cursor = inner.node(current).and_then(|n| n.parent);
        }

        inner.detach(child);
        if let Some(c) = inner.node_mut(child) {
            c.parent = Some(parent);
        }
        if let Some(p) = inner.node_mut(parent) {
            p.children.push(child);
        }
        Ok(())
    }

    /// Detach a node from its parent. The node stays alive.
    pub fn detach(&self, id: NodeId) {
        self.inner.borrow_mut().detach(id);
    }

    /// Detach and release a node with its whole subtree.
    pub fn remove(&self, id: NodeId) {
        let mut inner = self.inner.borrow_mut();
        if id == inner.body {
            tracing::warn!("refusing to remove the document body");
            return;
        }
        inner.detach(id);
        inner.release(id);
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.read(id, |n| n.children.clone()).unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.read(id, |n| n.parent).flatten()
    }

    // -------------------------------------------------------------------------
    // Visibility and focus
    // -------------------------------------------------------------------------

    pub fn set_hidden(&self, id: NodeId, hidden: bool) {
        self.write(id, |n| n.flags.set(NodeFlags::HIDDEN, hidden));
    }

    pub fn set_focusable(&self, id: NodeId, focusable: bool) {
        self.write(id, |n| n.flags.set(NodeFlags::FOCUSABLE, focusable));
    }

    /// Visible means attached under `body` with no hidden node on the way.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let inner = self.inner.borrow();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = inner.node(current) else {
                return false;
            };
            if node.is_hidden() {
                return false;
            }
            if current == inner.body {
                return true;
            }
            cursor = node.parent;
        }
        false
    }

    pub fn is_focusable(&self, id: NodeId) -> bool {
        self.read(id, |n| {
            n.flags.contains(NodeFlags::FOCUSABLE)
                || n.attributes.contains_key("tabindex")
                || (n.namespace == Namespace::Html && FOCUSABLE_TAGS.contains(&n.tag.as_str()))
        })
        .unwrap_or(false)
    }

    /// Focus a node. Returns false if it cannot take focus.
    pub fn focus(&self, id: NodeId) -> bool {
        if !self.is_focusable(id) {
            return false;
        }
        self.inner.borrow_mut().focused = Some(id);
        true
    }

    pub fn blur(&self) {
        self.inner.borrow_mut().focused = None;
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.inner.borrow().focused
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Register a listener for `kind` events on a node.
    pub fn add_event_listener(
        &self,
        id: NodeId,
        kind: &str,
        listener: Listener,
    ) -> Option<ListenerId> {
        let mut inner = self.inner.borrow_mut();
        let handle = ListenerId(inner.next_listener);
        let node = inner.node_mut(id)?;
        node.listeners.push((handle, kind.to_string(), listener));
        inner.next_listener += 1;
        Some(handle)
    }

    pub fn remove_event_listener(&self, id: NodeId, handle: ListenerId) -> bool {
        self.write(id, |n| {
            let before = n.listeners.len();
            n.listeners.retain(|(h, _, _)| *h != handle);
            n.listeners.len() != before
        })
        .unwrap_or(false)
    }

    pub fn listener_count(&self, id: NodeId, kind: &str) -> usize {
        self.read(id, |n| n.listeners.iter().filter(|(_, k, _)| k == kind).count())
            .unwrap_or(0)
    }

    /// Dispatch an event at a node and bubble it up through the ancestors.
    ///
    /// Returns `false` if a listener prevented the default action. A
    /// `mousedown` that is not prevented focuses a focusable target.
    pub fn dispatch(&self, id: NodeId, event: &Event) -> bool {
        if !self.is_alive(id) {
            tracing::trace!(node = id.0, kind = event.kind(), "dispatch on released node");
            return false;
        }
        event.set_target(id);

        let mut cursor = Some(id);
        while let Some(current) = cursor {
            // Clone the listeners out so they run without the arena borrowed.
            let listeners: Vec<Listener> = self
                .read(current, |n| {
                    n.listeners
                        .iter()
                        .filter(|(_, k, _)| k == event.kind())
                        .map(|(_, _, l)| l.clone())
                        .collect()
                })
                .unwrap_or_default();

            event.set_current_target(current);
            for listener in listeners {
                listener(event);
            }
            if event.propagation_stopped() {
                break;
            }
            cursor = self.parent(current);
        }

        if event.kind() == "mousedown" && !event.default_prevented() {
            self.focus(id);
        }
        !event.default_prevented()
    }
}

fn collect_text(inner: &DocumentInner, id: NodeId, out: &mut String) {
    let Some(node) = inner.node(id) else { return };
    out.push_str(node.content.as_str());
    for &child in &node.children {
        collect_text(inner, child, out);
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Document")
            .field("nodes", &inner.nodes.iter().filter(|n| n.is_some()).count())
            .field("free", &inner.free.len())
            .field("focused", &inner.focused)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn setup() -> (Document, NodeId) {
        let doc = Document::new();
        let div = doc.create_element("div", Namespace::Html);
        doc.append_child(doc.body(), div).unwrap();
        (doc, div)
    }

    #[test]
    fn test_index_reuse_after_remove() {
        let (doc, div) = setup();
        let child = doc.create_element("span", Namespace::Html);
        doc.append_child(div, child).unwrap();
        assert_eq!(doc.node_count(), 3);

        doc.remove(div);
        assert!(!doc.is_alive(div));
        assert!(!doc.is_alive(child), "subtree released with its root");
        assert_eq!(doc.node_count(), 1);
        assert!(doc.children(doc.body()).is_empty());

        let reused = doc.create_element("p", Namespace::Html);
        assert!(reused == div || reused == child, "freed index reused");
    }

    #[test]
    fn test_append_moves_between_parents() {
        let (doc, div) = setup();
        let other = doc.create_element("div", Namespace::Html);
        let child = doc.create_element("span", Namespace::Html);

        doc.append_child(div, child).unwrap();
        doc.append_child(other, child).unwrap();

        assert!(doc.children(div).is_empty());
        assert_eq!(doc.children(other), vec![child]);
        assert_eq!(doc.parent(child), Some(other));
    }

    #[test]
    fn test_append_rejects_cycles() {
        let (doc, div) = setup();
        let child = doc.create_element("span", Namespace::Html);
        doc.append_child(div, child).unwrap();

        let err = doc.append_child(child, div).unwrap_err();
        assert!(matches!(err, Error::HierarchyCycle { .. }));
        assert!(matches!(
            doc.append_child(div, div).unwrap_err(),
            Error::HierarchyCycle { .. }
        ));
    }

    #[test]
    fn test_text_content_releases_children() {
        let (doc, div) = setup();
        let child = doc.create_element("span", Namespace::Html);
        let grandchild = doc.create_element("i", Namespace::Html);
        doc.append_child(div, child).unwrap();
        doc.append_child(child, grandchild).unwrap();
        doc.set_id(grandchild, "icon");
        doc.set_text(grandchild, "inner");
        assert_eq!(doc.text(div), "inner");
        let before = doc.node_count();

        doc.set_text(div, "replaced");
        assert_eq!(doc.text(div), "replaced");
        assert!(doc.children(div).is_empty());
        assert!(!doc.is_alive(child), "replaced children are released");
        assert!(!doc.is_alive(grandchild));
        assert_eq!(doc.node_count(), before - 2);
        assert_eq!(doc.get_element_by_id("icon"), None, "id lookup cleared");
    }

    #[test]
    fn test_html_content_releases_children() {
        let (doc, div) = setup();
        let child = doc.create_element("span", Namespace::Html);
        doc.append_child(div, child).unwrap();

        doc.set_html(div, "<b>x</b>");
        assert!(!doc.is_alive(child));
        assert_eq!(doc.content(div), Some(Content::Html("<b>x</b>".to_string())));
    }

    #[test]
    fn test_visibility() {
        let (doc, div) = setup();
        let child = doc.create_element("span", Namespace::Html);
        assert!(!doc.is_visible(child), "detached nodes are not visible");

        doc.append_child(div, child).unwrap();
        assert!(doc.is_visible(child));

        doc.set_hidden(div, true);
        assert!(!doc.is_visible(child), "hidden ancestor hides descendants");
        doc.set_hidden(div, false);

        doc.set_style(div, "display", "none");
        assert!(!doc.is_visible(child));
        doc.remove_style(div, "display");
        assert!(doc.is_visible(child));
    }

    #[test]
    fn test_ids_follow_release() {
        let (doc, div) = setup();
        doc.set_id(div, "main");
        assert_eq!(doc.get_element_by_id("main"), Some(div));

        doc.remove(div);
        assert_eq!(doc.get_element_by_id("main"), None);
    }

    #[test]
    fn test_classes_are_deduplicated() {
        let (doc, div) = setup();
        doc.add_class(div, "card");
        doc.add_class(div, "card");
        doc.add_class(div, "");
        assert_eq!(doc.classes(div), vec!["card".to_string()]);
        doc.remove_class(div, "card");
        assert!(!doc.has_class(div, "card"));
    }

    #[test]
    fn test_dispatch_bubbles_until_stopped() {
        let (doc, div) = setup();
        let button = doc.create_element("button", Namespace::Html);
        doc.append_child(div, button).unwrap();

        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        doc.add_event_listener(div, "click", Rc::new(move |_: &Event| h.set(h.get() + 1)));
        let h = hits.clone();
        doc.add_event_listener(button, "click", Rc::new(move |_: &Event| h.set(h.get() + 10)));

        doc.dispatch(button, &Event::click());
        assert_eq!(hits.get(), 11);

        let stopper = doc
            .add_event_listener(button, "click", Rc::new(|e: &Event| e.stop_propagation()))
            .unwrap();
        doc.dispatch(button, &Event::click());
        assert_eq!(hits.get(), 21, "parent listener skipped after stop");

        assert!(doc.remove_event_listener(button, stopper));
        assert_eq!(doc.listener_count(button, "click"), 1);
    }

    #[test]
    fn test_mousedown_focuses_unless_prevented() {
        let (doc, div) = setup();
        let button = doc.create_element("button", Namespace::Html);
        doc.append_child(div, button).unwrap();

        assert!(doc.dispatch(button, &Event::mouse_down()));
        assert_eq!(doc.focused(), Some(button));

        doc.blur();
        doc.add_event_listener(button, "mousedown", Rc::new(|e: &Event| e.prevent_default()));
        assert!(!doc.dispatch(button, &Event::mouse_down()));
        assert_eq!(doc.focused(), None);

        assert!(!doc.focus(div), "plain div is not focusable");
        doc.set_attribute(div, "tabindex", "0");
        assert!(doc.focus(div));
    }

    #[test]
    fn test_released_node_is_inert() {
        let (doc, div) = setup();
        doc.remove(div);
        doc.set_text(div, "ignored");
        doc.set_attribute(div, "title", "ignored");
        assert_eq!(doc.content(div), None);
        assert_eq!(doc.attribute(div, "title"), None);
        assert!(!doc.dispatch(div, &Event::click()));
    }
}
