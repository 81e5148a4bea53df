//! Element definitions - the declarative input of the construction engine.

use std::rc::Rc;

use serde_json::Value;

use crate::dom::{Event, Listener, Namespace, NodeId};
use crate::drawable::Component;
use crate::error::Result;
use crate::reactive::Selector;
use crate::runtime::Runtime;
use crate::view::{BindTo, BoundView};

// =============================================================================
// Selectable - literal or selector-backed field
// =============================================================================

/// A configuration value that is either fixed or driven by a selector.
///
/// Selected values are applied when the element is built and again every
/// time the selector reports a change.
#[derive(Clone, Debug)]
pub enum Selectable {
    /// Applied once.
    Static(Value),
    /// Re-applied on every change of the selector.
    Selected(Selector),
}

impl From<Value> for Selectable {
    fn from(value: Value) -> Self {
        Selectable::Static(value)
    }
}

impl From<&str> for Selectable {
    fn from(value: &str) -> Self {
        Selectable::Static(Value::from(value))
    }
}

impl From<String> for Selectable {
    fn from(value: String) -> Self {
        Selectable::Static(Value::from(value))
    }
}

impl From<bool> for Selectable {
    fn from(value: bool) -> Self {
        Selectable::Static(Value::from(value))
    }
}

impl From<i64> for Selectable {
    fn from(value: i64) -> Self {
        Selectable::Static(Value::from(value))
    }
}

impl From<Selector> for Selectable {
    fn from(selector: Selector) -> Self {
        Selectable::Selected(selector)
    }
}

impl From<&Selector> for Selectable {
    fn from(selector: &Selector) -> Self {
        Selectable::Selected(selector.clone())
    }
}

// =============================================================================
// Drawable sources
// =============================================================================

/// How a drawable is produced: a zero-argument factory closure, or a
/// constructor that receives the runtime.
#[derive(Clone)]
pub enum DrawableSource {
    Factory(Rc<dyn Fn() -> Result<Component>>),
    Ctor(fn(&Runtime) -> Result<Component>),
}

impl DrawableSource {
    pub fn factory(f: impl Fn() -> Result<Component> + 'static) -> Self {
        DrawableSource::Factory(Rc::new(f))
    }

    pub fn ctor(ctor: fn(&Runtime) -> Result<Component>) -> Self {
        DrawableSource::Ctor(ctor)
    }

    /// Produce a new component.
    pub fn materialize(&self, rt: &Runtime) -> Result<Component> {
        match self {
            DrawableSource::Factory(f) => f(),
            DrawableSource::Ctor(ctor) => ctor(rt),
        }
    }
}

impl std::fmt::Debug for DrawableSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrawableSource::Factory(_) => f.write_str("DrawableSource::Factory"),
            DrawableSource::Ctor(_) => f.write_str("DrawableSource::Ctor"),
        }
    }
}

// =============================================================================
// Children
// =============================================================================

/// One entry of a definition's `children`.
pub enum Child {
    /// An existing node, appended as-is.
    Node(NodeId),
    /// A nested definition, built through the recursion hook.
    Definition(Box<ElementDefinition>),
    /// An already-constructed drawable, drawn onto the new node.
    Component(Component),
    /// A group, flattened in order.
    Many(Vec<Child>),
}

impl From<NodeId> for Child {
    fn from(node: NodeId) -> Self {
        Child::Node(node)
    }
}

impl From<ElementDefinition> for Child {
    fn from(def: ElementDefinition) -> Self {
        Child::Definition(Box::new(def))
    }
}

impl From<Component> for Child {
    fn from(component: Component) -> Self {
        Child::Component(component)
    }
}

impl From<BoundView> for Child {
    fn from(view: BoundView) -> Self {
        Child::Component(Component::View(view))
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(items: Vec<T>) -> Self {
        Child::Many(items.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Element Definition
// =============================================================================

/// Declarative description of one element and, recursively, its children.
///
/// Either `tag` or `drawable` names what to build; with neither, the
/// runtime's default tag is used. `children` and `content`/`html` are
/// mutually exclusive: when children are present the content fields are
/// ignored.
#[derive(Default)]
pub struct ElementDefinition {
    /// Name under which the built element is recorded for keyed lookup.
    pub key: Option<String>,
    /// Document-unique node id.
    pub id: Option<String>,
    pub tag: Option<String>,
    pub namespace: Namespace,
    /// Build a drawable instead of a plain node.
    pub drawable: Option<DrawableSource>,
    pub attrs: Vec<(String, Selectable)>,
    pub cls: Vec<Selectable>,
    pub style: Vec<(String, Selectable)>,
    pub content: Option<Selectable>,
    pub html: Option<Selectable>,
    pub children: Vec<Child>,
    pub event_listeners: Vec<(String, Listener)>,
    pub focusable: Option<bool>,
    /// Model binding, honoured when built inside a bound view.
    pub bind_to: Option<BindTo>,
    /// Older spelling of `bind_to`, honoured only by views that opt in.
    pub bound_to: Option<BindTo>,
    /// Attach the finished element here as the last step.
    pub parent: Option<NodeId>,
}

impl ElementDefinition {
    /// A definition for a `tag` element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Default::default()
        }
    }

    /// A definition that builds a drawable.
    pub fn with_drawable(source: DrawableSource) -> Self {
        Self {
            drawable: Some(source),
            ..Default::default()
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Selectable>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Add a class (or space-separated classes).
    pub fn class(mut self, class: impl Into<Selectable>) -> Self {
        self.cls.push(class.into());
        self
    }

    pub fn style(mut self, property: impl Into<String>, value: impl Into<Selectable>) -> Self {
        self.style.push((property.into(), value.into()));
        self
    }

    pub fn content(mut self, content: impl Into<Selectable>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn html(mut self, html: impl Into<Selectable>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, C>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Child>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Listen for `kind` events on the built node.
    pub fn on(mut self, kind: impl Into<String>, listener: impl Fn(&Event) + 'static) -> Self {
        let listener: Listener = Rc::new(listener);
        self.event_listeners.push((kind.into(), listener));
        self
    }

    pub fn focusable(mut self, focusable: bool) -> Self {
        self.focusable = Some(focusable);
        self
    }

    pub fn bind_to(mut self, binding: impl Into<BindTo>) -> Self {
        self.bind_to = Some(binding.into());
        self
    }

    pub fn bound_to(mut self, binding: impl Into<BindTo>) -> Self {
        self.bound_to = Some(binding.into());
        self
    }

    pub fn parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Short description used in error messages.
    pub(crate) fn label(&self) -> String {
        if let Some(key) = &self.key {
            return format!("key {key:?}");
        }
        if let Some(id) = &self.id {
            return format!("id {id:?}");
        }
        match (&self.tag, &self.drawable) {
            (_, Some(_)) => "drawable".to_string(),
            (Some(tag), None) => format!("<{tag}>"),
            (None, None) => "<default>".to_string(),
        }
    }
}
