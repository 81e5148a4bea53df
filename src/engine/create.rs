//! Create - Build nodes from element definitions.
//!
//! # Order of work
//!
//! 1. Resolve the node: materialize the drawable, or create the tag
//! 2. Identity (`id`)
//! 3. Attributes, then classes, then styles
//! 4. Children (flattened, nested definitions recursed), or content
//! 5. Focusability and event listeners
//! 6. Record under `key`
//! 7. Attach to `parent`
//!
//! # Reactivity
//!
//! Selected fields are applied immediately and then re-applied by a selector
//! callback on every change. The context remembers each registration so an
//! owner can drop them together with the nodes.

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::Value;

use super::definition::{Child, ElementDefinition, Selectable};
use super::element::Element;
use super::{is_valid_tag, keyboard};
use crate::config::Config;
use crate::dom::{Document, NodeId};
use crate::drawable::Component;
use crate::error::{Error, Result};
use crate::reactive::{CallbackId, Delivery, Selector};
use crate::runtime::Runtime;
use crate::types::{display_value, is_falsy};

// =============================================================================
// Build Context
// =============================================================================

/// Everything one construction pass produced.
///
/// Holds the keyed-element map plus the nodes, components and selector
/// registrations created along the way, so a failed build can be rolled back.
pub struct BuildContext {
    rt: Runtime,
    keyed: HashMap<String, Element>,
    subscriptions: Vec<(Selector, CallbackId)>,
    components: Vec<Component>,
    created: Vec<NodeId>,
    depth: usize,
}

/// What a finished build hands to its owner.
pub(crate) struct BuildParts {
    pub keyed: HashMap<String, Element>,
    pub subscriptions: Vec<(Selector, CallbackId)>,
    pub components: Vec<Component>,
}

impl BuildContext {
    pub fn new(rt: &Runtime) -> Self {
        Self {
            rt: rt.clone(),
            keyed: HashMap::new(),
            subscriptions: Vec::new(),
            components: Vec::new(),
            created: Vec::new(),
            depth: 0,
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.rt
    }

    /// Elements recorded under their definition's `key`.
    pub fn keyed(&self) -> &HashMap<String, Element> {
        &self.keyed
    }

    pub fn elem(&self, key: &str) -> Option<&Element> {
        self.keyed.get(key)
    }

    /// Nesting depth of the definition currently being built.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn into_parts(self) -> BuildParts {
        BuildParts {
            keyed: self.keyed,
            subscriptions: self.subscriptions,
            components: self.components,
        }
    }

    /// Undo the build: drop selector registrations, release components and
    /// release every node that was created.
    pub fn abandon(self) {
        for (selector, id) in self.subscriptions {
            selector.remove_callback(id);
        }
        let doc = self.rt.document();
        for component in self.components {
            component.release(doc);
        }
        for node in self.created.into_iter().rev() {
            doc.remove(node);
        }
    }
}

// =============================================================================
// Recursion hook
// =============================================================================

/// Builds nested definitions. Owners that need to see every definition (bound
/// views intercept `bind_to`) pass their own implementation.
pub trait Recurse {
    fn create(&self, ctx: &mut BuildContext, def: ElementDefinition) -> Result<Element>;
}

/// Recursion that builds nested definitions with no extra behaviour.
pub struct Plain;

impl Recurse for Plain {
    fn create(&self, ctx: &mut BuildContext, def: ElementDefinition) -> Result<Element> {
        create_element_with(ctx, def, self)
    }
}

// =============================================================================
// Create
// =============================================================================

/// Build one definition (and its subtree).
pub fn create_element(ctx: &mut BuildContext, def: ElementDefinition) -> Result<Element> {
    create_element_with(ctx, def, &Plain)
}

/// Build one definition, sending nested definitions through `recurse`.
pub fn create_element_with(
    ctx: &mut BuildContext,
    mut def: ElementDefinition,
    recurse: &dyn Recurse,
) -> Result<Element> {
    let rt = ctx.rt.clone();
    let doc = rt.document().clone();

    // 1. RESOLVE NODE
    let element = match def.drawable.take() {
        Some(source) => {
            let component = source.materialize(&rt)?;
            ctx.components.push(component.clone());
            Element::from(component)
        }
        None => {
            let tag = resolve_tag(def.tag.as_deref(), rt.config())?;
            let node = doc.create_element(&tag, def.namespace);
            ctx.created.push(node);
            Element::Node(node)
        }
    };
    let node = element.base();

    if def.bind_to.is_some() {
        tracing::trace!(element = %def.label(), "bind_to ignored outside a bound view");
    }

    // 2. IDENTITY
    if let Some(id) = &def.id {
        doc.set_id(node, id);
    }

    // 3. ATTRIBUTES, CLASSES, STYLES
    for (name, value) in def.attrs.drain(..) {
        subscribe(ctx, &doc, node, value, move |doc, node, v| {
            if v.is_null() {
                doc.remove_attribute(node, &name);
            } else {
                doc.set_attribute(node, &name, &display_value(v));
            }
        });
    }

    for class in def.cls.drain(..) {
        let applied = RefCell::new(Vec::<String>::new());
        subscribe(ctx, &doc, node, class, move |doc, node, v| {
            let mut applied = applied.borrow_mut();
            for old in applied.drain(..) {
                doc.remove_class(node, &old);
            }
            for name in class_names(v) {
                doc.add_class(node, &name);
                applied.push(name);
            }
        });
    }

    for (property, value) in def.style.drain(..) {
        subscribe(ctx, &doc, node, value, move |doc, node, v| {
            if v.is_null() {
                doc.remove_style(node, &property);
            } else {
                doc.set_style(node, &property, &display_value(v));
            }
        });
    }

    // 4. CHILDREN OR CONTENT
    if !def.children.is_empty() {
        if def.content.is_some() || def.html.is_some() {
            tracing::trace!(element = %def.label(), "children present; content ignored");
        }
        let children = std::mem::take(&mut def.children);
        ctx.depth += 1;
        let appended = append_children(ctx, &doc, node, children, recurse);
        ctx.depth -= 1;
        appended?;
    } else if let Some(html) = def.html.take() {
        subscribe(ctx, &doc, node, html, |doc, node, v| {
            doc.set_html(node, &display_value(v));
        });
    } else if let Some(content) = def.content.take() {
        subscribe(ctx, &doc, node, content, |doc, node, v| {
            doc.set_text(node, &display_value(v));
        });
    }

    // 5. FOCUS AND LISTENERS
    if let Some(focusable) = def.focusable {
        doc.set_focusable(node, focusable);
    }
    let keyboard_clicks = rt.config().keyboard_clicks && doc.is_focusable(node);
    for (kind, listener) in def.event_listeners.drain(..) {
        if kind == "click" && keyboard_clicks {
            keyboard::add_keyboard_click(&doc, node, listener.clone());
        }
        doc.add_event_listener(node, &kind, listener);
    }

    // 6. KEYED LOOKUP
    if let Some(key) = def.key.take() {
        ctx.keyed.insert(key, element.clone());
    }

    // 7. PARENT
    if let Some(parent) = def.parent {
        element.attach(&doc, parent)?;
    }

    Ok(element)
}

fn resolve_tag(tag: Option<&str>, config: &Config) -> Result<String> {
    match tag {
        None => Ok(config.default_tag.clone()),
        Some(tag) if is_valid_tag(tag) => Ok(tag.to_string()),
        Some(tag) => Err(Error::InvalidType(tag.to_string())),
    }
}

/// Apply a selectable field now and, if it is selected, on every change.
fn subscribe(
    ctx: &mut BuildContext,
    doc: &Document,
    node: NodeId,
    value: Selectable,
    apply: impl Fn(&Document, NodeId, &Value) + 'static,
) {
    match value {
        Selectable::Static(v) => apply(doc, node, &v),
        Selectable::Selected(selector) => {
            let doc = doc.clone();
            let id = selector.apply(
                move |change| {
                    apply(&doc, node, &change.value);
                    Ok(Delivery::Applied)
                },
                true,
            );
            ctx.subscriptions.push((selector, id));
        }
    }
}

fn append_children(
    ctx: &mut BuildContext,
    doc: &Document,
    parent: NodeId,
    children: Vec<Child>,
    recurse: &dyn Recurse,
) -> Result<()> {
    for child in children {
        match child {
            Child::Node(id) => doc.append_child(parent, id)?,
            Child::Definition(def) => {
                let placed = def.parent.is_some();
                let element = recurse.create(ctx, *def)?;
                if !placed {
                    element.attach(doc, parent)?;
                }
            }
            Child::Component(component) => {
                ctx.components.push(component.clone());
                component.draw(parent, false)?;
            }
            Child::Many(group) => append_children(ctx, doc, parent, group, recurse)?,
        }
    }
    Ok(())
}

/// Class names carried by a value: space-separated strings, arrays of
/// names, nothing for falsy values.
fn class_names(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().flat_map(class_names).collect(),
        v if is_falsy(v) => Vec::new(),
        v => display_value(v)
            .split_whitespace()
            .map(str::to_string)
            .collect(),
    }
}
