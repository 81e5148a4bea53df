//! End-to-end behaviour of bound views: bindings, nested views, mapped
//! children, skipping and teardown.

use std::cell::Cell;
use std::rc::Rc;

use serde_json::json;
use toolkip::{
    update_fn, BindingDetails, BoundView, Component, Drawable, DrawableBase, DrawableSource,
    Element, ElementDefinition, NodeId, Result, Runtime, SkipPolicy, ViewOptions, WHOLE_MODEL,
};

// =============================================================================
// Helpers
// =============================================================================

fn person_definition() -> ElementDefinition {
    ElementDefinition::new("div").class("person").children([
        ElementDefinition::new("span").key("name").bind_to("name"),
        ElementDefinition::new("span").key("count").bind_to("count"),
    ])
}

/// Constructor for a person card, used by map and nested bindings.
fn person_card(rt: &Runtime) -> Result<Component> {
    Ok(BoundView::new(rt, |_| person_definition())?.into())
}

/// A single-node drawable with no update of its own.
struct Chip {
    base: DrawableBase,
}

impl Drawable for Chip {
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

fn chip(rt: &Runtime) -> Result<Component> {
    Ok(Component::Plain(Rc::new(Chip {
        base: DrawableBase::create(rt.document(), "span"),
    })))
}

fn text(rt: &Runtime, view: &BoundView, key: &str) -> String {
    let elem = view.elem(key).expect("keyed element exists");
    rt.document().text(elem.base())
}

fn drawn_view(rt: &Runtime, definition: ElementDefinition) -> BoundView {
    let view = BoundView::new(rt, move |_| definition).expect("view builds");
    view.draw(rt.document().body(), false).expect("view draws");
    rt.settle();
    view
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn empty_model_renders_empty_content() {
    let rt = Runtime::new();
    let view = drawn_view(&rt, ElementDefinition::new("span").key("name").bind_to("name"));
    assert_eq!(text(&rt, &view, "name"), "");
}

#[test]
fn model_assignment_reaches_bound_element() {
    let rt = Runtime::new();
    let view = drawn_view(&rt, person_definition());

    view.set_model(json!({"name": "Kip", "count": 0}));
    rt.settle();
    assert_eq!(text(&rt, &view, "name"), "Kip");
    assert_eq!(text(&rt, &view, "count"), "", "zero is falsy and renders empty");
}

#[test]
fn registered_update_function_formats_value() {
    let rt = Runtime::new();
    let view = drawn_view(&rt, person_definition());
    let doc = rt.document().clone();
    view.set_update_function(
        "count",
        Some(update_fn(move |value, elem| {
            doc.set_text(elem.base(), &format!("Total: {value}"));
            Ok(())
        })),
    );

    view.set_model(json!({"name": "Kip", "count": 0}));
    rt.settle();
    assert_eq!(text(&rt, &view, "count"), "Total: 0");
}

#[test]
fn whole_model_array_maps_to_child_views() {
    let rt = Runtime::new();
    let view = drawn_view(
        &rt,
        ElementDefinition::new("ul").key("list").bind_to(
            BindingDetails::new()
                .key(WHOLE_MODEL)
                .map_to_drawable(DrawableSource::ctor(person_card)),
        ),
    );

    view.set_model(json!([
        {"name": "Big Bird", "count": 0},
        {"name": "Oscar", "count": 10},
    ]));
    rt.settle();

    let list = view.elem("list").unwrap().base();
    assert_eq!(view.bound_child_count(WHOLE_MODEL), 2);
    assert_eq!(rt.document().children(list).len(), 2);

    let children = view.bound_children(WHOLE_MODEL);
    let oscar = children[1].as_view().expect("children are views");
    assert_eq!(text(&rt, oscar, "name"), "Oscar");
    assert_eq!(text(&rt, oscar, "count"), "10");
}

#[test]
fn nested_view_receives_sub_model() {
    let rt = Runtime::new();
    let view = drawn_view(
        &rt,
        ElementDefinition::new("div").child(
            ElementDefinition::with_drawable(DrawableSource::ctor(person_card))
                .key("core_child")
                .bind_to("coreChild"),
        ),
    );

    view.set_model(json!({"coreChild": {"name": "Kip", "count": 0}}));
    rt.settle();

    let child = view.elem("core_child").unwrap();
    let child = child.as_view().expect("drawable definition produced a view");
    assert_eq!(child.model(), json!({"name": "Kip", "count": 0}));
    assert_eq!(text(&rt, child, "name"), "Kip");
}

#[test]
fn skipping_view_never_reflects_model() {
    let rt = Runtime::new();
    let view = BoundView::with_options(
        &rt,
        ViewOptions::new().skip(SkipPolicy::always()),
        |_| person_definition(),
    )
    .unwrap();
    view.draw(rt.document().body(), false).unwrap();

    for i in 0..3 {
        view.set_model(json!({"name": format!("Kip {i}"), "count": i}));
        rt.settle();
        assert_eq!(text(&rt, &view, "name"), "");
    }
}

// =============================================================================
// Invariants
// =============================================================================

#[test]
fn unchanged_key_is_not_updated() {
    let rt = Runtime::new();
    let name_updates = Rc::new(Cell::new(0));
    let n = name_updates.clone();
    let view = drawn_view(
        &rt,
        ElementDefinition::new("div").children([
            ElementDefinition::new("span").bind_to(
                BindingDetails::new()
                    .key("name")
                    .func(move |_, _| {
                        n.set(n.get() + 1);
                        Ok(())
                    }),
            ),
            ElementDefinition::new("span").key("count").bind_to("count"),
        ]),
    );

    view.set_model(json!({"name": "Kip", "count": 1}));
    rt.settle();
    assert_eq!(name_updates.get(), 1);

    view.set_model(json!({"name": "Kip", "count": 2}));
    rt.settle();
    assert_eq!(name_updates.get(), 1, "name did not change");
    assert_eq!(text(&rt, &view, "count"), "2");
}

#[test]
fn deep_equal_reassignment_does_no_writes() {
    let rt = Runtime::new();
    let writes = Rc::new(Cell::new(0));
    let w = writes.clone();
    let view = drawn_view(
        &rt,
        ElementDefinition::new("div").bind_to(BindingDetails::new().key(WHOLE_MODEL).func(
            move |_, _| {
                w.set(w.get() + 1);
                Ok(())
            },
        )),
    );

    view.set_model(json!({"a": 1, "b": {"c": [1, 2]}}));
    rt.settle();
    view.set_model(json!({"b": {"c": [1, 2]}, "a": 1}));
    rt.settle();
    assert_eq!(writes.get(), 1);
}

#[test]
fn erased_view_ignores_pending_notifications() {
    let rt = Runtime::new();
    let updates = Rc::new(Cell::new(0));
    let u = updates.clone();
    let view = drawn_view(
        &rt,
        ElementDefinition::new("span").bind_to(BindingDetails::new().key("name").func(
            move |_, _| {
                u.set(u.get() + 1);
                Ok(())
            },
        )),
    );

    view.set_model(json!({"name": "Kip"}));
    view.erase();
    rt.settle();
    view.set_model(json!({"name": "Oscar"}));
    rt.settle();

    assert_eq!(updates.get(), 0, "no update after erase");
    assert_eq!(rt.document().node_count(), 1, "only body remains");
}

#[test]
fn remapping_erases_previous_children() {
    let rt = Runtime::new();
    let view = drawn_view(
        &rt,
        ElementDefinition::new("ul").key("list").bind_to(
            BindingDetails::new()
                .key("people")
                .map_to_drawable(DrawableSource::ctor(person_card)),
        ),
    );
    let list = view.elem("list").unwrap().base();

    view.set_model(json!({"people": [{"name": "a"}, {"name": "b"}, {"name": "c"}]}));
    rt.settle();
    let first = view.bound_children("people");
    assert_eq!(first.len(), 3);
    let nodes_with_three = rt.document().node_count();

    view.set_model(json!({"people": {"x": {"name": "x"}, "y": {"name": "y"}}}));
    rt.settle();

    assert_eq!(view.bound_child_count("people"), 2);
    assert_eq!(rt.document().children(list).len(), 2);
    for old in &first {
        let old = old.as_view().unwrap();
        assert!(old.is_erased(), "previous children are erased");
        assert_eq!(old.selector_count(), 0);
    }
    // Each card is three nodes (div + two spans).
    assert_eq!(rt.document().node_count(), nodes_with_three - 3);

    let second = view.bound_children("people");
    assert_eq!(text(&rt, second[0].as_view().unwrap(), "name"), "x");
}

#[test]
fn mapping_a_scalar_clears_children() {
    let rt = Runtime::new();
    let view = drawn_view(
        &rt,
        ElementDefinition::new("ul").bind_to(
            BindingDetails::new()
                .key("people")
                .map_to_drawable(DrawableSource::ctor(person_card)),
        ),
    );

    view.set_model(json!({"people": [{"name": "a"}]}));
    rt.settle();
    assert_eq!(view.bound_child_count("people"), 1);

    view.set_model(json!({"people": "nobody"}));
    rt.settle();
    assert_eq!(view.bound_child_count("people"), 0);
}

#[test]
fn whole_model_binding_receives_entire_model() {
    let rt = Runtime::new();
    let view = drawn_view(&rt, ElementDefinition::new("pre").key("all").bind_to(WHOLE_MODEL));

    view.set_model(json!({"name": "Kip"}));
    rt.settle();
    assert_eq!(text(&rt, &view, "all"), r#"{"name":"Kip"}"#);
}

#[test]
fn null_value_keeps_previous_content() {
    let rt = Runtime::new();
    let view = drawn_view(&rt, ElementDefinition::new("span").key("name").bind_to("name"));

    view.set_model(json!({"name": "Kip"}));
    rt.settle();
    view.set_model(json!({"other": 1}));
    rt.settle();
    assert_eq!(text(&rt, &view, "name"), "Kip");

    view.set_model(json!({"name": null}));
    rt.settle();
    assert_eq!(text(&rt, &view, "name"), "Kip");
}

#[test]
fn hidden_element_catches_up_when_visible_again() {
    let rt = Runtime::new();
    let view = BoundView::with_options(
        &rt,
        ViewOptions::new().skip(SkipPolicy::WhenHidden),
        |_| ElementDefinition::new("span").key("name").bind_to("name"),
    )
    .unwrap();
    let doc = rt.document();
    view.draw(doc.body(), false).unwrap();
    rt.settle();

    view.set_model(json!({"name": "Kip"}));
    rt.settle();
    assert_eq!(text(&rt, &view, "name"), "Kip");

    doc.set_hidden(view.base(), true);
    view.set_model(json!({"name": "Oscar"}));
    rt.settle();
    assert_eq!(text(&rt, &view, "name"), "Kip", "hidden element is not updated");

    doc.set_hidden(view.base(), false);
    view.draw(doc.body(), true).unwrap();
    rt.settle();
    assert_eq!(text(&rt, &view, "name"), "Oscar", "reselect sweep catches up");
}

#[test]
fn failing_update_does_not_block_siblings() {
    let rt = Runtime::new();
    let view = drawn_view(
        &rt,
        ElementDefinition::new("div").children([
            ElementDefinition::new("span").bind_to(
                BindingDetails::new()
                    .key("name")
                    .func(|_, _| Err(toolkip::Error::update("name", "rejected"))),
            ),
            ElementDefinition::new("span").key("count").bind_to("count"),
        ]),
    );

    view.set_model(json!({"name": "Kip", "count": 4}));
    rt.settle();
    assert_eq!(text(&rt, &view, "count"), "4");
}

#[test]
fn invalid_type_fails_construction() {
    let rt = Runtime::new();
    let err = BoundView::new(&rt, |_| {
        ElementDefinition::new("div").child(ElementDefinition::new("not valid"))
    })
    .unwrap_err();
    assert!(matches!(err, toolkip::Error::InvalidType(_)));
    assert_eq!(rt.document().node_count(), 1, "failed view never reaches the document");
}

#[test]
fn nested_element_lookup_through_view_child() {
    let rt = Runtime::new();
    let inner = BoundView::new(&rt, |_| person_definition()).unwrap();
    let view = drawn_view(&rt, ElementDefinition::new("section").child(inner.clone()));

    inner.set_model(json!({"name": "Kip"}));
    rt.settle();
    assert!(matches!(inner.elem("name"), Some(Element::Node(_))));
    assert_eq!(rt.document().text(view.base()), "Kip");

    view.erase();
    assert!(inner.is_erased(), "children handed to a view are erased with it");
}

#[test]
fn content_update_releases_static_children() {
    let rt = Runtime::new();
    let view = drawn_view(
        &rt,
        ElementDefinition::new("div")
            .key("card")
            .bind_to("name")
            .child(ElementDefinition::new("span").id("icon")),
    );
    let doc = rt.document();
    assert!(doc.get_element_by_id("icon").is_some());

    view.set_model(json!({"name": "Kip"}));
    rt.settle();
    assert_eq!(text(&rt, &view, "card"), "Kip");
    assert_eq!(doc.get_element_by_id("icon"), None, "replaced child is gone");
    assert_eq!(doc.node_count(), 2);

    view.erase();
    assert_eq!(doc.node_count(), 1, "only body remains");
}

#[test]
fn remapping_plain_drawables_does_not_leak_nodes() {
    let rt = Runtime::new();
    let view = drawn_view(
        &rt,
        ElementDefinition::new("ul").key("list").bind_to(
            BindingDetails::new()
                .key("items")
                .map_to_drawable(DrawableSource::ctor(chip)),
        ),
    );
    let doc = rt.document();
    let list = view.elem("list").unwrap().base();

    for round in 0..5 {
        let items = if round % 2 == 0 { json!(["a", "b", "c"]) } else { json!(["x", "y"]) };
        let expected = items.as_array().map_or(0, Vec::len);
        view.set_model(json!({ "items": items }));
        rt.settle();

        assert_eq!(view.bound_child_count("items"), expected);
        assert_eq!(doc.children(list).len(), expected);
        // body + ul + one node per chip
        assert_eq!(doc.node_count(), 2 + expected, "round {round}");
    }
    assert_eq!(doc.text(list), "abc");

    view.erase();
    assert_eq!(doc.node_count(), 1, "only body remains");
}

#[test]
fn same_key_maps_into_independent_targets() {
    let rt = Runtime::new();
    let people = || {
        BindingDetails::new()
            .key("people")
            .map_to_drawable(DrawableSource::ctor(person_card))
    };
    let view = drawn_view(
        &rt,
        ElementDefinition::new("div").children([
            ElementDefinition::new("ul").key("ul").bind_to(people()),
            ElementDefinition::new("ol").key("ol").bind_to(people()),
        ]),
    );
    let doc = rt.document();
    let ul = view.elem("ul").unwrap().base();
    let ol = view.elem("ol").unwrap().base();

    view.set_model(json!({"people": [{"name": "a"}, {"name": "b"}]}));
    rt.settle();
    assert_eq!(doc.children(ul).len(), 2);
    assert_eq!(doc.children(ol).len(), 2);
    assert_eq!(view.bound_children_under("people", ul).len(), 2);
    assert_eq!(view.bound_children_under("people", ol).len(), 2);
    assert_eq!(view.bound_child_count("people"), 4);

    view.set_model(json!({"people": [{"name": "c"}]}));
    rt.settle();
    assert_eq!(doc.children(ul).len(), 1);
    assert_eq!(doc.children(ol).len(), 1);
    assert_eq!(view.bound_child_count("people"), 2);
}
