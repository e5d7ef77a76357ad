// SPDX-License-Identifier: Apache-2.0

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

use weft_core::{Children, Component, Element};
use weft_noop::{Harness, HostOp};

#[test]
fn recommitting_an_identical_description_performs_no_mutations() {
    let mut h = Harness::new();
    let tree = Element::host("div")
        .with_props(7_i32)
        .with_children(vec![Element::text("a"), Element::host("span")]);
    h.render_and_flush(tree.clone()).unwrap();
    h.take_ops();

    // Clones share props identity, so nothing changed anywhere.
    h.render_and_flush(tree).unwrap();
    assert_eq!(h.take_ops(), Vec::new());
}

#[test]
fn text_change_updates_in_place() {
    let mut h = Harness::new();
    h.render_and_flush(Element::host("div").with_children("a"))
        .unwrap();
    h.take_ops();

    h.render_and_flush(Element::host("div").with_children("b"))
        .unwrap();
    let ops = h.take_ops();
    assert_eq!(ops.len(), 1);
    assert!(matches!(&ops[0], HostOp::UpdateText { content, .. } if content == "b"));
    assert_eq!(h.snapshot(), "#container(div(\"b\"))");
}

#[test]
fn new_props_identity_commits_an_update() {
    let mut h = Harness::new();
    h.render_and_flush(Element::host("div").with_props(1_i32))
        .unwrap();
    h.take_ops();

    h.render_and_flush(Element::host("div").with_props(2_i32))
        .unwrap();
    let ops = h.take_ops();
    assert_eq!(ops.len(), 1);
    assert!(matches!(ops[0], HostOp::UpdateInstance { .. }));
}

#[test]
fn type_change_remounts_the_position() {
    let mut h = Harness::new();
    h.render_and_flush(Element::host("div").with_children("x"))
        .unwrap();
    h.take_ops();

    h.render_and_flush(Element::host("span").with_children("x"))
        .unwrap();
    let ops = h.take_ops();
    assert!(ops
        .iter()
        .any(|op| matches!(op, HostOp::RemoveChild { .. })));
    assert!(ops
        .iter()
        .any(|op| matches!(op, HostOp::CreateInstance { ty, .. } if ty == "span")));
    assert_eq!(h.snapshot(), "#container(span(\"x\"))");
}

#[test]
fn switching_component_functions_remounts_their_output() {
    let x = Component::new(|_, _| Ok(Element::host("div").with_children("X").into()));
    let y = Component::new(|_, _| Ok(Element::host("div").with_children("Y").into()));

    let mut h = Harness::new();
    h.render_and_flush(Element::component(x)).unwrap();
    h.take_ops();

    // Same output shape, but a different function identity: the old
    // subtree is torn down, not updated.
    h.render_and_flush(Element::component(y)).unwrap();
    let ops = h.take_ops();
    assert!(ops
        .iter()
        .any(|op| matches!(op, HostOp::RemoveChild { .. })));
    assert!(ops
        .iter()
        .any(|op| matches!(op, HostOp::CreateInstance { .. })));
    assert_eq!(h.snapshot(), "#container(div(\"Y\"))");
}

#[test]
fn clearing_children_removes_them() {
    let mut h = Harness::new();
    h.render_and_flush(Element::host("div").with_children(vec![
        Element::text("a"),
        Element::text("b"),
    ]))
    .unwrap();
    h.take_ops();

    h.render_and_flush(Element::host("div")).unwrap();
    let removals = h
        .take_ops()
        .into_iter()
        .filter(|op| matches!(op, HostOp::RemoveChild { .. }))
        .count();
    assert_eq!(removals, 2);
    assert_eq!(h.snapshot(), "#container(div)");
}

#[test]
fn replacing_the_whole_tree_with_nothing_empties_the_container() {
    let mut h = Harness::new();
    h.render_and_flush(Element::host("div").with_children("a"))
        .unwrap();
    h.render_and_flush(Children::None).unwrap();
    assert_eq!(h.snapshot(), "#container");
}
