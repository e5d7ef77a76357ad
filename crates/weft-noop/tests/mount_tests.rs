// SPDX-License-Identifier: Apache-2.0

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

use weft_core::{Children, Component, Element};
use weft_noop::{Harness, HostOp};

#[test]
fn mounts_a_host_tree() {
    let mut h = Harness::new();
    let tree = Element::host("div")
        .with_children(vec![Element::text("a"), Element::host("span")]);
    h.render_and_flush(tree).unwrap();
    assert_eq!(h.snapshot(), "#container(div(\"a\" span))");
}

#[test]
fn mount_splices_one_prebuilt_unit_into_the_container() {
    let mut h = Harness::new();
    let tree = Element::host("div").with_children(vec![
        Element::host("span").with_children("x"),
        Element::text("y"),
    ]);
    h.render_and_flush(tree).unwrap();

    // Only the subtree's top host instance lands in the container; the
    // rest was assembled beneath it before the commit.
    let container = h.container();
    let ops = h.take_ops();
    let into_container = ops
        .iter()
        .filter(|op| {
            matches!(op,
                HostOp::AppendChild { parent, .. } | HostOp::InsertBefore { parent, .. }
                    if *parent == container)
        })
        .count();
    assert_eq!(into_container, 1);
}

#[test]
fn unkeyed_top_level_fragment_is_transparent() {
    let mut h = Harness::new();
    let tree = Element::fragment(vec![Element::text("a"), Element::text("b")]);
    h.render_and_flush(tree).unwrap();
    assert_eq!(h.snapshot(), "#container(\"a\" \"b\")");
}

#[test]
fn nested_fragments_flatten_into_host_positions() {
    let mut h = Harness::new();
    let tree = Element::host("div").with_children(vec![
        Element::text("a"),
        Element::fragment(vec![Element::text("b"), Element::host("span")]),
        Element::text("c"),
    ]);
    h.render_and_flush(tree).unwrap();
    assert_eq!(h.snapshot(), "#container(div(\"a\" \"b\" span \"c\"))");
}

#[test]
fn component_output_mounts_in_place() {
    let greeter = Component::new(|_, _| {
        Ok(Element::host("p").with_children("hello").into())
    });
    let mut h = Harness::new();
    h.render_and_flush(Element::component(greeter)).unwrap();
    assert_eq!(h.snapshot(), "#container(p(\"hello\"))");
}

#[test]
fn component_rendering_nothing_mounts_nothing() {
    let empty = Component::new(|_, _| Ok(Children::None));
    let mut h = Harness::new();
    h.render_and_flush(Element::component(empty)).unwrap();
    assert_eq!(h.snapshot(), "#container");
    assert!(h.take_ops().is_empty());
}
