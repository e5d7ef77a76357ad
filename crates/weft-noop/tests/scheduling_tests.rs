// SPDX-License-Identifier: Apache-2.0

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

use std::cell::RefCell;
use std::rc::Rc;

use weft_core::{Component, Element, SchedulerPriority, Updater};
use weft_noop::Harness;

type Slot = Rc<RefCell<Option<Updater<i32>>>>;

fn counter(slot: Slot) -> Component {
    Component::new(move |cx, _| {
        let (value, updater) = cx.use_state(|| 0_i32)?;
        *slot.borrow_mut() = Some(updater);
        Ok(Element::text(value.to_string()).into())
    })
}

#[test]
fn sync_updates_coalesce_within_a_turn() {
    let slot: Slot = Rc::default();
    let mut h = Harness::new();
    h.render_and_flush(Element::component(counter(Rc::clone(&slot))))
        .unwrap();

    h.set_priority(SchedulerPriority::Immediate);
    let updater = slot.borrow().clone().unwrap();
    updater.update(|n| n + 1);
    updater.update(|n| n + 1);
    h.reconciler_mut().flush_updates();

    // Both dispatches ride one microtask-driven sync render.
    assert!(h.step().unwrap());
    assert_eq!(h.snapshot(), "#container(\"2\")");
}

#[test]
fn sync_work_preempts_default_work_without_losing_it() {
    let slot: Slot = Rc::default();
    let mut h = Harness::new();
    h.render_and_flush(Element::component(counter(Rc::clone(&slot))))
        .unwrap();
    let updater = slot.borrow().clone().unwrap();

    // A default-priority update is scheduled first...
    h.set_priority(SchedulerPriority::Normal);
    updater.update(|n| n + 1);
    h.reconciler_mut().flush_updates();

    // ...then a sync update arrives before it runs.
    h.set_priority(SchedulerPriority::Immediate);
    updater.update(|n| n + 10);
    h.reconciler_mut().flush_updates();

    // The microtask turn renders only the sync lane: the default update is
    // skipped, not dropped.
    h.step().unwrap();
    assert_eq!(h.snapshot(), "#container(\"10\")");

    // The replay then applies the full log in dispatch order.
    h.flush_all().unwrap();
    assert_eq!(h.snapshot(), "#container(\"11\")");
}

#[test]
fn time_sliced_render_yields_and_resumes() {
    let mut h = Harness::new();
    h.set_yield_every(Some(3));

    let children: Vec<Element> = (0..10).map(|i| Element::text(i.to_string())).collect();
    h.render(children);

    // First excursion yields before the tree completes: nothing commits.
    assert!(h.step().unwrap());
    assert_eq!(h.snapshot(), "#container");

    let mut excursions = 1;
    while h.step().unwrap() {
        excursions += 1;
    }
    assert!(excursions > 2, "render never yielded: {excursions} excursions");
    assert_eq!(
        h.snapshot(),
        format!(
            "#container({})",
            (0..10)
                .map(|i| format!("{:?}", i.to_string()))
                .collect::<Vec<_>>()
                .join(" ")
        )
    );
}

#[test]
fn sync_update_interrupts_an_in_flight_sliced_render() {
    let slot: Slot = Rc::default();
    let mut h = Harness::new();
    h.render_and_flush(Element::component(counter(Rc::clone(&slot))))
        .unwrap();
    let updater = slot.borrow().clone().unwrap();

    // Start a default-priority re-render and let it yield mid-tree.
    h.set_yield_every(Some(2));
    h.set_priority(SchedulerPriority::Normal);
    updater.update(|n| n + 1);
    h.reconciler_mut().flush_updates();
    assert!(h.step().unwrap());

    // Sync work preempts the suspended render; the suspended work restarts
    // afterwards rather than resuming a stale tree.
    h.set_priority(SchedulerPriority::Immediate);
    updater.update(|n| n + 10);
    h.reconciler_mut().flush_updates();
    h.set_yield_every(None);
    h.flush_all().unwrap();
    assert_eq!(h.snapshot(), "#container(\"11\")");
}

fn wide_counter(slot: Slot) -> Component {
    Component::new(move |cx, _| {
        let (value, updater) = cx.use_state(|| 0_i32)?;
        *slot.borrow_mut() = Some(updater);
        Ok(Element::host("div")
            .with_children(vec![
                Element::text(value.to_string()),
                Element::host("span"),
                Element::host("span"),
            ])
            .into())
    })
}

#[test]
fn preemption_after_the_component_rendered_keeps_skipped_updates() {
    let slot: Slot = Rc::default();
    let mut h = Harness::new();
    h.render_and_flush(Element::component(wide_counter(Rc::clone(&slot))))
        .unwrap();
    let updater = slot.borrow().clone().unwrap();

    // Wide enough that the sliced render yields only after the component
    // body has already consumed its pending updates.
    h.set_yield_every(Some(3));
    h.set_priority(SchedulerPriority::Normal);
    updater.update(|n| n + 1);
    h.reconciler_mut().flush_updates();
    assert!(h.step().unwrap());
    assert_eq!(h.snapshot(), "#container(div(\"0\" span span))");

    h.set_priority(SchedulerPriority::Immediate);
    updater.update(|n| n + 10);
    h.reconciler_mut().flush_updates();
    h.set_yield_every(None);

    // The sync render commits alone, without the default update...
    h.step().unwrap();
    assert_eq!(h.snapshot(), "#container(div(\"10\" span span))");

    // ...which the discarded render must not have consumed: it replays.
    h.flush_all().unwrap();
    assert_eq!(h.snapshot(), "#container(div(\"11\" span span))");
}

#[test]
fn idle_scheduler_stays_idle() {
    let mut h = Harness::new();
    h.render_and_flush(Element::host("div")).unwrap();
    assert!(h.host().is_idle());
    assert!(!h.step().unwrap());
}
