// SPDX-License-Identifier: Apache-2.0

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use weft_core::{
    Children, Component, Dep, Element, EffectCleanup, ReconcileError, Task, Updater,
};
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
fn state_dispatch_rerenders_with_the_new_value() {
    let slot: Slot = Rc::default();
    let mut h = Harness::new();
    h.render_and_flush(Element::component(counter(Rc::clone(&slot))))
        .unwrap();
    assert_eq!(h.snapshot(), "#container(\"0\")");

    let updater = slot.borrow().clone().unwrap();
    updater.set(1);
    h.flush_all().unwrap();
    assert_eq!(h.snapshot(), "#container(\"1\")");
}

#[test]
fn same_turn_dispatches_coalesce_into_one_render() {
    let renders = Rc::new(Cell::new(0_u32));
    let slot: Slot = Rc::default();
    let component = {
        let renders = Rc::clone(&renders);
        let slot = Rc::clone(&slot);
        Component::new(move |cx, _| {
            renders.set(renders.get() + 1);
            let (value, updater) = cx.use_state(|| 0_i32)?;
            *slot.borrow_mut() = Some(updater);
            Ok(Element::text(value.to_string()).into())
        })
    };

    let mut h = Harness::new();
    h.render_and_flush(Element::component(component)).unwrap();
    assert_eq!(renders.get(), 1);

    let updater = slot.borrow().clone().unwrap();
    updater.update(|n| n + 1);
    updater.update(|n| n + 1);
    updater.update(|n| n + 1);
    h.flush_all().unwrap();
    assert_eq!(renders.get(), 2);
    assert_eq!(h.snapshot(), "#container(\"3\")");
}

#[test]
fn growing_the_hook_list_is_a_fatal_render_error() {
    let extra = Rc::new(Cell::new(false));
    let slot: Slot = Rc::default();
    let component = {
        let extra = Rc::clone(&extra);
        let slot = Rc::clone(&slot);
        Component::new(move |cx, _| {
            let (value, updater) = cx.use_state(|| 0_i32)?;
            *slot.borrow_mut() = Some(updater);
            if extra.get() {
                let _ = cx.use_state(|| 0_i32)?;
            }
            Ok(Element::text(value.to_string()).into())
        })
    };

    let mut h = Harness::new();
    let tree = Element::component(component);
    h.render_and_flush(tree.clone()).unwrap();

    extra.set(true);
    let updater = slot.borrow().clone().unwrap();
    updater.set(1);
    let err = h.flush_all().unwrap_err();
    assert_eq!(
        err,
        ReconcileError::HookCountMismatch {
            called: 2,
            recorded: 1
        }
    );

    // The committed tree survives the discarded render, and a later render
    // proceeds normally.
    assert_eq!(h.snapshot(), "#container(\"0\")");
    extra.set(false);
    h.render_and_flush(tree).unwrap();
    assert_eq!(h.snapshot(), "#container(\"0\")");
}

#[test]
fn shrinking_the_hook_list_is_a_fatal_render_error() {
    let second = Rc::new(Cell::new(true));
    let slot: Slot = Rc::default();
    let component = {
        let second = Rc::clone(&second);
        let slot = Rc::clone(&slot);
        Component::new(move |cx, _| {
            let (value, updater) = cx.use_state(|| 0_i32)?;
            *slot.borrow_mut() = Some(updater);
            if second.get() {
                let _ = cx.use_state(|| 0_i32)?;
            }
            Ok(Element::text(value.to_string()).into())
        })
    };

    let mut h = Harness::new();
    h.render_and_flush(Element::component(component)).unwrap();

    second.set(false);
    let updater = slot.borrow().clone().unwrap();
    updater.set(1);
    let err = h.flush_all().unwrap_err();
    assert_eq!(
        err,
        ReconcileError::HookCountUnderrun {
            called: 1,
            recorded: 2
        }
    );
}

#[test]
fn changing_a_slot_kind_is_a_fatal_render_error() {
    let as_effect = Rc::new(Cell::new(false));
    let slot: Slot = Rc::default();
    let component = {
        let as_effect = Rc::clone(&as_effect);
        let slot = Rc::clone(&slot);
        Component::new(move |cx, _| {
            if as_effect.get() {
                cx.use_effect(None, || None)?;
                let (_, updater) = cx.use_state(|| 0_i32)?;
                *slot.borrow_mut() = Some(updater);
            } else {
                let (_, updater) = cx.use_state(|| 0_i32)?;
                *slot.borrow_mut() = Some(updater);
                cx.use_effect(None, || None)?;
            }
            Ok(Children::None)
        })
    };

    let mut h = Harness::new();
    h.render_and_flush(Element::component(component)).unwrap();

    as_effect.set(true);
    let updater = slot.borrow().clone().unwrap();
    updater.set(1);
    let err = h.flush_all().unwrap_err();
    assert_eq!(err, ReconcileError::HookKindMismatch { index: 0 });
}

#[test]
fn effects_run_after_commit_not_during_it() {
    let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
    let component = {
        let log = Rc::clone(&log);
        Component::new(move |cx, _| {
            let log = Rc::clone(&log);
            cx.use_effect(Some(vec![]), move || {
                log.borrow_mut().push("create");
                None
            })?;
            Ok(Element::host("div").into())
        })
    };

    let mut h = Harness::new();
    h.render(Element::component(component));
    assert!(h.step().unwrap()); // render + commit
    assert_eq!(h.snapshot(), "#container(div)");
    assert!(log.borrow().is_empty(), "effect ran during commit");

    assert!(h.step().unwrap()); // deferred-effect flush
    assert_eq!(*log.borrow(), vec!["create"]);
}

#[test]
fn a_second_passive_flush_runs_nothing() {
    let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
    let component = {
        let log = Rc::clone(&log);
        Component::new(move |cx, _| {
            let log = Rc::clone(&log);
            cx.use_effect(Some(vec![]), move || {
                log.borrow_mut().push("create");
                let log = Rc::clone(&log);
                let cleanup: EffectCleanup = Rc::new(move || log.borrow_mut().push("cleanup"));
                Some(cleanup)
            })?;
            Ok(Element::host("div").into())
        })
    };

    let mut h = Harness::new();
    h.render_and_flush(Element::component(component)).unwrap();
    assert_eq!(*log.borrow(), vec!["create"]);

    // A flush with no commit behind it finds empty queues and runs no
    // callbacks.
    let root = h.root();
    h.reconciler_mut()
        .execute_task(Task::FlushPassiveEffects { root })
        .unwrap();
    assert_eq!(*log.borrow(), vec!["create"]);
    assert!(h.host().is_idle());
}

#[test]
fn stable_deps_skip_the_effect() {
    let runs = Rc::new(Cell::new(0_u32));
    let slot: Slot = Rc::default();
    let component = {
        let runs = Rc::clone(&runs);
        let slot = Rc::clone(&slot);
        Component::new(move |cx, _| {
            let (value, updater) = cx.use_state(|| 0_i32)?;
            *slot.borrow_mut() = Some(updater);
            let runs = Rc::clone(&runs);
            cx.use_effect(Some(vec![Dep::from(1)]), move || {
                runs.set(runs.get() + 1);
                None
            })?;
            Ok(Element::text(value.to_string()).into())
        })
    };

    let mut h = Harness::new();
    h.render_and_flush(Element::component(component)).unwrap();
    assert_eq!(runs.get(), 1);

    let updater = slot.borrow().clone().unwrap();
    updater.set(5);
    h.flush_all().unwrap();
    assert_eq!(h.snapshot(), "#container(\"5\")");
    assert_eq!(runs.get(), 1);
}

#[test]
fn changed_deps_run_cleanup_before_the_new_create() {
    let log: Rc<RefCell<Vec<String>>> = Rc::default();
    let slot: Slot = Rc::default();
    let component = {
        let log = Rc::clone(&log);
        let slot = Rc::clone(&slot);
        Component::new(move |cx, _| {
            let (value, updater) = cx.use_state(|| 0_i32)?;
            *slot.borrow_mut() = Some(updater);
            let log = Rc::clone(&log);
            cx.use_effect(Some(vec![Dep::from(value)]), move || {
                log.borrow_mut().push(format!("create {value}"));
                let log = Rc::clone(&log);
                let cleanup: EffectCleanup =
                    Rc::new(move || log.borrow_mut().push(format!("cleanup {value}")));
                Some(cleanup)
            })?;
            Ok(Element::text(value.to_string()).into())
        })
    };

    let mut h = Harness::new();
    h.render_and_flush(Element::component(component)).unwrap();

    let updater = slot.borrow().clone().unwrap();
    updater.set(1);
    h.flush_all().unwrap();
    assert_eq!(
        *log.borrow(),
        vec!["create 0".to_owned(), "cleanup 0".to_owned(), "create 1".to_owned()]
    );
}

#[test]
fn unmount_runs_the_cleanup() {
    let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
    let component = {
        let log = Rc::clone(&log);
        Component::new(move |cx, _| {
            let log = Rc::clone(&log);
            cx.use_effect(Some(vec![]), move || {
                log.borrow_mut().push("create");
                let log = Rc::clone(&log);
                let cleanup: EffectCleanup = Rc::new(move || log.borrow_mut().push("cleanup"));
                Some(cleanup)
            })?;
            Ok(Element::host("div").into())
        })
    };

    let mut h = Harness::new();
    h.render_and_flush(Element::component(component)).unwrap();
    assert_eq!(*log.borrow(), vec!["create"]);

    h.render_and_flush(Children::None).unwrap();
    assert_eq!(*log.borrow(), vec!["create", "cleanup"]);
    assert_eq!(h.snapshot(), "#container");

    // Nothing left to flush; pumping again changes nothing.
    h.flush_all().unwrap();
    assert_eq!(*log.borrow(), vec!["create", "cleanup"]);
    assert!(h.host().is_idle());
}
