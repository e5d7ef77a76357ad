// SPDX-License-Identifier: Apache-2.0
//! The hook runtime.
//!
//! Every stateful call inside a component body occupies one slot in the
//! node's hook list, in call order. The list must have the same length and
//! slot kinds on every render of the same node; a mismatch is a fatal
//! consistency violation surfaced as a [`ReconcileError`].
//!
//! All render-scoped cursors live in [`HookContext`], which is threaded
//! into the component body — there is no ambient "currently rendering"
//! state. Mount and update behavior are selected by an explicit
//! [`HookMode`] instead of swapped dispatch tables.
//!
//! State dispatches issued outside the render (from effects or the
//! embedder) land in a shared inbox; the reconciler drains it after every
//! deferred-effect flush and on
//! [`Reconciler::flush_updates`](crate::Reconciler::flush_updates), where
//! each entry is assigned the lane of the ambient scheduler priority,
//! enqueued, and scheduled against the owning root.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::element::{Deps, Props};
use crate::error::ReconcileError;
use crate::flags::EffectTags;
use crate::lane::Lanes;
use crate::node::NodeKey;
use crate::update_queue::{Action, Processed, QueueAck, UpdateQueue};

/// Type-erased state stored in a state hook slot.
pub type StateValue = Rc<dyn Any>;

/// An effect's create callback; returns the cleanup to run before the next
/// create (or on unmount).
pub type EffectCreate = Rc<dyn Fn() -> Option<EffectCleanup>>;

/// An effect's cleanup callback.
pub type EffectCleanup = Rc<dyn Fn()>;

/// One deferred effect record.
pub struct Effect {
    /// Kind plus whether the effect must run this commit.
    pub tag: EffectTags,
    /// Create callback.
    pub create: EffectCreate,
    /// Cleanup produced by the previous create, if it has run.
    pub destroy: Option<EffectCleanup>,
    /// Dependency list; `None` re-runs every render.
    pub deps: Option<Deps>,
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("tag", &self.tag)
            .field("has_destroy", &self.destroy.is_some())
            .finish_non_exhaustive()
    }
}

/// A state hook slot.
#[derive(Clone)]
pub struct StateHook {
    /// State after the last processing pass.
    pub memoized: StateValue,
    /// Base state for skip-and-replay.
    pub base: StateValue,
    /// Pending updates, shared across node generations.
    pub queue: Rc<RefCell<UpdateQueue<StateValue>>>,
}

impl fmt::Debug for StateHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StateHook(..)")
    }
}

/// One hook slot.
#[derive(Debug, Clone)]
pub enum Hook {
    /// State slot.
    State(StateHook),
    /// Effect slot.
    Effect(Rc<RefCell<Effect>>),
}

/// Whether the node is rendering for the first time or re-rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookMode {
    /// No previous hook list exists; slots are allocated fresh.
    Mount,
    /// Slots are walked positionally against the previous list.
    Update,
}

/// A state dispatch awaiting lane assignment and scheduling.
pub(crate) struct Dispatch {
    /// The node the dispatch targets (for root lookup).
    pub node: NodeKey,
    /// The shared queue the record will be enqueued on.
    pub queue: Rc<RefCell<UpdateQueue<StateValue>>>,
    /// The requested change.
    pub action: Action<StateValue>,
}

/// Inbox of dispatches issued from user code.
#[derive(Default)]
pub(crate) struct Inbox {
    pub entries: Vec<Dispatch>,
}

pub(crate) type SharedInbox = Rc<RefCell<Inbox>>;

/// Handle for dispatching state changes to one state hook.
///
/// Clones freely; remains valid across renders (the underlying queue is
/// shared between node generations). Dispatching against an unmounted node
/// is dropped with a warning when the inbox is drained.
pub struct Updater<T> {
    node: NodeKey,
    queue: Rc<RefCell<UpdateQueue<StateValue>>>,
    inbox: SharedInbox,
    _state: PhantomData<fn(T)>,
}

impl<T> Clone for Updater<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node,
            queue: Rc::clone(&self.queue),
            inbox: Rc::clone(&self.inbox),
            _state: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Updater<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater").field("node", &self.node).finish()
    }
}

impl<T: Clone + 'static> Updater<T> {
    /// Requests that the state be replaced with `value`.
    pub fn set(&self, value: T) {
        self.push(Action::Replace(Rc::new(value) as StateValue));
    }

    /// Requests that the next state be computed from the current one.
    pub fn update(&self, f: impl Fn(&T) -> T + 'static) {
        let apply = Rc::new(move |state: &StateValue| -> StateValue {
            state.downcast_ref::<T>().map_or_else(
                || {
                    tracing::warn!("state updater saw foreign state type; keeping prior state");
                    Rc::clone(state)
                },
                |current| Rc::new(f(current)) as StateValue,
            )
        });
        self.push(Action::Apply(apply));
    }

    fn push(&self, action: Action<StateValue>) {
        self.inbox.borrow_mut().entries.push(Dispatch {
            node: self.node,
            queue: Rc::clone(&self.queue),
            action,
        });
    }
}

/// Render-scoped hook cursors for one component invocation.
pub struct HookContext<'a> {
    mode: HookMode,
    node: NodeKey,
    render_lanes: Lanes,
    prev: &'a [Hook],
    cursor: usize,
    next: Vec<Hook>,
    inbox: SharedInbox,
    needs_passive: bool,
    acks: Vec<QueueAck>,
}

impl<'a> HookContext<'a> {
    pub(crate) fn new(
        mode: HookMode,
        node: NodeKey,
        render_lanes: Lanes,
        prev: &'a [Hook],
        inbox: SharedInbox,
    ) -> Self {
        Self {
            mode,
            node,
            render_lanes,
            prev,
            cursor: 0,
            next: Vec::with_capacity(prev.len()),
            inbox,
            needs_passive: false,
            acks: Vec::new(),
        }
    }

    /// A state slot.
    ///
    /// On mount, stores the produced initial value. On update, applies the
    /// slot's pending updates at the render lanes (skip-and-replay). Returns
    /// the current value and an [`Updater`] bound to this slot.
    ///
    /// # Errors
    /// Fails when the hook call count, kind, or state type diverges from the
    /// previous render of this node.
    pub fn use_state<T: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> Result<(T, Updater<T>), ReconcileError> {
        let index = self.cursor;
        self.cursor += 1;

        let slot = match self.mode {
            HookMode::Mount => {
                let value: StateValue = Rc::new(init());
                StateHook {
                    memoized: Rc::clone(&value),
                    base: value,
                    queue: Rc::new(RefCell::new(UpdateQueue::new())),
                }
            }
            HookMode::Update => {
                let (queue, base) = match self.prev_slot(index)? {
                    Hook::State(prev) => (Rc::clone(&prev.queue), Rc::clone(&prev.base)),
                    Hook::Effect(_) => return Err(ReconcileError::HookKindMismatch { index }),
                };
                let Processed {
                    memoized,
                    base,
                    seen,
                    residual,
                } = queue.borrow().plan(base, self.render_lanes);
                // The plan is consumed from the shared log only when this
                // render commits; a discarded render leaves it replayable.
                if seen > 0 {
                    let planned = Rc::clone(&queue);
                    self.acks.push(Box::new(move || {
                        planned.borrow_mut().acknowledge(seen, residual);
                    }));
                }
                StateHook {
                    memoized,
                    base,
                    queue,
                }
            }
        };

        let value = slot
            .memoized
            .downcast_ref::<T>()
            .cloned()
            .ok_or(ReconcileError::StateTypeMismatch { index })?;
        let updater = Updater {
            node: self.node,
            queue: Rc::clone(&slot.queue),
            inbox: Rc::clone(&self.inbox),
            _state: PhantomData,
        };
        self.next.push(Hook::State(slot));
        Ok((value, updater))
    }

    /// A deferred-effect slot.
    ///
    /// On mount the effect always runs this commit. On update it re-runs
    /// only when `deps` differ element-wise from the previous render (or
    /// when `deps` is `None`); the previous cleanup is retained for the
    /// commit phase to invoke before the new create runs.
    ///
    /// # Errors
    /// Fails when the hook call count or kind diverges from the previous
    /// render of this node.
    pub fn use_effect(
        &mut self,
        deps: Option<Deps>,
        create: impl Fn() -> Option<EffectCleanup> + 'static,
    ) -> Result<(), ReconcileError> {
        let index = self.cursor;
        self.cursor += 1;
        let create: EffectCreate = Rc::new(create);

        let effect = match self.mode {
            HookMode::Mount => {
                self.needs_passive = true;
                Effect {
                    tag: EffectTags::PASSIVE | EffectTags::HAS_EFFECT,
                    create,
                    destroy: None,
                    deps,
                }
            }
            HookMode::Update => {
                let (prev_destroy, prev_deps) = match self.prev_slot(index)? {
                    Hook::Effect(prev) => {
                        let prev = prev.borrow();
                        (prev.destroy.clone(), prev.deps.clone())
                    }
                    Hook::State(_) => return Err(ReconcileError::HookKindMismatch { index }),
                };
                let unchanged = matches!(
                    (&deps, &prev_deps),
                    (Some(next), Some(old)) if next == old
                );
                if unchanged {
                    Effect {
                        tag: EffectTags::PASSIVE,
                        create,
                        destroy: prev_destroy,
                        deps,
                    }
                } else {
                    self.needs_passive = true;
                    Effect {
                        tag: EffectTags::PASSIVE | EffectTags::HAS_EFFECT,
                        create,
                        destroy: prev_destroy,
                        deps,
                    }
                }
            }
        };

        self.next.push(Hook::Effect(Rc::new(RefCell::new(effect))));
        Ok(())
    }

    fn prev_slot(&self, index: usize) -> Result<&Hook, ReconcileError> {
        self.prev
            .get(index)
            .ok_or(ReconcileError::HookCountMismatch {
                called: index + 1,
                recorded: self.prev.len(),
            })
    }

    /// Verifies the closing invariant and yields the new hook list, whether
    /// any effect must run this commit, and the queue acknowledgements to
    /// run when (and only when) this render commits.
    pub(crate) fn finish(self) -> Result<(Vec<Hook>, bool, Vec<QueueAck>), ReconcileError> {
        if self.mode == HookMode::Update && self.cursor < self.prev.len() {
            return Err(ReconcileError::HookCountUnderrun {
                called: self.cursor,
                recorded: self.prev.len(),
            });
        }
        Ok((self.next, self.needs_passive, self.acks))
    }
}

/// Invokes a component body with a fresh hook context.
///
/// Free function (rather than a `Reconciler` method) so the borrow of the
/// previous hook list stays local to the call.
pub(crate) fn render_component(
    component: &crate::element::Component,
    props: &Props,
    mode: HookMode,
    node: NodeKey,
    render_lanes: Lanes,
    prev: &[Hook],
    inbox: SharedInbox,
) -> Result<(crate::element::Children, Vec<Hook>, bool, Vec<QueueAck>), ReconcileError> {
    let mut cx = HookContext::new(mode, node, render_lanes, prev, inbox);
    let children = component.render(&mut cx, props)?;
    let (hooks, needs_passive, acks) = cx.finish()?;
    Ok((children, hooks, needs_passive, acks))
}
