// SPDX-License-Identifier: Apache-2.0
//! Per-node pending-state logs.
//!
//! Each stateful position owns one [`UpdateQueue`]. The queue object is
//! shared (via `Rc`) between the current node and its work-in-progress
//! alternate so that updates enqueued against either generation land in the
//! same log — the Rust rendition of the original's shared circular list,
//! with a `VecDeque` standing in for the ring (front = oldest, back = the
//! `pending` pointer).
//!
//! Processing is two-phase so that a discarded render cannot lose updates:
//! [`UpdateQueue::plan`] reads the log without consuming it, and the records
//! it accounted for are removed only when the render that planned them
//! commits, via [`UpdateQueue::acknowledge`]. A render that is preempted or
//! fails simply never acknowledges, leaving the full log in place for the
//! restart.
//!
//! A plan realizes skip-and-replay: records whose lane is not satisfied by
//! the render lanes land on a residual log (replayed by a later render) and
//! the base state is snapshotted at the first skip, so a low-priority update
//! interleaved with higher-priority ones is never lost and never applied out
//! of its enqueue position relative to its own lane.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::lane::Lanes;

/// Deferred queue consumption, run when the render that planned it commits.
pub(crate) type QueueAck = Box<dyn FnOnce()>;

/// A requested state change.
#[derive(Clone)]
pub enum Action<S> {
    /// Replace the state with the given value.
    Replace(S),
    /// Compute the next state from the current one.
    Apply(Rc<dyn Fn(&S) -> S>),
}

impl<S: Clone> Action<S> {
    fn apply(&self, state: &S) -> S {
        match self {
            Self::Replace(next) => next.clone(),
            Self::Apply(f) => f(state),
        }
    }
}

impl<S> std::fmt::Debug for Action<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Replace(_) => f.write_str("Action::Replace(..)"),
            Self::Apply(_) => f.write_str("Action::Apply(..)"),
        }
    }
}

/// One state-change request with its priority lane.
#[derive(Debug, Clone)]
pub struct UpdateRecord<S> {
    /// The requested change.
    pub action: Action<S>,
    /// The lane the change was requested at.
    pub lane: Lanes,
}

/// Result of one planning pass.
#[derive(Debug)]
pub struct Processed<S> {
    /// Final state after applying every satisfied record.
    pub memoized: S,
    /// State as of the first skipped record (or `memoized` when nothing was
    /// skipped); the next pass resumes from here.
    pub base: S,
    /// How many log records the plan accounted for; [`UpdateQueue::acknowledge`]
    /// replaces exactly that prefix with `residual`.
    pub seen: usize,
    /// Records the next pass must replay (skipped ones at their own lane,
    /// applied-after-a-skip ones with their lane cleared).
    pub residual: VecDeque<UpdateRecord<S>>,
}

/// An ordered log of pending updates.
#[derive(Debug, Default)]
pub struct UpdateQueue<S> {
    pending: VecDeque<UpdateRecord<S>>,
}

impl<S: Clone> UpdateQueue<S> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    /// Appends a record, preserving arrival order.
    pub fn enqueue(&mut self, record: UpdateRecord<S>) {
        self.pending.push_back(record);
    }

    /// True when no records are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Union of the lanes of every pending record.
    #[must_use]
    pub fn pending_lanes(&self) -> Lanes {
        self.pending
            .iter()
            .fold(Lanes::NONE, |acc, r| acc.merge(r.lane))
    }

    /// Walks the log once at `render_lanes` without consuming it.
    ///
    /// Satisfied records fold into the running state in arrival order. From
    /// the first skipped record onward, every record joins the residual —
    /// including satisfied ones, whose lane is cleared so a replay re-applies
    /// them unconditionally. Replaying from the base snapshot therefore
    /// always converges on the same state as applying the full log in
    /// arrival order.
    ///
    /// The log itself is untouched: call [`Self::acknowledge`] with the
    /// returned `seen`/`residual` when the render commits, or drop the plan
    /// to leave every record in place.
    #[must_use]
    pub fn plan(&self, base: S, render_lanes: Lanes) -> Processed<S> {
        let mut state = base;
        let mut base_state: Option<S> = None;
        let mut residual = VecDeque::new();

        for record in &self.pending {
            if record.lane.is_subset_of(render_lanes) {
                state = record.action.apply(&state);
                if base_state.is_some() {
                    residual.push_back(UpdateRecord {
                        action: record.action.clone(),
                        lane: Lanes::NONE,
                    });
                }
            } else {
                if base_state.is_none() {
                    base_state = Some(state.clone());
                }
                residual.push_back(record.clone());
            }
        }

        Processed {
            base: base_state.unwrap_or_else(|| state.clone()),
            memoized: state,
            seen: self.pending.len(),
            residual,
        }
    }

    /// Commits a plan: replaces the first `seen` records with `residual`,
    /// keeping anything that arrived after the plan was taken.
    pub fn acknowledge(&mut self, seen: usize, residual: VecDeque<UpdateRecord<S>>) {
        let tail = self.pending.split_off(seen.min(self.pending.len()));
        self.pending = residual;
        self.pending.extend(tail);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replace(n: i32, lane: Lanes) -> UpdateRecord<i32> {
        UpdateRecord {
            action: Action::Replace(n),
            lane,
        }
    }

    fn add(n: i32, lane: Lanes) -> UpdateRecord<i32> {
        UpdateRecord {
            action: Action::Apply(Rc::new(move |s: &i32| s + n)),
            lane,
        }
    }

    #[test]
    fn applies_in_enqueue_order() {
        let mut q = UpdateQueue::new();
        q.enqueue(replace(1, Lanes::SYNC));
        q.enqueue(add(10, Lanes::SYNC));
        q.enqueue(add(100, Lanes::SYNC));

        let out = q.plan(0, Lanes::SYNC);
        assert_eq!(out.memoized, 111);
        assert_eq!(out.base, 111);
        q.acknowledge(out.seen, out.residual);
        assert!(q.is_empty());
    }

    #[test]
    fn skips_and_replays_unsatisfied_lanes() {
        let mut q = UpdateQueue::new();
        q.enqueue(add(1, Lanes::SYNC));
        q.enqueue(add(10, Lanes::DEFAULT));
        q.enqueue(add(100, Lanes::SYNC));

        // Sync render: the default-lane record is skipped, base snapshots at
        // the skip point, and the later sync record is retained for replay.
        let out = q.plan(0, Lanes::SYNC);
        assert_eq!(out.memoized, 101);
        assert_eq!(out.base, 1);
        q.acknowledge(out.seen, out.residual);
        assert_eq!(q.pending_lanes(), Lanes::DEFAULT);

        // Replay re-applies everything from the skip point in order.
        let replay = q.plan(out.base, Lanes::DEFAULT);
        assert_eq!(replay.memoized, 111);
        assert_eq!(replay.base, 111);
        q.acknowledge(replay.seen, replay.residual);
        assert!(q.is_empty());
    }

    #[test]
    fn base_snapshot_is_first_skip_only() {
        let mut q = UpdateQueue::new();
        q.enqueue(add(10, Lanes::DEFAULT));
        q.enqueue(add(1, Lanes::SYNC));

        let out = q.plan(0, Lanes::SYNC);
        assert_eq!(out.memoized, 1);
        // Skip happened before anything applied.
        assert_eq!(out.base, 0);
    }

    #[test]
    fn unacknowledged_plan_leaves_the_log_intact() {
        let mut q = UpdateQueue::new();
        q.enqueue(add(1, Lanes::DEFAULT));

        // A render plans the record, then is discarded without acknowledging.
        let discarded = q.plan(0, Lanes::DEFAULT);
        assert_eq!(discarded.memoized, 1);
        assert_eq!(q.pending_lanes(), Lanes::DEFAULT);

        // The restart sees the full log and converges on the same state.
        let out = q.plan(0, Lanes::DEFAULT.merge(Lanes::SYNC));
        assert_eq!(out.memoized, 1);
        q.acknowledge(out.seen, out.residual);
        assert!(q.is_empty());
    }

    #[test]
    fn acknowledge_keeps_records_that_arrived_after_the_plan() {
        let mut q = UpdateQueue::new();
        q.enqueue(add(1, Lanes::SYNC));
        let out = q.plan(0, Lanes::SYNC);

        // A dispatch lands between the plan and its commit.
        q.enqueue(add(10, Lanes::DEFAULT));
        q.acknowledge(out.seen, out.residual);

        let replay = q.plan(out.memoized, Lanes::DEFAULT);
        assert_eq!(replay.memoized, 11);
    }
}
