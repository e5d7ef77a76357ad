// SPDX-License-Identifier: Apache-2.0
//! Scheduling and the render work loop.
//!
//! One scheduling decision per root: whichever lane set is
//! highest-priority pending wins the root's single callback slot.
//! Synchronous work coalesces through a microtask-flushed queue so that
//! several same-turn updates produce one render; everything else goes
//! through the host's prioritized callback queue and renders in time
//! slices, yielding between units of work whenever the host asks.
//!
//! A render that fails (hook misuse, component error) is discarded whole:
//! the work-in-progress tree is dropped, the render's lane is cleared so
//! the scheduler cannot wedge on it, and the error propagates to the
//! embedder.

use crate::error::ReconcileError;
use crate::host::{HostConfig, HostScheduler, Task};
use crate::lane::{priority_of_lanes, Lanes};
use crate::node::{NodeKey, NodeProps, RootId};
use crate::reconciler::{Reconciler, RenderCursor};

/// How a render excursion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderOutcome {
    /// The whole tree was processed; finished work is staged on the root.
    Completed,
    /// The host asked for the thread back; the cursor holds the resume
    /// position.
    Yielded,
}

impl<H: HostConfig + HostScheduler> Reconciler<H> {
    /// Reconciles the root's callback slot with its highest-priority
    /// pending lane: cancels a stale callback, queues sync work on the
    /// microtask path, and schedules everything else on the host scheduler.
    pub(crate) fn ensure_root_is_scheduled(&mut self, root: RootId) {
        let Some(descriptor) = self.roots.get(root) else {
            return;
        };
        let next = descriptor.pending_lanes.highest_priority();

        if next.is_none() {
            if let Some(handle) = self.roots[root].callback_handle.take() {
                self.host.cancel_callback(handle);
            }
            self.roots[root].callback_lanes = Lanes::NONE;
            return;
        }
        if descriptor.callback_lanes == next {
            // The existing callback already covers this priority.
            return;
        }
        if let Some(handle) = self.roots[root].callback_handle.take() {
            self.host.cancel_callback(handle);
        }

        if next == Lanes::SYNC {
            if !self.sync_queue.contains(&root) {
                self.sync_queue.push(root);
            }
            self.host.schedule_microtask(Task::FlushSyncQueue);
            self.roots[root].callback_lanes = Lanes::SYNC;
        } else {
            let handle = self.alloc_handle();
            self.host.schedule_callback(
                priority_of_lanes(next),
                handle,
                Task::PerformWorkOnRoot { root, handle },
            );
            self.roots[root].callback_handle = Some(handle);
            self.roots[root].callback_lanes = next;
        }
    }

    /// Drains the synchronous queue. Reentrant calls (an effect or a sync
    /// render scheduling more sync work) fold into the running drain.
    pub(crate) fn flush_sync_callbacks(&mut self) -> Result<(), ReconcileError> {
        if self.is_flushing_sync {
            return Ok(());
        }
        self.is_flushing_sync = true;
        while !self.sync_queue.is_empty() {
            let root = self.sync_queue.remove(0);
            if let Err(error) = self.perform_sync_work_on_root(root) {
                self.is_flushing_sync = false;
                return Err(error);
            }
        }
        self.is_flushing_sync = false;
        Ok(())
    }

    /// One uninterruptible render-and-commit of the root's sync lane.
    fn perform_sync_work_on_root(&mut self, root: RootId) -> Result<(), ReconcileError> {
        self.flush_passive_effects(root)?;
        let Some(descriptor) = self.roots.get(root) else {
            return Ok(());
        };
        // The queue entry may be stale: effects may have consumed or
        // outranked the sync work since it was queued.
        if descriptor.pending_lanes.highest_priority() != Lanes::SYNC {
            self.roots[root].callback_lanes = Lanes::NONE;
            self.ensure_root_is_scheduled(root);
            return Ok(());
        }

        match self.render_root(root, Lanes::SYNC, false)? {
            RenderOutcome::Completed => {}
            RenderOutcome::Yielded => {
                return Err(ReconcileError::Internal("sync render yielded"));
            }
        }
        self.commit_root(root)?;
        self.roots[root].callback_lanes = Lanes::NONE;
        self.ensure_root_is_scheduled(root);
        Ok(())
    }

    /// One time-sliced render excursion for the root's highest pending
    /// lane. No-op when `handle` is no longer the root's live callback.
    pub(crate) fn perform_concurrent_work_on_root(
        &mut self,
        root: RootId,
        handle: crate::host::CallbackHandle,
    ) -> Result<(), ReconcileError> {
        let live = |r: &Self| {
            r.roots
                .get(root)
                .is_some_and(|d| d.callback_handle == Some(handle))
        };
        if !live(self) {
            return Ok(());
        }

        // Deferred effects run before any new render; they may dispatch
        // updates that reschedule this root and retire our handle.
        self.flush_passive_effects(root)?;
        if !live(self) {
            return Ok(());
        }

        let next = self.roots[root].pending_lanes.highest_priority();
        if next.is_none() {
            self.roots[root].callback_handle = None;
            self.roots[root].callback_lanes = Lanes::NONE;
            return Ok(());
        }
        if next == Lanes::SYNC {
            // Sync work outranked us; hand over to the microtask path.
            self.roots[root].callback_handle = None;
            self.roots[root].callback_lanes = Lanes::NONE;
            self.ensure_root_is_scheduled(root);
            return Ok(());
        }

        match self.render_root(root, next, true)? {
            RenderOutcome::Yielded => {
                // Continuation under a fresh handle, same priority.
                let handle = self.alloc_handle();
                self.host.schedule_callback(
                    priority_of_lanes(next),
                    handle,
                    Task::PerformWorkOnRoot { root, handle },
                );
                self.roots[root].callback_handle = Some(handle);
                self.roots[root].callback_lanes = next;
            }
            RenderOutcome::Completed => {
                self.commit_root(root)?;
                self.roots[root].callback_handle = None;
                self.roots[root].callback_lanes = Lanes::NONE;
                self.ensure_root_is_scheduled(root);
            }
        }
        Ok(())
    }

    /// Renders `root` at `lanes`, resuming an in-flight render of the same
    /// work or starting fresh (which discards any other in-flight render).
    fn render_root(
        &mut self,
        root: RootId,
        lanes: Lanes,
        sliced: bool,
    ) -> Result<RenderOutcome, ReconcileError> {
        let resumable = self
            .cursor
            .as_ref()
            .is_some_and(|c| c.root == root && c.lanes == lanes && c.wip.is_some());
        if !resumable {
            self.prepare_fresh_stack(root, lanes);
        }

        loop {
            let Some(wip) = self.cursor.as_ref().and_then(|c| c.wip) else {
                break;
            };
            if sliced && self.host.should_yield() {
                return Ok(RenderOutcome::Yielded);
            }
            if let Err(error) = self.perform_unit_of_work(wip, lanes) {
                tracing::error!(%error, ?root, "render aborted; work-in-progress discarded");
                self.cursor = None;
                self.render_acks.clear();
                let descriptor = &mut self.roots[root];
                descriptor.pending_lanes = descriptor.pending_lanes.remove(lanes);
                descriptor.callback_handle = None;
                descriptor.callback_lanes = Lanes::NONE;
                self.ensure_root_is_scheduled(root);
                return Err(error);
            }
        }

        self.cursor = None;
        let finished = self.nodes[self.roots[root].current]
            .alternate
            .ok_or(ReconcileError::Internal("completed render without tree"))?;
        self.roots[root].finished_work = Some(finished);
        self.roots[root].finished_lanes = lanes;
        Ok(RenderOutcome::Completed)
    }

    /// Starts a work-in-progress tree from the root's committed tree. Any
    /// abandoned render's planned queue consumptions are dropped with it,
    /// leaving its updates replayable.
    fn prepare_fresh_stack(&mut self, root: RootId, lanes: Lanes) {
        self.render_acks.clear();
        let current = self.roots[root].current;
        let wip = self.create_work_in_progress(current, NodeProps::Root);
        self.roots[root].finished_work = None;
        self.roots[root].finished_lanes = Lanes::NONE;
        self.cursor = Some(RenderCursor {
            root,
            wip: Some(wip),
            lanes,
        });
    }

    /// Begin one node, then either descend or complete upward.
    fn perform_unit_of_work(&mut self, wip: NodeKey, lanes: Lanes) -> Result<(), ReconcileError> {
        let next = self.begin_work(wip, lanes)?;
        let pending = self.nodes[wip].pending.clone();
        self.nodes[wip].memoized = Some(pending);

        match next {
            Some(child) => {
                if let Some(cursor) = self.cursor.as_mut() {
                    cursor.wip = Some(child);
                }
                Ok(())
            }
            None => self.complete_unit_of_work(wip),
        }
    }

    /// Completes nodes upward until one has an unprocessed sibling (the
    /// next unit) or the root completes (ending the render).
    fn complete_unit_of_work(&mut self, node: NodeKey) -> Result<(), ReconcileError> {
        let mut current = node;
        loop {
            self.complete_work(current)?;
            if let Some(sibling) = self.nodes[current].sibling {
                if let Some(cursor) = self.cursor.as_mut() {
                    cursor.wip = Some(sibling);
                }
                return Ok(());
            }
            match self.nodes[current].parent {
                Some(parent) => current = parent,
                None => {
                    if let Some(cursor) = self.cursor.as_mut() {
                        cursor.wip = None;
                    }
                    return Ok(());
                }
            }
        }
    }
}
