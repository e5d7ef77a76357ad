// SPDX-License-Identifier: Apache-2.0
//! The narrow host-operations seam.
//!
//! The reconciler never touches a concrete host environment. Everything it
//! needs — materializing instances, splicing them into the host tree, and
//! scheduling its own continuation — goes through [`HostConfig`] and
//! [`HostScheduler`].
//!
//! Scheduling is inverted relative to a closure-based host: the reconciler
//! hands the host a plain [`Task`] value together with a reconciler-issued
//! [`CallbackHandle`], and the embedder later pumps due tasks back into
//! [`Reconciler::execute_task`](crate::Reconciler::execute_task). A handle
//! that was cancelled (or superseded) makes the corresponding task a no-op.

use std::fmt;

use crate::element::Props;
use crate::node::RootId;

/// General-purpose host scheduler priority levels.
///
/// Each level maps bijectively onto a priority lane; see [`crate::lane`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SchedulerPriority {
    /// Must run before the current turn ends.
    Immediate,
    /// Discrete or continuous user input.
    UserBlocking,
    /// Ordinary work.
    Normal,
    /// Runs only in host idle time.
    Idle,
}

/// Identity of one scheduled host callback.
///
/// Issued by the reconciler (monotonically increasing) and passed to
/// [`HostScheduler::schedule_callback`]; at most one handle is live per root
/// at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackHandle(pub u64);

/// A unit of reconciler work the host hands back via
/// [`Reconciler::execute_task`](crate::Reconciler::execute_task).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Drain the synchronous callback queue (scheduled as a microtask so
    /// that several synchronous updates in one turn coalesce into a single
    /// render).
    FlushSyncQueue,
    /// Render (or resume rendering) the highest-priority pending lane of
    /// `root`. Stale if `handle` is no longer the root's current callback.
    PerformWorkOnRoot {
        /// The root to render.
        root: RootId,
        /// The handle this task was scheduled under.
        handle: CallbackHandle,
    },
    /// Run the deferred-effect queues accumulated for `root`.
    FlushPassiveEffects {
        /// The root whose effect queues should be flushed.
        root: RootId,
    },
}

/// Host-tree operations consumed by the reconciler.
///
/// Containers are instances: the root container passed to
/// [`Reconciler::create_root`](crate::Reconciler::create_root) is an
/// ordinary [`HostConfig::Instance`].
pub trait HostConfig {
    /// Opaque handle to one realized host node (element or text).
    type Instance: Clone + PartialEq + fmt::Debug;

    /// Creates a host element instance. Props travel with the call; the
    /// host owns any per-instance bookkeeping for them.
    fn create_instance(&mut self, ty: &str, props: &Props) -> Self::Instance;

    /// Creates a host text instance with the given content.
    fn create_text_instance(&mut self, content: &str) -> Self::Instance;

    /// Appends `child` as the last child of `parent`.
    fn append_child(&mut self, parent: &Self::Instance, child: &Self::Instance);

    /// Inserts `child` immediately before `before` under `parent`.
    fn insert_child_before(
        &mut self,
        parent: &Self::Instance,
        child: &Self::Instance,
        before: &Self::Instance,
    );

    /// Detaches `child` from `parent`.
    fn remove_child(&mut self, parent: &Self::Instance, child: &Self::Instance);

    /// Replaces the content of a text instance.
    fn update_text(&mut self, instance: &Self::Instance, content: &str);

    /// Commits new props onto an element instance.
    fn update_instance(&mut self, instance: &Self::Instance, props: &Props);

    /// Queues `task` to run at the end of the current turn, before any
    /// time-sliced callback.
    fn schedule_microtask(&mut self, task: Task);
}

/// Host callback-scheduling operations consumed by the reconciler.
pub trait HostScheduler {
    /// Queues `task` to run at `priority`. The reconciler-issued `handle`
    /// identifies the callback for cancellation and staleness checks.
    fn schedule_callback(&mut self, priority: SchedulerPriority, handle: CallbackHandle, task: Task);

    /// Cancels a previously scheduled callback. Cancelling an already-run
    /// or unknown handle is a no-op.
    fn cancel_callback(&mut self, handle: CallbackHandle);

    /// Cooperative yield signal consulted between units of work during a
    /// time-sliced render.
    fn should_yield(&mut self) -> bool;

    /// The ambient priority of the currently executing context; new updates
    /// request their lane from this.
    fn current_priority(&self) -> SchedulerPriority;
}
