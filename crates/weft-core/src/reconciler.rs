// SPDX-License-Identifier: Apache-2.0
//! The reconciler: arena, roots, and the entry points collaborators use.
//!
//! One `Reconciler` owns everything: the work-node arena, the root
//! descriptors, the dispatch inbox, and the host. Single-threaded by
//! construction; "concurrency" is cooperative interleaving of renders at
//! unit-of-work boundaries, never parallelism.

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::SlotMap;

use crate::element::Children;
use crate::error::ReconcileError;
use crate::hooks::{Inbox, SharedInbox};
use crate::host::{CallbackHandle, HostConfig, HostScheduler, Task};
use crate::lane::{lane_from_priority, Lanes};
use crate::node::{NodeKey, NodeProps, Root, RootId, RootNodeState, WorkNode, WorkTag};
use crate::update_queue::{Action, QueueAck, UpdateRecord};

/// In-flight render position, preserved across time slices.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RenderCursor {
    /// The root being rendered.
    pub root: RootId,
    /// Next unit of work; `None` once the walk returned to the root.
    pub wip: Option<NodeKey>,
    /// The lane set this render executes at.
    pub lanes: Lanes,
}

/// The reconciliation engine.
pub struct Reconciler<H: HostConfig + HostScheduler> {
    pub(crate) host: H,
    pub(crate) nodes: SlotMap<NodeKey, WorkNode<H::Instance>>,
    pub(crate) roots: SlotMap<RootId, Root<H::Instance>>,
    pub(crate) inbox: SharedInbox,
    pub(crate) sync_queue: Vec<RootId>,
    pub(crate) is_flushing_sync: bool,
    pub(crate) cursor: Option<RenderCursor>,
    /// Queue consumptions planned by the in-flight render; run at its
    /// commit, discarded with it.
    pub(crate) render_acks: Vec<QueueAck>,
    next_handle: u64,
}

impl<H: HostConfig + HostScheduler> Reconciler<H> {
    /// Creates an engine over the given host.
    pub fn new(host: H) -> Self {
        Self {
            host,
            nodes: SlotMap::with_key(),
            roots: SlotMap::with_key(),
            inbox: Rc::new(RefCell::new(Inbox::default())),
            sync_queue: Vec::new(),
            is_flushing_sync: false,
            cursor: None,
            render_acks: Vec::new(),
            next_handle: 0,
        }
    }

    /// Borrows the host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutably borrows the host (e.g. for the embedder's pump loop).
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Creates an independent tree rendering into `container`.
    pub fn create_root(&mut self, container: H::Instance) -> RootId {
        let root_id = self.roots.insert(Root::new(container));
        let mut node = WorkNode::new(WorkTag::HostRoot, NodeProps::Root, None);
        node.root = Some(root_id);
        node.root_state = Some(RootNodeState::new());
        let key = self.nodes.insert(node);
        self.roots[root_id].current = key;
        tracing::debug!(?root_id, "root created");
        root_id
    }

    /// Enqueues a new tree description for `root` at the ambient priority
    /// and schedules a render.
    pub fn update_root(&mut self, root: RootId, children: Children) {
        let Some(descriptor) = self.roots.get(root) else {
            tracing::warn!(?root, "update_root against unknown root; dropped");
            return;
        };
        let root_node = descriptor.current;
        let lane = lane_from_priority(self.host.current_priority());
        {
            let Some(node) = self.nodes.get(root_node) else {
                tracing::warn!(?root, "root node missing from arena; dropped");
                return;
            };
            let Some(state) = node.root_state.as_ref() else {
                tracing::warn!(?root, "root node has no root state; dropped");
                return;
            };
            state.queue.borrow_mut().enqueue(UpdateRecord {
                action: Action::Replace(children),
                lane,
            });
        }
        self.schedule_update_on_node(root_node, lane);
    }

    /// Drains externally issued state dispatches: assigns each the lane of
    /// the ambient scheduler priority, enqueues it, and schedules a render
    /// for the owning root.
    pub fn flush_updates(&mut self) {
        loop {
            let entries = std::mem::take(&mut self.inbox.borrow_mut().entries);
            if entries.is_empty() {
                return;
            }
            for dispatch in entries {
                let lane = lane_from_priority(self.host.current_priority());
                dispatch.queue.borrow_mut().enqueue(UpdateRecord {
                    action: dispatch.action,
                    lane,
                });
                self.schedule_update_on_node(dispatch.node, lane);
            }
        }
    }

    /// Runs one host-delivered task.
    ///
    /// # Errors
    /// Returns the consistency violation that aborted a render, if any. The
    /// offending render has already been discarded and its lane cleared.
    pub fn execute_task(&mut self, task: Task) -> Result<(), ReconcileError> {
        match task {
            Task::FlushSyncQueue => self.flush_sync_callbacks(),
            Task::PerformWorkOnRoot { root, handle } => {
                self.perform_concurrent_work_on_root(root, handle)
            }
            Task::FlushPassiveEffects { root } => {
                self.flush_passive_effects(root)?;
                Ok(())
            }
        }
    }

    /// Walks parent links to the owning root and records `lane` as pending,
    /// then makes sure a render is scheduled.
    pub(crate) fn schedule_update_on_node(&mut self, node: NodeKey, lane: Lanes) {
        let Some(root) = self.find_root_for_node(node) else {
            tracing::warn!(?node, "update against node with no owning root; dropped");
            return;
        };
        let descriptor = &mut self.roots[root];
        descriptor.pending_lanes = descriptor.pending_lanes.merge(lane);
        self.ensure_root_is_scheduled(root);
    }

    /// Resolves the root a node belongs to by walking its parent links.
    ///
    /// Returns `None` for freed nodes and for nodes detached from any root
    /// (for example, a subtree abandoned by a discarded render).
    #[must_use]
    pub fn owning_root(&self, node: NodeKey) -> Option<RootId> {
        self.find_root_for_node(node)
    }

    pub(crate) fn find_root_for_node(&self, node: NodeKey) -> Option<RootId> {
        let mut key = node;
        loop {
            let n = self.nodes.get(key)?;
            match n.parent {
                Some(parent) => key = parent,
                None => return if n.tag == WorkTag::HostRoot { n.root } else { None },
            }
        }
    }

    pub(crate) fn alloc_handle(&mut self) -> CallbackHandle {
        self.next_handle += 1;
        CallbackHandle(self.next_handle)
    }
}
