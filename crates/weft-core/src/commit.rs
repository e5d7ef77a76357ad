// SPDX-License-Identifier: Apache-2.0
//! The commit phase: applying a finished render to the host.
//!
//! Commit is never interrupted. It walks only flagged subtrees (guided by
//! the bubbled flag unions), performs deletions before the node's own
//! placement, and swaps the root's current tree at the end. Deferred
//! effects are not run here; their records are collected onto the root and
//! a flush is scheduled at normal priority.

use std::rc::Rc;

use crate::error::ReconcileError;
use crate::flags::{EffectTags, Flags};
use crate::hooks::Hook;
use crate::host::{HostConfig, HostScheduler, SchedulerPriority, Task};
use crate::lane::Lanes;
use crate::node::{NodeKey, NodeProps, RootId, WorkTag};
use crate::reconciler::Reconciler;

impl<H: HostConfig + HostScheduler> Reconciler<H> {
    /// Applies the root's finished work-in-progress tree to the host and
    /// swaps it in as current.
    pub(crate) fn commit_root(&mut self, root: RootId) -> Result<(), ReconcileError> {
        let Some(finished) = self.roots[root].finished_work.take() else {
            return Ok(());
        };
        let lanes = self.roots[root].finished_lanes;
        self.roots[root].finished_lanes = Lanes::NONE;
        {
            let descriptor = &mut self.roots[root];
            descriptor.pending_lanes = descriptor.pending_lanes.remove(lanes);
        }
        tracing::debug!(?root, ?lanes, "commit");

        // The render is now authoritative: consume the queue records it
        // planned. Discarded renders never reach this point, so their
        // records stay replayable.
        for ack in self.render_acks.drain(..) {
            ack();
        }

        let all_flags = self.nodes[finished].flags | self.nodes[finished].subtree_flags;

        // Deferred effects run later; make sure exactly one flush is queued.
        if all_flags.intersects(Flags::PASSIVE_MASK) && !self.roots[root].passive_flush_scheduled {
            self.roots[root].passive_flush_scheduled = true;
            let handle = self.alloc_handle();
            self.host.schedule_callback(
                SchedulerPriority::Normal,
                handle,
                Task::FlushPassiveEffects { root },
            );
        }

        if all_flags.intersects(Flags::MUTATION_MASK | Flags::PASSIVE_EFFECT) {
            let deleted = self.commit_mutation_effects(root, finished)?;
            self.roots[root].current = finished;
            for key in deleted {
                self.free_subtree(key);
            }
        } else {
            self.roots[root].current = finished;
        }
        Ok(())
    }

    /// Depth-first walk over flagged subtrees, visiting bottom-up. Returns
    /// the roots of the deleted subtrees so the arena slots can be freed
    /// after the walk.
    fn commit_mutation_effects(
        &mut self,
        root: RootId,
        finished: NodeKey,
    ) -> Result<Vec<NodeKey>, ReconcileError> {
        let mask = Flags::MUTATION_MASK | Flags::PASSIVE_EFFECT;
        let mut deleted = Vec::new();

        let mut next = Some(finished);
        while let Some(mut node) = next {
            // Descend while flagged work exists below.
            loop {
                let n = &self.nodes[node];
                if n.subtree_flags.intersects(mask) {
                    if let Some(child) = n.child {
                        node = child;
                        continue;
                    }
                }
                break;
            }
            // Visit, then move to the sibling or climb (visiting ancestors
            // on the way up).
            next = loop {
                self.commit_mutation_effects_on_node(root, node, &mut deleted)?;
                if let Some(sibling) = self.nodes[node].sibling {
                    break Some(sibling);
                }
                match self.nodes[node].parent {
                    Some(parent) => node = parent,
                    None => break None,
                }
            };
        }
        Ok(deleted)
    }

    fn commit_mutation_effects_on_node(
        &mut self,
        root: RootId,
        node: NodeKey,
        deleted: &mut Vec<NodeKey>,
    ) -> Result<(), ReconcileError> {
        let flags = self.nodes[node].flags;

        if flags.contains(Flags::CHILD_DELETION) {
            let children = std::mem::take(&mut self.nodes[node].deletions);
            for child in children {
                self.commit_deletion(root, child);
                deleted.push(child);
            }
            self.nodes[node].flags -= Flags::CHILD_DELETION;
        }

        if flags.contains(Flags::PLACEMENT) {
            self.commit_placement(root, node)?;
            self.nodes[node].flags -= Flags::PLACEMENT;
        }

        if flags.contains(Flags::UPDATE) {
            self.commit_update(node)?;
            self.nodes[node].flags -= Flags::UPDATE;
        }

        if flags.contains(Flags::PASSIVE_EFFECT) {
            self.collect_update_effects(root, node)?;
            self.nodes[node].flags -= Flags::PASSIVE_EFFECT;
        }
        Ok(())
    }

    fn commit_update(&mut self, node: NodeKey) -> Result<(), ReconcileError> {
        let instance = self.nodes[node]
            .instance
            .clone()
            .ok_or(ReconcileError::Internal("update against missing instance"))?;
        match self.nodes[node].pending.clone() {
            NodeProps::Text(content) => self.host.update_text(&instance, &content),
            NodeProps::Host { props, .. } => self.host.update_instance(&instance, &props),
            _ => return Err(ReconcileError::Internal("update flag on non-host node")),
        }
        Ok(())
    }

    /// Moves the node's effect records onto the root for the deferred pass.
    fn collect_update_effects(
        &mut self,
        root: RootId,
        node: NodeKey,
    ) -> Result<(), ReconcileError> {
        let effects: Vec<_> = self.nodes[node]
            .hooks
            .iter()
            .filter_map(|hook| match hook {
                Hook::Effect(effect) => Some(Rc::clone(effect)),
                Hook::State(_) => None,
            })
            .collect();
        if effects.is_empty() {
            return Err(ReconcileError::MissingEffects);
        }
        self.roots[root].pending_update_effects.extend(effects);
        Ok(())
    }

    /// Splices the node's outermost host instances into the host tree at
    /// the right position. A missing host parent is logged and the
    /// placement skipped (best-effort degradation, not a crash).
    fn commit_placement(&mut self, root: RootId, node: NodeKey) -> Result<(), ReconcileError> {
        let Some(parent_instance) = self.get_host_parent(root, node) else {
            tracing::warn!(?node, "placement has no host parent; skipped");
            return Ok(());
        };
        let before = self.get_host_sibling(node);
        self.insert_or_append(node, &parent_instance, before.as_ref())
    }

    /// Nearest host ancestor's instance (or the root container).
    fn get_host_parent(&self, root: RootId, node: NodeKey) -> Option<H::Instance> {
        let mut cursor = self.nodes[node].parent;
        while let Some(key) = cursor {
            let n = &self.nodes[key];
            match n.tag {
                WorkTag::HostComponent => return n.instance.clone(),
                WorkTag::HostRoot => return Some(self.roots[root].container.clone()),
                _ => cursor = n.parent,
            }
        }
        None
    }

    /// The already-attached host instance the placed node must land before,
    /// if any. Walks forward through siblings (climbing through non-host
    /// wrappers), skipping anything itself awaiting placement — an
    /// unattached instance is not a valid anchor.
    fn get_host_sibling(&self, node: NodeKey) -> Option<H::Instance> {
        let mut cursor = node;
        'siblings: loop {
            // Forward: next sibling, climbing out of wrappers when the run
            // ends (but never past a host boundary).
            loop {
                if let Some(sibling) = self.nodes[cursor].sibling {
                    cursor = sibling;
                    break;
                }
                let parent = self.nodes[cursor].parent?;
                if self.nodes[parent].is_host() || self.nodes[parent].tag == WorkTag::HostRoot {
                    return None;
                }
                cursor = parent;
            }
            // Downward: find the outermost host node of this sibling.
            while !self.nodes[cursor].is_host() {
                if self.nodes[cursor].flags.contains(Flags::PLACEMENT) {
                    continue 'siblings;
                }
                match self.nodes[cursor].child {
                    Some(child) => cursor = child,
                    None => continue 'siblings,
                }
            }
            if !self.nodes[cursor].flags.contains(Flags::PLACEMENT) {
                return self.nodes[cursor].instance.clone();
            }
        }
    }

    /// Inserts (or appends) the node's outermost host instances under
    /// `parent`, descending through non-host nodes. `before` applies at
    /// every level: all spliced instances land in front of the same anchor.
    fn insert_or_append(
        &mut self,
        node: NodeKey,
        parent: &H::Instance,
        before: Option<&H::Instance>,
    ) -> Result<(), ReconcileError> {
        if self.nodes[node].is_host() {
            let instance = self.nodes[node]
                .instance
                .clone()
                .ok_or(ReconcileError::Internal("placement before instance creation"))?;
            match before {
                Some(anchor) => self.host.insert_child_before(parent, &instance, anchor),
                None => self.host.append_child(parent, &instance),
            }
            return Ok(());
        }
        let mut cursor = self.nodes[node].child;
        while let Some(child) = cursor {
            self.insert_or_append(child, parent, before)?;
            cursor = self.nodes[child].sibling;
        }
        Ok(())
    }

    /// Detaches a deleted subtree from the host and queues its unmount
    /// cleanups for the deferred pass. With no host parent the detach is
    /// skipped, but cleanups are still queued.
    fn commit_deletion(&mut self, root: RootId, child: NodeKey) {
        let parent_instance = self.get_host_parent(root, child);
        let mut outermost = Vec::new();
        self.collect_deletion(root, child, &mut outermost, false);
        match parent_instance {
            Some(parent) => {
                for instance in outermost {
                    self.host.remove_child(&parent, &instance);
                }
            }
            None => tracing::warn!(?child, "deleted subtree has no host parent; detach skipped"),
        }
    }

    /// Walks the deleted subtree: records each outermost host instance and
    /// queues the unmount cleanup of every component beneath.
    fn collect_deletion(
        &mut self,
        root: RootId,
        node: NodeKey,
        outermost: &mut Vec<H::Instance>,
        inside_host: bool,
    ) {
        let mut now_inside = inside_host;
        match self.nodes[node].tag {
            WorkTag::HostComponent | WorkTag::HostText => {
                if !inside_host {
                    if let Some(instance) = self.nodes[node].instance.clone() {
                        outermost.push(instance);
                    }
                }
                now_inside = true;
            }
            WorkTag::FunctionComponent => {
                let effects: Vec<_> = self.nodes[node]
                    .hooks
                    .iter()
                    .filter_map(|hook| match hook {
                        Hook::Effect(effect) => Some(Rc::clone(effect)),
                        Hook::State(_) => None,
                    })
                    .collect();
                self.roots[root].pending_unmount_effects.extend(effects);
            }
            WorkTag::HostRoot | WorkTag::Fragment => {}
        }

        let mut cursor = self.nodes[node].child;
        while let Some(child) = cursor {
            self.collect_deletion(root, child, outermost, now_inside);
            cursor = self.nodes[child].sibling;
        }
    }

    /// Frees a detached subtree's arena slots, both generations.
    fn free_subtree(&mut self, top: NodeKey) {
        // (key, whether its sibling is also being freed)
        let mut stack = vec![(top, false)];
        while let Some((key, free_sibling)) = stack.pop() {
            // Removal doubles as the visited marker; alternates point back.
            let Some(node) = self.nodes.remove(key) else {
                continue;
            };
            if free_sibling {
                if let Some(sibling) = node.sibling {
                    stack.push((sibling, true));
                }
            }
            if let Some(child) = node.child {
                stack.push((child, true));
            }
            if let Some(alternate) = node.alternate {
                stack.push((alternate, false));
            }
        }
    }

    /// Runs the deferred-effect queues for `root`: all unmount cleanups,
    /// then the cleanups of every re-running effect, then their creates.
    /// Finishes by draining state dispatches the effects issued.
    pub(crate) fn flush_passive_effects(&mut self, root: RootId) -> Result<bool, ReconcileError> {
        let Some(descriptor) = self.roots.get_mut(root) else {
            return Ok(false);
        };
        descriptor.passive_flush_scheduled = false;
        let unmounts = std::mem::take(&mut descriptor.pending_unmount_effects);
        let updates = std::mem::take(&mut descriptor.pending_update_effects);
        if unmounts.is_empty() && updates.is_empty() {
            return Ok(false);
        }
        tracing::trace!(?root, unmounts = unmounts.len(), updates = updates.len(), "flush effects");
        let mut ran = false;

        for effect in &unmounts {
            let destroy = {
                let mut effect = effect.borrow_mut();
                effect.tag -= EffectTags::HAS_EFFECT;
                effect.destroy.take()
            };
            if let Some(destroy) = destroy {
                ran = true;
                destroy();
            }
        }

        // Cleanups of every effect about to re-run, before any create.
        for effect in &updates {
            let destroy = {
                let effect = effect.borrow();
                if effect.tag.contains(EffectTags::PASSIVE | EffectTags::HAS_EFFECT) {
                    effect.destroy.clone()
                } else {
                    None
                }
            };
            if let Some(destroy) = destroy {
                ran = true;
                destroy();
            }
        }

        for effect in &updates {
            let create = {
                let effect = effect.borrow();
                effect
                    .tag
                    .contains(EffectTags::PASSIVE | EffectTags::HAS_EFFECT)
                    .then(|| Rc::clone(&effect.create))
            };
            if let Some(create) = create {
                ran = true;
                let destroy = create();
                let mut effect = effect.borrow_mut();
                effect.destroy = destroy;
                effect.tag -= EffectTags::HAS_EFFECT;
            }
        }

        // Effects commonly dispatch state; give those updates their lanes
        // and let any synchronous work run before control returns.
        self.flush_updates();
        self.flush_sync_callbacks()?;
        Ok(ran)
    }
}
