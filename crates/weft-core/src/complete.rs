// SPDX-License-Identifier: Apache-2.0
//! The complete phase: bottom-up realization and flag bubbling.
//!
//! Host nodes materialize their instance on first completion and assemble
//! their outermost host descendants beneath it, so a whole freshly mounted
//! subtree reaches the host as one prebuilt unit when its top placement
//! commits. Revisited host nodes compare against the committed generation
//! and mark a coarse update when something changed.
//!
//! Every completion bubbles the child flags upward, which is what lets the
//! commit walk skip clean subtrees without visiting them.

use crate::error::ReconcileError;
use crate::flags::Flags;
use crate::host::{HostConfig, HostScheduler};
use crate::node::{NodeKey, NodeProps, WorkTag};
use crate::reconciler::Reconciler;

impl<H: HostConfig + HostScheduler> Reconciler<H> {
    /// Completes one node.
    ///
    /// # Errors
    /// Fails on structural impossibilities (a host node with no type, a
    /// completed child with no instance); these indicate a bug, not bad
    /// input.
    pub(crate) fn complete_work(&mut self, wip: NodeKey) -> Result<(), ReconcileError> {
        match self.nodes[wip].tag {
            WorkTag::HostComponent => {
                if self.nodes[wip].alternate.is_some() && self.nodes[wip].instance.is_some() {
                    self.mark_host_update(wip)?;
                } else {
                    let NodeProps::Host { props, .. } = self.nodes[wip].pending.clone() else {
                        return Err(ReconcileError::Internal("host node without host props"));
                    };
                    let Some(crate::node::ElemType::Host(ty)) = self.nodes[wip].elem_type.clone()
                    else {
                        return Err(ReconcileError::Internal("host node without type name"));
                    };
                    let instance = self.host.create_instance(&ty, &props);
                    self.nodes[wip].instance = Some(instance);
                    self.append_all_children(wip)?;
                }
            }
            WorkTag::HostText => {
                if self.nodes[wip].alternate.is_some() && self.nodes[wip].instance.is_some() {
                    self.mark_text_update(wip)?;
                } else {
                    let NodeProps::Text(content) = self.nodes[wip].pending.clone() else {
                        return Err(ReconcileError::Internal("text node without content"));
                    };
                    let instance = self.host.create_text_instance(&content);
                    self.nodes[wip].instance = Some(instance);
                }
            }
            WorkTag::HostRoot | WorkTag::FunctionComponent | WorkTag::Fragment => {}
        }
        self.bubble_properties(wip);
        Ok(())
    }

    /// Coarse change detection for a revisited host element: new props with
    /// a different identity mean an update. Finer diffing is the host's
    /// business, performed when it receives the committed props.
    fn mark_host_update(&mut self, wip: NodeKey) -> Result<(), ReconcileError> {
        let alternate = self.nodes[wip]
            .alternate
            .ok_or(ReconcileError::Internal("revisit without counterpart"))?;
        let NodeProps::Host { props: new, .. } = &self.nodes[wip].pending else {
            return Err(ReconcileError::Internal("host node without host props"));
        };
        let changed = match &self.nodes[alternate].memoized {
            Some(NodeProps::Host { props: old, .. }) => !new.ptr_eq(old),
            _ => true,
        };
        if changed {
            self.nodes[wip].flags |= Flags::UPDATE;
        }
        Ok(())
    }

    /// Text compares by content, not identity.
    fn mark_text_update(&mut self, wip: NodeKey) -> Result<(), ReconcileError> {
        let alternate = self.nodes[wip]
            .alternate
            .ok_or(ReconcileError::Internal("revisit without counterpart"))?;
        let NodeProps::Text(new) = &self.nodes[wip].pending else {
            return Err(ReconcileError::Internal("text node without content"));
        };
        let changed = match &self.nodes[alternate].memoized {
            Some(NodeProps::Text(old)) => new != old,
            _ => true,
        };
        if changed {
            self.nodes[wip].flags |= Flags::UPDATE;
        }
        Ok(())
    }

    /// Appends every outermost host descendant of `wip` to its fresh
    /// instance, descending through non-host nodes but never into a host
    /// node's own children.
    fn append_all_children(&mut self, wip: NodeKey) -> Result<(), ReconcileError> {
        let parent_instance = self.nodes[wip]
            .instance
            .clone()
            .ok_or(ReconcileError::Internal("append before instance creation"))?;

        let mut cursor = self.nodes[wip].child;
        while let Some(key) = cursor {
            let node = &self.nodes[key];
            if node.is_host() {
                let child_instance = node
                    .instance
                    .clone()
                    .ok_or(ReconcileError::Internal("completed child without instance"))?;
                self.host.append_child(&parent_instance, &child_instance);
            } else if let Some(child) = node.child {
                cursor = Some(child);
                continue;
            }

            // Next outermost position: sibling, or climb until one exists.
            let mut climb = key;
            cursor = loop {
                if climb == wip {
                    break None;
                }
                if let Some(sibling) = self.nodes[climb].sibling {
                    break Some(sibling);
                }
                match self.nodes[climb].parent {
                    Some(parent) if parent != wip => climb = parent,
                    _ => break None,
                }
            };
        }
        Ok(())
    }

    /// Unions the children's flags into `wip.subtree_flags` and reaffirms
    /// their parent links for the commit walk.
    fn bubble_properties(&mut self, wip: NodeKey) {
        let mut subtree = Flags::empty();
        let mut cursor = self.nodes[wip].child;
        while let Some(key) = cursor {
            let child = &mut self.nodes[key];
            subtree |= child.subtree_flags | child.flags;
            child.parent = Some(wip);
            cursor = child.sibling;
        }
        self.nodes[wip].subtree_flags |= subtree;
    }
}
