// SPDX-License-Identifier: Apache-2.0
//! The begin phase: top-down expansion of one work node.
//!
//! Begin turns a node's pending description into reconciled children and
//! hands the walk its first child (or `None`, sending the walk into the
//! complete phase). Component bodies run here; this is the only place user
//! code executes during a render.

use crate::element::Children;
use crate::error::ReconcileError;
use crate::hooks::{render_component, HookMode};
use crate::host::{HostConfig, HostScheduler};
use crate::lane::Lanes;
use crate::node::{ElemType, NodeKey, NodeProps, WorkTag};
use crate::reconciler::Reconciler;
use crate::update_queue::Processed;

impl<H: HostConfig + HostScheduler> Reconciler<H> {
    /// Expands `wip` at `render_lanes`; returns the next unit of work.
    ///
    /// # Errors
    /// Propagates hook-consistency violations and component-body failures.
    pub(crate) fn begin_work(
        &mut self,
        wip: NodeKey,
        render_lanes: Lanes,
    ) -> Result<Option<NodeKey>, ReconcileError> {
        match self.nodes[wip].tag {
            WorkTag::HostRoot => self.begin_host_root(wip, render_lanes),
            WorkTag::HostComponent => {
                let NodeProps::Host { children, .. } = self.nodes[wip].pending.clone() else {
                    return Err(ReconcileError::Internal("host node without host props"));
                };
                self.reconcile_children(wip, children);
                Ok(self.nodes[wip].child)
            }
            // Text is a leaf; its content is handled in the complete phase.
            WorkTag::HostText => Ok(None),
            WorkTag::FunctionComponent => self.begin_function_component(wip, render_lanes),
            WorkTag::Fragment => {
                let NodeProps::Fragment(children) = self.nodes[wip].pending.clone() else {
                    return Err(ReconcileError::Internal("fragment node without children"));
                };
                self.reconcile_children(wip, Children::Many(children));
                Ok(self.nodes[wip].child)
            }
        }
    }

    /// Processes the root's pending tree descriptions and reconciles the
    /// winning description against the existing children.
    fn begin_host_root(
        &mut self,
        wip: NodeKey,
        render_lanes: Lanes,
    ) -> Result<Option<NodeKey>, ReconcileError> {
        let state = self.nodes[wip]
            .root_state
            .clone()
            .ok_or(ReconcileError::Internal("root node without root state"))?;

        let Processed {
            memoized,
            base,
            seen,
            residual,
        } = state.queue.borrow().plan(state.base.clone(), render_lanes);
        let children = memoized.clone();

        if let Some(state) = self.nodes[wip].root_state.as_mut() {
            state.memoized = memoized;
            state.base = base;
        }
        if seen > 0 {
            let queue = std::rc::Rc::clone(&state.queue);
            self.render_acks.push(Box::new(move || {
                queue.borrow_mut().acknowledge(seen, residual);
            }));
        }

        self.reconcile_children(wip, children);
        Ok(self.nodes[wip].child)
    }

    /// Runs the component body and reconciles what it returned.
    fn begin_function_component(
        &mut self,
        wip: NodeKey,
        render_lanes: Lanes,
    ) -> Result<Option<NodeKey>, ReconcileError> {
        let (component, props, mode, prev_hooks) = {
            let node = &self.nodes[wip];
            let Some(ElemType::Component(component)) = node.elem_type.clone() else {
                return Err(ReconcileError::Internal("component node without function"));
            };
            let NodeProps::Component(props) = node.pending.clone() else {
                return Err(ReconcileError::Internal("component node without props"));
            };
            let mode = if node.alternate.is_some() {
                HookMode::Update
            } else {
                HookMode::Mount
            };
            // `create_work_in_progress` copied the committed hook list onto
            // the work-in-progress node; it is the previous render's list.
            (component, props, mode, node.hooks.clone())
        };

        let inbox = std::rc::Rc::clone(&self.inbox);
        let (children, hooks, needs_passive, acks) =
            render_component(&component, &props, mode, wip, render_lanes, &prev_hooks, inbox)?;
        self.render_acks.extend(acks);

        let node = &mut self.nodes[wip];
        node.hooks = hooks;
        if needs_passive {
            node.flags |= crate::flags::Flags::PASSIVE_EFFECT;
        }

        self.reconcile_children(wip, children);
        Ok(self.nodes[wip].child)
    }
}
