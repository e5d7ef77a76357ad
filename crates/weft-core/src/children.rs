// SPDX-License-Identifier: Apache-2.0
//! Child reconciliation: deciding reuse vs. recreation.
//!
//! Two tracking modes share one implementation: the update path
//! (`track_effects = true`) records deletions and placements; the mount
//! path skips all reuse bookkeeping because a freshly mounted subtree has
//! nothing to reuse and is materialized as a unit during the complete
//! phase. Only the root has a current-tree counterpart on first render, so
//! mounts reconcile in tracking mode exactly once, at the root.
//!
//! Multi-child lists use a single forward scan with a key-or-index lookup
//! map and a running maximum of matched old indices: a matched child whose
//! old index is below the maximum is marked for movement (children only
//! ever move forward relative to the scan). This is an O(n) heuristic, not
//! a minimal-edit-distance diff.

use rustc_hash::FxHashMap;

use crate::element::{Children, Element, Key};
use crate::host::{HostConfig, HostScheduler};
use crate::node::{ElemType, NodeKey, NodeProps, WorkNode, WorkTag};
use crate::flags::Flags;
use crate::reconciler::Reconciler;

/// Identity of an existing child during a multi-child scan: explicit key if
/// present, positional index otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MapKey {
    Key(Key),
    Index(u32),
}

fn pending_props_of(element: &Element) -> NodeProps {
    match element {
        Element::Host(h) => NodeProps::Host {
            props: h.props.clone(),
            children: h.children.clone(),
        },
        Element::Text(t) => NodeProps::Text(t.clone()),
        Element::Component(c) => NodeProps::Component(c.props.clone()),
        Element::Fragment(f) => NodeProps::Fragment(f.children.clone()),
    }
}

impl<H: HostConfig + HostScheduler> Reconciler<H> {
    /// Reconciles `wip`'s children against the new description, attaching
    /// the first child.
    pub(crate) fn reconcile_children(&mut self, wip: NodeKey, children: Children) {
        let current = self.nodes[wip].alternate;
        let first = if let Some(current) = current {
            let current_first = self.nodes[current].child;
            self.reconcile_child_nodes(wip, current_first, children, true)
        } else {
            self.reconcile_child_nodes(wip, None, children, false)
        };
        self.nodes[wip].child = first;
    }

    fn reconcile_child_nodes(
        &mut self,
        ret: NodeKey,
        current_first: Option<NodeKey>,
        new_child: Children,
        track: bool,
    ) -> Option<NodeKey> {
        // An unkeyed top-level fragment is transparent: reconcile its
        // children directly.
        let new_child = match new_child {
            Children::One(boxed) => match *boxed {
                Element::Fragment(f) if f.key.is_none() => Children::Many(f.children),
                other => Children::One(Box::new(other)),
            },
            other => other,
        };

        match new_child {
            Children::One(boxed) => {
                let node = match *boxed {
                    Element::Text(content) => {
                        self.reconcile_single_text(ret, current_first, &content, track)
                    }
                    element => self.reconcile_single_element(ret, current_first, element, track),
                };
                self.place_single_child(node, track);
                Some(node)
            }
            Children::Many(list) => self.reconcile_array(ret, current_first, list, track),
            Children::None => {
                self.delete_remaining_children(ret, current_first, track);
                None
            }
        }
    }

    /// Single new element against an existing sibling run.
    fn reconcile_single_element(
        &mut self,
        ret: NodeKey,
        current_first: Option<NodeKey>,
        element: Element,
        track: bool,
    ) -> NodeKey {
        let key = element.key().cloned();
        let mut cursor = current_first;
        while let Some(existing) = cursor {
            let sibling = self.nodes[existing].sibling;
            if self.nodes[existing].key == key {
                if self.element_matches_node(&element, existing) {
                    // Reuse: attach new props, drop every remaining sibling.
                    let wip = self.use_node(existing, pending_props_of(&element));
                    self.nodes[wip].parent = Some(ret);
                    self.delete_remaining_children(ret, sibling, track);
                    return wip;
                }
                // Same key, different type: nothing below is salvageable.
                self.delete_remaining_children(ret, Some(existing), track);
                break;
            }
            // Key mismatch: this node is gone, keep scanning.
            self.delete_child(ret, existing, track);
            cursor = sibling;
        }

        let fresh = self.create_node_from_element(&element);
        self.nodes[fresh].parent = Some(ret);
        fresh
    }

    /// Single new text run against an existing sibling run.
    fn reconcile_single_text(
        &mut self,
        ret: NodeKey,
        current_first: Option<NodeKey>,
        content: &std::rc::Rc<str>,
        track: bool,
    ) -> NodeKey {
        let mut cursor = current_first;
        while let Some(existing) = cursor {
            let sibling = self.nodes[existing].sibling;
            if self.nodes[existing].tag == WorkTag::HostText {
                let wip = self.use_node(existing, NodeProps::Text(content.clone()));
                self.nodes[wip].parent = Some(ret);
                self.delete_remaining_children(ret, sibling, track);
                return wip;
            }
            self.delete_child(ret, existing, track);
            cursor = sibling;
        }

        let fresh = self
            .nodes
            .insert(WorkNode::new(WorkTag::HostText, NodeProps::Text(content.clone()), None));
        self.nodes[fresh].parent = Some(ret);
        fresh
    }

    /// Ordered child list against an existing sibling run.
    fn reconcile_array(
        &mut self,
        ret: NodeKey,
        current_first: Option<NodeKey>,
        list: Vec<Element>,
        track: bool,
    ) -> Option<NodeKey> {
        // Existing children by key-or-index.
        let mut existing: FxHashMap<MapKey, NodeKey> = FxHashMap::default();
        let mut cursor = current_first;
        while let Some(key) = cursor {
            let node = &self.nodes[key];
            let map_key = node
                .key
                .clone()
                .map_or(MapKey::Index(node.index), MapKey::Key);
            existing.insert(map_key, key);
            cursor = node.sibling;
        }

        let mut first: Option<NodeKey> = None;
        let mut last: Option<NodeKey> = None;
        // Highest old index seen among reused children; anything matched
        // behind it must move forward.
        let mut last_placed_index: u32 = 0;

        for (i, element) in list.into_iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let index = i as u32;
            let new_node = self.update_from_map(&mut existing, index, element);
            {
                let node = &mut self.nodes[new_node];
                node.index = index;
                node.parent = Some(ret);
                node.sibling = None;
            }

            match last {
                None => first = Some(new_node),
                Some(prev) => self.nodes[prev].sibling = Some(new_node),
            }
            last = Some(new_node);

            if !track {
                continue;
            }
            match self.nodes[new_node].alternate {
                Some(counterpart) => {
                    let old_index = self.nodes[counterpart].index;
                    if old_index < last_placed_index {
                        self.nodes[new_node].flags |= Flags::PLACEMENT;
                    } else {
                        last_placed_index = old_index;
                    }
                }
                None => self.nodes[new_node].flags |= Flags::PLACEMENT,
            }
        }

        // Anything left in the map matched nothing.
        let stale: Vec<NodeKey> = existing.into_values().collect();
        for node in stale {
            self.delete_child(ret, node, track);
        }
        first
    }

    /// Finds a reusable existing child for `element` (removing it from the
    /// map) or creates a fresh node.
    fn update_from_map(
        &mut self,
        existing: &mut FxHashMap<MapKey, NodeKey>,
        index: u32,
        element: Element,
    ) -> NodeKey {
        let map_key = element
            .key()
            .cloned()
            .map_or(MapKey::Index(index), MapKey::Key);

        if let Some(&before) = existing.get(&map_key) {
            let reusable = match &element {
                Element::Text(_) => self.nodes[before].tag == WorkTag::HostText,
                _ => self.element_matches_node(&element, before),
            };
            if reusable {
                existing.remove(&map_key);
                return self.use_node(before, pending_props_of(&element));
            }
            // Type changed under the same identity: leave the old node in
            // the map so the post-scan sweep deletes it.
        }

        self.create_node_from_element(&element)
    }

    /// True when the description and the existing node refer to the same
    /// concrete type (given their keys already matched).
    fn element_matches_node(&self, element: &Element, node: NodeKey) -> bool {
        let node = &self.nodes[node];
        match element {
            Element::Host(h) => node
                .elem_type
                .as_ref()
                .is_some_and(|t| t.same_type(&ElemType::Host(h.ty.clone()))),
            Element::Component(c) => node
                .elem_type
                .as_ref()
                .is_some_and(|t| t.same_type(&ElemType::Component(c.component.clone()))),
            Element::Fragment(_) => node.tag == WorkTag::Fragment,
            Element::Text(_) => node.tag == WorkTag::HostText,
        }
    }

    /// A freshly created node (no counterpart) gets a placement when the
    /// parent is tracking effects.
    fn place_single_child(&mut self, node: NodeKey, track: bool) {
        if track && self.nodes[node].alternate.is_none() {
            self.nodes[node].flags |= Flags::PLACEMENT;
        }
    }

    pub(crate) fn delete_child(&mut self, ret: NodeKey, child: NodeKey, track: bool) {
        if !track {
            return;
        }
        let parent = &mut self.nodes[ret];
        parent.deletions.push(child);
        parent.flags |= Flags::CHILD_DELETION;
    }

    pub(crate) fn delete_remaining_children(
        &mut self,
        ret: NodeKey,
        first: Option<NodeKey>,
        track: bool,
    ) {
        if !track {
            return;
        }
        let mut cursor = first;
        while let Some(child) = cursor {
            let sibling = self.nodes[child].sibling;
            self.delete_child(ret, child, track);
            cursor = sibling;
        }
    }

    /// Creates a fresh node for `element` with no reuse.
    pub(crate) fn create_node_from_element(&mut self, element: &Element) -> NodeKey {
        let node = match element {
            Element::Host(h) => {
                let mut node = WorkNode::new(
                    WorkTag::HostComponent,
                    pending_props_of(element),
                    h.key.clone(),
                );
                node.elem_type = Some(ElemType::Host(h.ty.clone()));
                node
            }
            Element::Text(_) => WorkNode::new(WorkTag::HostText, pending_props_of(element), None),
            Element::Component(c) => {
                let mut node = WorkNode::new(
                    WorkTag::FunctionComponent,
                    pending_props_of(element),
                    c.key.clone(),
                );
                node.elem_type = Some(ElemType::Component(c.component.clone()));
                node
            }
            Element::Fragment(f) => {
                WorkNode::new(WorkTag::Fragment, pending_props_of(element), f.key.clone())
            }
        };
        self.nodes.insert(node)
    }

    /// Reuses `current` for this render: clones it into (or refreshes) its
    /// alternate slot, detached from any sibling run.
    pub(crate) fn use_node(&mut self, current: NodeKey, pending: NodeProps) -> NodeKey {
        let wip = self.create_work_in_progress(current, pending);
        let node = &mut self.nodes[wip];
        node.index = 0;
        node.sibling = None;
        wip
    }

    /// Pairs `current` with a work-in-progress counterpart carrying
    /// `pending`, allocating the alternate slot only on first reuse. Never
    /// produces a third generation.
    pub(crate) fn create_work_in_progress(
        &mut self,
        current: NodeKey,
        pending: NodeProps,
    ) -> NodeKey {
        let (alternate, tag, key, elem_type, instance, root, root_state, hooks, child, memoized) = {
            let cur = &self.nodes[current];
            (
                cur.alternate,
                cur.tag,
                cur.key.clone(),
                cur.elem_type.clone(),
                cur.instance.clone(),
                cur.root,
                cur.root_state.clone(),
                cur.hooks.clone(),
                cur.child,
                cur.memoized.clone(),
            )
        };

        match alternate {
            None => {
                let mut wip = WorkNode::new(tag, pending, key);
                wip.elem_type = elem_type;
                wip.instance = instance;
                wip.root = root;
                wip.root_state = root_state;
                wip.hooks = hooks;
                wip.child = child;
                wip.memoized = memoized;
                wip.alternate = Some(current);
                let wip = self.nodes.insert(wip);
                self.nodes[current].alternate = Some(wip);
                wip
            }
            Some(wip) => {
                let node = &mut self.nodes[wip];
                node.pending = pending;
                node.flags = Flags::empty();
                node.subtree_flags = Flags::empty();
                node.deletions.clear();
                node.elem_type = elem_type;
                node.instance = instance;
                node.root = root;
                node.root_state = root_state;
                node.hooks = hooks;
                node.child = child;
                node.memoized = memoized;
                wip
            }
        }
    }
}
