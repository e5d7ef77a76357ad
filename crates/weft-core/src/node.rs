// SPDX-License-Identifier: Apache-2.0
//! Work nodes, the arena that owns them, and root descriptors.
//!
//! The tree is an arena of nodes addressed by [`NodeKey`]; `parent`,
//! `child`, `sibling`, and `alternate` are plain handle fields with no
//! ownership implied. Every logical position is double-buffered: the node
//! visible to the host ("current") and its work-in-progress counterpart
//! trade roles when a render commits. A third generation is never
//! allocated.

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::new_key_type;

use crate::element::{Children, Component, Element, Key, Props};
use crate::flags::Flags;
use crate::hooks::Hook;
use crate::update_queue::UpdateQueue;

new_key_type! {
    /// Handle to one work node in the arena.
    pub struct NodeKey;

    /// Handle to one root descriptor.
    pub struct RootId;
}

/// The kind of a work node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkTag {
    /// The root marker node owned by a root descriptor.
    HostRoot,
    /// A host element.
    HostComponent,
    /// A host text run.
    HostText,
    /// A component-function node.
    FunctionComponent,
    /// A group with no host instance of its own.
    Fragment,
}

/// The concrete type behind a node, used for reuse-vs-recreate decisions.
#[derive(Debug, Clone)]
pub enum ElemType {
    /// Host element type name.
    Host(Rc<str>),
    /// Component function identity.
    Component(Component),
}

impl ElemType {
    /// True when both refer to the same concrete type.
    #[must_use]
    pub fn same_type(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Host(a), Self::Host(b)) => a == b,
            (Self::Component(a), Self::Component(b)) => a.same_type(b),
            _ => false,
        }
    }
}

/// Per-tag props snapshot carried by a work node.
#[derive(Debug, Clone, Default)]
pub enum NodeProps {
    /// Root nodes carry no props.
    #[default]
    Root,
    /// Host element props plus its desired children.
    Host {
        /// Opaque host props.
        props: Props,
        /// Desired children (from the description's props).
        children: Children,
    },
    /// Text content.
    Text(Rc<str>),
    /// Component props.
    Component(Props),
    /// Fragment children (the props *are* the children).
    Fragment(Vec<Element>),
}

/// Root-node render state: the pending tree-description log plus the
/// memoized/base descriptions, shared across generations via `Rc`.
#[derive(Debug, Clone)]
pub struct RootNodeState {
    /// Pending tree descriptions awaiting a render.
    pub queue: Rc<RefCell<UpdateQueue<Children>>>,
    /// The description rendered by the last completed pass.
    pub memoized: Children,
    /// Base description for skip-and-replay processing.
    pub base: Children,
}

impl RootNodeState {
    pub(crate) fn new() -> Self {
        Self {
            queue: Rc::new(RefCell::new(UpdateQueue::new())),
            memoized: Children::None,
            base: Children::None,
        }
    }
}

/// One tree position across renders.
///
/// Generic over the host instance handle `I` so the arena can hold realized
/// host instances without knowing the host.
#[derive(Debug)]
pub struct WorkNode<I> {
    /// Node kind.
    pub tag: WorkTag,
    /// Concrete type reference (host name or component identity).
    pub elem_type: Option<ElemType>,
    /// Explicit identity hint.
    pub key: Option<Key>,
    /// Implicit identity fallback: position in the sibling list as of the
    /// render that produced this node.
    pub index: u32,

    /// Props for the in-progress render.
    pub pending: NodeProps,
    /// Props as of the last completed render of this node.
    pub memoized: Option<NodeProps>,

    /// Realized host instance (host element / text nodes only).
    pub instance: Option<I>,
    /// Owning root descriptor (root nodes only).
    pub root: Option<RootId>,
    /// Root render state (root nodes only).
    pub root_state: Option<RootNodeState>,
    /// Hook slots in call order (component nodes only).
    pub hooks: Vec<Hook>,

    /// Parent back-reference.
    pub parent: Option<NodeKey>,
    /// First child.
    pub child: Option<NodeKey>,
    /// Next sibling.
    pub sibling: Option<NodeKey>,
    /// Same-position counterpart in the other tree generation.
    pub alternate: Option<NodeKey>,

    /// Own pending host mutations.
    pub flags: Flags,
    /// Union of all descendant flags (after complete-phase bubbling).
    pub subtree_flags: Flags,
    /// Children marked for deletion this render.
    pub deletions: Vec<NodeKey>,
}

impl<I> WorkNode<I> {
    /// Creates a detached node.
    pub fn new(tag: WorkTag, pending: NodeProps, key: Option<Key>) -> Self {
        Self {
            tag,
            elem_type: None,
            key,
            index: 0,
            pending,
            memoized: None,
            instance: None,
            root: None,
            root_state: None,
            hooks: Vec::new(),
            parent: None,
            child: None,
            sibling: None,
            alternate: None,
            flags: Flags::empty(),
            subtree_flags: Flags::empty(),
            deletions: Vec::new(),
        }
    }

    /// True for nodes that own a realized host instance.
    #[must_use]
    pub fn is_host(&self) -> bool {
        matches!(self.tag, WorkTag::HostComponent | WorkTag::HostText)
    }
}

/// One independent tree.
#[derive(Debug)]
pub struct Root<I> {
    /// The host container the tree renders into.
    pub container: I,
    /// The root node of the tree currently visible to the host.
    pub current: NodeKey,
    /// The finished work-in-progress tree awaiting commit.
    pub finished_work: Option<NodeKey>,
    /// The lane the finished tree was rendered at.
    pub finished_lanes: crate::lane::Lanes,
    /// All lanes with pending work.
    pub pending_lanes: crate::lane::Lanes,
    /// The in-flight scheduled host callback, if any.
    pub callback_handle: Option<crate::host::CallbackHandle>,
    /// The lane the in-flight callback was scheduled for.
    pub callback_lanes: crate::lane::Lanes,
    /// True while a deferred-effect flush callback is outstanding.
    pub passive_flush_scheduled: bool,
    /// Unmount cleanups awaiting the deferred-effect pass.
    pub pending_unmount_effects: Vec<Rc<RefCell<crate::hooks::Effect>>>,
    /// Update effects awaiting the deferred-effect pass.
    pub pending_update_effects: Vec<Rc<RefCell<crate::hooks::Effect>>>,
}

impl<I> Root<I> {
    pub(crate) fn new(container: I) -> Self {
        Self {
            container,
            current: NodeKey::default(),
            finished_work: None,
            finished_lanes: crate::lane::Lanes::NONE,
            pending_lanes: crate::lane::Lanes::NONE,
            callback_handle: None,
            callback_lanes: crate::lane::Lanes::NONE,
            passive_flush_scheduled: false,
            pending_unmount_effects: Vec::new(),
            pending_update_effects: Vec::new(),
        }
    }
}
