// SPDX-License-Identifier: Apache-2.0
//! Mutation flags carried by work nodes.
//!
//! A node's own `flags` record the host mutations it needs this commit;
//! `subtree_flags` is the union of every descendant's flags and is bubbled
//! during the complete phase so the commit walk can skip clean subtrees.

use bitflags::bitflags;

bitflags! {
    /// Pending side effects for one work node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Flags: u8 {
        /// The node's host instance must be inserted (or moved) in the host tree.
        const PLACEMENT = 0b0000_0001;
        /// The node's host instance content or props changed.
        const UPDATE = 0b0000_0010;
        /// One or more of the node's previous children must be detached.
        const CHILD_DELETION = 0b0000_0100;
        /// The node registered deferred (passive) effects this render.
        const PASSIVE_EFFECT = 0b0000_1000;
    }
}

impl Flags {
    /// Flags acted on by the commit-phase mutation walk.
    pub const MUTATION_MASK: Self =
        Self::PLACEMENT.union(Self::UPDATE).union(Self::CHILD_DELETION);

    /// Flags that require a deferred-effect flush to be scheduled.
    ///
    /// Deletion is included because unmounting a component must enqueue its
    /// cleanup callbacks even though the node carries no `PASSIVE_EFFECT` of
    /// its own.
    pub const PASSIVE_MASK: Self = Self::PASSIVE_EFFECT.union(Self::CHILD_DELETION);
}

bitflags! {
    /// Tags carried by one effect record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EffectTags: u8 {
        /// The effect must run during the next deferred-effect flush.
        const HAS_EFFECT = 0b01;
        /// The effect is a deferred (passive) effect.
        const PASSIVE = 0b10;
    }
}
