// SPDX-License-Identifier: Apache-2.0
//! Reconciler error taxonomy.
//!
//! Consistency violations are fatal for the render that hit them: the work
//! loop discards the in-progress tree, clears the in-flight lane, and
//! surfaces the error to the task-execution caller. There is no automatic
//! retry; a later unrelated update renders fresh from the committed tree.
//! Degradations that are not fatal (missing host parent, dispatch against
//! an unmounted node) are logged and skipped instead of raised.

use thiserror::Error;

/// Fatal per-render errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// A component called more stateful hooks this render than it recorded
    /// on a previous render of the same node.
    #[error("hook list exhausted: component called hook #{called} but only {recorded} were recorded last render")]
    HookCountMismatch {
        /// 1-based index of the offending hook call.
        called: usize,
        /// Number of slots recorded on the previous render.
        recorded: usize,
    },
    /// A component called fewer stateful hooks this render than it recorded
    /// on a previous render of the same node.
    #[error("hook list underrun: component called {called} hooks but {recorded} were recorded last render")]
    HookCountUnderrun {
        /// Number of hook calls made this render.
        called: usize,
        /// Number of slots recorded on the previous render.
        recorded: usize,
    },
    /// A hook call site changed kind (state vs. effect) between renders.
    #[error("hook kind mismatch at slot {index}")]
    HookKindMismatch {
        /// 0-based slot index of the mismatch.
        index: usize,
    },
    /// A state hook's stored value no longer downcasts to the requested type.
    #[error("state type mismatch at hook slot {index}")]
    StateTypeMismatch {
        /// 0-based slot index of the mismatch.
        index: usize,
    },
    /// A node carried the deferred-effect marker but no effect records.
    #[error("node flagged for deferred effects has no effect list")]
    MissingEffects,
    /// An internal structural invariant failed.
    #[error("internal invariant violated: {0}")]
    Internal(&'static str),
}
