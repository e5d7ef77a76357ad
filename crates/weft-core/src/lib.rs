// SPDX-License-Identifier: Apache-2.0
//! weft-core: an incremental tree-reconciliation runtime.
//!
//! A `weft` tree is described declaratively ([`Element`] / [`Children`]) and
//! realized against an arbitrary host environment through a narrow
//! operations seam ([`HostConfig`] / [`HostScheduler`]). Re-rendering is
//! incremental: the runtime keeps the committed tree, builds a
//! work-in-progress counterpart for each render, diffs children by key and
//! type, and applies the minimal set of host mutations in a single
//! uninterruptible commit.
//!
//! Renders are prioritized by [`Lanes`]: synchronous work coalesces within
//! a microtask turn, everything else renders cooperatively in time slices
//! driven by the host scheduler, and a higher-priority update interrupts
//! and restarts lower-priority work without losing it.
//!
//! The embedder wires the loop together: host callbacks and microtasks
//! carry plain [`Task`] values that are pumped back into
//! [`Reconciler::execute_task`].
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod begin;
mod children;
mod commit;
mod complete;
/// Tree descriptions: elements, children, props, keys, dependencies.
pub mod element;
mod error;
/// Mutation flags and effect tags.
pub mod flags;
/// The hook runtime: state and deferred effects.
pub mod hooks;
/// The host-operations seam.
pub mod host;
/// Priority lanes.
pub mod lane;
/// Work nodes and root descriptors.
pub mod node;
mod reconciler;
mod update_queue;
mod work_loop;

pub use element::{Children, Component, Dep, Deps, Element, Key, Props};
pub use error::ReconcileError;
pub use flags::{EffectTags, Flags};
pub use hooks::{EffectCleanup, HookContext, HookMode, Updater};
pub use host::{CallbackHandle, HostConfig, HostScheduler, SchedulerPriority, Task};
pub use lane::{lane_from_priority, priority_of_lanes, Lanes};
pub use node::{NodeKey, RootId, WorkTag};
pub use reconciler::Reconciler;
pub use update_queue::{Action, Processed, UpdateQueue, UpdateRecord};
