// SPDX-License-Identifier: Apache-2.0
//! weft-noop: an in-memory host environment and test harness for the weft
//! reconciler.
//!
//! The host records every mutation instead of performing it, keeps a
//! shadow of the realized tree for structural assertions, and leaves all
//! scheduling to a manual pump so tests control exactly when (and how much)
//! work runs.
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

mod harness;
mod host;

pub use harness::Harness;
pub use host::{HostOp, NoopHost, NoopInstance};
