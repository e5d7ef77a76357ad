// SPDX-License-Identifier: Apache-2.0
//! Single-root test harness: a reconciler over a [`NoopHost`] plus the
//! pump loop an embedder would normally provide.

use weft_core::{Children, ReconcileError, Reconciler, RootId, SchedulerPriority};

use crate::host::{HostOp, NoopHost, NoopInstance};

/// Iteration cap for the pump loops; a scheduler that fails to quiesce
/// within this many tasks is broken.
const PUMP_LIMIT: usize = 10_000;

/// A reconciler wired to one root in a recording host.
pub struct Harness {
    reconciler: Reconciler<NoopHost>,
    root: RootId,
    container: NoopInstance,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    /// Creates a harness with a fresh container and root.
    #[must_use]
    pub fn new() -> Self {
        let mut host = NoopHost::new();
        let container = host.create_container();
        let mut reconciler = Reconciler::new(host);
        let root = reconciler.create_root(container);
        Self {
            reconciler,
            root,
            container,
        }
    }

    /// Enqueues a new tree description at the ambient priority.
    pub fn render(&mut self, children: impl Into<Children>) {
        self.reconciler.update_root(self.root, children.into());
    }

    /// Enqueues a description and pumps until idle.
    ///
    /// # Errors
    /// Propagates render failures.
    pub fn render_and_flush(&mut self, children: impl Into<Children>) -> Result<(), ReconcileError> {
        self.render(children);
        self.flush_all()
    }

    /// Pumps microtasks and callbacks until the host is idle.
    ///
    /// # Errors
    /// Propagates render failures; fails when the scheduler does not
    /// quiesce.
    pub fn flush_all(&mut self) -> Result<(), ReconcileError> {
        for _ in 0..PUMP_LIMIT {
            self.reconciler.flush_updates();
            let microtasks = self.reconciler.host_mut().take_microtasks();
            if !microtasks.is_empty() {
                for task in microtasks {
                    self.reconciler.execute_task(task)?;
                }
                continue;
            }
            let Some(task) = self.reconciler.host_mut().pop_callback() else {
                return Ok(());
            };
            self.reconciler.execute_task(task)?;
        }
        Err(ReconcileError::Internal("scheduler did not quiesce"))
    }

    /// Pumps pending microtasks, then at most one callback. Returns whether
    /// anything ran.
    ///
    /// # Errors
    /// Propagates render failures.
    pub fn step(&mut self) -> Result<bool, ReconcileError> {
        self.reconciler.flush_updates();
        let microtasks = self.reconciler.host_mut().take_microtasks();
        if !microtasks.is_empty() {
            for task in microtasks {
                self.reconciler.execute_task(task)?;
            }
            return Ok(true);
        }
        match self.reconciler.host_mut().pop_callback() {
            Some(task) => {
                self.reconciler.execute_task(task)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The operations recorded since the last call.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        self.reconciler.host_mut().take_ops()
    }

    /// Compact string form of the realized tree.
    #[must_use]
    pub fn snapshot(&self) -> String {
        self.reconciler.host().snapshot(self.container)
    }

    /// Sets the ambient priority for subsequently enqueued updates.
    pub fn set_priority(&mut self, priority: SchedulerPriority) {
        self.reconciler.host_mut().set_priority(priority);
    }

    /// Makes renders yield after every `units` units of work.
    pub fn set_yield_every(&mut self, units: Option<u32>) {
        self.reconciler.host_mut().set_yield_every(units);
    }

    /// The root id.
    #[must_use]
    pub fn root(&self) -> RootId {
        self.root
    }

    /// The container instance.
    #[must_use]
    pub fn container(&self) -> NoopInstance {
        self.container
    }

    /// The underlying reconciler.
    pub fn reconciler_mut(&mut self) -> &mut Reconciler<NoopHost> {
        &mut self.reconciler
    }

    /// The underlying host.
    #[must_use]
    pub fn host(&self) -> &NoopHost {
        self.reconciler.host()
    }
}
