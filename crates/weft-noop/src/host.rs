// SPDX-License-Identifier: Apache-2.0
//! An in-memory host: every operation is recorded, nothing is displayed.
//!
//! `NoopHost` keeps a shadow of the host tree (per-instance type, text, and
//! child lists) so tests can assert on the realized structure, plus an
//! operation log so tests can assert on exactly which mutations a commit
//! performed. Scheduling is fully manual: microtasks and callbacks queue up
//! until the harness pumps them.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use weft_core::{CallbackHandle, HostConfig, HostScheduler, Props, SchedulerPriority, Task};

/// Handle to one recorded host instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoopInstance(pub u32);

/// One recorded host mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    /// An element instance was created.
    CreateInstance {
        /// The new instance.
        instance: NoopInstance,
        /// Its type name.
        ty: String,
    },
    /// A text instance was created.
    CreateText {
        /// The new instance.
        instance: NoopInstance,
        /// Its content.
        content: String,
    },
    /// `child` was appended under `parent`.
    AppendChild {
        /// Receiving parent.
        parent: NoopInstance,
        /// Appended child.
        child: NoopInstance,
    },
    /// `child` was inserted under `parent` in front of `before`.
    InsertBefore {
        /// Receiving parent.
        parent: NoopInstance,
        /// Inserted child.
        child: NoopInstance,
        /// The anchor it landed in front of.
        before: NoopInstance,
    },
    /// `child` was detached from `parent`.
    RemoveChild {
        /// Former parent.
        parent: NoopInstance,
        /// Removed child.
        child: NoopInstance,
    },
    /// A text instance's content was replaced.
    UpdateText {
        /// The text instance.
        instance: NoopInstance,
        /// The new content.
        content: String,
    },
    /// New props were committed onto an element instance.
    UpdateInstance {
        /// The element instance.
        instance: NoopInstance,
    },
}

/// A recording host with manual scheduling.
#[derive(Debug, Default)]
pub struct NoopHost {
    next_instance: u32,
    ops: Vec<HostOp>,
    types: FxHashMap<NoopInstance, String>,
    texts: FxHashMap<NoopInstance, String>,
    children: FxHashMap<NoopInstance, Vec<NoopInstance>>,
    microtasks: VecDeque<Task>,
    callbacks: Vec<(SchedulerPriority, u64, CallbackHandle, Task)>,
    scheduled_seq: u64,
    priority: Option<SchedulerPriority>,
    yield_every: Option<u32>,
    yield_counter: u32,
}

impl NoopHost {
    /// Creates an empty host; the ambient priority starts at `Normal`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a container instance to render a root into.
    pub fn create_container(&mut self) -> NoopInstance {
        let instance = self.alloc();
        self.types.insert(instance, "#container".to_owned());
        instance
    }

    fn alloc(&mut self) -> NoopInstance {
        let instance = NoopInstance(self.next_instance);
        self.next_instance += 1;
        self.children.insert(instance, Vec::new());
        instance
    }

    /// Takes the operations recorded since the last call.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    /// Sets the ambient priority reported to the reconciler.
    pub fn set_priority(&mut self, priority: SchedulerPriority) {
        self.priority = Some(priority);
    }

    /// Makes `should_yield` fire after every `units` consultations; `None`
    /// never yields.
    pub fn set_yield_every(&mut self, units: Option<u32>) {
        self.yield_every = units;
        self.yield_counter = 0;
    }

    /// Takes the queued microtasks.
    pub fn take_microtasks(&mut self) -> Vec<Task> {
        self.microtasks.drain(..).collect()
    }

    /// Pops the due callback: highest priority first, scheduling order
    /// within a priority.
    pub fn pop_callback(&mut self) -> Option<Task> {
        let position = self
            .callbacks
            .iter()
            .enumerate()
            .min_by_key(|(_, (priority, seq, _, _))| (*priority, *seq))
            .map(|(i, _)| i)?;
        let (_, _, _, task) = self.callbacks.remove(position);
        Some(task)
    }

    /// True when neither microtasks nor callbacks are queued.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.microtasks.is_empty() && self.callbacks.is_empty()
    }

    /// The ordered children of `instance`.
    #[must_use]
    pub fn children_of(&self, instance: NoopInstance) -> &[NoopInstance] {
        self.children.get(&instance).map_or(&[], Vec::as_slice)
    }

    /// The type name of an element instance.
    #[must_use]
    pub fn type_of(&self, instance: NoopInstance) -> Option<&str> {
        self.types.get(&instance).map(String::as_str)
    }

    /// The content of a text instance.
    #[must_use]
    pub fn text_of(&self, instance: NoopInstance) -> Option<&str> {
        self.texts.get(&instance).map(String::as_str)
    }

    /// Renders the subtree under `instance` as a compact string, e.g.
    /// `div("a" span)`.
    #[must_use]
    pub fn snapshot(&self, instance: NoopInstance) -> String {
        if let Some(text) = self.texts.get(&instance) {
            return format!("{text:?}");
        }
        let ty = self.types.get(&instance).map_or("?", String::as_str);
        let children = self.children_of(instance);
        if children.is_empty() {
            return ty.to_owned();
        }
        let inner: Vec<String> = children.iter().map(|c| self.snapshot(*c)).collect();
        format!("{ty}({})", inner.join(" "))
    }

    fn detach(&mut self, parent: NoopInstance, child: NoopInstance) {
        if let Some(list) = self.children.get_mut(&parent) {
            list.retain(|c| *c != child);
        }
    }
}

impl HostConfig for NoopHost {
    type Instance = NoopInstance;

    fn create_instance(&mut self, ty: &str, _props: &Props) -> Self::Instance {
        let instance = self.alloc();
        self.types.insert(instance, ty.to_owned());
        self.ops.push(HostOp::CreateInstance {
            instance,
            ty: ty.to_owned(),
        });
        instance
    }

    fn create_text_instance(&mut self, content: &str) -> Self::Instance {
        let instance = self.alloc();
        self.texts.insert(instance, content.to_owned());
        self.ops.push(HostOp::CreateText {
            instance,
            content: content.to_owned(),
        });
        instance
    }

    fn append_child(&mut self, parent: &Self::Instance, child: &Self::Instance) {
        self.detach(*parent, *child);
        if let Some(list) = self.children.get_mut(parent) {
            list.push(*child);
        }
        self.ops.push(HostOp::AppendChild {
            parent: *parent,
            child: *child,
        });
    }

    fn insert_child_before(
        &mut self,
        parent: &Self::Instance,
        child: &Self::Instance,
        before: &Self::Instance,
    ) {
        self.detach(*parent, *child);
        if let Some(list) = self.children.get_mut(parent) {
            let at = list.iter().position(|c| c == before).unwrap_or(list.len());
            list.insert(at, *child);
        }
        self.ops.push(HostOp::InsertBefore {
            parent: *parent,
            child: *child,
            before: *before,
        });
    }

    fn remove_child(&mut self, parent: &Self::Instance, child: &Self::Instance) {
        self.detach(*parent, *child);
        self.ops.push(HostOp::RemoveChild {
            parent: *parent,
            child: *child,
        });
    }

    fn update_text(&mut self, instance: &Self::Instance, content: &str) {
        self.texts.insert(*instance, content.to_owned());
        self.ops.push(HostOp::UpdateText {
            instance: *instance,
            content: content.to_owned(),
        });
    }

    fn update_instance(&mut self, instance: &Self::Instance, _props: &Props) {
        self.ops.push(HostOp::UpdateInstance {
            instance: *instance,
        });
    }

    fn schedule_microtask(&mut self, task: Task) {
        self.microtasks.push_back(task);
    }
}

impl HostScheduler for NoopHost {
    fn schedule_callback(
        &mut self,
        priority: SchedulerPriority,
        handle: CallbackHandle,
        task: Task,
    ) {
        self.scheduled_seq += 1;
        self.callbacks.push((priority, self.scheduled_seq, handle, task));
    }

    fn cancel_callback(&mut self, handle: CallbackHandle) {
        self.callbacks.retain(|(_, _, h, _)| *h != handle);
    }

    fn should_yield(&mut self) -> bool {
        let Some(every) = self.yield_every else {
            return false;
        };
        self.yield_counter += 1;
        if self.yield_counter >= every {
            self.yield_counter = 0;
            return true;
        }
        false
    }

    fn current_priority(&self) -> SchedulerPriority {
        self.priority.unwrap_or(SchedulerPriority::Normal)
    }
}
