//! Graph Nodes
//!
//! This module defines the state every node in the signal graph carries:
//! its identity, its current value and the ordered list of outputs it
//! fans messages out to.

use std::borrow::Cow;
use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use smallvec::SmallVec;

use super::port::{same_output, OutputRef};

/// Unique identifier for a node in the signal graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a node is currently feeding anyone.
///
/// There is no stored flag behind this: a node with at least one output is
/// started, a node with none is stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// No outputs. The node's upstream chain is inactive.
    Stopped,

    /// One or more outputs. Every upstream the node depends on is active.
    Started,
}

/// Outputs of a node, in connection order.
pub(crate) type Outputs<T> = SmallVec<[OutputRef<T>; 2]>;

/// State shared by every node kind.
///
/// `Core` owns the value and the outputs list but never calls into other
/// nodes itself. Starting and stopping is decided by the caller from the
/// transition flags that [`Core::attach`] and [`Core::detach`] return.
pub struct Core<T> {
    /// Unique identifier for this node.
    id: NodeId,

    /// Diagnostic name.
    name: Cow<'static, str>,

    /// The most recently delivered value (or the initial one).
    value: RefCell<T>,

    /// Subscribers. Insertion order is delivery order.
    outputs: RefCell<Outputs<T>>,

    /// Set once End has been dispatched.
    ended: Cell<bool>,
}

impl<T> Core<T> {
    /// Create node state holding `value` with no outputs.
    pub fn new(name: impl Into<Cow<'static, str>>, value: T) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            value: RefCell::new(value),
            outputs: RefCell::new(SmallVec::new()),
            ended: Cell::new(false),
        }
    }

    /// Get the node's ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the node's diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrow the current value.
    pub fn borrow_value(&self) -> Ref<'_, T> {
        self.value.borrow()
    }

    /// Replace the current value.
    pub(crate) fn set_value(&self, value: T) {
        *self.value.borrow_mut() = value;
    }

    /// Number of connected outputs.
    pub fn output_count(&self) -> usize {
        self.outputs.borrow().len()
    }

    /// Current lifecycle state, computed from the outputs list.
    pub fn lifecycle(&self) -> Lifecycle {
        if self.output_count() == 0 {
            Lifecycle::Stopped
        } else {
            Lifecycle::Started
        }
    }

    /// Output currently at `index`, if any.
    ///
    /// Returns a cloned handle so no borrow is held while the output runs.
    pub(crate) fn output_at(&self, index: usize) -> Option<OutputRef<T>> {
        self.outputs.borrow().get(index).cloned()
    }

    /// Append `output` unless it is already connected.
    ///
    /// Returns `true` when this moved the node from zero outputs to one.
    pub(crate) fn attach(&self, output: OutputRef<T>) -> bool {
        let mut outputs = self.outputs.borrow_mut();
        if outputs.iter().any(|o| same_output(o, &output)) {
            return false;
        }
        outputs.push(output);
        outputs.len() == 1
    }

    /// Remove `output` if connected.
    ///
    /// Returns `true` when this removed the last output.
    pub(crate) fn detach(&self, output: &OutputRef<T>) -> bool {
        let mut outputs = self.outputs.borrow_mut();
        match outputs.iter().position(|o| same_output(o, output)) {
            Some(index) => {
                outputs.remove(index);
                outputs.is_empty()
            }
            None => false,
        }
    }

    /// Whether End has been dispatched on this node.
    pub fn is_ended(&self) -> bool {
        self.ended.get()
    }

    pub(crate) fn mark_ended(&self) {
        self.ended.set(true);
    }
}

impl<T> fmt::Debug for Core<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("outputs", &self.output_count())
            .field("ended", &self.ended.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorder;

    #[test]
    fn node_ids_are_unique() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn new_core_is_stopped_with_value() {
        let core = Core::new("test", 3);
        assert_eq!(*core.borrow_value(), 3);
        assert_eq!(core.lifecycle(), Lifecycle::Stopped);
        assert!(!core.is_ended());
    }

    #[test]
    fn attach_reports_first_output_only() {
        let core = Core::new("test", 0);
        let a = Recorder::<i32>::new().into_output();
        let b = Recorder::<i32>::new().into_output();

        assert!(core.attach(a.clone()));
        assert!(!core.attach(b.clone()));
        assert_eq!(core.output_count(), 2);
        assert_eq!(core.lifecycle(), Lifecycle::Started);
    }

    #[test]
    fn attach_is_idempotent() {
        let core = Core::new("test", 0);
        let a = Recorder::<i32>::new().into_output();

        assert!(core.attach(a.clone()));
        assert!(!core.attach(a.clone()));
        assert_eq!(core.output_count(), 1);
    }

    #[test]
    fn detach_reports_last_output_only() {
        let core = Core::new("test", 0);
        let a = Recorder::<i32>::new().into_output();
        let b = Recorder::<i32>::new().into_output();
        core.attach(a.clone());
        core.attach(b.clone());

        assert!(!core.detach(&a));
        assert!(!core.detach(&a), "second detach is a no-op");
        assert!(core.detach(&b));
        assert_eq!(core.lifecycle(), Lifecycle::Stopped);
    }

    #[test]
    fn outputs_keep_connection_order() {
        let core = Core::new("test", 0);
        let a = Recorder::<i32>::new().into_output();
        let b = Recorder::<i32>::new().into_output();
        let c = Recorder::<i32>::new().into_output();
        core.attach(a.clone());
        core.attach(b.clone());
        core.attach(c.clone());
        core.detach(&b);

        assert!(same_output(&core.output_at(0).unwrap(), &a));
        assert!(same_output(&core.output_at(1).unwrap(), &c));
        assert!(core.output_at(2).is_none());
    }

    #[test]
    fn node_id_displays_with_hash() {
        assert_eq!(NodeId::from(12).to_string(), "#12");
    }
}
