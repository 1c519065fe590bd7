//! Wiring shared by nodes with several sources.
//!
//! Each source of an n-ary node gets its own [`Inlet`]: an output that
//! knows its position and forwards into the node. Positions make it
//! unnecessary to look the sending node up by identity, and let a node
//! combine sources of different value types.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use smallvec::SmallVec;

use crate::error::Fault;
use crate::graph::{Delivery, NodeId, Output, OutputRef};
use crate::reactive::{Signal, SignalRef};

/// Node callbacks an inlet forwards to.
pub(super) struct Handlers<T, N> {
    pub(super) value: fn(&N, usize, &T) -> Delivery,
    pub(super) error: fn(&N, &Fault) -> Delivery,
    pub(super) end: fn(&N, usize) -> Delivery,
}

impl<T, N> Clone for Handlers<T, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, N> Copy for Handlers<T, N> {}

/// Output standing for source `index` of `node`.
struct Inlet<T, N> {
    node: Rc<N>,
    index: usize,
    handlers: Handlers<T, N>,
}

impl<T, N> Output<T> for Inlet<T, N> {
    fn on_value(&self, message: &T, _source: NodeId) -> Delivery {
        (self.handlers.value)(&self.node, self.index, message)
    }

    fn on_error(&self, fault: &Fault, _source: NodeId) -> Delivery {
        (self.handlers.error)(&self.node, fault)
    }

    fn on_end(&self, _source: NodeId) -> Delivery {
        (self.handlers.end)(&self.node, self.index)
    }
}

/// One upstream of an n-ary node and the inlet connected to it.
///
/// The inlet holds the node strongly, so it only exists while the node is
/// started.
pub(super) struct Slot<T> {
    source: SignalRef<T>,
    inlet: RefCell<Option<OutputRef<T>>>,
}

impl<T: Clone + 'static> Slot<T> {
    pub(super) fn new(source: SignalRef<T>) -> Self {
        Self {
            source,
            inlet: RefCell::new(None),
        }
    }

    /// Connect a fresh inlet for `node` at position `index`.
    pub(super) fn attach<N: 'static>(&self, node: &Rc<N>, index: usize, handlers: Handlers<T, N>) {
        let inlet: OutputRef<T> = Rc::new(Inlet {
            node: Rc::clone(node),
            index,
            handlers,
        });
        *self.inlet.borrow_mut() = Some(inlet.clone());
        self.source.connect(inlet);
    }

    /// Disconnect the inlet, if any.
    pub(super) fn detach(&self) {
        let inlet = self.inlet.borrow_mut().take();
        if let Some(inlet) = inlet {
            self.source.disconnect(&inlet);
        }
    }
}

/// End bookkeeping: which sources have ended, and how many are left.
#[derive(Debug)]
pub(super) struct Pending {
    remaining: Cell<usize>,
    closed: SmallVec<[Cell<bool>; 4]>,
}

impl Pending {
    pub(super) fn new(count: usize) -> Self {
        Self {
            remaining: Cell::new(count),
            closed: (0..count).map(|_| Cell::new(false)).collect(),
        }
    }

    /// Record that source `index` ended.
    ///
    /// Returns `None` if it had already ended, otherwise whether every source
    /// has now ended.
    pub(super) fn close(&self, index: usize) -> Option<bool> {
        let closed = self.closed.get(index)?;
        if closed.replace(true) {
            return None;
        }
        let remaining = self.remaining.get().saturating_sub(1);
        self.remaining.set(remaining);
        Some(remaining == 0)
    }

    /// Whether source `index` has ended.
    pub(super) fn is_closed(&self, index: usize) -> bool {
        self.closed.get(index).is_some_and(Cell::get)
    }

    pub(super) fn remaining(&self) -> usize {
        self.remaining.get()
    }
}
