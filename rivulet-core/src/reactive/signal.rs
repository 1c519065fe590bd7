//! Signal Protocol
//!
//! A signal is a time-varying value with an ordered set of outputs. Every
//! node kind in the crate implements [`Signal`]; most only supply their
//! [`Core`] and the two lifecycle hooks, and inherit the rest.
//!
//! # Activation
//!
//! Work starts lazily. Connecting the first output calls [`Signal::start`],
//! which for a derived node connects it to its own upstream, which in turn
//! may start that upstream, all the way to the leaves. Disconnecting the
//! last output calls [`Signal::stop`], which unwinds the same chain.
//!
//! # Ownership
//!
//! Signals are `Rc`-shared and single-threaded. An upstream node holds its
//! outputs strongly while they are connected, so an active chain stays
//! alive as long as its leaf does, and is released once it is stopped.

use std::rc::Rc;

use serde::Serialize;
use tracing::trace;

use crate::error::Fault;
use crate::graph::{self, Core, Lifecycle, Message, NodeId, OutputRef};

/// A node of the signal graph.
pub trait Signal<T: Clone + 'static> {
    /// Shared node state.
    fn core(&self) -> &Core<T>;

    /// Called when the node gains its first output. Leaves do nothing here
    /// unless they feed from an external producer.
    fn start(&self) {}

    /// Called when the node loses its last output.
    fn stop(&self) {}

    /// Get the node's ID.
    fn id(&self) -> NodeId {
        self.core().id()
    }

    /// Get a copy of the current value.
    fn value(&self) -> T {
        self.core().borrow_value().clone()
    }

    /// Number of connected outputs.
    fn output_count(&self) -> usize {
        self.core().output_count()
    }

    /// Started if anyone is connected, stopped otherwise.
    fn lifecycle(&self) -> Lifecycle {
        self.core().lifecycle()
    }

    /// Connect `output`. Connecting an output twice is a no-op.
    fn connect(&self, output: OutputRef<T>) {
        let core = self.core();
        if core.attach(output) {
            trace!(node = %core.id(), name = core.name(), "start");
            self.start();
        }
    }

    /// Disconnect `output`. Disconnecting an unknown output is a no-op.
    fn disconnect(&self, output: &OutputRef<T>) {
        let core = self.core();
        if core.detach(output) {
            trace!(node = %core.id(), name = core.name(), "stop");
            self.stop();
        }
    }

    /// Push a value to every output and make it the current value.
    fn receive(&self, message: T) {
        graph::write(self, Message::Value(message));
    }

    /// Push an error to every output.
    fn error(&self, fault: Fault) {
        graph::write(self, Message::Error(fault));
    }

    /// End the stream. Every output is told and disconnected.
    fn end(&self) {
        graph::write(self, Message::End);
    }

    /// Serializable view of the node.
    fn snapshot(&self) -> Snapshot<T> {
        let core = self.core();
        Snapshot {
            id: core.id(),
            name: core.name().to_owned(),
            value: self.value(),
            lifecycle: core.lifecycle(),
            subscribers: core.output_count(),
        }
    }
}

/// Shared handle to a signal.
pub type SignalRef<T> = Rc<dyn Signal<T>>;

/// Point-in-time view of a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot<T> {
    /// Node ID.
    pub id: NodeId,
    /// Diagnostic name.
    pub name: String,
    /// Current value.
    pub value: T,
    /// Started or stopped.
    pub lifecycle: Lifecycle,
    /// Number of connected outputs.
    pub subscribers: usize,
}

/// "Deliver this value, then end."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Return<T>(pub T);

/// A raw event from a producer, as accepted by [`send`].
#[derive(Debug, Clone)]
pub enum Event<T> {
    /// Dispatch on the value channel.
    Value(T),
    /// Dispatch on the error channel.
    Error(Fault),
    /// Dispatch the value, then End.
    Return(T),
}

impl<T> From<Return<T>> for Event<T> {
    fn from(Return(value): Return<T>) -> Self {
        Event::Return(value)
    }
}

impl<T> From<Fault> for Event<T> {
    fn from(fault: Fault) -> Self {
        Event::Error(fault)
    }
}

/// Map a producer event onto the three channels of `node`.
pub fn send<T, S>(node: &S, event: impl Into<Event<T>>)
where
    T: Clone + 'static,
    S: Signal<T> + ?Sized,
{
    match event.into() {
        Event::Value(value) => node.receive(value),
        Event::Error(fault) => node.error(fault),
        Event::Return(value) => {
            node.receive(value);
            node.end();
        }
    }
}
