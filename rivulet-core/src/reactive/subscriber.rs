//! Subscriber types for the signal graph.
//!
//! A [`Subscriber`] is an [`Output`] assembled from closures. It is how
//! callers observe a graph without writing an `Output` impl of their own.

use std::fmt;
use std::rc::Rc;

use tracing::warn;

use crate::error::Fault;
use crate::graph::{Delivery, Flow, NodeId, Output, OutputRef};

type ValueFn<T> = Box<dyn Fn(&T, NodeId) -> Delivery>;
type ErrorFn = Box<dyn Fn(&Fault, NodeId) -> Delivery>;
type EndFn = Box<dyn Fn(NodeId) -> Delivery>;

/// An output whose handlers are closures.
///
/// Only the value handler is required. Without an error handler, errors are
/// logged and otherwise ignored; without an end handler, End is ignored
/// (the subscriber is disconnected either way).
pub struct Subscriber<T> {
    id: NodeId,
    on_value: ValueFn<T>,
    on_error: Option<ErrorFn>,
    on_end: Option<EndFn>,
}

impl<T: 'static> Subscriber<T> {
    /// Create a subscriber with the given value handler.
    pub fn new<F>(on_value: F) -> Self
    where
        F: Fn(&T, NodeId) -> Delivery + 'static,
    {
        Self {
            id: NodeId::new(),
            on_value: Box::new(on_value),
            on_error: None,
            on_end: None,
        }
    }

    /// Create a subscriber that runs `f` on every value and never breaks.
    pub fn each<F>(f: F) -> Self
    where
        F: Fn(&T) + 'static,
    {
        Self::new(move |value, _| {
            f(value);
            Ok(Flow::Continue)
        })
    }

    /// Set the error handler.
    pub fn with_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&Fault, NodeId) -> Delivery + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Set the end handler.
    pub fn with_end<F>(mut self, f: F) -> Self
    where
        F: Fn(NodeId) -> Delivery + 'static,
    {
        self.on_end = Some(Box::new(f));
        self
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Share the subscriber as an output handle.
    pub fn into_output(self) -> OutputRef<T> {
        Rc::new(self)
    }
}

impl<T> Output<T> for Subscriber<T> {
    fn on_value(&self, message: &T, source: NodeId) -> Delivery {
        (self.on_value)(message, source)
    }

    fn on_error(&self, fault: &Fault, source: NodeId) -> Delivery {
        match &self.on_error {
            Some(f) => f(fault, source),
            None => {
                warn!(
                    subscriber = %self.id,
                    node = %source,
                    %fault,
                    "error reached subscriber without error handler"
                );
                Ok(Flow::Continue)
            }
        }
    }

    fn on_end(&self, source: NodeId) -> Delivery {
        match &self.on_end {
            Some(f) => f(source),
            None => Ok(Flow::Continue),
        }
    }
}

impl<T> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("on_error", &self.on_error.is_some())
            .field("on_end", &self.on_end.is_some())
            .finish()
    }
}
