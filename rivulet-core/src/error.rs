//! Error types.
//!
//! Two kinds of failure exist in the engine:
//!
//! - [`SignalError`]: a contract violation detected while building a graph
//!   (an empty source list, the same upstream passed twice) or while using
//!   a bus that was already closed.
//! - [`Fault`]: the payload carried on a node's error channel. Faults are
//!   out-of-band values flowing through the graph; they never terminate a
//!   stream on their own.

use std::error::Error as StdError;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::graph::NodeId;

/// Errors raised while constructing or wiring signals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// An n-ary combinator was given no sources.
    #[error("{kind} needs at least one source signal")]
    NoSources {
        /// Combinator that rejected the input.
        kind: &'static str,
    },

    /// The same upstream node appears more than once in a source list.
    #[error("{kind} received node {id} twice (positions {first} and {second})")]
    DuplicateSource {
        /// Combinator that rejected the input.
        kind: &'static str,
        /// The repeated node.
        id: NodeId,
        /// First position of the node in the source list.
        first: usize,
        /// Second position of the node in the source list.
        second: usize,
    },

    /// A message was published on a bus after it was closed.
    #[error("bus is closed, cannot publish on topic {topic:?}")]
    BusClosed {
        /// Topic of the rejected publish.
        topic: String,
    },
}

/// Result alias used across the crate.
pub type Result<T, E = SignalError> = std::result::Result<T, E>;

/// Plain-text error used by [`Fault::msg`].
#[derive(Debug, Error)]
#[error("{0}")]
struct FaultMessage(String);

/// Payload of the error channel.
///
/// A `Fault` wraps any [`std::error::Error`] behind an `Rc`, so the same
/// fault can be fanned out to many subscribers without copying.
#[derive(Clone)]
pub struct Fault(Rc<dyn StdError + 'static>);

impl Fault {
    /// Wrap an error value.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + 'static,
    {
        Self(Rc::new(error))
    }

    /// Build a fault from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(FaultMessage(message.into()))
    }

    /// Try to view the wrapped error as a concrete type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.0.downcast_ref::<E>()
    }

    /// True if both handles point at the same underlying error.
    pub fn ptr_eq(&self, other: &Fault) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Fault").field(&self.0.to_string()).finish()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<SignalError> for Fault {
    fn from(error: SignalError) -> Self {
        Fault::new(error)
    }
}
