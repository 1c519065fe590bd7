//! Reactive Primitives
//!
//! This module implements the user-facing side of the signal protocol: the
//! [`Signal`] trait that every node implements, the sources values enter
//! the graph through, and the closure-based outputs they leave it by.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A [`Signal`] is a time-varying value with an ordered set of outputs. It
//! always has a value, from the moment it is created.
//!
//! ## Sources
//!
//! An [`Input`] is fed from outside the graph. Its start and stop hooks are
//! where it registers with, and unregisters from, whatever produces its
//! values. A [`Constant`] never changes and never starts.
//!
//! ## Subscribers
//!
//! A [`Subscriber`] observes a signal through plain closures, one per
//! channel.
//!
//! # Implementation Notes
//!
//! Nodes are single-threaded and shared through `Rc`. Producers feed a
//! source either through the [`Signal`] entry points or through [`send`],
//! which maps a raw [`Event`] onto the three channels.

mod input;
mod signal;
mod subscriber;

pub use input::{Constant, Input, InputBuilder};
pub use signal::{send, Event, Return, Signal, SignalRef, Snapshot};
pub use subscriber::Subscriber;
