//! Rivulet Core
//!
//! This crate provides a push-based reactive signal engine. It implements:
//!
//! - A signal protocol with lazy, reference-counted activation
//! - A fan-out dispatcher that tolerates outputs leaving mid-broadcast
//! - Algebraic combinators (merge, fold, lift, filter) and compositions of them
//! - An in-process topic bus for feeding values into a graph
//!
//! Everything is synchronous and single-threaded. Sending a value into the
//! graph returns once every affected node has seen it.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: node state, output ports and the dispatch loop
//! - `reactive`: the `Signal` trait, sources and closure subscribers
//! - `combinators`: derived signals
//! - `bus`: topic-keyed publish point
//! - `error`: construction errors and error-channel payloads
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use rivulet_core::combinators::foldp;
//! use rivulet_core::reactive::{send, Input, Return, Signal, SignalRef, Subscriber};
//!
//! let clicks: SignalRef<u32> = Input::new(0);
//! let total = foldp(|sum: &u32, n: &u32| sum + n, 0, clicks.clone());
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = seen.clone();
//! total.connect(Subscriber::each(move |n: &u32| log.borrow_mut().push(*n)).into_output());
//!
//! clicks.receive(2);
//! send(&*clicks, Return(3));
//!
//! assert_eq!(*seen.borrow(), vec![2, 5]);
//! ```

pub mod bus;
pub mod combinators;
pub mod error;
pub mod graph;
pub mod reactive;

#[cfg(test)]
mod testing;

pub use bus::{Bus, TopicInput, TopicOutput};
pub use error::{Fault, Result, SignalError};
pub use graph::{Delivery, Flow, Lifecycle, NodeId, Output, OutputRef};
pub use reactive::{send, Constant, Event, Input, Return, Signal, SignalRef, Subscriber};
