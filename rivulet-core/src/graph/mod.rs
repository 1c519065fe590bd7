//! Signal Graph
//!
//! This module implements the plumbing every node shares: identity, the
//! ordered list of outputs, and the dispatch loop that fans a message out to
//! them.
//!
//! # Overview
//!
//! The graph is push-based. An upstream node holds its downstream outputs,
//! and delivering a message is a synchronous call into each of them in
//! connection order. There is no central registry: a node is reachable only
//! through the handles that point at it.
//!
//! # Design Decisions
//!
//! 1. Outputs are trait objects rather than nodes, so the same list holds
//!    downstream nodes, inlets of n-ary combinators and caller closures.
//!
//! 2. A node's started/stopped state is derived from its output count and
//!    never stored.
//!
//! 3. The dispatch loop walks outputs by index and never holds a borrow of
//!    the list while a handler runs, so handlers may connect or disconnect
//!    anything, including themselves.

mod dispatch;
mod node;
mod port;

pub use dispatch::{write, Message};
pub use node::{Core, Lifecycle, NodeId};
pub use port::{same_output, Delivery, Flow, Output, OutputRef};
