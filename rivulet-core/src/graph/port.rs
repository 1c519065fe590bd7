//! Output ports.
//!
//! An [`Output`] is anything a node can deliver to: a downstream node, an
//! inlet of an n-ary combinator, or a caller-supplied [`Subscriber`].
//! Each of the three channels has its own handler.
//!
//! [`Subscriber`]: crate::reactive::Subscriber

use std::rc::Rc;

use super::node::NodeId;
use crate::error::Fault;

/// What the dispatcher should do with an output after delivering to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    /// Keep the output connected.
    #[default]
    Continue,

    /// Disconnect this one output now.
    Break,
}

/// Result of handing a message to an output.
///
/// `Err` means the handler failed. For values and ends the dispatcher then
/// retries with the same output's error handler; for errors the failure is
/// logged and dropped.
pub type Delivery = Result<Flow, Fault>;

/// Receiving side of the signal protocol.
///
/// `source` is the id of the node that is dispatching.
pub trait Output<T> {
    /// Handle a value.
    fn on_value(&self, message: &T, source: NodeId) -> Delivery;

    /// Handle an out-of-band error.
    fn on_error(&self, fault: &Fault, source: NodeId) -> Delivery;

    /// Handle the end of the stream. The output is disconnected afterwards
    /// whatever this returns.
    fn on_end(&self, source: NodeId) -> Delivery;
}

/// Shared handle to an output.
pub type OutputRef<T> = Rc<dyn Output<T>>;

/// Identity of an output is the identity of its allocation.
pub fn same_output<T>(a: &OutputRef<T>, b: &OutputRef<T>) -> bool {
    std::ptr::eq(Rc::as_ptr(a).cast::<()>(), Rc::as_ptr(b).cast::<()>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorder;

    #[test]
    fn same_output_compares_allocations() {
        let recorder = Recorder::<u8>::new();
        let a: OutputRef<u8> = recorder.output();
        let b: OutputRef<u8> = recorder.output();
        let other: OutputRef<u8> = Recorder::<u8>::new().into_output();

        assert!(same_output(&a, &b));
        assert!(!same_output(&a, &other));
    }

    #[test]
    fn flow_defaults_to_continue() {
        assert_eq!(Flow::default(), Flow::Continue);
    }
}
