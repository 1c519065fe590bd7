//! N-ary merge.

use std::fmt;
use std::rc::{Rc, Weak};

use super::check_sources;
use super::join::{Handlers, Pending, Slot};
use crate::error::{Fault, Result};
use crate::graph::{Core, Delivery, Flow};
use crate::reactive::{Signal, SignalRef};

/// Forwards every value and error from any of its sources.
///
/// The initial value is the first source's value. When several sources fire
/// off the same external trigger, they are delivered in source order. The
/// merge ends only after every source has ended.
pub struct Merge<T> {
    core: Core<T>,
    slots: Vec<Slot<T>>,
    pending: Pending,
    this: Weak<Self>,
}

impl<T: Clone + 'static> Merge<T> {
    /// Merge `sources`, biased towards the earlier ones.
    ///
    /// Fails if `sources` is empty or lists the same node twice.
    pub fn new(sources: Vec<SignalRef<T>>) -> Result<Rc<Self>> {
        check_sources("merge", &sources)?;
        let value = sources[0].value();
        Ok(Self::build(value, sources))
    }

    /// Merge sources that are known to be distinct.
    pub(super) fn build(value: T, sources: Vec<SignalRef<T>>) -> Rc<Self> {
        let pending = Pending::new(sources.len());
        Rc::new_cyclic(|this| Self {
            core: Core::new("merge", value),
            slots: sources.into_iter().map(Slot::new).collect(),
            pending,
            this: this.clone(),
        })
    }

    /// Number of sources that have not ended yet.
    pub fn pending(&self) -> usize {
        self.pending.remaining()
    }

    fn handlers() -> Handlers<T, Self> {
        Handlers {
            value: Self::forward_value,
            error: Self::forward_error,
            end: Self::source_ended,
        }
    }

    fn forward_value(&self, _index: usize, message: &T) -> Delivery {
        self.receive(message.clone());
        Ok(Flow::Continue)
    }

    fn forward_error(&self, fault: &Fault) -> Delivery {
        self.error(fault.clone());
        Ok(Flow::Continue)
    }

    fn source_ended(&self, index: usize) -> Delivery {
        if let Some(all_ended) = self.pending.close(index) {
            if let Some(slot) = self.slots.get(index) {
                slot.detach();
            }
            if all_ended {
                self.end();
            }
        }
        Ok(Flow::Continue)
    }
}

impl<T: Clone + 'static> Signal<T> for Merge<T> {
    fn core(&self) -> &Core<T> {
        &self.core
    }

    fn start(&self) {
        let Some(node) = self.this.upgrade() else {
            return;
        };
        for (index, slot) in self.slots.iter().enumerate() {
            if !self.pending.is_closed(index) {
                slot.attach(&node, index, Self::handlers());
            }
        }
    }

    fn stop(&self) {
        for slot in &self.slots {
            slot.detach();
        }
    }
}

impl<T> fmt::Debug for Merge<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Merge")
            .field("core", &self.core)
            .field("sources", &self.slots.len())
            .field("pending", &self.pending.remaining())
            .finish()
    }
}
