//! Past-dependent accumulation.

use std::fmt;
use std::rc::{Rc, Weak};

use super::{link, unlink};
use crate::error::Fault;
use crate::graph::{Core, Delivery, Flow, NodeId, Output};
use crate::reactive::{Signal, SignalRef};

type Step<T, A> = Box<dyn Fn(&A, &T) -> A>;

/// Folds every upstream value into an accumulator.
///
/// The initial accumulator is given explicitly: it may have a different type
/// from the upstream values, so it cannot be derived from them.
pub struct FoldP<T, A> {
    core: Core<A>,
    source: SignalRef<T>,
    step: Step<T, A>,
    this: Weak<Self>,
}

impl<T, A> FoldP<T, A>
where
    T: Clone + 'static,
    A: Clone + 'static,
{
    /// Create a fold starting from `initial`.
    pub fn new<F>(step: F, initial: A, source: SignalRef<T>) -> Rc<Self>
    where
        F: Fn(&A, &T) -> A + 'static,
    {
        Rc::new_cyclic(|this| Self {
            core: Core::new("foldp", initial),
            source,
            step: Box::new(step),
            this: this.clone(),
        })
    }
}

impl<T, A> Signal<A> for FoldP<T, A>
where
    T: Clone + 'static,
    A: Clone + 'static,
{
    fn core(&self) -> &Core<A> {
        &self.core
    }

    fn start(&self) {
        link(&self.source, &self.this);
    }

    fn stop(&self) {
        unlink(&self.source, &self.this);
    }
}

impl<T, A> Output<T> for FoldP<T, A>
where
    T: Clone + 'static,
    A: Clone + 'static,
{
    fn on_value(&self, message: &T, _source: NodeId) -> Delivery {
        let next = (self.step)(&self.core.borrow_value(), message);
        self.receive(next);
        Ok(Flow::Continue)
    }

    fn on_error(&self, fault: &Fault, _source: NodeId) -> Delivery {
        self.error(fault.clone());
        Ok(Flow::Continue)
    }

    fn on_end(&self, _source: NodeId) -> Delivery {
        self.end();
        Ok(Flow::Continue)
    }
}

impl<T, A> fmt::Debug for FoldP<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FoldP").field("core", &self.core).finish()
    }
}
