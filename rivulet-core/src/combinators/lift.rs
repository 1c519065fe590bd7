//! Pure transforms over one or more sources.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::join::{Handlers, Pending, Slot};
use super::{check_sources, link, unlink};
use crate::error::{Fault, Result};
use crate::graph::{Core, Delivery, Flow, NodeId, Output};
use crate::reactive::{Signal, SignalRef};

type Step<T, U> = Box<dyn Fn(&T) -> std::result::Result<U, Fault>>;

/// Applies a function to every upstream value.
///
/// A step that fails is treated like a failed delivery: the failure goes to
/// the lift's own error handler, which forwards it downstream.
pub struct Lift<T, U> {
    core: Core<U>,
    source: SignalRef<T>,
    step: Step<T, U>,
    this: Weak<Self>,
}

impl<T, U> Lift<T, U>
where
    T: Clone + 'static,
    U: Clone + 'static,
{
    /// Lift an infallible `step`. The initial value is `step(source.value())`.
    pub fn new<F>(step: F, source: SignalRef<T>) -> Rc<Self>
    where
        F: Fn(&T) -> U + 'static,
    {
        let value = step(&source.value());
        Self::build(value, source, Box::new(move |message| Ok(step(message))))
    }

    /// Lift a fallible `step`.
    ///
    /// The step is applied to the source's current value right away, and
    /// its failure is returned: a lift must start with a value.
    pub fn try_new<F>(step: F, source: SignalRef<T>) -> std::result::Result<Rc<Self>, Fault>
    where
        F: Fn(&T) -> std::result::Result<U, Fault> + 'static,
    {
        let value = step(&source.value())?;
        Ok(Self::build(value, source, Box::new(step)))
    }

    fn build(value: U, source: SignalRef<T>, step: Step<T, U>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            core: Core::new("lift", value),
            source,
            step,
            this: this.clone(),
        })
    }
}

impl<T, U> Signal<U> for Lift<T, U>
where
    T: Clone + 'static,
    U: Clone + 'static,
{
    fn core(&self) -> &Core<U> {
        &self.core
    }

    fn start(&self) {
        link(&self.source, &self.this);
    }

    fn stop(&self) {
        unlink(&self.source, &self.this);
    }
}

impl<T, U> Output<T> for Lift<T, U>
where
    T: Clone + 'static,
    U: Clone + 'static,
{
    fn on_value(&self, message: &T, _source: NodeId) -> Delivery {
        let next = (self.step)(message)?;
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

impl<T, U> fmt::Debug for Lift<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lift").field("core", &self.core).finish()
    }
}

/// Applies a function to the latest values of all its sources.
///
/// Every time any source fires, the function is reapplied to the whole
/// snapshot, not just the value that changed. Ends once every source has
/// ended.
pub struct LiftN<T, U> {
    core: Core<U>,
    slots: Vec<Slot<T>>,
    pending: Pending,
    state: RefCell<Vec<T>>,
    step: Box<dyn Fn(&[T]) -> U>,
    this: Weak<Self>,
}

impl<T, U> LiftN<T, U>
where
    T: Clone + 'static,
    U: Clone + 'static,
{
    /// Lift `step` over `sources`.
    ///
    /// Fails if `sources` is empty or lists the same node twice.
    pub fn new<F>(step: F, sources: Vec<SignalRef<T>>) -> Result<Rc<Self>>
    where
        F: Fn(&[T]) -> U + 'static,
    {
        Self::named("lift_n", step, sources)
    }

    pub(super) fn named<F>(
        name: &'static str,
        step: F,
        sources: Vec<SignalRef<T>>,
    ) -> Result<Rc<Self>>
    where
        F: Fn(&[T]) -> U + 'static,
    {
        check_sources(name, &sources)?;
        let state: Vec<T> = sources.iter().map(|source| source.value()).collect();
        let value = step(&state);
        let pending = Pending::new(sources.len());
        Ok(Rc::new_cyclic(|this| Self {
            core: Core::new(name, value),
            slots: sources.into_iter().map(Slot::new).collect(),
            pending,
            state: RefCell::new(state),
            step: Box::new(step),
            this: this.clone(),
        }))
    }

    /// Number of sources that have not ended yet.
    pub fn pending(&self) -> usize {
        self.pending.remaining()
    }

    fn handlers() -> Handlers<T, Self> {
        Handlers {
            value: Self::source_value,
            error: Self::forward_error,
            end: Self::source_ended,
        }
    }

    fn source_value(&self, index: usize, message: &T) -> Delivery {
        if let Some(slot) = self.state.borrow_mut().get_mut(index) {
            *slot = message.clone();
        }
        let next = {
            let state = self.state.borrow();
            (self.step)(&state)
        };
        self.receive(next);
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

impl<T, U> Signal<U> for LiftN<T, U>
where
    T: Clone + 'static,
    U: Clone + 'static,
{
    fn core(&self) -> &Core<U> {
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

impl<T, U> fmt::Debug for LiftN<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiftN")
            .field("core", &self.core)
            .field("sources", &self.slots.len())
            .field("pending", &self.pending.remaining())
            .finish()
    }
}

/// Binary lift over sources of different types.
///
/// Same end semantics as [`LiftN`]. Passing one node as both sources is
/// allowed: each side is tracked on its own.
pub struct Lift2<A, B, U> {
    core: Core<U>,
    left: Slot<A>,
    right: Slot<B>,
    pending: Pending,
    state: RefCell<(A, B)>,
    step: Box<dyn Fn(&A, &B) -> U>,
    this: Weak<Self>,
}

impl<A, B, U> Lift2<A, B, U>
where
    A: Clone + 'static,
    B: Clone + 'static,
    U: Clone + 'static,
{
    /// Lift `step` over two sources. The initial value uses both current values.
    pub fn new<F>(step: F, left: SignalRef<A>, right: SignalRef<B>) -> Rc<Self>
    where
        F: Fn(&A, &B) -> U + 'static,
    {
        let state = (left.value(), right.value());
        let value = step(&state.0, &state.1);
        Rc::new_cyclic(|this| Self {
            core: Core::new("lift2", value),
            left: Slot::new(left),
            right: Slot::new(right),
            pending: Pending::new(2),
            state: RefCell::new(state),
            step: Box::new(step),
            this: this.clone(),
        })
    }

    fn left_handlers() -> Handlers<A, Self> {
        Handlers {
            value: Self::left_value,
            error: Self::forward_error,
            end: Self::source_ended,
        }
    }

    fn right_handlers() -> Handlers<B, Self> {
        Handlers {
            value: Self::right_value,
            error: Self::forward_error,
            end: Self::source_ended,
        }
    }

    fn left_value(&self, _index: usize, message: &A) -> Delivery {
        self.state.borrow_mut().0 = message.clone();
        self.recompute()
    }

    fn right_value(&self, _index: usize, message: &B) -> Delivery {
        self.state.borrow_mut().1 = message.clone();
        self.recompute()
    }

    fn recompute(&self) -> Delivery {
        let next = {
            let state = self.state.borrow();
            (self.step)(&state.0, &state.1)
        };
        self.receive(next);
        Ok(Flow::Continue)
    }

    fn forward_error(&self, fault: &Fault) -> Delivery {
        self.error(fault.clone());
        Ok(Flow::Continue)
    }

    fn source_ended(&self, index: usize) -> Delivery {
        if let Some(all_ended) = self.pending.close(index) {
            match index {
                0 => self.left.detach(),
                _ => self.right.detach(),
            }
            if all_ended {
                self.end();
            }
        }
        Ok(Flow::Continue)
    }
}

impl<A, B, U> Signal<U> for Lift2<A, B, U>
where
    A: Clone + 'static,
    B: Clone + 'static,
    U: Clone + 'static,
{
    fn core(&self) -> &Core<U> {
        &self.core
    }

    fn start(&self) {
        let Some(node) = self.this.upgrade() else {
            return;
        };
        if !self.pending.is_closed(0) {
            self.left.attach(&node, 0, Self::left_handlers());
        }
        if !self.pending.is_closed(1) {
            self.right.attach(&node, 1, Self::right_handlers());
        }
    }

    fn stop(&self) {
        self.left.detach();
        self.right.detach();
    }
}

impl<A, B, U> fmt::Debug for Lift2<A, B, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lift2")
            .field("core", &self.core)
            .field("pending", &self.pending.remaining())
            .finish()
    }
}
