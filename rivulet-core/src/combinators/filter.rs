//! Predicate filters.

use std::fmt;
use std::rc::{Rc, Weak};

use serde::Serialize;

use super::{link, unlink};
use crate::error::Fault;
use crate::graph::{Core, Delivery, Flow, NodeId, Output};
use crate::reactive::{Signal, SignalRef};

type Predicate<T> = Box<dyn Fn(&T, &T) -> bool>;

/// Whether a filter forwards the values that pass its predicate or the ones
/// that fail it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Forward values that satisfy the predicate.
    Keep,
    /// Forward values that fail the predicate.
    Drop,
}

impl Polarity {
    fn admits(self, verdict: bool) -> bool {
        match self {
            Polarity::Keep => verdict,
            Polarity::Drop => !verdict,
        }
    }
}

/// Forwards only the values its predicate admits.
///
/// The predicate sees the incoming value and the filter's current value.
/// A swallowed value leaves the current value untouched. Errors and End
/// always pass through.
pub struct Filter<T> {
    core: Core<T>,
    source: SignalRef<T>,
    polarity: Polarity,
    predicate: Predicate<T>,
    this: Weak<Self>,
}

impl<T: Clone + 'static> Filter<T> {
    /// Forward values for which `predicate` holds.
    ///
    /// Starts at the source's value if it already passes, at `fallback`
    /// otherwise.
    pub fn keep_if<P>(predicate: P, fallback: T, source: SignalRef<T>) -> Rc<Self>
    where
        P: Fn(&T) -> bool + 'static,
    {
        Self::new(Polarity::Keep, move |message, _| predicate(message), fallback, source)
    }

    /// Forward values for which `predicate` does not hold.
    pub fn drop_if<P>(predicate: P, fallback: T, source: SignalRef<T>) -> Rc<Self>
    where
        P: Fn(&T) -> bool + 'static,
    {
        Self::new(Polarity::Drop, move |message, _| predicate(message), fallback, source)
    }

    /// Filter with a predicate that also sees the current value.
    ///
    /// While priming, the current value is `fallback`.
    pub fn new<P>(
        polarity: Polarity,
        predicate: P,
        fallback: T,
        source: SignalRef<T>,
    ) -> Rc<Self>
    where
        P: Fn(&T, &T) -> bool + 'static,
    {
        let initial = source.value();
        let value = if polarity.admits(predicate(&initial, &fallback)) {
            initial
        } else {
            fallback
        };
        Rc::new_cyclic(|this| Self {
            core: Core::new(
                match polarity {
                    Polarity::Keep => "keep_if",
                    Polarity::Drop => "drop_if",
                },
                value,
            ),
            source,
            polarity,
            predicate: Box::new(predicate),
            this: this.clone(),
        })
    }

    /// Whether matching values are kept or dropped.
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }
}

impl<T: Clone + 'static> Signal<T> for Filter<T> {
    fn core(&self) -> &Core<T> {
        &self.core
    }

    fn start(&self) {
        link(&self.source, &self.this);
    }

    fn stop(&self) {
        unlink(&self.source, &self.this);
    }
}

impl<T: Clone + 'static> Output<T> for Filter<T> {
    fn on_value(&self, message: &T, _source: NodeId) -> Delivery {
        let admitted = {
            let current = self.core.borrow_value();
            self.polarity.admits((self.predicate)(message, &current))
        };
        if admitted {
            self.receive(message.clone());
        }
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

impl<T> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("core", &self.core)
            .field("polarity", &self.polarity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{send, Input, Return};
    use crate::testing::{Recorder, Seen};

    fn is_odd(x: &i32) -> bool {
        x % 2 != 0
    }

    fn is_even(x: &i32) -> bool {
        x % 2 == 0
    }

    #[test]
    fn keep_if_primes_from_source_when_it_passes() {
        let xs: SignalRef<i32> = Input::new(1);
        let odd = Filter::keep_if(is_odd, 0, xs.clone());
        let even = Filter::keep_if(is_even, 0, xs.clone());

        assert_eq!(odd.value(), 1);
        assert_eq!(even.value(), 0);
    }

    #[test]
    fn keep_if_swallows_failing_values() {
        let xs: SignalRef<i32> = Input::new(0);
        let even = Filter::keep_if(is_even, 0, xs.clone());
        let client = Recorder::<i32>::new();
        even.connect(client.output());

        for x in 1..=5 {
            xs.receive(x);
        }
        send(&*xs, Return(7));

        assert_eq!(
            client.seen(),
            vec![Seen::Value(2), Seen::Value(4), Seen::End]
        );
        assert_eq!(even.value(), 4);
    }

    #[test]
    fn drop_if_is_the_complement() {
        let xs: SignalRef<i32> = Input::new(0);
        let odd = Filter::drop_if(is_even, 1, xs.clone());
        assert_eq!(odd.value(), 1);
        assert_eq!(odd.polarity(), Polarity::Drop);

        let client = Recorder::<i32>::new();
        odd.connect(client.output());
        for x in 1..=4 {
            xs.receive(x);
        }

        assert_eq!(client.values(), vec![1, 3]);
    }

    #[test]
    fn predicate_sees_current_value() {
        let xs: SignalRef<i32> = Input::new(0);
        let rising = Filter::new(
            Polarity::Keep,
            |m: &i32, current: &i32| m > current,
            0,
            xs.clone(),
        );
        let client = Recorder::<i32>::new();
        rising.connect(client.output());

        for x in [1, 3, 2, 5, 4] {
            xs.receive(x);
        }

        assert_eq!(client.values(), vec![1, 3, 5]);
    }

    #[test]
    fn errors_bypass_the_predicate() {
        let xs: SignalRef<i32> = Input::new(0);
        let none = Filter::keep_if(|_: &i32| false, 0, xs.clone());
        let client = Recorder::<i32>::new();
        none.connect(client.output());

        xs.receive(1);
        xs.error(Fault::msg("boom"));

        assert_eq!(client.seen(), vec![Seen::Error("boom".into())]);
    }
}
