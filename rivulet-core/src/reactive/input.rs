//! Source nodes.
//!
//! Sources have no upstream. [`Input`] is fed from outside the graph: a
//! producer calls [`Signal::receive`], [`Signal::error`], [`Signal::end`] or
//! [`send`](super::send) on it, and the input's start/stop hooks tell that
//! producer when anyone is listening. [`Constant`] never changes.

use std::borrow::Cow;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::error::Fault;
use crate::graph::{Core, OutputRef};

use super::signal::Signal;

type Hook = Box<dyn Fn()>;

/// A source fed by an external producer.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use rivulet_core::reactive::{Input, Signal, Subscriber};
///
/// let listening = Rc::new(Cell::new(false));
/// let on = listening.clone();
/// let off = listening.clone();
/// let clicks = Input::builder(0)
///     .name("clicks")
///     .on_start(move || on.set(true))
///     .on_stop(move || off.set(false))
///     .build();
///
/// let printer = Subscriber::each(|n: &i32| println!("click {n}")).into_output();
/// clicks.connect(printer.clone());
/// assert!(listening.get());
///
/// clicks.receive(1);
/// clicks.disconnect(&printer);
/// assert!(!listening.get());
/// ```
pub struct Input<T> {
    core: Core<T>,
    on_start: Option<Hook>,
    on_stop: Option<Hook>,
    // Set once the stop that follows end has run.
    finished: Cell<bool>,
}

impl<T: Clone + 'static> Input<T> {
    /// Create an input with no hooks.
    pub fn new(value: T) -> Rc<Self> {
        Self::builder(value).build()
    }

    /// Start building an input.
    pub fn builder(value: T) -> InputBuilder<T> {
        InputBuilder {
            name: Cow::Borrowed("input"),
            value,
            on_start: None,
            on_stop: None,
        }
    }
}

impl<T: Clone + 'static> Signal<T> for Input<T> {
    fn core(&self) -> &Core<T> {
        &self.core
    }

    fn start(&self) {
        if self.core.is_ended() {
            return;
        }
        if let Some(hook) = &self.on_start {
            hook();
        }
    }

    fn stop(&self) {
        if self.finished.replace(self.core.is_ended()) {
            return;
        }
        if let Some(hook) = &self.on_stop {
            hook();
        }
    }
}

impl<T> fmt::Debug for Input<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input").field("core", &self.core).finish()
    }
}

/// Builder for [`Input`].
pub struct InputBuilder<T> {
    name: Cow<'static, str>,
    value: T,
    on_start: Option<Hook>,
    on_stop: Option<Hook>,
}

impl<T: Clone + 'static> InputBuilder<T> {
    /// Set the diagnostic name.
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Run `hook` whenever the input gains its first output.
    pub fn on_start(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_start = Some(Box::new(hook));
        self
    }

    /// Run `hook` whenever the input loses its last output, or ends while
    /// nobody is connected. Neither hook runs again once the input has ended.
    pub fn on_stop(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_stop = Some(Box::new(hook));
        self
    }

    /// Finish building.
    pub fn build(self) -> Rc<Input<T>> {
        Rc::new(Input {
            core: Core::new(self.name, self.value),
            on_start: self.on_start,
            on_stop: self.on_stop,
            finished: Cell::new(false),
        })
    }
}

/// A signal that never changes.
///
/// Connecting to it, writing to it and ending it are all ignored. It is
/// never started and never delivers anything.
pub struct Constant<T> {
    core: Core<T>,
}

impl<T: Clone + 'static> Constant<T> {
    /// Create a constant signal.
    pub fn new(value: T) -> Rc<Self> {
        Rc::new(Self {
            core: Core::new("constant", value),
        })
    }
}

impl<T: Clone + 'static> Signal<T> for Constant<T> {
    fn core(&self) -> &Core<T> {
        &self.core
    }

    fn connect(&self, _output: OutputRef<T>) {}

    fn disconnect(&self, _output: &OutputRef<T>) {}

    fn receive(&self, _message: T) {}

    fn error(&self, _fault: Fault) {}

    fn end(&self) {}
}

impl<T> fmt::Debug for Constant<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constant").field("core", &self.core).finish()
    }
}
