//! Test helpers shared by unit tests.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Metadata};

use crate::error::Fault;
use crate::graph::{Delivery, Flow, NodeId, Output, OutputRef};

/// What a [`Recorder`] saw, in order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Seen<T> {
    Value(T),
    Error(String),
    End,
}

/// An output that records everything delivered to it.
pub(crate) struct Recorder<T> {
    seen: RefCell<Vec<Seen<T>>>,
    break_on_value: Cell<bool>,
    break_on_error: Cell<bool>,
    fail_values: RefCell<Option<String>>,
}

impl<T: Clone + 'static> Recorder<T> {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            seen: RefCell::new(Vec::new()),
            break_on_value: Cell::new(false),
            break_on_error: Cell::new(false),
            fail_values: RefCell::new(None),
        })
    }

    pub(crate) fn output(self: &Rc<Self>) -> OutputRef<T> {
        self.clone()
    }

    pub(crate) fn into_output(self: Rc<Self>) -> OutputRef<T> {
        self
    }

    pub(crate) fn break_on_value(&self) {
        self.break_on_value.set(true);
    }

    pub(crate) fn break_on_error(&self) {
        self.break_on_error.set(true);
    }

    /// Record values, then fail with `message`.
    pub(crate) fn fail_values_with(&self, message: &str) {
        *self.fail_values.borrow_mut() = Some(message.to_owned());
    }

    pub(crate) fn seen(&self) -> Vec<Seen<T>> {
        self.seen.borrow().clone()
    }

    pub(crate) fn values(&self) -> Vec<T> {
        self.seen
            .borrow()
            .iter()
            .filter_map(|seen| match seen {
                Seen::Value(value) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn ended(&self) -> bool {
        self.seen.borrow().iter().any(|seen| matches!(seen, Seen::End))
    }
}

impl<T: Clone> Output<T> for Recorder<T> {
    fn on_value(&self, message: &T, _source: NodeId) -> Delivery {
        self.seen.borrow_mut().push(Seen::Value(message.clone()));
        if let Some(reason) = self.fail_values.borrow().as_ref() {
            return Err(Fault::msg(reason.clone()));
        }
        Ok(if self.break_on_value.get() {
            Flow::Break
        } else {
            Flow::Continue
        })
    }

    fn on_error(&self, fault: &Fault, _source: NodeId) -> Delivery {
        self.seen.borrow_mut().push(Seen::Error(fault.to_string()));
        Ok(if self.break_on_error.get() {
            Flow::Break
        } else {
            Flow::Continue
        })
    }

    fn on_end(&self, _source: NodeId) -> Delivery {
        self.seen.borrow_mut().push(Seen::End);
        Ok(Flow::Continue)
    }
}

/// Run `f` with a recording tracing subscriber and return one line per event.
pub(crate) fn capture_logs(f: impl FnOnce()) -> Vec<String> {
    let collector = LineCollector::default();
    tracing::subscriber::with_default(collector.clone(), f);
    collector.lines()
}

#[derive(Clone, Default)]
struct LineCollector {
    lines: Arc<Mutex<Vec<String>>>,
}

impl LineCollector {
    fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("lock").clone()
    }
}

impl tracing::Subscriber for LineCollector {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, _: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _: &Id, _: &Record<'_>) {}

    fn record_follows_from(&self, _: &Id, _: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut visitor = LineVisitor {
            line: format!("{} ", event.metadata().level()),
        };
        event.record(&mut visitor);
        self.lines.lock().expect("lock").push(visitor.line);
    }

    fn enter(&self, _: &Id) {}

    fn exit(&self, _: &Id) {}
}

struct LineVisitor {
    line: String,
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.line.push_str(&format!("{value:?}"));
        } else {
            self.line.push_str(&format!(" {}={value:?}", field.name()));
        }
    }
}
