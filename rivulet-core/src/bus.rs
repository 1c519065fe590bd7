//! Topic Bus
//!
//! An in-process publish point keyed by topic. Sources subscribe to a topic
//! with [`Bus::input`] and receive whatever is published on it while they
//! are started. [`Bus::output`] goes the other way and republishes every
//! value it receives.
//!
//! The bus only holds its inputs weakly, so registering does not keep an
//! input alive. An input registers when it gains its first output and
//! unregisters when it loses its last, or when it is dropped.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::error::{Fault, Result, SignalError};
use crate::graph::{Core, Delivery, Flow, NodeId, Output};
use crate::reactive::Signal;

struct Registry<T> {
    topics: RefCell<IndexMap<String, Vec<Weak<TopicInput<T>>>>>,
    closed: Cell<bool>,
}

impl<T> Registry<T> {
    fn register(&self, topic: &str, input: Weak<TopicInput<T>>) {
        self.topics
            .borrow_mut()
            .entry(topic.to_owned())
            .or_default()
            .push(input);
    }

    fn unregister(&self, topic: &str, input: &Weak<TopicInput<T>>) {
        let mut topics = self.topics.borrow_mut();
        let Some(inputs) = topics.get_mut(topic) else {
            return;
        };
        inputs.retain(|registered| !registered.ptr_eq(input));
        if inputs.is_empty() {
            topics.shift_remove(topic);
        }
    }
}

impl<T: Clone + 'static> Registry<T> {
    fn publish(&self, topic: &str, value: T) -> Result<usize> {
        if self.closed.get() {
            return Err(SignalError::BusClosed {
                topic: topic.to_owned(),
            });
        }
        let inputs = self.inputs(topic);
        trace!(topic, observers = inputs.len(), "publish");
        for input in &inputs {
            input.receive(value.clone());
        }
        Ok(inputs.len())
    }

    /// Live inputs of `topic`, in registration order.
    fn inputs(&self, topic: &str) -> Vec<Rc<TopicInput<T>>> {
        self.topics
            .borrow()
            .get(topic)
            .map(|inputs| inputs.iter().filter_map(Weak::upgrade).collect())
            .unwrap_or_default()
    }
}

/// Publish point for values of type `T`.
///
/// Cloning a bus gives another handle to the same topics.
pub struct Bus<T> {
    registry: Rc<Registry<T>>,
}

impl<T: Clone + 'static> Bus<T> {
    /// Create an open bus with no topics.
    pub fn new() -> Self {
        Self {
            registry: Rc::new(Registry {
                topics: RefCell::new(IndexMap::new()),
                closed: Cell::new(false),
            }),
        }
    }

    /// Source that receives what is published on `topic`.
    pub fn input(&self, topic: impl Into<String>, initial: T) -> Rc<TopicInput<T>> {
        let topic = topic.into();
        Rc::new_cyclic(|this| TopicInput {
            core: Core::new(format!("topic:{topic}"), initial),
            topic,
            registry: Rc::downgrade(&self.registry),
            this: this.clone(),
        })
    }

    /// Output that republishes every value it receives on `topic`.
    pub fn output(&self, topic: impl Into<String>) -> Rc<TopicOutput<T>> {
        Rc::new(TopicOutput {
            topic: topic.into(),
            registry: Rc::clone(&self.registry),
        })
    }

    /// Deliver `value` to every started input of `topic`.
    ///
    /// Returns the number of inputs it reached.
    pub fn publish(&self, topic: &str, value: T) -> Result<usize> {
        self.registry.publish(topic, value)
    }

    /// Number of started inputs on `topic`.
    pub fn observer_count(&self, topic: &str) -> usize {
        self.registry.inputs(topic).len()
    }

    /// Topics with at least one registered input, oldest first.
    pub fn topics(&self) -> Vec<String> {
        self.registry.topics.borrow().keys().cloned().collect()
    }

    /// Whether [`Bus::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.registry.closed.get()
    }

    /// Close the bus and end every registered input.
    ///
    /// Closing twice is a no-op.
    pub fn close(&self) {
        if self.registry.closed.replace(true) {
            return;
        }
        let topics = std::mem::take(&mut *self.registry.topics.borrow_mut());
        debug!(topics = topics.len(), "closing bus");
        for input in topics.into_values().flatten().filter_map(|input| input.upgrade()) {
            input.end();
        }
    }
}

impl<T: Clone + 'static> Default for Bus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Bus<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<T> fmt::Debug for Bus<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("topics", &self.registry.topics.borrow().len())
            .field("closed", &self.registry.closed.get())
            .finish()
    }
}

/// A source fed by one topic of a [`Bus`].
pub struct TopicInput<T> {
    core: Core<T>,
    topic: String,
    registry: Weak<Registry<T>>,
    this: Weak<Self>,
}

impl<T> TopicInput<T> {
    /// Topic this input listens to.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl<T: Clone + 'static> Signal<T> for TopicInput<T> {
    fn core(&self) -> &Core<T> {
        &self.core
    }

    fn start(&self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        if registry.closed.get() {
            debug!(topic = %self.topic, "bus closed, not registering");
            return;
        }
        registry.register(&self.topic, self.this.clone());
    }

    fn stop(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(&self.topic, &self.this);
        }
    }
}

impl<T> Drop for TopicInput<T> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(&self.topic, &self.this);
        }
    }
}

impl<T> fmt::Debug for TopicInput<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicInput")
            .field("core", &self.core)
            .field("topic", &self.topic)
            .finish()
    }
}

/// Republishes received values on a topic.
///
/// Errors cannot be published and are dropped with a warning. End leaves
/// the bus open.
pub struct TopicOutput<T> {
    topic: String,
    registry: Rc<Registry<T>>,
}

impl<T: Clone + 'static> Output<T> for TopicOutput<T> {
    fn on_value(&self, message: &T, _source: NodeId) -> Delivery {
        self.registry.publish(&self.topic, message.clone())?;
        Ok(Flow::Continue)
    }

    fn on_error(&self, fault: &Fault, source: NodeId) -> Delivery {
        warn!(topic = %self.topic, node = %source, %fault, "error dropped at topic output");
        Ok(Flow::Continue)
    }

    fn on_end(&self, _source: NodeId) -> Delivery {
        Ok(Flow::Continue)
    }
}

impl<T> fmt::Debug for TopicOutput<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicOutput")
            .field("topic", &self.topic)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::lift;
    use crate::graph::Lifecycle;
    use crate::reactive::{Input, SignalRef};
    use crate::testing::{capture_logs, Recorder, Seen};

    #[test]
    fn inputs_receive_only_while_started() {
        let bus = Bus::new();
        let input = bus.input("greeting", String::new());

        assert_eq!(bus.publish("greeting", "ignored".to_owned()).unwrap(), 0);
        assert_eq!(input.value(), "");

        let client = Recorder::<String>::new();
        input.connect(client.output());
        assert_eq!(bus.observer_count("greeting"), 1);
        assert_eq!(bus.publish("greeting", "hello".to_owned()).unwrap(), 1);

        input.disconnect(&client.output());
        assert_eq!(bus.observer_count("greeting"), 0);
        assert!(bus.topics().is_empty());
        bus.publish("greeting", "bye".to_owned()).unwrap();

        assert_eq!(client.values(), vec!["hello".to_owned()]);
        assert_eq!(input.value(), "hello");
    }

    #[test]
    fn derived_chain_activates_the_topic() {
        let bus = Bus::<i32>::new();
        let input: SignalRef<i32> = bus.input("n", 0);
        let doubled = lift(|x: &i32| x * 2, input.clone());

        bus.publish("n", 1).unwrap();
        assert_eq!(doubled.value(), 0);

        let client = Recorder::<i32>::new();
        doubled.connect(client.output());
        bus.publish("n", 2).unwrap();

        assert_eq!(client.values(), vec![4]);
        assert_eq!(input.lifecycle(), Lifecycle::Started);
    }

    #[test]
    fn topics_are_kept_apart() {
        let bus = Bus::new();
        let a = bus.input("a", 0);
        let b = bus.input("b", 0);
        let seen_a = Recorder::<i32>::new();
        let seen_b = Recorder::<i32>::new();
        a.connect(seen_a.output());
        b.connect(seen_b.output());

        bus.publish("b", 2).unwrap();
        bus.publish("a", 1).unwrap();

        assert_eq!(seen_a.values(), vec![1]);
        assert_eq!(seen_b.values(), vec![2]);
        assert_eq!(bus.topics(), vec!["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn close_ends_inputs_and_rejects_publishing() {
        let bus = Bus::new();
        let input = bus.input("t", 0);
        let client = Recorder::<i32>::new();
        input.connect(client.output());

        bus.close();

        assert_eq!(client.seen(), vec![Seen::End]);
        assert_eq!(input.lifecycle(), Lifecycle::Stopped);
        assert!(bus.is_closed());
        assert_eq!(
            bus.publish("t", 1),
            Err(SignalError::BusClosed { topic: "t".into() })
        );
    }

    #[test]
    fn output_republishes_values() {
        let bus = Bus::<i32>::new();
        let source: SignalRef<i32> = Input::new(0);
        let sink = bus.input("relay", 0);
        let client = Recorder::<i32>::new();
        sink.connect(client.output());
        source.connect(bus.output("relay"));

        source.receive(5);
        source.receive(6);

        assert_eq!(client.values(), vec![5, 6]);
    }

    #[test]
    fn output_on_closed_bus_logs_failure() {
        let bus = Bus::<i32>::new();
        let source: SignalRef<i32> = Input::new(0);
        source.connect(bus.output("relay"));
        bus.close();

        let logs = capture_logs(|| source.receive(1));

        assert_eq!(logs.len(), 1);
        assert!(logs[0].contains("error dropped at topic output"));
        assert!(logs[0].contains("bus is closed"));
    }

    #[test]
    fn dropped_input_is_not_kept_alive() {
        let bus = Bus::new();
        let input = bus.input("t", 0);
        let client = Recorder::<i32>::new();
        input.connect(client.output());
        drop(input);

        assert_eq!(bus.publish("t", 1).unwrap(), 0);
        assert_eq!(bus.observer_count("t"), 0);
        assert!(client.seen().is_empty());
        assert!(bus.topics().is_empty());
    }

    #[test]
    fn dropping_inputs_forgets_their_topics() {
        let bus = Bus::<i32>::new();
        let client = Recorder::<i32>::new();
        let kept = bus.input("kept", 0);
        kept.connect(client.output());
        for n in 0..8 {
            let input = bus.input(format!("short-{n}"), 0);
            input.connect(client.output());
        }
        let shared = bus.input("kept", 0);
        shared.connect(client.output());
        drop(shared);

        assert_eq!(bus.topics(), vec!["kept".to_owned()]);
        assert_eq!(bus.observer_count("kept"), 1);
        assert_eq!(bus.publish("kept", 3).unwrap(), 1);
        assert_eq!(client.values(), vec![3]);
    }
}
