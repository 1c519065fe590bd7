//! Dispatch Engine
//!
//! [`write`] fans a single message out to every output of a node, on one of
//! three channels: value, error or end.
//!
//! # Algorithm
//!
//! The outputs list is not snapshotted. The loop walks it by index and
//! tolerates the list shrinking underneath it:
//!
//! 1. Take the output at `index` and hand it the message.
//! 2. If the handler failed on the value or end channel, hand the failure to
//!    the same output's error handler. A failure there, or any failure on the
//!    error channel, is logged and dropped.
//! 3. If the handler returned [`Flow::Break`], or the message was End,
//!    disconnect the output.
//! 4. If the output is still in its slot, move to the next one. Otherwise
//!    the list shifted under the loop: it restarts from the front and
//!    skips every output it has already visited, so nothing is skipped or
//!    visited twice.
//!
//! Once every output has been visited a value becomes the node's current
//! value. An End written to a node nobody listens to still stops the node,
//! so whatever it registered upstream gets released.

use smallvec::SmallVec;
use tracing::{error, warn};

use super::node::NodeId;
use super::port::{same_output, Delivery, Flow, Output, OutputRef};
use crate::error::Fault;
use crate::reactive::Signal;

/// A message on one of the three channels.
#[derive(Debug, Clone)]
pub enum Message<T> {
    /// A normal value.
    Value(T),

    /// An out-of-band error. Does not end the stream.
    Error(Fault),

    /// No further messages will follow.
    End,
}

impl<T> Message<T> {
    fn channel(&self) -> &'static str {
        match self {
            Message::Value(_) => "value",
            Message::Error(_) => "error",
            Message::End => "end",
        }
    }
}

/// Deliver `message` to every output of `node`.
pub fn write<T, S>(node: &S, message: Message<T>)
where
    T: Clone + 'static,
    S: Signal<T> + ?Sized,
{
    let core = node.core();
    let id = core.id();

    if core.is_ended() {
        warn!(
            node = %id,
            name = core.name(),
            channel = message.channel(),
            "message written after end, dropping"
        );
        return;
    }

    let count = core.output_count();
    match &message {
        Message::Error(fault) if count == 0 => {
            error!(node = %id, name = core.name(), %fault, "unhandled error message");
        }
        Message::End => core.mark_ended(),
        _ => {}
    }

    let mut index = 0;
    let mut visited: SmallVec<[OutputRef<T>; 4]> = SmallVec::new();
    let mut shifted = false;
    while let Some(output) = core.output_at(index) {
        if shifted && visited.iter().any(|seen| same_output(seen, &output)) {
            index += 1;
            continue;
        }

        let flow = match deliver(&*output, &message, id) {
            Ok(flow) => flow,
            Err(reason) => recover(&*output, &message, reason, id),
        };

        if flow == Flow::Break || matches!(message, Message::End) {
            node.disconnect(&output);
        }

        let in_place = core
            .output_at(index)
            .is_some_and(|current| same_output(&current, &output));
        visited.push(output);
        if in_place {
            index += 1;
        } else {
            shifted = true;
            index = 0;
        }
    }

    match message {
        Message::Value(value) => core.set_value(value),
        Message::End if count == 0 => node.stop(),
        _ => {}
    }
}

fn deliver<T>(output: &dyn Output<T>, message: &Message<T>, source: NodeId) -> Delivery {
    match message {
        Message::Value(value) => output.on_value(value, source),
        Message::Error(fault) => output.on_error(fault, source),
        Message::End => output.on_end(source),
    }
}

/// Handle a failed delivery and decide what happens to the output.
fn recover<T>(output: &dyn Output<T>, message: &Message<T>, reason: Fault, source: NodeId) -> Flow {
    if let Message::Error(fault) = message {
        error!(node = %source, %fault, %reason, "failed to receive an error message");
        return Flow::Continue;
    }

    match output.on_error(&reason, source) {
        Ok(flow) => flow,
        Err(second) => {
            error!(
                node = %source,
                channel = message.channel(),
                %reason,
                %second,
                "failed to receive message and the error it raised"
            );
            Flow::Continue
        }
    }
}
