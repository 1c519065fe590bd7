//! Combinators
//!
//! Functions that build derived signals out of existing ones.
//!
//! # Primitives
//!
//! Four node kinds implement the protocol directly:
//!
//! - [`Merge`]: forwards whatever any of its sources emits, and ends once
//!   every source has ended.
//! - [`FoldP`]: accumulates values into a state.
//! - [`Lift`], [`LiftN`], [`Lift2`]: apply a pure function to the latest
//!   value(s) of their sources.
//! - [`Filter`]: forwards values that pass a predicate (keep-if) or fail it
//!   (drop-if).
//!
//! Every derived node is primed at construction from the current value of
//! its sources, so a signal always has a value.
//!
//! # Derived combinators
//!
//! [`drop_repeats`], [`keep_when`], [`drop_when`], [`sample_on`],
//! [`count`], [`count_if`] and [`combine`] are compositions of the
//! primitives and add no protocol of their own.

mod derived;
mod filter;
mod fold;
mod join;
mod lift;
mod merge;

use std::rc::Weak;

use crate::error::{Result, SignalError};
use crate::graph::{Output, OutputRef};
use crate::reactive::{Signal, SignalRef};

pub use derived::{
    combine, constant, count, count_if, drop_if, drop_repeats, drop_when, foldp, keep_if,
    keep_when, lift, lift2, lift_n, merge, merges, sample_on, try_lift,
};
pub use filter::{Filter, Polarity};
pub use fold::FoldP;
pub use lift::{Lift, Lift2, LiftN};
pub use merge::Merge;

/// Connect a unary node to its upstream.
fn link<T, N>(source: &SignalRef<T>, this: &Weak<N>)
where
    T: Clone + 'static,
    N: Output<T> + 'static,
{
    if let Some(node) = this.upgrade() {
        let output: OutputRef<T> = node;
        source.connect(output);
    }
}

/// Disconnect a unary node from its upstream.
fn unlink<T, N>(source: &SignalRef<T>, this: &Weak<N>)
where
    T: Clone + 'static,
    N: Output<T> + 'static,
{
    if let Some(node) = this.upgrade() {
        let output: OutputRef<T> = node;
        source.disconnect(&output);
    }
}

/// Reject empty source lists and repeated sources.
fn check_sources<T: Clone + 'static>(kind: &'static str, sources: &[SignalRef<T>]) -> Result<()> {
    if sources.is_empty() {
        return Err(SignalError::NoSources { kind });
    }
    for (second, source) in sources.iter().enumerate() {
        if let Some(first) = sources[..second].iter().position(|s| s.id() == source.id()) {
            return Err(SignalError::DuplicateSource {
                kind,
                id: source.id(),
                first,
                second,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Input;

    #[test]
    fn check_sources_rejects_empty() {
        let sources: Vec<SignalRef<i32>> = Vec::new();
        assert_eq!(
            check_sources("merge", &sources),
            Err(SignalError::NoSources { kind: "merge" })
        );
    }

    #[test]
    fn check_sources_rejects_repeats() {
        let a: SignalRef<i32> = Input::new(0);
        let b: SignalRef<i32> = Input::new(0);
        let sources = vec![a.clone(), b, a.clone()];

        assert_eq!(
            check_sources("lift_n", &sources),
            Err(SignalError::DuplicateSource {
                kind: "lift_n",
                id: a.id(),
                first: 0,
                second: 2,
            })
        );
    }
}
