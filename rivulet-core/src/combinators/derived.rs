//! Combinator functions.
//!
//! Thin constructors over the primitive nodes, plus the combinators that
//! are only compositions of them. Everything here returns a [`SignalRef`] so
//! calls nest.

use super::filter::{Filter, Polarity};
use super::fold::FoldP;
use super::lift::{Lift, Lift2, LiftN};
use super::merge::Merge;
use crate::error::{Fault, Result};
use crate::reactive::{Constant, Signal, SignalRef};

/// A signal that always holds `value`.
pub fn constant<T: Clone + 'static>(value: T) -> SignalRef<T> {
    Constant::new(value)
}

/// Merge two signals. See [`Merge`].
pub fn merge<T>(left: SignalRef<T>, right: SignalRef<T>) -> Result<SignalRef<T>>
where
    T: Clone + 'static,
{
    merges(vec![left, right])
}

/// Merge any number of signals, biased towards the earlier ones.
pub fn merges<T: Clone + 'static>(sources: Vec<SignalRef<T>>) -> Result<SignalRef<T>> {
    let merged: SignalRef<T> = Merge::new(sources)?;
    Ok(merged)
}

/// Accumulate values from the past, starting at `initial`.
pub fn foldp<T, A, F>(step: F, initial: A, source: SignalRef<T>) -> SignalRef<A>
where
    T: Clone + 'static,
    A: Clone + 'static,
    F: Fn(&A, &T) -> A + 'static,
{
    FoldP::new(step, initial, source)
}

/// Apply `step` to every value of `source`.
pub fn lift<T, U, F>(step: F, source: SignalRef<T>) -> SignalRef<U>
where
    T: Clone + 'static,
    U: Clone + 'static,
    F: Fn(&T) -> U + 'static,
{
    Lift::new(step, source)
}

/// Like [`lift`], but failures of `step` are sent downstream as errors.
///
/// Fails right away if `step` fails on the source's current value.
pub fn try_lift<T, U, F>(step: F, source: SignalRef<T>) -> std::result::Result<SignalRef<U>, Fault>
where
    T: Clone + 'static,
    U: Clone + 'static,
    F: Fn(&T) -> std::result::Result<U, Fault> + 'static,
{
    let lifted: SignalRef<U> = Lift::try_new(step, source)?;
    Ok(lifted)
}

/// Apply `step` to the latest values of `left` and `right`.
pub fn lift2<A, B, U, F>(step: F, left: SignalRef<A>, right: SignalRef<B>) -> SignalRef<U>
where
    A: Clone + 'static,
    B: Clone + 'static,
    U: Clone + 'static,
    F: Fn(&A, &B) -> U + 'static,
{
    Lift2::new(step, left, right)
}

/// Apply `step` to the latest values of all `sources`.
pub fn lift_n<T, U, F>(step: F, sources: Vec<SignalRef<T>>) -> Result<SignalRef<U>>
where
    T: Clone + 'static,
    U: Clone + 'static,
    F: Fn(&[T]) -> U + 'static,
{
    let lifted: SignalRef<U> = LiftN::new(step, sources)?;
    Ok(lifted)
}

/// A signal of the latest values of all `sources`, in order.
pub fn combine<T: Clone + 'static>(sources: Vec<SignalRef<T>>) -> Result<SignalRef<Vec<T>>> {
    let combined: SignalRef<Vec<T>> = LiftN::named("combine", <[T]>::to_vec, sources)?;
    Ok(combined)
}

/// Forward only values that satisfy `predicate`. See [`Filter`].
pub fn keep_if<T, P>(predicate: P, fallback: T, source: SignalRef<T>) -> SignalRef<T>
where
    T: Clone + 'static,
    P: Fn(&T) -> bool + 'static,
{
    Filter::keep_if(predicate, fallback, source)
}

/// Forward only values that fail `predicate`. See [`Filter`].
pub fn drop_if<T, P>(predicate: P, fallback: T, source: SignalRef<T>) -> SignalRef<T>
where
    T: Clone + 'static,
    P: Fn(&T) -> bool + 'static,
{
    Filter::drop_if(predicate, fallback, source)
}

/// Drop values equal to the last one forwarded.
pub fn drop_repeats<T>(source: SignalRef<T>) -> SignalRef<T>
where
    T: Clone + PartialEq + 'static,
{
    let fallback = source.value();
    Filter::new(
        Polarity::Drop,
        |message, current| message == current,
        fallback,
        source,
    )
}

/// Forward values of `source` only while `state` is true.
///
/// Also fires when `state` turns true, with the latest value of `source`.
/// `initial` is used if the gate starts closed.
pub fn keep_when<T: Clone + 'static>(
    state: SignalRef<bool>,
    initial: T,
    source: SignalRef<T>,
) -> SignalRef<T> {
    gate(true, state, initial, source)
}

/// Forward values of `source` only while `state` is false.
pub fn drop_when<T: Clone + 'static>(
    state: SignalRef<bool>,
    initial: T,
    source: SignalRef<T>,
) -> SignalRef<T> {
    gate(false, state, initial, source)
}

fn gate<T: Clone + 'static>(
    open_on: bool,
    state: SignalRef<bool>,
    initial: T,
    source: SignalRef<T>,
) -> SignalRef<T> {
    // `None` marks a value that arrived while the gate was shut.
    let gated = lift2(
        move |open: &bool, message: &T| (*open == open_on).then(|| message.clone()),
        drop_repeats(state),
        source,
    );
    let passed = drop_if(Option::is_none, Some(initial.clone()), gated);
    lift(
        move |message: &Option<T>| message.clone().unwrap_or_else(|| initial.clone()),
        passed,
    )
}

/// Emit the current value of `source` whenever `ticks` fires.
///
/// Values of `source` on their own are never forwarded.
pub fn sample_on<S, T>(ticks: SignalRef<S>, source: SignalRef<T>) -> SignalRef<T>
where
    S: Clone + 'static,
    T: Clone + 'static,
{
    let value = source.value();
    let tracked = drop_if(|_: &T| true, value.clone(), source.clone());
    let sampled = lift(move |_: &S| source.value(), ticks);
    Merge::build(value, vec![tracked, sampled])
}

/// Number of values `source` has produced.
pub fn count<T: Clone + 'static>(source: SignalRef<T>) -> SignalRef<u64> {
    foldp(|total: &u64, _: &T| total + 1, 0, source)
}

/// Number of values `source` has produced that satisfy `predicate`.
pub fn count_if<T, P>(predicate: P, source: SignalRef<T>) -> SignalRef<u64>
where
    T: Clone + 'static,
    P: Fn(&T) -> bool + 'static,
{
    let fallback = source.value();
    count(keep_if(predicate, fallback, source))
}
