//! Benchmarks for fan-out dispatch and derived-signal chains.

use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rivulet_core::combinators::{combine, lift};
use rivulet_core::reactive::{Input, Signal, SignalRef, Subscriber};

/// One source, many subscribers.
fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");

    for n in [1, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let source: SignalRef<u64> = Input::new(0);
            let total = Rc::new(Cell::new(0u64));
            for _ in 0..n {
                let total = total.clone();
                source.connect(
                    Subscriber::each(move |x: &u64| total.set(total.get() + x)).into_output(),
                );
            }

            let mut next = 0;
            b.iter(|| {
                next += 1;
                source.receive(black_box(next));
            });
        });
    }

    group.finish();
}

/// A value travelling down a chain of lifts.
fn bench_lift_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("lift_chain");

    for depth in [1, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            let source: SignalRef<u64> = Input::new(0);
            let mut tip = source.clone();
            for _ in 0..depth {
                tip = lift(|x: &u64| x.wrapping_add(1), tip);
            }
            tip.connect(Subscriber::each(|x: &u64| {
                black_box(*x);
            })
            .into_output());

            let mut next = 0;
            b.iter(|| {
                next += 1;
                source.receive(black_box(next));
            });
        });
    }

    group.finish();
}

/// Recombining many sources after one of them changes.
fn bench_combine(c: &mut Criterion) {
    let mut group = c.benchmark_group("combine");

    for width in [2, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            let sources: Vec<SignalRef<u64>> = (0..width)
                .map(|_| -> SignalRef<u64> { Input::new(0) })
                .collect();
            let combined = combine(sources.clone()).expect("distinct sources");
            combined.connect(Subscriber::each(|xs: &Vec<u64>| {
                black_box(xs.len());
            })
            .into_output());

            let mut next = 0;
            b.iter(|| {
                next += 1;
                sources[0].receive(black_box(next));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fan_out, bench_lift_chain, bench_combine);
criterion_main!(benches);
