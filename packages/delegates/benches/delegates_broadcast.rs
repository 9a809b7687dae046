//! Basic benchmarks for the `delegates` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

use criterion::{Criterion, criterion_group, criterion_main};
use delegates::{Delegate, MulticastDelegate};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

const TARGET_COUNT: usize = 16;

fn add(a: u64, b: u64) -> u64 {
    a.wrapping_add(b)
}

struct Accumulator {
    total: Cell<u64>,
}

impl Accumulator {
    fn accumulate(&self, a: u64, b: u64) -> u64 {
        self.total.set(self.total.get().wrapping_add(a).wrapping_add(b));
        self.total.get()
    }
}

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("delegates_invoke");

    group.bench_function("function", |b| {
        let mut delegate = Delegate::<(u64, u64), u64>::new();
        delegate.bind_function(add);

        b.iter(|| delegate.invoke(black_box((1, 2))));
    });

    group.bench_function("object", |b| {
        let accumulator = Accumulator {
            total: Cell::new(0),
        };

        let mut delegate = Delegate::<(u64, u64), u64>::new();
        delegate.bind_object(&accumulator, Accumulator::accumulate);

        b.iter(|| delegate.invoke(black_box((1, 2))));
    });

    group.bench_function("safe_object", |b| {
        let accumulator = Rc::new(Accumulator {
            total: Cell::new(0),
        });

        let mut delegate = Delegate::<(u64, u64), u64>::new();
        delegate.bind_shared_object(&accumulator, Accumulator::accumulate);

        b.iter(|| delegate.invoke(black_box((1, 2))));
    });

    group.bench_function("closure", |b| {
        let mut delegate = Delegate::<(u64, u64), u64>::new();
        delegate.bind_closure(|(a, b)| a.wrapping_mul(b));

        b.iter(|| delegate.invoke(black_box((1, 2))));
    });

    group.finish();

    let mut group = c.benchmark_group("delegates_broadcast");

    group.bench_function("empty", |b| {
        let delegate = MulticastDelegate::<(u64, u64), u64>::new();

        b.iter(|| delegate.broadcast(black_box((1, 2))));
    });

    group.bench_function("functions", |b| {
        let delegate = MulticastDelegate::<(u64, u64), u64>::new();

        for _ in 0..TARGET_COUNT {
            delegate.add_function(add);
        }

        b.iter(|| delegate.broadcast(black_box((1, 2))));
    });

    group.bench_function("safe_objects", |b| {
        let accumulators = (0..TARGET_COUNT)
            .map(|_| {
                Rc::new(Accumulator {
                    total: Cell::new(0),
                })
            })
            .collect::<Vec<_>>();

        let delegate = MulticastDelegate::<(u64, u64), u64>::new();

        for accumulator in &accumulators {
            delegate.add_shared_object(accumulator, Accumulator::accumulate);
        }

        b.iter(|| delegate.broadcast(black_box((1, 2))));
    });

    group.bench_function("collect_closures", |b| {
        let delegate = MulticastDelegate::<(u64, u64), u64>::new();

        for _ in 0..TARGET_COUNT {
            delegate.add_closure(|(a, b)| a.wrapping_mul(b));
        }

        b.iter(|| delegate.broadcast_collect(black_box((1, 2))));
    });

    group.bench_function("add_remove", |b| {
        let delegate = MulticastDelegate::<(u64, u64), u64>::new();

        b.iter(|| {
            let handle = delegate.add_function(add);
            delegate.remove(black_box(handle))
        });
    });

    group.finish();
}
