//! Microbenchmarks for the append and query paths.
//!
//! Run with: `cargo bench -p roundlog`

#![allow(missing_docs, clippy::cast_possible_wrap)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use roundlog::{CircularStore, StoreConfig};

/// Creates a store that has wrapped at least once.
fn setup_store(capacity: usize) -> CircularStore {
    let store = CircularStore::new(StoreConfig::new(capacity).unwrap()).unwrap();
    for i in 0..capacity + capacity / 2 {
        store.append(format!("{i}"), "2024-01-01 00:00:00", None);
    }
    store
}

fn bench_append(c: &mut Criterion) {
    let store = setup_store(100);

    c.bench_function("append/single", |b| {
        b.iter(|| {
            store.append(
                black_box("1 + 0"),
                black_box("2024-01-01 00:00:00"),
                black_box(None),
            )
        });
    });
}

fn bench_append_with(c: &mut Criterion) {
    let store = setup_store(100);

    c.bench_function("append/with_position", |b| {
        b.iter(|| {
            store.append_with(|round, slot| {
                roundlog::Entry::new(format!("{round} + {slot}"), "2024-01-01 00:00:00", None)
            })
        });
    });
}

fn bench_query_stale(c: &mut Criterion) {
    let mut group = c.benchmark_group("query/stale_full_round");

    for capacity in [10, 100, 1000] {
        let store = setup_store(capacity);

        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, _| {
            b.iter(|| store.query(black_box(0), black_box(0)).unwrap());
        });
    }

    group.finish();
}

fn bench_query_tail(c: &mut Criterion) {
    let store = setup_store(100);
    let position = store.position();
    let round = position.round as i64;
    let slot = position.cursor.unwrap_or(0) as i64;

    c.bench_function("query/latest_record", |b| {
        b.iter(|| store.query(black_box(round), black_box(slot)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_append,
    bench_append_with,
    bench_query_stale,
    bench_query_tail,
);
criterion_main!(benches);
