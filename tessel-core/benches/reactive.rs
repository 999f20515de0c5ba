//! Benchmarks for signal propagation and list reconciliation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use tessel_core::{el, Definition, Document, Engine, ItemKey, Props, Runtime, Value};

// =============================================================================
// Signal Propagation
// =============================================================================

fn bench_signal_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal_fan_out");

    for subscribers in [1usize, 16, 256] {
        let runtime = Runtime::new();
        let source = runtime.signal(0u64);
        let effects: Vec<_> = (0..subscribers)
            .map(|_| {
                let source = source.clone();
                runtime.effect(move || {
                    black_box(source.get());
                })
            })
            .collect();

        group.throughput(Throughput::Elements(subscribers as u64));
        group.bench_with_input(BenchmarkId::from_parameter(subscribers), &source, |b, source| {
            b.iter(|| source.update(|n| n + 1));
        });
        drop(effects);
    }

    group.finish();
}

fn bench_derived_chain(c: &mut Criterion) {
    let runtime = Runtime::new();
    let source = runtime.signal(0u64);
    let mut tail = source.clone();
    for _ in 0..32 {
        let previous = tail.clone();
        tail = runtime.derive(move || previous.get() + 1);
    }

    c.bench_function("derived_chain_32", |b| {
        b.iter(|| {
            source.update(|n| n + 1);
            black_box(tail.get_untracked())
        });
    });
}

// =============================================================================
// List Reconciliation
// =============================================================================

fn collection(len: usize, shift: usize) -> Value {
    Value::List((0..len).map(|n| Value::from(n + shift)).collect())
}

fn bench_keyed_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed_list");

    for len in [10usize, 100, 1000] {
        let document = Document::new();
        document.build(
            document.root(),
            &el("template")
                .attr("id", "bench-list")
                .attr("data--rows", "")
                .attr("data--by-value", "")
                .child(
                    el("ul").child(
                        el("data--rows")
                            .attr("each", "data--row")
                            .attr("key", "data--by-value")
                            .child(el("li").child(el("data--row"))),
                    ),
                ),
        );
        let engine = Engine::new(document);
        let rows = engine.runtime().signal(collection(len, 0));
        let component = engine
            .define(
                Definition::new("bench-list")
                    .prop("rows", rows.clone())
                    .prop("byValue", Value::key_fn(|row, _, _| ItemKey::from_value(row))),
            )
            .expect("bench template is valid");
        let root = engine.document().root();
        component
            .mount(root, "rows", Props::new())
            .expect("bench list mounts");

        let mut shift = 0;
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter(|| {
                shift = (shift + 1) % 2;
                rows.set(collection(len, shift));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_signal_fan_out, bench_derived_chain, bench_keyed_list);
criterion_main!(benches);
