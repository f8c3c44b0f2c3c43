//! Symbol interning benchmarks.
//!
//! Run with: `cargo bench --bench symbol_bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rxc_util::Symbol;

fn bench_intern(c: &mut Criterion) {
    let mut group = c.benchmark_group("intern");
    group.throughput(Throughput::Elements(1));

    group.bench_function("intern_miss", |b| {
        let mut counter = 0u64;
        b.iter(|| {
            counter += 1;
            Symbol::intern(&format!("bench_miss_{counter}"))
        })
    });

    group.bench_function("intern_hit", |b| {
        let _warm = Symbol::intern("bench_hit_probe");
        b.iter(|| black_box(Symbol::intern("bench_hit_probe")))
    });

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    group.throughput(Throughput::Elements(1));

    let symbol = Symbol::intern("bench_resolve_probe");
    group.bench_function("as_str", |b| b.iter(|| black_box(symbol.as_str())));

    group.finish();
}

criterion_group!(benches, bench_intern, bench_resolve);
criterion_main!(benches);
