//! Read-back benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fatalog_bench::{emulated_store, fill};

/// Benchmark scanning a full store.
fn bench_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("report");

    for size in [256u16, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(u64::from(*size)));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut store = emulated_store(size);
            fill(&mut store, 12);

            b.iter(|| black_box(store.report()));
        });
    }

    group.finish();
}

/// Benchmark rendering a full store to text.
fn bench_print(c: &mut Criterion) {
    let mut group = c.benchmark_group("print");

    for size in [256u16, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(u64::from(*size)));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut store = emulated_store(size);
            fill(&mut store, 12);
            let mut out = String::with_capacity(16 * 1024);

            b.iter(|| {
                out.clear();
                store.print(&mut out).unwrap();
                black_box(out.len());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_report, bench_print);
criterion_main!(benches);
