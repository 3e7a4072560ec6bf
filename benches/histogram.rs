use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jtl_splitter::Histogram;

fn bench_record(c: &mut Criterion) {
    c.bench_function("histogram_record", |b| {
        let mut hist = Histogram::new(2).unwrap();
        let mut value: u64 = 1;
        b.iter(|| {
            // Cycle through three decades of latencies.
            value = value % 9_973 + 1;
            hist.record(black_box(value));
        });
    });
}

fn bench_value_at_percentile(c: &mut Criterion) {
    let mut hist = Histogram::new(2).unwrap();
    for i in 0..1_000_000u64 {
        hist.record(i % 30_000);
    }
    c.bench_function("histogram_value_at_percentile", |b| {
        b.iter(|| black_box(hist.value_at_percentile(black_box(99.9))));
    });
}

fn bench_summarize_path(c: &mut Criterion) {
    use jtl_splitter::StatAccumulator;
    c.bench_function("accumulator_add_sample", |b| {
        let accumulator = StatAccumulator::new(2).unwrap();
        let mut i: i64 = 0;
        b.iter(|| {
            i += 1;
            accumulator.add_sample(black_box(1_000 + i), black_box((i % 500) as u64), true, 512, 128);
        });
    });
}

criterion_group!(
    benches,
    bench_record,
    bench_value_at_percentile,
    bench_summarize_path
);
criterion_main!(benches);
