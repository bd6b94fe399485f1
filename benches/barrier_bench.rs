use admind::errors::AdmindError;
use admind::workthread::aggregate;
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_aggregate(c: &mut Criterion) {
    let results: Vec<AdmindError> = (0..63)
        .map(|_| AdmindError::Success)
        .chain(std::iter::once(AdmindError::NodeDown(7)))
        .collect();

    c.bench_function("aggregate_64_results_one_node_down", |b| {
        b.iter(|| aggregate(results.clone()));
    });
}

criterion_group!(benches, bench_aggregate);
criterion_main!(benches);
