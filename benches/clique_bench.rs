use std::collections::{BTreeMap, BTreeSet};

use admind::membership::compute_clique;
use criterion::{criterion_group, criterion_main, Criterion};

fn full_mesh(n: u32) -> BTreeMap<u32, BTreeSet<u32>> {
    let all: BTreeSet<u32> = (0..n).collect();
    (0..n).map(|id| (id, all.clone())).collect()
}

fn bench_clique(c: &mut Criterion) {
    let mesh = full_mesh(64);
    c.bench_function("compute_clique_64_full_mesh", |b| {
        b.iter(|| compute_clique(0, &mesh));
    });
}

criterion_group!(benches, bench_clique);
criterion_main!(benches);
