//! Benchmarks for content keys and store indexing.

use adflow::core::{ContentKey, WorkItem};
use adflow::store::StoreIndex;
use adflow::testing::fixtures;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn content_key_benchmark(c: &mut Criterion) {
    c.bench_function("derive_key", |b| {
        b.iter(|| ContentKey::derive(black_box(&["3f2a9c1b7e44", "meta", "4"])));
    });
}

fn store_index_benchmark(c: &mut Criterion) {
    let artifacts: Vec<_> = fixtures::ad_items(250, &["meta", "google", "tiktok", "pinterest"], 4)
        .iter()
        .map(fixtures::artifact_for)
        .collect();
    let items: Vec<WorkItem> = fixtures::ad_items(250, &["meta"], 4);

    c.bench_function("index_4000_artifacts", |b| {
        b.iter(|| StoreIndex::from_records(black_box(&artifacts)));
    });

    let index = StoreIndex::from_records(&artifacts);
    c.bench_function("dedup_1000_items", |b| {
        b.iter(|| items.iter().filter(|item| index.contains(&item.key())).count());
    });
}

criterion_group!(benches, content_key_benchmark, store_index_benchmark);
criterion_main!(benches);
