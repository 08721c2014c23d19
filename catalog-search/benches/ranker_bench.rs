use catalog_search::{Candidate, CandidateIndex, CandidatePool, EmbeddingVector, HnswIndex};
use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const DIM: usize = 384;

fn synthetic_vector(seed: usize) -> EmbeddingVector {
    let values = (0..DIM)
        .map(|i| ((seed * 31 + i * 17) as f32 * 0.013).sin())
        .collect();
    EmbeddingVector::new(values).expect("finite synthetic vector")
}

fn synthetic_pool(size: usize) -> CandidatePool<usize> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    CandidatePool::from_snapshot((0..size).map(|id| {
        Candidate::new(id, base + Duration::minutes(id as i64)).with_embedding(synthetic_vector(id))
    }))
}

fn bench_exact_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("exact_rank");
    let query = synthetic_vector(7);

    for size in [1_000, 10_000] {
        let pool = synthetic_pool(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &pool, |b, pool| {
            b.iter(|| black_box(pool.nearest(&query, 20, 0.25)))
        });
    }
    group.finish();
}

fn bench_hnsw_rank(c: &mut Criterion) {
    let pool = synthetic_pool(10_000);
    let index = HnswIndex::build(&pool, DIM);
    let query = synthetic_vector(7);

    c.bench_function("hnsw_rank_10000", |b| {
        b.iter(|| black_box(index.nearest(&query, 20, 0.25)))
    });
}

fn bench_recent(c: &mut Criterion) {
    let pool = synthetic_pool(10_000);
    c.bench_function("most_recent_10000", |b| {
        b.iter(|| black_box(CandidateIndex::most_recent(&pool, 20)))
    });
}

criterion_group!(benches, bench_exact_rank, bench_hnsw_rank, bench_recent);
criterion_main!(benches);
