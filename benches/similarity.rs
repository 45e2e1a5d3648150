//! Benchmarks for vector similarity
//!
//! This benchmark measures:
//! - Cosine similarity at common embedding sizes
//! - Top-K ranking over a candidate pool
//! - Centroid averaging of document chunks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use semantic_analysis::embeddings::{average_vectors, cosine_similarity, top_k_cosine_similarities};

fn random_vectors(count: usize, dims: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| (0..dims).map(|_| rng.gen_range(-1.0f32..1.0)).collect())
        .collect()
}

fn bench_cosine(c: &mut Criterion) {
    let mut group = c.benchmark_group("cosine_similarity");
    for dims in [256usize, 1536, 3072] {
        let v = random_vectors(2, dims, 7);
        group.throughput(Throughput::Elements(dims as u64));
        group.bench_with_input(BenchmarkId::from_parameter(dims), &v, |b, v| {
            b.iter(|| cosine_similarity(black_box(&v[0]), black_box(&v[1])).unwrap())
        });
    }
    group.finish();
}

fn bench_top_k(c: &mut Criterion) {
    let mut group = c.benchmark_group("top_k");
    let query = random_vectors(1, 1536, 1).remove(0);
    for pool in [100usize, 1000] {
        let candidates: Vec<(String, Vec<f32>)> = random_vectors(pool, 1536, 2)
            .into_iter()
            .enumerate()
            .map(|(i, v)| (format!("doc_{}", i), v))
            .collect();
        group.throughput(Throughput::Elements(pool as u64));
        group.bench_with_input(BenchmarkId::from_parameter(pool), &candidates, |b, candidates| {
            b.iter(|| {
                top_k_cosine_similarities(
                    black_box(&query),
                    candidates.iter().map(|(id, v)| (id.as_str(), v.as_slice())),
                    5,
                )
                .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_average(c: &mut Criterion) {
    let chunks = random_vectors(50, 1536, 3);
    c.bench_function("average_50_chunks", |b| {
        b.iter(|| average_vectors(black_box(&chunks)).unwrap())
    });
}

criterion_group!(benches, bench_cosine, bench_top_k, bench_average);
criterion_main!(benches);
