//! Benchmarks for dimensionality reduction
//!
//! This benchmark measures:
//! - PCA projection as input dimensionality grows
//! - Neighbor embedding (t-SNE) on small word sets
//! - Min-max scaling to plot ranges

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use semantic_analysis::reduction::{DimensionalityReducer, EigenOrder, NeighborEmbeddingParams};

fn random_vectors(count: usize, dims: usize) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| (0..dims).map(|_| rng.gen_range(-1.0f32..1.0)).collect())
        .collect()
}

fn bench_pca(c: &mut Criterion) {
    let mut group = c.benchmark_group("pca");
    group.sample_size(20);
    let reducer = DimensionalityReducer::new(2).with_eigen_order(EigenOrder::DescendingVariance);
    for dims in [32usize, 128, 256] {
        let vectors = random_vectors(40, dims);
        group.bench_with_input(BenchmarkId::from_parameter(dims), &vectors, |b, v| {
            b.iter(|| reducer.perform_pca(black_box(v)).unwrap())
        });
    }
    group.finish();
}

fn bench_neighbor_embedding(c: &mut Criterion) {
    let mut group = c.benchmark_group("neighbor_embedding");
    group.sample_size(10);
    let reducer = DimensionalityReducer::new(2).with_neighbor_params(NeighborEmbeddingParams {
        perplexity: 5.0,
        max_iterations: 300,
        ..Default::default()
    });
    for count in [20usize, 60] {
        let vectors = random_vectors(count, 64);
        group.bench_with_input(BenchmarkId::from_parameter(count), &vectors, |b, v| {
            b.iter(|| {
                reducer
                    .reduce_dimensions_using_neighbor_embedding(black_box(v), None)
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_scaling(c: &mut Criterion) {
    let reducer = DimensionalityReducer::default();
    let projected = reducer.perform_pca(&random_vectors(200, 16)).unwrap();
    c.bench_function("min_max_scale_200", |b| {
        b.iter(|| reducer.min_max_scale(black_box(&projected)).unwrap())
    });
}

criterion_group!(benches, bench_pca, bench_neighbor_embedding, bench_scaling);
criterion_main!(benches);
