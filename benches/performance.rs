//! Performance benchmarks for the pairwise ping-pong benchmark
//!
//! These cover the CPU-bound pieces that scale with group size: pair
//! enumeration, least-squares fitting, and result ranking.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pingpong_bench::fit::{fit_matrix, least_squares};
use pingpong_bench::models::{Measurement, ResultSet, Sample, SampleMatrix};
use pingpong_bench::topology::enumerate_pairs;
use pingpong_bench::types::{Pair, PairScheme, RunMode};

/// Build a synthetic timing matrix on an exact line t = x/rate + latency
fn synthetic_matrix(sizes: usize, repeats: usize) -> SampleMatrix {
    let rate = 1e9;
    let latency = 2e-5;
    let sizes_bytes: Vec<usize> = (1..=sizes).map(|i| i * 10 * 1024).collect();
    let timings = sizes_bytes
        .iter()
        .map(|&bytes| {
            let t = 16.0 * bytes as f64 / rate + latency;
            vec![t; repeats]
        })
        .collect();
    SampleMatrix {
        sizes_bytes,
        repeats,
        timings,
    }
}

/// Build a result set with `pairs` plausible measurements
fn synthetic_results(group_size: usize) -> ResultSet {
    let pairs = enumerate_pairs(group_size, usize::MAX);
    let measurements = pairs
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let sample = Sample {
                t_small: 1e-5 + (i % 7) as f64 * 1e-6,
                t_large: 9e-3 + (i % 11) as f64 * 1e-4,
            };
            Measurement::from_sample(sample, 1024, 1024 * 1024)
        })
        .collect();
    ResultSet::new(
        "bench".into(),
        RunMode::TwoPoint,
        PairScheme::FullMesh,
        group_size,
        pairs,
        measurements,
    )
}

fn bench_pair_enumeration(c: &mut Criterion) {
    let mut group = c.benchmark_group("enumerate_pairs");

    for &n in &[8usize, 32, 33, 128] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| enumerate_pairs(black_box(n), black_box(32)))
        });
    }

    group.finish();
}

fn bench_least_squares(c: &mut Criterion) {
    let mut group = c.benchmark_group("least_squares");

    for &points in &[6usize, 60, 600] {
        let x: Vec<f64> = (1..=points).map(|i| i as f64 * 1024.0).collect();
        let y: Vec<f64> = x.iter().map(|&xi| xi / 1e9 + 2e-5).collect();
        group.bench_with_input(BenchmarkId::from_parameter(points), &points, |b, _| {
            b.iter(|| least_squares(black_box(&x), black_box(&y)))
        });
    }

    group.finish();
}

fn bench_fit_matrix(c: &mut Criterion) {
    let matrix = synthetic_matrix(6, 20);
    c.bench_function("fit_matrix_6x20", |b| {
        b.iter(|| fit_matrix(black_box(&matrix)))
    });
}

fn bench_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("result_ranking");

    for &n in &[8usize, 32] {
        let results = synthetic_results(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| results.ranked())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_pair_enumeration,
    bench_least_squares,
    bench_fit_matrix,
    bench_ranking
);
criterion_main!(benches);
