//! Benchmarks for index computation and point sampling

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use verdex_algorithms::imagery::{compute_index, sample_points, GeoPoint, SpectralBands};
use verdex_core::{GeoTransform, IndexType};

fn synthetic_bands(size: usize) -> Vec<Array2<f64>> {
    [0.04, 0.07, 0.09, 0.30, 0.18]
        .iter()
        .map(|&base| {
            Array2::from_shape_fn((size, size), |(r, c)| {
                base + ((r * 7 + c * 13) % 200) as f64 * 1e-3
            })
        })
        .collect()
}

fn bench_indices(c: &mut Criterion) {
    for index in [IndexType::NDVI, IndexType::EVI] {
        let mut group = c.benchmark_group(format!("imagery/{}", index.name().to_lowercase()));
        for size in [256, 1024, 2048] {
            let grids = synthetic_bands(size);
            let bands = SpectralBands::from_slice(&grids).unwrap();
            group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
                b.iter(|| compute_index(black_box(&bands), index).unwrap())
            });
        }
        group.finish();
    }
}

fn bench_sampling(c: &mut Criterion) {
    let size = 1024;
    let gt = GeoTransform::new(-71.0, -33.0, 0.0003, -0.0003);
    let grid = Array2::from_elem((size, size), 0.5);
    let points: Vec<GeoPoint> = (0..10_000)
        .map(|i| {
            let f = (i % 1000) as f64 / 1000.0;
            GeoPoint::new(format!("{}", -33.0 - f * 0.3), format!("{}", -71.0 + f * 0.3))
        })
        .collect();

    c.bench_function("imagery/sample_10k_points", |b| {
        b.iter(|| sample_points(black_box(&points), &gt, grid.view()))
    });
}

criterion_group!(benches, bench_indices, bench_sampling);
criterion_main!(benches);
