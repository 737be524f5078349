//! Benchmarks for the TV denoiser.
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tv_denoise::{
    Boundary, Config, Image, add_gaussian_noise, compute_metrics, denoise, linspace,
    sweep_lambda, sweep_lambda_parallel,
};

fn noisy_phantom(side: usize) -> (Image, Image) {
    let clean = Image::phantom(side, side).unwrap();
    let noisy = add_gaussian_noise(&clean, 0.1, Some(0)).unwrap();
    (clean, noisy)
}

/// Denoise the phantom at a few sizes.
/// Throughput is in pixels, since each iteration is linear in them.
fn denoise_phantom(c: &mut Criterion, boundary: Boundary) {
    let mut group = c.benchmark_group(format!("denoise_{boundary:?}").to_lowercase());
    for side in [32, 64, 128] {
        let (_clean, noisy) = noisy_phantom(side);
        let config = Config::default().with_boundary(boundary);
        group.throughput(Throughput::Elements((side * side) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(side), &noisy, |b, noisy| {
            b.iter(|| {
                // Running out of iterations is still a full solve's worth of work.
                let _actual = black_box(denoise(noisy, 0.1, config));
            });
        });
    }
    group.finish();
}

fn denoise_neumann(c: &mut Criterion) {
    denoise_phantom(c, Boundary::Neumann);
}

fn denoise_interior(c: &mut Criterion) {
    denoise_phantom(c, Boundary::Interior);
}

fn metrics(c: &mut Criterion) {
    let (clean, noisy) = noisy_phantom(256);
    c.bench_function("metrics_256", |b| {
        b.iter(|| {
            let _actual = black_box(compute_metrics(&clean, &noisy).unwrap());
        });
    });
}

/// Like the CLI's default sweep, on a smaller image.
fn sweep(c: &mut Criterion) {
    let (clean, noisy) = noisy_phantom(64);
    let lambdas = linspace(0.01, 0.2, 5);
    let mut group = c.benchmark_group("sweep_64");
    group.bench_function("sequential", |b| {
        b.iter(|| {
            let _actual =
                black_box(sweep_lambda(&noisy, &clean, &lambdas, Config::default()).unwrap());
        });
    });
    group.bench_function("parallel", |b| {
        b.iter(|| {
            let _actual = black_box(
                sweep_lambda_parallel(&noisy, &clean, &lambdas, Config::default()).unwrap(),
            );
        });
    });
    group.finish();
}

criterion_group!(benches, denoise_neumann, denoise_interior, metrics, sweep);
criterion_main!(benches);
