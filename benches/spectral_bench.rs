//! Benchmarks for spectral estimation.
//!
//! Run with: `cargo bench --bench spectral_bench`
//!
//! Compares a reused `SpectralEstimator` against planning on every call.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ndarray::{Array2, Array3, Axis};
use ssh_eval::{
    GridShape, RadialBinning, SpectralConfig, SpectralEstimator, rapsd, rapsd_stack, snr_analysis,
};

fn field(n: usize, seed: f64) -> Array2<f64> {
    Array2::from_shape_fn((n, n), |(r, c)| {
        (0.11 * c as f64 + seed).sin() + 0.3 * (0.47 * r as f64 - seed).cos()
    })
}

/// Benchmark single-field RAPSD for several grid sizes.
fn bench_rapsd(c: &mut Criterion) {
    let mut group = c.benchmark_group("rapsd");

    for n in [64usize, 128, 256] {
        let f = field(n, 0.0);
        let config = SpectralConfig::default();
        group.throughput(Throughput::Elements((n * n) as u64));

        group.bench_with_input(BenchmarkId::new("planned_each_call", n), &f, |b, f| {
            b.iter(|| rapsd(black_box(f.view()), &config));
        });

        let estimator = SpectralEstimator::new(GridShape::new(n, n), config.clone())
            .expect("valid estimator");
        group.bench_with_input(BenchmarkId::new("reused_estimator", n), &f, |b, f| {
            b.iter(|| estimator.curve(black_box(f.view())));
        });

        let log_config = config.with_binning(RadialBinning::Log {
            bins_per_decade: 10.0,
        });
        group.bench_with_input(BenchmarkId::new("log_bins", n), &f, |b, f| {
            b.iter(|| rapsd(black_box(f.view()), &log_config));
        });
    }

    group.finish();
}

/// Benchmark stack-averaged spectra and the full SNR analysis.
fn bench_snr(c: &mut Criterion) {
    let mut group = c.benchmark_group("snr_analysis");
    group.sample_size(20);

    let n = 128;
    for steps in [5usize, 20] {
        let mut truth = Array3::<f64>::zeros((steps, n, n));
        for (t, mut step) in truth.axis_iter_mut(Axis(0)).enumerate() {
            step.assign(&field(n, t as f64 * 0.1));
        }
        let candidate = &truth * 0.8;
        let config = SpectralConfig::default();
        group.throughput(Throughput::Elements((steps * n * n) as u64));

        group.bench_with_input(BenchmarkId::new("rapsd_stack", steps), &truth, |b, truth| {
            b.iter(|| rapsd_stack(black_box(truth.view()), &config));
        });

        group.bench_with_input(BenchmarkId::new("snr", steps), &truth, |b, truth| {
            b.iter(|| snr_analysis(black_box(candidate.view()), black_box(truth.view()), &config));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rapsd, bench_snr);
criterion_main!(benches);
