// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Surrogate Benchmarks
// ─────────────────────────────────────────────────────────────────────
//! Criterion benchmarks for the surrogate hot loop.
//!
//! Covers:
//!   - Sign-flipped eigenbases (68 nodes, 100 surrogates)
//!   - Informed surrogate timeseries (68 × 300 × 4, 100 surrogates)
//!   - Configuration-model Laplacian + uninformed surrogates
//!   - Bernoulli significance test over a 68 × 4 × 1001 ensemble

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::{Array2, Array3};

use sdi_spectral::{decompose, symmetric_normalised_laplacian};
use sdi_surrogates::{
    random_sign, sc_informed, sc_uninformed, test_significance, SignificanceOptions,
};

const N: usize = 68;
const T: usize = 300;
const S: usize = 4;
const N_SURR: usize = 100;

// ── Helpers ───────────────────────────────────────────────────────────

fn make_laplacian() -> Array2<f64> {
    let sc = Array2::from_shape_fn((N, N), |(i, j)| {
        if i == j {
            0.0
        } else {
            let (a, b) = (i.min(j) as f64, i.max(j) as f64);
            0.5 + 0.5 * (a * 0.37 + b * 0.11).sin().abs()
        }
    });
    symmetric_normalised_laplacian(&sc.view(), None, true).unwrap()
}

fn make_ts() -> Array3<f64> {
    Array3::from_shape_fn((N, T, S), |(i, t, s)| {
        ((i as f64 * 0.3) + (t as f64 * 0.05) + s as f64).sin()
    })
}

// ── Surrogates ───────────────────────────────────────────────────────

fn bench_random_sign(c: &mut Criterion) {
    let basis = decompose(&make_laplacian().view()).unwrap().eigenvectors;
    c.bench_function("random_sign_68x68x100", |b| {
        b.iter(|| random_sign(black_box(&basis.view()), N_SURR, 42, false).unwrap())
    });
}

fn bench_surrogates(c: &mut Criterion) {
    let lapl = make_laplacian();
    let basis = decompose(&lapl.view()).unwrap().eigenvectors;
    let ts = make_ts().into_dyn();
    let mut group = c.benchmark_group("surrogates");
    group.sample_size(10);
    group.bench_function("informed_68x300x4x100", |b| {
        b.iter(|| sc_informed(black_box(&ts.view()), &basis.view(), N_SURR, 42, false).unwrap())
    });
    group.bench_function("uninformed_68x300x4x100", |b| {
        b.iter(|| sc_uninformed(black_box(&ts.view()), &lapl.view(), N_SURR, 42, false).unwrap())
    });
    group.finish();
}

// ── Significance ─────────────────────────────────────────────────────

fn bench_significance(c: &mut Criterion) {
    let surr = Array3::from_shape_fn((N, S, 1001), |(i, s, k)| {
        ((i * 31 + s * 7 + k * 13) as f64 * 0.017).sin()
    })
    .into_dyn();
    let opts = SignificanceOptions::default();
    c.bench_function("bernoulli_68x4x1001", |b| {
        b.iter(|| test_significance(black_box(&surr.view()), None, &opts).unwrap())
    });
}

// ── Groups ───────────────────────────────────────────────────────────

criterion_group!(surrogates, bench_random_sign, bench_surrogates,);

criterion_group!(significance, bench_significance,);

criterion_main!(surrogates, significance);
