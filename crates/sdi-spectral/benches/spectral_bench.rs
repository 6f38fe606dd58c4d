// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Spectral Benchmarks
// ─────────────────────────────────────────────────────────────────────
//! Criterion benchmarks for the spectral engine.
//!
//! Covers:
//!   - Laplacian construction + symmetric normalisation
//!   - Jacobi eigendecomposition (68 and 200 nodes)
//!   - Graph Fourier transform of a single subject
//!   - Median cutoff + two-band graph filter

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::{Array2, Array3};

use sdi_spectral::{
    compute_laplacian, decompose, graph_filter, graph_fourier_transform,
    median_cutoff_frequency_index, normalise, DegreeInput,
};
use sdi_types::{NegativeHandling, Normalisation, SelfLoops};

const N: usize = 68;
const T: usize = 300;
const S: usize = 4;

// ── Helpers ───────────────────────────────────────────────────────────

fn make_sc(n: usize) -> Array2<f64> {
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            0.0
        } else {
            let (a, b) = (i.min(j) as f64, i.max(j) as f64);
            0.5 + 0.5 * (a * 0.37 + b * 0.11).sin().abs()
        }
    })
}

fn make_ts() -> Array3<f64> {
    Array3::from_shape_fn((N, T, S), |(i, t, s)| {
        ((i as f64 * 0.3) + (t as f64 * 0.05) + s as f64).sin()
    })
}

fn make_basis(n: usize) -> Array2<f64> {
    let (lapl, degree) =
        compute_laplacian(&make_sc(n).view(), NegativeHandling::Absolute, &SelfLoops::Remove)
            .unwrap();
    let norm = normalise(
        &lapl.view(),
        DegreeInput::Vector(degree.view()),
        Normalisation::Symmetric,
        true,
    )
    .unwrap();
    decompose(&norm.view()).unwrap().eigenvectors
}

// ── Laplacian / eigen ────────────────────────────────────────────────

fn bench_laplacian(c: &mut Criterion) {
    let sc = make_sc(N);
    c.bench_function("laplacian_symmetric_68x68", |b| {
        b.iter(|| {
            let (lapl, degree) = compute_laplacian(
                black_box(&sc.view()),
                NegativeHandling::Absolute,
                &SelfLoops::Remove,
            )
            .unwrap();
            normalise(
                &lapl.view(),
                DegreeInput::Vector(degree.view()),
                Normalisation::Symmetric,
                true,
            )
            .unwrap()
        })
    });
}

fn bench_decompose(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompose");
    group.sample_size(20);
    for n in [N, 200] {
        let sc = make_sc(n);
        let (lapl, _) =
            compute_laplacian(&sc.view(), NegativeHandling::Absolute, &SelfLoops::Remove).unwrap();
        group.bench_function(format!("jacobi_{n}x{n}"), |b| {
            b.iter(|| decompose(black_box(&lapl.view())).unwrap())
        });
    }
    group.finish();
}

// ── Projection / filter ──────────────────────────────────────────────

fn bench_gft(c: &mut Criterion) {
    let basis = make_basis(N);
    let ts = make_ts().into_dyn();
    c.bench_function("gft_energy_68x300x4", |b| {
        b.iter(|| graph_fourier_transform(black_box(&ts.view()), &basis.view(), true, true).unwrap())
    });
}

fn bench_filter(c: &mut Criterion) {
    let basis = make_basis(N);
    let ts = make_ts().into_dyn();
    let keys = vec!["low".to_string(), "high".to_string()];
    c.bench_function("median_split_filter_68x300x4", |b| {
        b.iter(|| {
            let energy = graph_fourier_transform(&ts.view(), &basis.view(), true, true).unwrap();
            let cutoff = median_cutoff_frequency_index(&energy.view()).unwrap();
            graph_filter(black_box(&ts.view()), &basis.view(), &[cutoff], &keys).unwrap()
        })
    });
}

// ── Groups ───────────────────────────────────────────────────────────

criterion_group!(laplacian, bench_laplacian, bench_decompose,);

criterion_group!(projection, bench_gft, bench_filter,);

criterion_main!(laplacian, projection);
