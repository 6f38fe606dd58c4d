// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Spectral Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Graph spectral machinery for structural decoupling analysis.
//!
//! Architecture:
//!   - ndim: canonical `(nodes, time, batch)` reshaping, nested rows → arrays
//!   - laplacian: connectivity → Laplacian → normalised Laplacian
//!   - eigen: Jacobi (symmetric) / Schur (non-symmetric) eigenpairs, recomposition
//!   - projection: graph Fourier transform, energy, median cutoff, z-scoring
//!   - filter: contiguous band split of eigenvectors and timeseries

pub mod eigen;
pub mod filter;
pub mod laplacian;
pub mod ndim;
pub mod projection;

pub use eigen::{decompose, recompose, EigenDecomposition};
pub use filter::{graph_filter, resolve_band_keys, split_eigenvectors, SplitBundle};
pub use laplacian::{compute_laplacian, normalise, symmetric_normalised_laplacian, DegreeInput};
pub use ndim::{from_nested, NestedRows};
pub use projection::{
    graph_fourier_transform, inverse_graph_fourier_transform, median_cutoff_frequency_index,
    normalise_timeseries,
};
