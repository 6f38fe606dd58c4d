// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Surrogate Timeseries
// ─────────────────────────────────────────────────────────────────────
//! Null timeseries that keep the empirical energy of every graph mode and
//! scramble its sign.
//!
//! The Fourier coefficients are computed once; every surrogate re-projects
//! them through its own sign-flipped basis. Surrogates are independent, so
//! they fan out over rayon and are stacked along a new last axis.

use log::info;
use ndarray::{stack, Array1, Array2, ArrayD, ArrayView2, ArrayViewD, Axis, IxDyn};
use rayon::prelude::*;
use sdi_spectral::{decompose, graph_fourier_transform, inverse_graph_fourier_transform};
use sdi_types::{SdiError, SdiResult, SurrogateKind};

use crate::sign::signed_basis;

const MAX_TIMESERIES_DIMS: usize = 3;

fn check_timeseries_rank(timeseries: &ArrayViewD<'_, f64>) -> SdiResult<()> {
    if timeseries.ndim() > MAX_TIMESERIES_DIMS {
        return Err(SdiError::shape(format!(
            "Provided timeseries has {} dimensions, but timeseries of more than \
             {MAX_TIMESERIES_DIMS} dimensions are not supported",
            timeseries.ndim()
        )));
    }
    Ok(())
}

/// Surrogate ensemble of shape `timeseries.shape + [n_surrogates (+1)]`.
///
/// Surrogate `i` is `V·diag(s_i) · Vᵀ·ts` with `s_i` drawn from stream `i`
/// of `seed`. With `stack`, the real timeseries reconstructed through the
/// unflipped basis is appended last.
pub fn create_surrogates(
    timeseries: &ArrayViewD<'_, f64>,
    eigenvectors: &ArrayView2<'_, f64>,
    n_surrogates: usize,
    seed: u64,
    stack_real: bool,
) -> SdiResult<ArrayD<f64>> {
    check_timeseries_rank(timeseries)?;
    let coeff = graph_fourier_transform(timeseries, eigenvectors, false, false)?;

    info!("Projecting the timeseries onto {n_surrogates} surrogate eigenvector sets.");
    let mut realisations: Vec<ArrayD<f64>> = (0..n_surrogates)
        .into_par_iter()
        .map(|i| {
            let basis = signed_basis(eigenvectors, seed, i);
            inverse_graph_fourier_transform(&coeff.view(), &basis.view())
        })
        .collect::<SdiResult<Vec<_>>>()?;
    if stack_real {
        realisations.push(inverse_graph_fourier_transform(&coeff.view(), eigenvectors)?);
    }

    let axis = Axis(coeff.ndim());
    if realisations.is_empty() {
        let mut shape = coeff.shape().to_vec();
        shape.push(0);
        return Ok(ArrayD::zeros(IxDyn(&shape)));
    }
    let views: Vec<ArrayViewD<'_, f64>> = realisations.iter().map(|r| r.view()).collect();
    stack(axis, &views).map_err(|e| SdiError::shape(format!("stacking surrogates: {e}")))
}

/// Surrogates informed by the empirical structural eigenbasis.
pub fn sc_informed(
    timeseries: &ArrayViewD<'_, f64>,
    eigenvectors: &ArrayView2<'_, f64>,
    n_surrogates: usize,
    seed: u64,
    stack_real: bool,
) -> SdiResult<ArrayD<f64>> {
    check_timeseries_rank(timeseries)?;
    create_surrogates(timeseries, eigenvectors, n_surrogates, seed, stack_real)
}

/// Laplacian of the configuration-model null of a symmetric normalised
/// Laplacian.
///
/// With `A = I - L` and row sums `k`, the null adjacency is `k kᵀ / Σ A` and
/// its Laplacian `diag(k) - k kᵀ / Σ A`. `I - L` only recovers the adjacency
/// for `L = I - D^-1/2 A D^-1/2`; combinatorial or random-walk Laplacians
/// lose the degree sequence here.
pub fn configuration_model_laplacian(laplacian: &ArrayView2<'_, f64>) -> SdiResult<Array2<f64>> {
    let (rows, cols) = laplacian.dim();
    if rows != cols {
        return Err(SdiError::shape(format!(
            "Laplacian must be square, got shape {:?}",
            laplacian.shape()
        )));
    }
    let adjacency = Array2::<f64>::eye(rows) - laplacian;
    let strength: Array1<f64> = adjacency.sum_axis(Axis(1));
    let total = adjacency.sum();
    if total == 0.0 || !total.is_finite() {
        return Err(SdiError::InvalidParameter {
            name: "laplacian",
            value: format!("total adjacency weight {total}"),
            expected: "a Laplacian whose adjacency has non-zero finite total weight",
        });
    }
    let col = strength.view().insert_axis(Axis(1));
    let row = strength.view().insert_axis(Axis(0));
    let conf_model = col.dot(&row) / total;
    Ok(Array2::from_diag(&strength) - conf_model)
}

/// Surrogates ignorant of the empirical structure: the sign-flipped basis
/// comes from the configuration-model null of `laplacian`.
pub fn sc_uninformed(
    timeseries: &ArrayViewD<'_, f64>,
    laplacian: &ArrayView2<'_, f64>,
    n_surrogates: usize,
    seed: u64,
    stack_real: bool,
) -> SdiResult<ArrayD<f64>> {
    check_timeseries_rank(timeseries)?;
    let conf_lapl = configuration_model_laplacian(laplacian)?;
    let null = decompose(&conf_lapl.view())?;
    create_surrogates(timeseries, &null.eigenvectors.view(), n_surrogates, seed, stack_real)
}

/// Dispatch on [`SurrogateKind`]: informed surrogates use `eigenvectors`,
/// uninformed ones use `laplacian`, which must be symmetric normalised.
pub fn surrogates_of_kind(
    kind: SurrogateKind,
    timeseries: &ArrayViewD<'_, f64>,
    eigenvectors: &ArrayView2<'_, f64>,
    laplacian: &ArrayView2<'_, f64>,
    n_surrogates: usize,
    seed: u64,
) -> SdiResult<ArrayD<f64>> {
    match kind {
        SurrogateKind::Informed => sc_informed(timeseries, eigenvectors, n_surrogates, seed, false),
        SurrogateKind::Uninformed => sc_uninformed(timeseries, laplacian, n_surrogates, seed, false),
    }
}
