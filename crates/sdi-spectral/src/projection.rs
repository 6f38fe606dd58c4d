// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Spectral Projection
// ─────────────────────────────────────────────────────────────────────
//! Graph Fourier transform, spectral energy and the median (half-energy)
//! cutoff. Timeseries are `nodes × time [× batch...]`; every batch slice
//! is projected independently.

use log::{debug, info, warn};
use ndarray::{Array1, Array3, ArrayD, ArrayView2, ArrayViewD, Axis, Ix1, Ix2};
use sdi_types::{SdiError, SdiResult};

use crate::ndim::{from_batched, leading_shape, to_batched};

/// Apply `op` to the primary axis of every batch slice of `data`.
pub(crate) fn apply_batched(op: &ArrayView2<'_, f64>, data: &ArrayViewD<'_, f64>) -> SdiResult<ArrayD<f64>> {
    if data.ndim() == 0 || data.shape()[0] != op.ncols() {
        return Err(SdiError::shape(format!(
            "cannot project data of shape {:?} with a basis of shape {:?}",
            data.shape(),
            op.shape()
        )));
    }
    let (cube, trailing) = to_batched(data)?;
    let (_, secondary, batch) = cube.dim();
    let mut out = Array3::<f64>::zeros((op.nrows(), secondary, batch));
    for b in 0..batch {
        let slice = cube.index_axis(Axis(2), b);
        out.index_axis_mut(Axis(2), b).assign(&op.dot(&slice));
    }
    let mut leading = leading_shape(data);
    leading[0] = op.nrows();
    from_batched(out, &leading, &trailing)
}

/// `Vᵀ · timeseries` along the node axis.
///
/// With `energy` the squared coefficients are returned. With `mean` and a
/// batch axis present, axis 1 is averaged (raw coefficients and energy
/// alike).
pub fn graph_fourier_transform(
    timeseries: &ArrayViewD<'_, f64>,
    eigenvectors: &ArrayView2<'_, f64>,
    energy: bool,
    mean: bool,
) -> SdiResult<ArrayD<f64>> {
    let mut proj = apply_batched(&eigenvectors.t(), timeseries)?;
    if energy {
        proj.mapv_inplace(|x| x * x);
    }
    if mean && proj.ndim() > 2 {
        proj = proj
            .mean_axis(Axis(1))
            .ok_or_else(|| SdiError::shape("cannot average over an empty time axis"))?;
    }
    Ok(proj)
}

/// `V · coefficients`: back from the spectral domain to node space.
pub fn inverse_graph_fourier_transform(
    coefficients: &ArrayViewD<'_, f64>,
    eigenvectors: &ArrayView2<'_, f64>,
) -> SdiResult<ArrayD<f64>> {
    apply_batched(eigenvectors, coefficients)
}

fn trapz(y: &[f64]) -> f64 {
    y.windows(2).map(|w| 0.5 * (w[0] + w[1])).sum()
}

/// Smallest mode index whose cumulative trapezoidal energy reaches half
/// of the total.
///
/// Energy is `modes` or `modes × subjects` (averaged across subjects).
/// If no index reaches half the energy, the last mode index is returned.
pub fn median_cutoff_frequency_index(energy: &ArrayViewD<'_, f64>) -> SdiResult<usize> {
    let spectrum: Array1<f64> = match energy.ndim() {
        1 => energy
            .view()
            .into_dimensionality::<Ix1>()
            .map_err(|e| SdiError::shape(e.to_string()))?
            .to_owned(),
        2 => energy
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|e| SdiError::shape(e.to_string()))?
            .mean_axis(Axis(1))
            .ok_or_else(|| SdiError::shape("energy has no subjects to average"))?,
        d => {
            return Err(SdiError::shape(format!(
                "provided energy spectral density data have {d} dimensions, \
                 but arrays of more than 2 dimensions are not supported"
            )))
        }
    };
    let e = spectrum.to_vec();
    if e.len() < 2 {
        return Err(SdiError::shape(format!(
            "need at least two modes to find a cutoff, got {}",
            e.len()
        )));
    }

    let half = trapz(&e) / 2.0;
    debug!("Total AUC = {}, targetting half of total AUC", half * 2.0);
    let mut idx = 1;
    while idx < e.len() {
        let auc = trapz(&e[..idx]);
        debug!("Frequency idx {idx}, AUC = {auc}, target AUC = {half}");
        if auc >= half {
            break;
        }
        idx += 1;
    }
    let idx = idx.min(e.len() - 1);
    info!("Found {idx} as splitting index");
    Ok(idx)
}

/// Z-score along the time axis (sample std, ddof = 1).
///
/// Zero-variance rows become zeros. Data with fewer than two timepoints
/// is returned unchanged.
pub fn normalise_timeseries(timeseries: &ArrayViewD<'_, f64>) -> SdiResult<ArrayD<f64>> {
    if timeseries.ndim() < 2 || timeseries.shape()[1] < 2 {
        warn!("Given timeseries seems to be a single timepoint. Returning it as is.");
        return Ok(timeseries.to_owned());
    }
    let (mut cube, trailing) = to_batched(timeseries)?;
    let (nodes, time, batch) = cube.dim();
    let dof = (time - 1) as f64;
    for b in 0..batch {
        for i in 0..nodes {
            let mut lane = cube.slice_mut(ndarray::s![i, .., b]);
            let mean = lane.sum() / time as f64;
            let var = lane.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / dof;
            let std = var.sqrt();
            if std > 0.0 && std.is_finite() {
                lane.mapv_inplace(|x| (x - mean) / std);
            } else {
                lane.fill(0.0);
            }
        }
    }
    from_batched(cube, &leading_shape(timeseries), &trailing)
}
