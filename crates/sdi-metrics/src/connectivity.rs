// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Functional Connectivity
// ─────────────────────────────────────────────────────────────────────
//! Pearson correlation between nodes, time along axis 1. Batched input
//! (`nodes × time × subjects...`) yields `nodes × nodes × subjects...`.

use log::warn;
use ndarray::{Array2, Array3, ArrayD, ArrayView2, ArrayViewD, Axis};
use sdi_spectral::ndim::to_batched;
use sdi_types::{BandMap, SdiError, SdiResult};

/// Correlation matrix of the rows of `ts` (`nodes × time`).
///
/// A zero-variance row correlates 0 with every other row and 1 with
/// itself.
pub fn pearson(ts: &ArrayView2<'_, f64>) -> Array2<f64> {
    let (nodes, time) = ts.dim();
    let mut centred = ts.to_owned();
    let mut scale = vec![0.0; nodes];
    for (i, mut row) in centred.axis_iter_mut(Axis(0)).enumerate() {
        let mean = if time > 0 { row.sum() / time as f64 } else { 0.0 };
        row.mapv_inplace(|x| x - mean);
        scale[i] = row.dot(&row).sqrt();
    }
    let mut fc = centred.dot(&centred.t());
    for i in 0..nodes {
        for j in 0..nodes {
            let denom = scale[i] * scale[j];
            fc[[i, j]] = if i == j {
                1.0
            } else if denom > 0.0 {
                (fc[[i, j]] / denom).clamp(-1.0, 1.0)
            } else {
                0.0
            };
        }
    }
    fc
}

/// Functional connectivity of a timeseries.
///
/// 1D input has no time axis and yields `[[1.0]]`. With `mean`, batched
/// output is averaged over axis 2.
pub fn functional_connectivity(ts: &ArrayViewD<'_, f64>, mean: bool) -> SdiResult<ArrayD<f64>> {
    if ts.ndim() < 2 {
        warn!("Computing functional connectivity of a 1D array (== 1)!");
        return Ok(Array2::from_elem((1, 1), 1.0).into_dyn());
    }
    let nodes = ts.shape()[0];
    let (cube, trailing) = to_batched(ts)?;
    let batch = cube.dim().2;
    let mut out = Array3::<f64>::zeros((nodes, nodes, batch));
    for b in 0..batch {
        out.index_axis_mut(Axis(2), b)
            .assign(&pearson(&cube.index_axis(Axis(2), b)));
    }
    let mut shape = vec![nodes, nodes];
    shape.extend_from_slice(&trailing);
    let fc = out
        .into_shape(ndarray::IxDyn(&shape))
        .map_err(|e| SdiError::shape(format!("restoring FC shape {shape:?}: {e}")))?;
    if mean && fc.ndim() > 2 {
        return fc
            .mean_axis(Axis(2))
            .ok_or_else(|| SdiError::shape("cannot average FC over an empty subject axis"));
    }
    Ok(fc)
}

/// Functional connectivity of every band of a split.
pub fn functional_connectivity_split(
    bands: &BandMap<ArrayD<f64>>,
    mean: bool,
) -> SdiResult<BandMap<ArrayD<f64>>> {
    bands.try_map_values(|_, ts| functional_connectivity(&ts.view(), mean))
}
