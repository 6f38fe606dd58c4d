// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Graph Diagnostics
// ─────────────────────────────────────────────────────────────────────

use log::debug;
use ndarray::{Array1, ArrayD, ArrayView2, ArrayViewD, Axis};
use sdi_types::{SdiError, SdiResult};

/// Sign changes between adjacent rows, per eigenvector column.
///
/// Exact zeros do not count as a crossing.
pub fn zero_crossings(eigenvectors: &ArrayView2<'_, f64>) -> Array1<usize> {
    let rows = eigenvectors.nrows();
    eigenvectors.map_axis(Axis(0), |col| {
        (1..rows).filter(|&i| col[i - 1] * col[i] < 0.0).count()
    })
}

/// Column sums of `|mtx|`. With `mean`, a trailing batch axis
/// (`nodes × nodes × subjects`) is averaged out.
pub fn node_strength(mtx: &ArrayViewD<'_, f64>, mean: bool) -> SdiResult<ArrayD<f64>> {
    if mtx.ndim() < 2 {
        return Err(SdiError::shape(format!(
            "node strength needs at least a 2D matrix, got shape {:?}",
            mtx.shape()
        )));
    }
    let strength = mtx.mapv(f64::abs).sum_axis(Axis(0));
    if !mean {
        return Ok(strength);
    }
    if strength.ndim() < 2 {
        debug!("No batch axis to average node strength over");
        return Ok(strength);
    }
    let last = Axis(strength.ndim() - 1);
    strength
        .mean_axis(last)
        .ok_or_else(|| SdiError::shape("cannot average over an empty batch axis"))
}
