// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — N-D Batching Helper
// ─────────────────────────────────────────────────────────────────────
//! Every batched operation (projection, energy, norms, FC) works on a
//! canonical `(primary, secondary, batch)` cube. Arrays of any rank are
//! flattened into that layout and restored afterwards:
//!
//! - 1D `(n,)` becomes `(n, 1, 1)` with no trailing axes
//! - 2D `(n, t)` becomes `(n, t, 1)` with no trailing axes
//! - kD `(n, t, a, b, ...)` becomes `(n, t, a*b*...)` with trailing `[a, b, ...]`

use ndarray::{Array3, ArrayD, ArrayViewD, IxDyn};
use sdi_types::{SdiError, SdiResult};

/// Flatten `a` into `(primary, secondary, batch)`; returns the trailing
/// shape needed by [`from_batched`].
pub fn to_batched(a: &ArrayViewD<'_, f64>) -> SdiResult<(Array3<f64>, Vec<usize>)> {
    let shape = a.shape();
    let (primary, secondary, trailing) = match shape.len() {
        0 => return Err(SdiError::shape("cannot batch a 0-dimensional array")),
        1 => (shape[0], 1, Vec::new()),
        _ => (shape[0], shape[1], shape[2..].to_vec()),
    };
    let batch: usize = trailing.iter().product();
    // iter() walks in logical row-major order regardless of memory layout.
    let cube = Array3::from_shape_vec((primary, secondary, batch), a.iter().copied().collect())
        .map_err(|e| SdiError::shape(format!("batching {shape:?}: {e}")))?;
    Ok((cube, trailing))
}

/// Restore a cube to `leading ++ trailing`.
///
/// `leading` replaces the first two axes and may have one or two entries
/// (one for vectors, two for matrices).
pub fn from_batched(cube: Array3<f64>, leading: &[usize], trailing: &[usize]) -> SdiResult<ArrayD<f64>> {
    let shape: Vec<usize> = leading.iter().chain(trailing.iter()).copied().collect();
    let expected: usize = shape.iter().product();
    if expected != cube.len() {
        return Err(SdiError::shape(format!(
            "cannot restore {:?} into shape {shape:?}",
            cube.dim()
        )));
    }
    ArrayD::from_shape_vec(IxDyn(&shape), cube.iter().copied().collect())
        .map_err(|e| SdiError::shape(format!("restoring {shape:?}: {e}")))
}

/// Leading shape of an array as seen by [`to_batched`]: `[n]` for 1D,
/// `[n, t]` otherwise.
pub fn leading_shape(a: &ArrayViewD<'_, f64>) -> Vec<usize> {
    a.shape().iter().take(2).copied().collect()
}

/// Nested `Vec`s of `f64`, outermost axis first.
pub trait NestedRows {
    /// Nesting depth (0 for a scalar).
    const DEPTH: usize;

    /// Shape read along the first element of every level.
    fn leading_shape(&self, out: &mut Vec<usize>);

    /// Every level has exactly the lengths in `shape`.
    fn is_rectangular(&self, shape: &[usize]) -> bool;

    fn flatten_into(self, out: &mut Vec<f64>);
}

impl NestedRows for f64 {
    const DEPTH: usize = 0;

    fn leading_shape(&self, _out: &mut Vec<usize>) {}

    fn is_rectangular(&self, shape: &[usize]) -> bool {
        shape.is_empty()
    }

    fn flatten_into(self, out: &mut Vec<f64>) {
        out.push(self);
    }
}

impl<T: NestedRows> NestedRows for Vec<T> {
    const DEPTH: usize = T::DEPTH + 1;

    fn leading_shape(&self, out: &mut Vec<usize>) {
        out.push(self.len());
        match self.first() {
            Some(first) => first.leading_shape(out),
            None => out.extend(std::iter::repeat(0).take(T::DEPTH)),
        }
    }

    fn is_rectangular(&self, shape: &[usize]) -> bool {
        match shape.split_first() {
            Some((len, rest)) => *len == self.len() && self.iter().all(|x| x.is_rectangular(rest)),
            None => false,
        }
    }

    fn flatten_into(self, out: &mut Vec<f64>) {
        for x in self {
            x.flatten_into(out);
        }
    }
}

/// Dense array from nested rows; every row at a level must have the same
/// length.
pub fn from_nested<T: NestedRows>(nested: T) -> SdiResult<ArrayD<f64>> {
    let mut shape = Vec::with_capacity(T::DEPTH);
    nested.leading_shape(&mut shape);
    if !nested.is_rectangular(&shape) {
        return Err(SdiError::shape(format!(
            "ragged nested list, expected a rectangular array of shape {shape:?}"
        )));
    }
    let mut flat = Vec::with_capacity(shape.iter().product());
    nested.flatten_into(&mut flat);
    ArrayD::from_shape_vec(IxDyn(&shape), flat).map_err(|e| SdiError::shape(format!("nested list {shape:?}: {e}")))
}
