// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Eigendecomposition
// ─────────────────────────────────────────────────────────────────────
//! Eigenpairs of graph Laplacians, sorted ascending.
//!
//! Symmetric input goes through the cyclic Jacobi solver the kernel has
//! always used (cross-checked against `nalgebra::SymmetricEigen` in the
//! tests); anything else
//! through a real Schur form (`nalgebra`) followed by back-substitution
//! on the triangular factor. Only real spectra are supported: complex
//! conjugate pairs are reported as [`SdiError::ComplexSpectrum`].

use log::debug;
use nalgebra::{linalg::Schur, DMatrix};
use ndarray::{Array1, Array2, ArrayView2, ArrayViewD, Ix1, Ix2};
use sdi_types::{SdiError, SdiResult};

/// Symmetry tolerance relative to the largest absolute entry.
const SYMMETRY_TOL: f64 = 1e-10;

/// Eigenvalues (ascending) and the matching eigenvector columns.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenDecomposition {
    pub eigenvalues: Array1<f64>,
    /// Column `k` is the unit-norm eigenvector of `eigenvalues[k]`.
    pub eigenvectors: Array2<f64>,
}

impl EigenDecomposition {
    pub fn n_modes(&self) -> usize {
        self.eigenvalues.len()
    }
}

pub fn is_symmetric(mtx: &ArrayView2<'_, f64>) -> bool {
    if !mtx.is_square() {
        return false;
    }
    let scale = mtx.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    let n = mtx.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            if (mtx[[i, j]] - mtx[[j, i]]).abs() > SYMMETRY_TOL * scale {
                return false;
            }
        }
    }
    true
}

/// Eigendecomposition sorted ascending by eigenvalue.
///
/// Non-symmetric input is decomposed too, but only while its spectrum is
/// real: a complex conjugate pair fails with [`SdiError::ComplexSpectrum`]
/// instead of being returned. Symmetric and random-walk normalised
/// Laplacians always have real spectra.
pub fn decompose(mtx: &ArrayView2<'_, f64>) -> SdiResult<EigenDecomposition> {
    if !mtx.is_square() {
        return Err(SdiError::shape(format!(
            "cannot decompose a non-square matrix of shape {:?}",
            mtx.shape()
        )));
    }
    let (values, mut vectors) = if is_symmetric(mtx) {
        debug!("Decomposing symmetric {}x{} matrix (Jacobi)", mtx.nrows(), mtx.ncols());
        jacobi_eigen_symmetric(mtx)?
    } else {
        debug!("Decomposing non-symmetric {}x{} matrix (Schur)", mtx.nrows(), mtx.ncols());
        schur_eigen(mtx)?
    };
    fix_signs(&mut vectors);
    let (eigenvalues, eigenvectors) = sort_eigenpairs(&values, &vectors);
    Ok(EigenDecomposition {
        eigenvalues,
        eigenvectors,
    })
}

/// Rebuild `V diag(λ) Vᵀ`.
///
/// Eigenvalues may be a vector or a diagonal matrix; eigenvectors must be
/// a single 2D matrix.
pub fn recompose(
    eigenvalues: &ArrayViewD<'_, f64>,
    eigenvectors: &ArrayViewD<'_, f64>,
) -> SdiResult<Array2<f64>> {
    if eigenvectors.ndim() != 2 {
        return Err(SdiError::shape(format!(
            "eigenvector matrix dimensionality ({}) is not supported, only 2D matrices can be recomposed",
            eigenvectors.ndim()
        )));
    }
    let vecs = eigenvectors
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|e| SdiError::shape(e.to_string()))?;

    let vals = match eigenvalues.ndim() {
        1 => eigenvalues
            .view()
            .into_dimensionality::<Ix1>()
            .map_err(|e| SdiError::shape(e.to_string()))?
            .to_owned(),
        2 => {
            let m = eigenvalues
                .view()
                .into_dimensionality::<Ix2>()
                .map_err(|e| SdiError::shape(e.to_string()))?;
            let off_diagonal = m.indexed_iter().any(|((i, j), v)| i != j && *v != 0.0);
            if !m.is_square() || off_diagonal {
                return Err(SdiError::shape(
                    "the provided eigenvalue matrix is not a diagonal matrix",
                ));
            }
            m.diag().to_owned()
        }
        d => {
            return Err(SdiError::shape(format!(
                "Too many dimensions ({d}) in the eigenvalue array, expected a vector or a diagonal matrix"
            )))
        }
    };
    if vals.len() != vecs.ncols() {
        return Err(SdiError::shape(format!(
            "{} eigenvalues for {} eigenvectors",
            vals.len(),
            vecs.ncols()
        )));
    }
    let scaled = &vecs * &vals;
    Ok(scaled.dot(&vecs.t()))
}

// ---------------------------------------------------------------------------
// Symmetric path
// ---------------------------------------------------------------------------

/// Cyclic Jacobi eigendecomposition for a symmetric matrix.
///
/// Returns unsorted eigenvalues and the eigenvector matrix (columns).
/// Converges when the largest off-diagonal entry falls below a tolerance
/// relative to the Frobenius norm.
pub fn jacobi_eigen_symmetric(mtx: &ArrayView2<'_, f64>) -> SdiResult<(Array1<f64>, Array2<f64>)> {
    const MAX_SWEEPS: usize = 100;
    const REL_TOL: f64 = 1e-13;

    let n = mtx.nrows();
    let mut a = mtx.to_owned();
    let mut v = Array2::<f64>::eye(n);
    let tol = REL_TOL * a.iter().map(|x| x * x).sum::<f64>().sqrt();

    let mut converged = false;
    for sweep in 0..MAX_SWEEPS {
        let mut max_off = 0.0_f64;
        for p in 0..n {
            for q in (p + 1)..n {
                max_off = max_off.max(a[[p, q]].abs());
            }
        }
        if max_off <= tol {
            debug!("Jacobi converged after {sweep} sweeps");
            converged = true;
            break;
        }

        // Skip small rotations during the first sweeps.
        let threshold = if sweep < 4 {
            0.2 * max_off / (n * n) as f64
        } else {
            0.0
        };

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 || apq.abs() < threshold {
                    continue;
                }
                let app = a[[p, p]];
                let aqq = a[[q, q]];
                let diff = aqq - app;

                let t = if diff.abs() < 1e-300 {
                    apq.signum()
                } else {
                    let theta = diff / (2.0 * apq);
                    let root = 1.0 / (theta.abs() + (1.0 + theta * theta).sqrt());
                    if theta >= 0.0 {
                        root
                    } else {
                        -root
                    }
                };
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = t * c;
                let tau = s / (1.0 + c);

                a[[p, p]] -= t * apq;
                a[[q, q]] += t * apq;
                a[[p, q]] = 0.0;
                a[[q, p]] = 0.0;

                for r in 0..n {
                    if r == p || r == q {
                        continue;
                    }
                    let arp = a[[r, p]];
                    let arq = a[[r, q]];
                    a[[r, p]] = arp - s * (arq + tau * arp);
                    a[[p, r]] = a[[r, p]];
                    a[[r, q]] = arq + s * (arp - tau * arq);
                    a[[q, r]] = a[[r, q]];
                }
                for r in 0..n {
                    let vrp = v[[r, p]];
                    let vrq = v[[r, q]];
                    v[[r, p]] = vrp - s * (vrq + tau * vrp);
                    v[[r, q]] = vrq + s * (vrp - tau * vrq);
                }
            }
        }
    }
    if !converged {
        return Err(SdiError::Convergence(format!(
            "Jacobi solver did not reach tolerance {tol:e} within {MAX_SWEEPS} sweeps ({n}x{n} matrix)"
        )));
    }
    Ok((a.diag().to_owned(), v))
}

// ---------------------------------------------------------------------------
// Non-symmetric path
// ---------------------------------------------------------------------------

fn schur_eigen(mtx: &ArrayView2<'_, f64>) -> SdiResult<(Array1<f64>, Array2<f64>)> {
    const MAX_ITER: usize = 10_000;

    let n = mtx.nrows();
    let m = DMatrix::from_fn(n, n, |i, j| mtx[[i, j]]);
    let schur = Schur::try_new(m, f64::EPSILON, MAX_ITER).ok_or_else(|| {
        SdiError::Convergence(format!(
            "Schur decomposition did not converge within {MAX_ITER} iterations ({n}x{n} matrix)"
        ))
    })?;
    if schur.eigenvalues().is_none() {
        let pairs = schur
            .complex_eigenvalues()
            .iter()
            .filter(|c| c.im != 0.0)
            .count()
            / 2;
        return Err(SdiError::ComplexSpectrum(pairs.max(1)));
    }
    let (mut q, mut t) = schur.unpack();

    let scale = t.iter().fold(0.0_f64, |acc, x| acc.max(x.abs())).max(f64::MIN_POSITIVE);
    let small = f64::EPSILON * scale;
    triangularise_blocks(&mut q, &mut t, small)?;

    let values = Array1::from_shape_fn(n, |k| t[(k, k)]);
    let mut vectors = Array2::<f64>::zeros((n, n));
    let mut y = vec![0.0; n];
    for k in 0..n {
        let lambda = t[(k, k)];
        y.iter_mut().for_each(|x| *x = 0.0);
        y[k] = 1.0;
        for i in (0..k).rev() {
            let mut acc = 0.0;
            for j in (i + 1)..=k {
                acc += t[(i, j)] * y[j];
            }
            let mut denom = t[(i, i)] - lambda;
            if denom.abs() < small {
                denom = small;
            }
            y[i] = -acc / denom;
        }
        let mut norm = 0.0;
        for r in 0..n {
            let mut x = 0.0;
            for c in 0..=k {
                x += q[(r, c)] * y[c];
            }
            vectors[[r, k]] = x;
            norm += x * x;
        }
        let norm = norm.sqrt();
        if norm > 0.0 {
            vectors.column_mut(k).mapv_inplace(|x| x / norm);
        }
    }
    Ok((values, vectors))
}

/// Rotate away any 2×2 block with real eigenvalues left on the
/// subdiagonal of `t`, updating `q` so that `q t qᵀ` is unchanged.
fn triangularise_blocks(q: &mut DMatrix<f64>, t: &mut DMatrix<f64>, small: f64) -> SdiResult<()> {
    let n = t.nrows();
    for k in 0..n.saturating_sub(1) {
        let c = t[(k + 1, k)];
        if c.abs() <= small {
            t[(k + 1, k)] = 0.0;
            continue;
        }
        let (a, b, d) = (t[(k, k)], t[(k, k + 1)], t[(k + 1, k + 1)]);
        let half_trace = 0.5 * (a + d);
        let disc = 0.25 * (a - d) * (a - d) + b * c;
        if disc < 0.0 {
            return Err(SdiError::ComplexSpectrum(1));
        }
        let lambda = half_trace + disc.sqrt();
        // eigenvector of the block for lambda: (lambda - d, c)
        let (x, y) = (lambda - d, c);
        let r = x.hypot(y);
        let (cs, sn) = (x / r, y / r);

        for j in 0..n {
            let (tk, tk1) = (t[(k, j)], t[(k + 1, j)]);
            t[(k, j)] = cs * tk + sn * tk1;
            t[(k + 1, j)] = -sn * tk + cs * tk1;
        }
        for i in 0..n {
            let (tk, tk1) = (t[(i, k)], t[(i, k + 1)]);
            t[(i, k)] = cs * tk + sn * tk1;
            t[(i, k + 1)] = -sn * tk + cs * tk1;
            let (qk, qk1) = (q[(i, k)], q[(i, k + 1)]);
            q[(i, k)] = cs * qk + sn * qk1;
            q[(i, k + 1)] = -sn * qk + cs * qk1;
        }
        t[(k + 1, k)] = 0.0;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Flip each column so its largest-magnitude component is positive.
fn fix_signs(vectors: &mut Array2<f64>) {
    for mut col in vectors.columns_mut() {
        let mut pivot = 0.0_f64;
        for &x in col.iter() {
            if x.abs() > pivot.abs() {
                pivot = x;
            }
        }
        if pivot < 0.0 {
            col.mapv_inplace(|x| -x);
        }
    }
}

/// Stable ascending sort of eigenvalues, permuting eigenvector columns.
fn sort_eigenpairs(values: &Array1<f64>, vectors: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let sorted_values = order.iter().map(|&i| values[i]).collect::<Array1<f64>>();
    let sorted_vectors = vectors.select(ndarray::Axis(1), &order);
    (sorted_values, sorted_vectors)
}
