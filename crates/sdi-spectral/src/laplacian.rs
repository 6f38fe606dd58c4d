// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Laplacian Construction and Normalisation
// ─────────────────────────────────────────────────────────────────────
//! Connectivity matrix → adjacency → `L = D - A` → normalised Laplacian.
//!
//! Degree is always the row sum of the final adjacency, so rows of an
//! unnormalised Laplacian without self loops sum to zero.

use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use sdi_types::{NegativeHandling, Normalisation, SdiError, SdiResult, SelfLoops};

/// Degree given either as a vector or as a diagonal matrix.
#[derive(Debug, Clone, Copy)]
pub enum DegreeInput<'a> {
    Vector(ArrayView1<'a, f64>),
    Diagonal(ArrayView2<'a, f64>),
}

impl<'a> DegreeInput<'a> {
    /// Extract the degree vector, checking diagonality and length `n`.
    pub fn to_vector(&self, n: usize) -> SdiResult<Array1<f64>> {
        let d = match self {
            Self::Vector(v) => v.to_owned(),
            Self::Diagonal(m) => {
                if !m.is_square() {
                    return Err(SdiError::shape(format!(
                        "degree matrix has shape {:?}, which is not square",
                        m.shape()
                    )));
                }
                let off_diagonal = m
                    .indexed_iter()
                    .any(|((i, j), v)| i != j && *v != 0.0);
                if off_diagonal {
                    return Err(SdiError::shape(
                        "the provided degree matrix is not a diagonal matrix",
                    ));
                }
                m.diag().to_owned()
            }
        };
        if d.len() != n {
            return Err(SdiError::shape(format!(
                "degree matrix has shape {:?} while laplacian has {n} nodes",
                match self {
                    Self::Vector(v) => v.shape().to_vec(),
                    Self::Diagonal(m) => m.shape().to_vec(),
                }
            )));
        }
        Ok(d)
    }
}

fn check_square(mtx: &ArrayView2<'_, f64>, what: &str) -> SdiResult<usize> {
    if !mtx.is_square() {
        return Err(SdiError::shape(format!(
            "{what} must be a square matrix, got shape {:?}",
            mtx.shape()
        )));
    }
    Ok(mtx.nrows())
}

/// Resolve negative weights. Matrices without negatives pass unchanged.
pub fn resolve_negatives(mtx: &ArrayView2<'_, f64>, mode: NegativeHandling) -> Array2<f64> {
    let mut adj = mtx.to_owned();
    if !adj.iter().any(|v| *v < 0.0) {
        return adj;
    }
    debug!("Resolving negative weights with {mode:?}");
    match mode {
        NegativeHandling::Absolute => adj.mapv_inplace(f64::abs),
        NegativeHandling::Remove => adj.mapv_inplace(|v| v.max(0.0)),
        NegativeHandling::Rescale => {
            let min = adj.iter().copied().fold(f64::INFINITY, f64::min);
            let max = adj.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let scale = if max == 0.0 {
                warn!("Matrix maximum is zero, rescaling by shift only");
                1.0
            } else {
                max
            };
            adj.mapv_inplace(|v| (v - min) / scale);
        }
    }
    adj
}

/// Build the (unnormalised) Laplacian and the degree vector.
pub fn compute_laplacian(
    mtx: &ArrayView2<'_, f64>,
    negative: NegativeHandling,
    self_loops: &SelfLoops,
) -> SdiResult<(Array2<f64>, Array1<f64>)> {
    let n = check_square(mtx, "connectivity matrix")?;
    let mut adj = resolve_negatives(mtx, negative);

    match self_loops {
        SelfLoops::Keep => {}
        SelfLoops::Remove => adj.diag_mut().fill(0.0),
        SelfLoops::Degree => {
            adj.diag_mut().fill(0.0);
            let off = adj.sum_axis(Axis(1));
            adj.diag_mut().assign(&off);
        }
        SelfLoops::Custom(weights) => {
            if weights.len() != n {
                return Err(SdiError::shape(format!(
                    "self loop vector has {} entries but the matrix has {n} nodes",
                    weights.len()
                )));
            }
            adj.diag_mut().assign(&ArrayView1::from(weights.as_slice()));
        }
    }

    let degree = adj.sum_axis(Axis(1));
    let mut lapl = -adj;
    for i in 0..n {
        lapl[[i, i]] += degree[i];
    }
    Ok((lapl, degree))
}

/// Normalise a Laplacian by its degree.
///
/// - symmetric: `D^-1/2 L D^-1/2`
/// - random walk inflow: `D^-1 L`
/// - random walk outflow: `L D^-1`
///
/// With `fix_zeros`, zero degrees are replaced by 1 before inversion.
pub fn normalise(
    lapl: &ArrayView2<'_, f64>,
    degree: DegreeInput<'_>,
    mode: Normalisation,
    fix_zeros: bool,
) -> SdiResult<Array2<f64>> {
    let n = check_square(lapl, "laplacian")?;
    let mut d = degree.to_vector(n)?;
    if fix_zeros {
        d.mapv_inplace(|v| if v == 0.0 { 1.0 } else { v });
    } else if d.iter().any(|v| *v == 0.0) {
        warn!("Degree has zero entries and fix_zeros is off, normalisation will produce non-finite values");
    }

    let out = match mode {
        Normalisation::Symmetric => {
            let d_inv_sqrt = d.mapv(|v| 1.0 / v.sqrt());
            Array2::from_shape_fn((n, n), |(i, j)| d_inv_sqrt[i] * lapl[[i, j]] * d_inv_sqrt[j])
        }
        Normalisation::RandomWalkInflow => {
            Array2::from_shape_fn((n, n), |(i, j)| lapl[[i, j]] / d[i])
        }
        Normalisation::RandomWalkOutflow => {
            Array2::from_shape_fn((n, n), |(i, j)| lapl[[i, j]] / d[j])
        }
    };
    Ok(out)
}

/// `I - D^-1/2 A D^-1/2` in one call.
///
/// `degree` overrides the row sums of `mtx`. Zero-degree rows and columns
/// get no identity entry, so isolated nodes stay all-zero.
pub fn symmetric_normalised_laplacian(
    mtx: &ArrayView2<'_, f64>,
    degree: Option<DegreeInput<'_>>,
    fix_zeros: bool,
) -> SdiResult<Array2<f64>> {
    let n = check_square(mtx, "connectivity matrix")?;
    let raw = match degree {
        Some(d) => d.to_vector(n)?,
        None => mtx.sum_axis(Axis(1)),
    };
    let isolated: Vec<bool> = raw.iter().map(|v| *v == 0.0).collect();
    let d = if fix_zeros {
        raw.mapv(|v| if v == 0.0 { 1.0 } else { v })
    } else {
        raw
    };
    let d_inv_sqrt = d.mapv(|v| 1.0 / v.sqrt());

    let mut out = Array2::from_shape_fn((n, n), |(i, j)| -(d_inv_sqrt[i] * mtx[[i, j]] * d_inv_sqrt[j]));
    for i in 0..n {
        if !isolated[i] {
            out[[i, i]] += 1.0;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Array2<f64> {
        array![
            [0.0, 2.0, 1.0, 0.0],
            [2.0, 0.0, 3.0, 1.0],
            [1.0, 3.0, 0.0, 4.0],
            [0.0, 1.0, 4.0, 0.0]
        ]
    }

    #[test]
    fn test_rows_sum_to_zero() {
        let mut m = sample();
        m[[0, 0]] = 5.0;
        let (lapl, degree) =
            compute_laplacian(&m.view(), NegativeHandling::Absolute, &SelfLoops::Remove).unwrap();
        for i in 0..4 {
            let s: f64 = lapl.row(i).sum();
            assert!(s.abs() < 1e-12, "row {i} sums to {s}");
        }
        assert_eq!(degree, array![3.0, 6.0, 8.0, 5.0]);
    }

    #[test]
    fn test_negative_modes() {
        let m = array![[0.0, -2.0], [4.0, 0.0]];
        let abs = resolve_negatives(&m.view(), NegativeHandling::Absolute);
        assert_eq!(abs, array![[0.0, 2.0], [4.0, 0.0]]);
        let rem = resolve_negatives(&m.view(), NegativeHandling::Remove);
        assert_eq!(rem, array![[0.0, 0.0], [4.0, 0.0]]);
        let res = resolve_negatives(&m.view(), NegativeHandling::Rescale);
        // (m - (-2)) / 4
        assert_eq!(res, array![[0.5, 0.0], [1.5, 0.5]]);
    }

    #[test]
    fn test_non_negative_matrix_untouched_by_rescale() {
        let m = sample();
        assert_eq!(resolve_negatives(&m.view(), NegativeHandling::Rescale), m);
    }

    #[test]
    fn test_self_loop_modes() {
        let mut m = sample();
        m[[1, 1]] = 7.0;
        let (_, keep) =
            compute_laplacian(&m.view(), NegativeHandling::Absolute, &SelfLoops::Keep).unwrap();
        assert_eq!(keep[1], 13.0);

        let (lapl, deg) =
            compute_laplacian(&m.view(), NegativeHandling::Absolute, &SelfLoops::Degree).unwrap();
        // diagonal equals the off-diagonal degree, so total degree doubles
        assert_eq!(deg, array![6.0, 12.0, 16.0, 10.0]);
        assert_eq!(lapl[[1, 1]], 6.0);

        let custom = SelfLoops::Custom(vec![1.0, 1.0, 1.0, 1.0]);
        let (_, deg) = compute_laplacian(&m.view(), NegativeHandling::Absolute, &custom).unwrap();
        assert_eq!(deg, array![4.0, 7.0, 9.0, 6.0]);

        let bad = SelfLoops::Custom(vec![1.0]);
        assert!(compute_laplacian(&m.view(), NegativeHandling::Absolute, &bad).is_err());
    }

    #[test]
    fn test_non_square_rejected() {
        let m = Array2::<f64>::zeros((3, 4));
        let err = compute_laplacian(&m.view(), NegativeHandling::Absolute, &SelfLoops::Remove)
            .unwrap_err();
        assert!(err.to_string().contains("square"));
    }

    #[test]
    fn test_symmetric_normalisation_has_unit_diagonal() {
        let (lapl, degree) =
            compute_laplacian(&sample().view(), NegativeHandling::Absolute, &SelfLoops::Remove)
                .unwrap();
        let norm = normalise(
            &lapl.view(),
            DegreeInput::Vector(degree.view()),
            Normalisation::Symmetric,
            true,
        )
        .unwrap();
        for i in 0..4 {
            assert!((norm[[i, i]] - 1.0).abs() < 1e-12);
            for j in 0..4 {
                assert!((norm[[i, j]] - norm[[j, i]]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_random_walk_directions() {
        let (lapl, degree) =
            compute_laplacian(&sample().view(), NegativeHandling::Absolute, &SelfLoops::Remove)
                .unwrap();
        let inflow = normalise(
            &lapl.view(),
            DegreeInput::Vector(degree.view()),
            Normalisation::RandomWalkInflow,
            true,
        )
        .unwrap();
        let outflow = normalise(
            &lapl.view(),
            DegreeInput::Vector(degree.view()),
            Normalisation::RandomWalkOutflow,
            true,
        )
        .unwrap();
        // D^-1 L: rows still sum to zero; L D^-1: columns do.
        for i in 0..4 {
            assert!(inflow.row(i).sum().abs() < 1e-12);
            assert!(outflow.column(i).sum().abs() < 1e-12);
        }
        assert!((inflow[[0, 1]] - (-2.0 / 3.0)).abs() < 1e-12);
        assert!((outflow[[0, 1]] - (-2.0 / 6.0)).abs() < 1e-12);
    }

    #[test]
    fn test_fix_zeros_keeps_values_finite() {
        let m = array![[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
        let (lapl, degree) =
            compute_laplacian(&m.view(), NegativeHandling::Absolute, &SelfLoops::Remove).unwrap();
        let norm = normalise(
            &lapl.view(),
            DegreeInput::Vector(degree.view()),
            Normalisation::Symmetric,
            true,
        )
        .unwrap();
        assert!(norm.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_degree_matrix_checks() {
        let lapl = Array2::<f64>::eye(3);
        let not_diag = array![[1.0, 0.5, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let err = normalise(
            &lapl.view(),
            DegreeInput::Diagonal(not_diag.view()),
            Normalisation::Symmetric,
            true,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not a diagonal"));

        let small = Array2::<f64>::eye(2);
        let err = normalise(
            &lapl.view(),
            DegreeInput::Diagonal(small.view()),
            Normalisation::Symmetric,
            true,
        )
        .unwrap_err();
        assert!(err.to_string().contains("degree matrix has shape"));

        let diag = Array2::from_diag(&array![2.0, 2.0, 2.0]);
        let ok = normalise(
            &lapl.view(),
            DegreeInput::Diagonal(diag.view()),
            Normalisation::RandomWalkInflow,
            true,
        )
        .unwrap();
        assert!((ok[[0, 0]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_normalised_laplacian_masks_isolated_nodes() {
        let m = array![[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
        let l = symmetric_normalised_laplacian(&m.view(), None, true).unwrap();
        assert_eq!(l[[2, 2]], 0.0);
        assert!((l[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((l[[0, 1]] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_normalised_laplacian_matches_two_step() {
        let m = sample();
        let direct = symmetric_normalised_laplacian(&m.view(), None, true).unwrap();
        let (lapl, degree) =
            compute_laplacian(&m.view(), NegativeHandling::Absolute, &SelfLoops::Remove).unwrap();
        let two_step = normalise(
            &lapl.view(),
            DegreeInput::Vector(degree.view()),
            Normalisation::Symmetric,
            true,
        )
        .unwrap();
        for (a, b) in direct.iter().zip(two_step.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
