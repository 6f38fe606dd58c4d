// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Random Sign Flips
// ─────────────────────────────────────────────────────────────────────
//! Surrogate eigenbases: every eigenvector (column) gets a random sign.
//!
//! Draw order is part of the contract: surrogate `i` uses ChaCha8 seeded
//! with `seed` on stream `i`, and draws one Bernoulli(0.5) per column in
//! column order. Results are therefore identical for any thread count.

use log::info;
use ndarray::{Array1, Array2, Array3, ArrayView2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use sdi_types::SdiResult;

/// Generator for surrogate `index`.
pub fn surrogate_rng(seed: u64, index: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(index as u64);
    rng
}

/// `n` independent ±1 values.
pub fn draw_signs(rng: &mut ChaCha8Rng, n: usize) -> Array1<f64> {
    (0..n)
        .map(|_| if rng.gen_bool(0.5) { 1.0 } else { -1.0 })
        .collect()
}

/// Eigenbasis of surrogate `index`.
pub fn signed_basis(eigenvectors: &ArrayView2<'_, f64>, seed: u64, index: usize) -> Array2<f64> {
    let mut rng = surrogate_rng(seed, index);
    let signs = draw_signs(&mut rng, eigenvectors.ncols());
    eigenvectors * &signs
}

/// Stack of `n_surrogates` sign-flipped eigenbases along a new last axis
/// (`N × N × n`). With `stack`, the original basis is appended last.
pub fn random_sign(
    eigenvectors: &ArrayView2<'_, f64>,
    n_surrogates: usize,
    seed: u64,
    stack: bool,
) -> SdiResult<Array3<f64>> {
    info!("Randomly switching signs of eigenvectors to create surrogates.");
    let total = n_surrogates + usize::from(stack);
    let (rows, cols) = eigenvectors.dim();

    let bases: Vec<Array2<f64>> = (0..n_surrogates)
        .into_par_iter()
        .map(|i| signed_basis(eigenvectors, seed, i))
        .collect();

    let mut out = Array3::<f64>::zeros((rows, cols, total));
    for (i, basis) in bases.iter().enumerate() {
        out.index_axis_mut(Axis(2), i).assign(basis);
    }
    if stack {
        out.index_axis_mut(Axis(2), n_surrogates).assign(eigenvectors);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Array2<f64> {
        Array2::from_shape_fn((6, 6), |(i, j)| ((i * 6 + j) as f64 * 0.37).sin())
    }

    #[test]
    fn test_reproducible() {
        let v = sample();
        let a = random_sign(&v.view(), 8, 2, false).unwrap();
        let b = random_sign(&v.view(), 8, 2, false).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_seed_changes_draws() {
        let v = sample();
        let a = random_sign(&v.view(), 8, 2, false).unwrap();
        let b = random_sign(&v.view(), 8, 3, false).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_stack_appends_original() {
        let v = sample();
        let rs = random_sign(&v.view(), 4, 2, true).unwrap();
        assert_eq!(rs.dim(), (6, 6, 5));
        assert_eq!(rs.index_axis(Axis(2), 4), v);
    }

    #[test]
    fn test_whole_columns_flip() {
        let v = sample();
        let rs = random_sign(&v.view(), 3, 11, false).unwrap();
        for s in 0..3 {
            for j in 0..6 {
                let ratio = rs[[0, j, s]] / v[[0, j]];
                assert!((ratio.abs() - 1.0).abs() < 1e-12);
                for i in 1..6 {
                    assert!((rs[[i, j, s]] - ratio * v[[i, j]]).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_surrogate_matches_its_stream() {
        let v = array![[1.0, 2.0], [3.0, 4.0]];
        let rs = random_sign(&v.view(), 3, 9, false).unwrap();
        let mut rng = surrogate_rng(9, 2);
        let signs = draw_signs(&mut rng, 2);
        assert_eq!(rs.index_axis(Axis(2), 2), &v * &signs);
    }

    #[test]
    fn test_signs_are_balanced() {
        let mut rng = surrogate_rng(42, 0);
        let signs = draw_signs(&mut rng, 10_000);
        let positives = signs.iter().filter(|s| **s > 0.0).count();
        assert!((4_500..5_500).contains(&positives), "got {positives} positives");
    }
}
