// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Graph Filter
// ─────────────────────────────────────────────────────────────────────
//! Splits the eigenbasis into contiguous bands of modes and re-projects
//! the Fourier coefficients through each band.
//!
//! Cutoffs `[c1, c2, ...]` give bands `[0, c1)`, `[c1, c2)`, ..., `[ck, N)`.
//! Every band's eigenvector matrix keeps its own columns and zeroes the
//! rest, so the band matrices sum back to the full basis.

use log::{info, warn};
use ndarray::{s, Array2, ArrayD, ArrayView2, ArrayViewD};
use sdi_types::{BandKey, BandMap, SdiError, SdiResult};

use crate::projection::{graph_fourier_transform, inverse_graph_fourier_transform};

/// Per-band eigenvectors and timeseries, in band order.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitBundle {
    pub eigenvectors: BandMap<Array2<f64>>,
    pub timeseries: BandMap<ArrayD<f64>>,
}

impl SplitBundle {
    pub fn keys(&self) -> Vec<BandKey> {
        self.timeseries.keys().cloned().collect()
    }

    pub fn n_bands(&self) -> usize {
        self.timeseries.len()
    }
}

/// Fit `keys` to `n_bands`: extra keys are dropped, missing ones are
/// generated as `key-NNN` (1-based band position).
pub fn resolve_band_keys(keys: &[String], n_bands: usize) -> Vec<String> {
    let mut out: Vec<String> = keys.iter().take(n_bands).cloned().collect();
    if keys.len() > n_bands {
        warn!(
            "The declared keys list ({keys:?}) has {} elements, but the split has {n_bands} bands. \
             Keys after {:?} will be ignored.",
            keys.len(),
            out.last()
        );
    } else if keys.len() < n_bands {
        warn!(
            "The declared keys list ({keys:?}) has {} elements, but the split has {n_bands} bands. \
             More keys will be created.",
            keys.len()
        );
        for i in keys.len()..n_bands {
            out.push(format!("key-{:03}", i + 1));
        }
    }
    out
}

/// Validate cutoffs against an eigenvector matrix of shape `shape`.
pub fn check_cutoffs(cutoffs: &[usize], shape: &[usize]) -> SdiResult<()> {
    if cutoffs.is_empty() {
        return Err(SdiError::InvalidIndex(
            "at least one cutoff index is required".to_string(),
        ));
    }
    let rows = shape.first().copied().unwrap_or(0);
    for &f in cutoffs {
        if f == 0 || f + 1 >= rows {
            return Err(SdiError::InvalidIndex(format!(
                "Selected index {f} is not valid to split eigenvector matrix of shape {shape:?}"
            )));
        }
    }
    if cutoffs.windows(2).any(|w| w[0] >= w[1]) {
        return Err(SdiError::InvalidIndex(format!(
            "cutoff indices must be strictly increasing, got {cutoffs:?}"
        )));
    }
    Ok(())
}

/// Zero-padded band matrices of `eigenvectors` for `cutoffs`.
pub fn split_eigenvectors(
    eigenvectors: &ArrayView2<'_, f64>,
    cutoffs: &[usize],
    keys: &[String],
) -> SdiResult<BandMap<Array2<f64>>> {
    check_cutoffs(cutoffs, eigenvectors.shape())?;
    let keys = resolve_band_keys(keys, cutoffs.len() + 1);
    let mut bounds = Vec::with_capacity(cutoffs.len() + 2);
    bounds.push(0);
    bounds.extend_from_slice(cutoffs);
    bounds.push(eigenvectors.ncols());

    let mut split = BandMap::new();
    for (key, w) in keys.into_iter().zip(bounds.windows(2)) {
        let (lo, hi) = (w[0], w[1]);
        let mut band = Array2::<f64>::zeros(eigenvectors.raw_dim());
        band.slice_mut(s![.., lo..hi])
            .assign(&eigenvectors.slice(s![.., lo..hi]));
        if split.insert(BandKey::named(key.clone()), band).is_some() {
            return Err(SdiError::InvalidParameter {
                name: "band keys",
                value: key,
                expected: "unique band names",
            });
        }
    }
    Ok(split)
}

/// Split `timeseries` into spectral bands.
///
/// Fourier coefficients are computed once with the full basis, then
/// re-projected through every band matrix.
pub fn graph_filter(
    timeseries: &ArrayViewD<'_, f64>,
    eigenvectors: &ArrayView2<'_, f64>,
    cutoffs: &[usize],
    keys: &[String],
) -> SdiResult<SplitBundle> {
    let evec_split = split_eigenvectors(eigenvectors, cutoffs, keys)?;
    info!("Splitting graph into {} parts", evec_split.len());

    info!("Compute graph fourier coefficients.");
    let coeff = graph_fourier_transform(timeseries, eigenvectors, false, false)?;
    let ts_split = evec_split.try_map_values(|k, band| {
        info!("Compute {k} part of timeseries.");
        inverse_graph_fourier_transform(&coeff.view(), &band.view())
    })?;

    Ok(SplitBundle {
        eigenvectors: evec_split,
        timeseries: ts_split,
    })
}
