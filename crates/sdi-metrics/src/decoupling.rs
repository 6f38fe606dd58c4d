// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Structural Decoupling Index
// ─────────────────────────────────────────────────────────────────────
//! SDI = `log2(‖high‖ / ‖low‖)` per node, norms taken along time.
//!
//! gSDI extends the ratio to more than two bands: every selected band is
//! compared with every other band and with every sum of 2..k-1 selected
//! bands that does not include it.

use log::{info, warn};
use ndarray::{ArrayD, Axis, Zip};
use sdi_types::{BandKey, BandMap, RatioKey, RatioMap, SdiError, SdiResult};

/// L2 norm along the time axis (axis 1).
fn time_norm(ts: &ArrayD<f64>) -> SdiResult<ArrayD<f64>> {
    if ts.ndim() < 2 {
        return Err(SdiError::shape(format!(
            "band timeseries need a time axis, got shape {:?}",
            ts.shape()
        )));
    }
    Ok(ts.map_axis(Axis(1), |lane| lane.dot(&lane).sqrt()))
}

fn log_ratio(num: &ArrayD<f64>, den: &ArrayD<f64>, mean: bool, label: &str) -> SdiResult<ArrayD<f64>> {
    if num.shape() != den.shape() {
        return Err(SdiError::shape(format!(
            "band norms of {label} have shapes {:?} and {:?}",
            num.shape(),
            den.shape()
        )));
    }
    let mut ratio = Zip::from(num).and(den).map_collect(|a, b| a / b);
    if mean && ratio.ndim() >= 2 {
        ratio = ratio
            .mean_axis(Axis(1))
            .ok_or_else(|| SdiError::shape("cannot average over an empty subject axis"))?;
    }
    ratio.mapv_inplace(f64::log2);
    let bad = ratio.iter().filter(|v| !v.is_finite()).count();
    if bad > 0 {
        warn!("{label}: {bad} non-finite values (zero-energy band?)");
    }
    Ok(ratio)
}

/// Resolve the requested keys against the bundle.
fn select_keys(bundle: &BandMap<ArrayD<f64>>, keys: Option<&[String]>) -> SdiResult<Vec<BandKey>> {
    match keys {
        None => Ok(bundle.keys().cloned().collect()),
        Some(requested) => {
            let available = bundle.labels();
            if requested.iter().any(|k| !available.contains(k)) {
                return Err(SdiError::UnknownBand {
                    requested: requested.to_vec(),
                    available,
                });
            }
            Ok(requested.iter().map(|k| BandKey::named(k.clone())).collect())
        }
    }
}

fn lookup<'a>(bundle: &'a BandMap<ArrayD<f64>>, key: &BandKey) -> SdiResult<&'a ArrayD<f64>> {
    bundle.get(key).ok_or_else(|| SdiError::UnknownBand {
        requested: vec![key.to_string()],
        available: bundle.labels(),
    })
}

/// Structural decoupling index of a two-band split.
///
/// Bands named `low`/`high` (any case) are ordered low → high; otherwise
/// the second key is the numerator. `mean` averages the ratio across
/// subjects before the logarithm.
pub fn structural_decoupling_index(
    bundle: &BandMap<ArrayD<f64>>,
    mean: bool,
    keys: Option<&[String]>,
) -> SdiResult<ArrayD<f64>> {
    let mut keys = select_keys(bundle, keys)?;
    if keys.len() != 2 {
        return Err(SdiError::BandCount(keys.len()));
    }
    let lower: Vec<String> = keys.iter().map(|k| k.to_string().to_lowercase()).collect();
    if lower[0] == "high" && lower[1] == "low" {
        keys.swap(0, 1);
    }
    let low = time_norm(lookup(bundle, &keys[0])?)?;
    let high = time_norm(lookup(bundle, &keys[1])?)?;
    log_ratio(&high, &low, mean, "structural decoupling index")
}

/// Generalised structural decoupling index, keyed `{band}_over_{other}`.
pub fn generalised_decoupling_index(
    bundle: &BandMap<ArrayD<f64>>,
    mean: bool,
    keys: Option<&[String]>,
) -> SdiResult<RatioMap<ArrayD<f64>>> {
    let keys = select_keys(bundle, keys)?;
    let names: Vec<String> = keys.iter().map(|k| k.to_string()).collect();

    let mut norms: BandMap<ArrayD<f64>> = BandMap::new();
    for (k, ts) in bundle.iter() {
        norms.insert(k.clone(), time_norm(ts)?);
    }

    if keys.len() > 2 {
        info!("Prepare combinations of timeseries");
        for size in 2..keys.len() {
            for combo in combinations(&names, size) {
                let first = lookup(bundle, &BandKey::named(combo[0].clone()))?;
                let mut sum = first.clone();
                for name in &combo[1..] {
                    sum += lookup(bundle, &BandKey::named(name.clone()))?;
                }
                norms.insert(BandKey::combination(&combo), time_norm(&sum)?);
            }
        }
    }

    let mut out = RatioMap::new();
    for k in &keys {
        let Some(name) = k.as_named() else { continue };
        let num = lookup(&norms, k)?;
        for (j, den) in norms.iter() {
            if j.contains(name) {
                continue;
            }
            let ratio_key = RatioKey::new(k.clone(), j.clone());
            let label = ratio_key.to_string();
            out.insert(ratio_key, log_ratio(num, den, mean, &label)?);
        }
    }
    Ok(out)
}

/// Ordered `size`-combinations of `items` (lexicographic by position).
fn combinations(items: &[String], size: usize) -> Vec<Vec<String>> {
    let n = items.len();
    if size == 0 || size > n {
        return Vec::new();
    }
    let mut idx: Vec<usize> = (0..size).collect();
    let mut out = Vec::new();
    loop {
        out.push(idx.iter().map(|&i| items[i].clone()).collect());
        let mut pos = size;
        while pos > 0 && idx[pos - 1] == n - size + pos - 1 {
            pos -= 1;
        }
        if pos == 0 {
            return out;
        }
        idx[pos - 1] += 1;
        for i in pos..size {
            idx[i] = idx[i - 1] + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    fn bundle(pairs: Vec<(&str, ArrayD<f64>)>) -> BandMap<ArrayD<f64>> {
        pairs.into_iter().map(|(k, v)| (BandKey::named(k), v)).collect()
    }

    #[test]
    fn test_sdi_ratio_of_norms() {
        let b = bundle(vec![
            ("low", array![[1.0], [2.0]].into_dyn()),
            ("high", array![[3.0], [4.0]].into_dyn()),
        ]);
        let sdi = structural_decoupling_index(&b, false, None).unwrap();
        assert!((sdi[[0]] - 3.0_f64.log2()).abs() < 1e-12);
        assert!((sdi[[1]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sdi_low_high_order_is_case_insensitive() {
        let low = array![[1.0, 1.0], [2.0, 0.0]].into_dyn();
        let high = array![[3.0, 0.0], [1.0, 1.0]].into_dyn();
        let a = bundle(vec![("low", low.clone()), ("high", high.clone())]);
        let b = bundle(vec![("HIGH", high), ("Low", low)]);
        let sa = structural_decoupling_index(&a, false, None).unwrap();
        let sb = structural_decoupling_index(&b, false, None).unwrap();
        assert_eq!(sa, sb);
    }

    #[test]
    fn test_sdi_other_names_use_key_order() {
        let b = bundle(vec![
            ("alpha", array![[1.0]].into_dyn()),
            ("beta", array![[4.0]].into_dyn()),
        ]);
        let forward = structural_decoupling_index(&b, false, None).unwrap();
        assert!((forward[[0]] - 2.0).abs() < 1e-12);
        let keys = vec!["beta".to_string(), "alpha".to_string()];
        let reversed = structural_decoupling_index(&b, false, Some(&keys)).unwrap();
        assert!((reversed[[0]] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sdi_band_count_and_unknown_keys() {
        let b = bundle(vec![
            ("a", array![[1.0]].into_dyn()),
            ("b", array![[1.0]].into_dyn()),
            ("c", array![[1.0]].into_dyn()),
        ]);
        let err = structural_decoupling_index(&b, false, None).unwrap_err();
        assert!(matches!(err, SdiError::BandCount(3)));
        let keys = vec!["a".to_string(), "z".to_string()];
        let err = structural_decoupling_index(&b, false, Some(&keys)).unwrap_err();
        assert!(err.to_string().contains("provided keys"));
    }

    #[test]
    fn test_sdi_mean_before_log() {
        let low = Array3::from_shape_fn((1, 1, 2), |_| 1.0).into_dyn();
        let mut high = Array3::zeros((1, 1, 2));
        high[[0, 0, 0]] = 2.0;
        high[[0, 0, 1]] = 6.0;
        let b = bundle(vec![("low", low), ("high", high.into_dyn())]);
        let sdi = structural_decoupling_index(&b, true, None).unwrap();
        assert_eq!(sdi.shape(), &[1]);
        assert!((sdi[[0]] - 2.0).abs() < 1e-12);
        let per_subject = structural_decoupling_index(&b, false, None).unwrap();
        assert_eq!(per_subject.shape(), &[1, 2]);
    }

    #[test]
    fn test_gsdi_keys() {
        let b = bundle(vec![
            ("alpha", array![[1.0, 0.0]].into_dyn()),
            ("beta", array![[0.0, 2.0]].into_dyn()),
            ("gamma", array![[2.0, 2.0]].into_dyn()),
        ]);
        let g = generalised_decoupling_index(&b, false, None).unwrap();
        let expected = vec![
            "alpha_over_beta",
            "alpha_over_gamma",
            "alpha_over_(beta_and_gamma)",
            "beta_over_alpha",
            "beta_over_gamma",
            "beta_over_(alpha_and_gamma)",
            "gamma_over_alpha",
            "gamma_over_beta",
            "gamma_over_(alpha_and_beta)",
        ];
        assert_eq!(g.labels(), expected);
        // ‖alpha‖ = 1, ‖beta + gamma‖ = ‖(2, 4)‖
        let v = g.get_label("alpha_over_(beta_and_gamma)").unwrap();
        assert!((v[[0]] - (1.0 / 20.0_f64.sqrt()).log2()).abs() < 1e-12);
    }

    #[test]
    fn test_gsdi_two_bands_matches_sdi() {
        let b = bundle(vec![
            ("low", array![[1.0, 1.0], [0.5, 0.5]].into_dyn()),
            ("high", array![[2.0, 0.0], [0.0, 3.0]].into_dyn()),
        ]);
        let g = generalised_decoupling_index(&b, false, None).unwrap();
        let sdi = structural_decoupling_index(&b, false, None).unwrap();
        assert_eq!(g.len(), 2);
        assert_eq!(g.get_label("high_over_low").unwrap(), &sdi);
    }

    #[test]
    fn test_combinations() {
        let items: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let pairs = combinations(&items, 2);
        assert_eq!(pairs.len(), 6);
        assert_eq!(pairs[0], vec!["a", "b"]);
        assert_eq!(pairs[5], vec!["c", "d"]);
        assert_eq!(combinations(&items, 3).len(), 4);
    }
}
