// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Significance Testing
// ─────────────────────────────────────────────────────────────────────
//! Non-parametric test of empirical data against a surrogate ensemble.
//!
//! Ensembles are `observations [× subjects ...] × surrogates`, with the
//! empirical data as the last slice of the last axis.
//!
//! - Frequentist: two-tailed percentile test per entry (`p/2` each tail).
//! - Bernoulli: the frequentist test per subject, then a group-level
//!   binomial test over how many subjects flag each observation
//!   (one-tailed, Bonferroni-corrected across observations).
//!
//! When too few surrogates or subjects exist for the requested p, the p is
//! relaxed to the finest resolvable value with a warning.

use log::{info, warn};
use ndarray::{concatenate, ArrayD, ArrayViewD, Axis, Zip};
use sdi_types::{AnalysisConfig, SdiError, SdiResult, TestMethod};

/// Trials of the binomial reference distribution.
const BINOMIAL_TRIALS: usize = 100;
/// Subject-level p used by the Bernoulli method when only `p` is given.
const DEFAULT_SUBJECT_P: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct SignificanceOptions {
    pub method: TestMethod,
    /// Two-tailed subject-level threshold.
    pub p: f64,
    /// One-tailed group-level threshold (Bernoulli only). When `None`, `p`
    /// becomes the group threshold and the subject threshold is 0.1.
    pub p_bernoulli: Option<f64>,
    /// Return the empirical data with non-significant entries replaced by
    /// `fill_value` instead of the mask.
    pub return_masked: bool,
    /// Average the output over the subject axis (axis 1).
    pub mean: bool,
    /// Default: 0.0, so masked outputs stay finite (rather than -inf).
    pub fill_value: f64,
}

impl Default for SignificanceOptions {
    fn default() -> Self {
        Self {
            method: TestMethod::Bernoulli,
            p: 0.05,
            p_bernoulli: None,
            return_masked: false,
            mean: false,
            fill_value: 0.0,
        }
    }
}

impl SignificanceOptions {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            method: config.test_method,
            p: config.p,
            p_bernoulli: config.p_bernoulli,
            return_masked: config.return_masked,
            mean: config.mean,
            fill_value: config.fill_value,
        }
    }
}

/// Result of [`test_significance`].
#[derive(Debug, Clone, PartialEq)]
pub enum SignificanceOutput {
    /// `true` where the empirical value is significant.
    Mask(ArrayD<bool>),
    /// Fraction of significant subjects per observation.
    MaskFraction(ArrayD<f64>),
    /// Empirical data, non-significant entries replaced by the fill value.
    Masked(ArrayD<f64>),
}

impl SignificanceOutput {
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Mask(m) => m.shape(),
            Self::MaskFraction(a) | Self::Masked(a) => a.shape(),
        }
    }

    pub fn as_mask(&self) -> Option<&ArrayD<bool>> {
        match self {
            Self::Mask(m) => Some(m),
            _ => None,
        }
    }

    /// Numeric view of the output (masks become 0/1).
    pub fn to_f64(&self) -> ArrayD<f64> {
        match self {
            Self::Mask(m) => m.mapv(|b| if b { 1.0 } else { 0.0 }),
            Self::MaskFraction(a) | Self::Masked(a) => a.clone(),
        }
    }
}

fn check_probability(p: f64) -> SdiResult<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(SdiError::Probability(p));
    }
    if p == 0.0 || p == 1.0 {
        warn!(
            "The selected p value of {p} is at the limits of the possible range of [0, 1]. \
             Statistical thresholding might not be interpretable."
        );
    }
    Ok(())
}

/// `P(X = x)` for `X ~ Bin(100, p)`, `x` in `0..100`.
fn binomial_pmf(p: f64) -> Vec<f64> {
    let n = BINOMIAL_TRIALS;
    if p <= 0.0 {
        let mut pmf = vec![0.0; n];
        pmf[0] = 1.0;
        return pmf;
    }
    if p >= 1.0 {
        return vec![0.0; n];
    }
    let (ln_p, ln_q) = (p.ln(), (1.0 - p).ln());
    let mut ln_choose = 0.0;
    (0..n)
        .map(|x| {
            let v = (ln_choose + x as f64 * ln_p + (n - x) as f64 * ln_q).exp();
            ln_choose += ((n - x) as f64 / (x + 1) as f64).ln();
            v
        })
        .collect()
}

/// Smallest `x` with `P(X > x) < alpha` for `X ~ Bin(100, p)`; 100 if
/// none of `0..100` qualifies.
pub fn binomial_threshold(p: f64, alpha: f64) -> usize {
    let mut cdf = 0.0;
    for (x, mass) in binomial_pmf(p).into_iter().enumerate() {
        cdf += mass;
        if 1.0 - cdf < alpha {
            return x;
        }
    }
    BINOMIAL_TRIALS
}

/// Per-tail p of the frequentist test, relaxed to `1 / len` when the
/// ensemble cannot resolve it.
fn frequentist_threshold(p: f64, len: usize) -> f64 {
    info!("Testing for p={p} two-tails (p={} each tail)", p / 2.0);
    let tail = p / 2.0;
    let finest = 1.0 / len as f64;
    if finest > tail {
        warn!(
            "The generated surrogates are not enough to test for the selected p \
             ({p} two-tails), since at least {} surrogates are required. \
             Testing for p={finest} two-tails instead.",
            (1.0 / tail).ceil() - 1.0,
        );
        return finest;
    }
    tail
}

/// Subject-level p and, when a group step runs over `subjects`, the
/// group-level p.
///
/// Without `p_bernoulli`, `p` becomes the group threshold and the subject
/// threshold is 0.1. Both are relaxed to the finest resolvable value.
fn bernoulli_thresholds(opts: &SignificanceOptions, subjects: Option<usize>, len: usize) -> (f64, Option<f64>) {
    let (mut p, mut p_bernoulli) = match opts.p_bernoulli {
        Some(pb) => (opts.p, pb),
        None => (DEFAULT_SUBJECT_P, opts.p),
    };
    if 1.0 / len as f64 > p {
        warn!(
            "The generated surrogates are not enough to test for p={p} two-tails at \
             the subject level. {} surrogates are required for p={p}.",
            (1.0 / p).ceil() - 1.0
        );
        p = 1.0 / len as f64;
    }
    let Some(n_subjects) = subjects else {
        info!("Testing for p={} two-tails (p={p} each tail) at the subject level only.", p * 2.0);
        return (p, None);
    };
    if 1.0 / n_subjects as f64 > p_bernoulli {
        warn!(
            "The provided subjects are not enough to test for p={p_bernoulli} one-tail \
             at the group level, since at least {} subjects are required.",
            (1.0 / p_bernoulli).ceil()
        );
        p_bernoulli = 1.0 / n_subjects as f64;
    }
    info!(
        "Testing for p={p_bernoulli} one-tail at the group level and at p={} two-tails \
         (p={p} each tail) at the subject level.",
        p * 2.0
    );
    (p, Some(p_bernoulli))
}

/// Test `data` (or the last slice of `surr`) against the surrogates in
/// `surr`.
///
/// `data`, when given, must match every axis of `surr` but the last; it is
/// appended unless it is already the last slice. Ties between the empirical
/// value and a surrogate rank the empirical value above the surrogate.
pub fn test_significance(
    surr: &ArrayViewD<'_, f64>,
    data: Option<&ArrayViewD<'_, f64>>,
    opts: &SignificanceOptions,
) -> SdiResult<SignificanceOutput> {
    if surr.ndim() == 0 {
        return Err(SdiError::shape("surrogate ensemble must have a surrogate axis"));
    }
    let mut ensemble = surr.to_owned();
    if let Some(data) = data {
        let ax = data.ndim();
        if surr.ndim() != ax + 1 || surr.shape()[..ax] != *data.shape() {
            return Err(SdiError::shape(format!(
                "Provided empirical data and surrogate data shapes do not agree, \
                 with shapes {:?} and {:?} (last axis excluded)",
                data.shape(),
                &surr.shape()[..surr.ndim() - 1]
            )));
        }
        let already = surr.shape()[ax] > 0 && surr.index_axis(Axis(ax), surr.shape()[ax] - 1) == *data;
        if !already {
            let real = data.view().insert_axis(Axis(ax));
            ensemble = concatenate(Axis(ax), &[ensemble.view(), real])
                .map_err(|e| SdiError::shape(format!("appending empirical data: {e}")))?;
        }
    }

    check_probability(opts.p)?;
    if let Some(pb) = opts.p_bernoulli {
        check_probability(pb)?;
    }

    let last = ensemble.ndim() - 1;
    let len = ensemble.shape()[last];
    if len == 0 {
        return Err(SdiError::shape("surrogate ensemble is empty"));
    }
    if ensemble.ndim() < 3 {
        warn!(
            "Surrogate dimensions ({}) are less than expected. Check that you mean to run a \
             test on an average or that you have enough surrogates.",
            ensemble.ndim()
        );
    }
    let real_idx = len - 1;
    let n_subjects = if ensemble.ndim() >= 3 { ensemble.shape()[1] } else { 1 };

    info!("Adopting {} testing method.", opts.method);
    let (p, group_p) = match opts.method {
        TestMethod::Frequentist => (frequentist_threshold(opts.p, len), None),
        TestMethod::Bernoulli => {
            let subjects = if ensemble.ndim() < 3 {
                warn!("The dimensionality of the data is not enough to run the Bernoulli method.");
                None
            } else if n_subjects < 2 {
                warn!("The Bernoulli method is a group test that requires multiple subjects to be run.");
                None
            } else {
                Some(n_subjects)
            };
            bernoulli_thresholds(opts, subjects, len)
        }
    };

    // Real value at either extreme of its sorted lane, `k` positions wide.
    let k = (real_idx as f64 * p).floor() as usize + 1;
    let upper = len.saturating_sub(k);
    let mut mask: ArrayD<bool> = Zip::from(ensemble.lanes(Axis(last))).map_collect(|lane| {
        let real = lane[real_idx];
        let rank = lane.iter().take(real_idx).filter(|s| **s <= real).count();
        rank < k || rank >= upper
    });

    if let Some(p_bernoulli) = group_p {
        let n_obs = ensemble.shape()[0];
        let x = binomial_threshold(p, p_bernoulli / n_obs as f64);
        let thr = (n_subjects as f64 / BINOMIAL_TRIALS as f64 * x as f64).floor() as usize + 1;
        info!("Group-level threshold: more than {thr} of {n_subjects} subjects");
        let group = mask
            .map_axis(Axis(1), |l| l.iter().filter(|b| **b).count() > thr)
            .insert_axis(Axis(1));
        mask = group
            .broadcast(mask.raw_dim())
            .ok_or_else(|| SdiError::shape("cannot broadcast group mask over subjects"))?
            .to_owned();
    }

    let real = ensemble.index_axis(Axis(last), real_idx);
    let average = opts.mean && mask.ndim() >= 2;
    let fill = opts.fill_value;
    let out = match (opts.return_masked, average) {
        (true, true) => {
            info!("Returning masked empirical data, averaged across subjects (axis 1)");
            SignificanceOutput::Masked(
                Zip::from(real.lanes(Axis(1)))
                    .and(mask.lanes(Axis(1)))
                    .map_collect(|r, m| {
                        let (sum, n) = r
                            .iter()
                            .zip(m.iter())
                            .filter(|(_, keep)| **keep)
                            .fold((0.0, 0usize), |(s, n), (v, _)| (s + v, n + 1));
                        if n == 0 {
                            fill
                        } else {
                            sum / n as f64
                        }
                    }),
            )
        }
        (true, false) => {
            info!("Returning masked empirical data");
            SignificanceOutput::Masked(
                Zip::from(&real)
                    .and(&mask)
                    .map_collect(|&v, &keep| if keep { v } else { fill }),
            )
        }
        (false, true) => {
            info!("Returning mask averaged across subjects (axis 1)");
            SignificanceOutput::MaskFraction(mask.map_axis(Axis(1), |l| {
                l.iter().filter(|b| **b).count() as f64 / l.len() as f64
            }))
        }
        (false, false) => {
            info!("Returning mask");
            SignificanceOutput::Mask(mask)
        }
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2, Array3};

    /// Five observations, four subjects, four surrogates plus the real
    /// value last.
    fn fixture() -> Array3<f64> {
        let low_high = [0.1, 0.1, 0.1, 0.1, 0.4];
        let below = [0.1, 0.1, 0.1, 0.1, -0.1];
        let middle = [0.4, 0.4, 0.1, 0.1, 0.2];
        let rows: [[[f64; 5]; 4]; 5] = [
            [low_high, low_high, below, middle],
            [low_high, low_high, middle, middle],
            [low_high, low_high, middle, middle],
            [middle, middle, middle, middle],
            [low_high, low_high, middle, middle],
        ];
        Array3::from_shape_fn((5, 4, 5), |(o, s, n)| rows[o][s][n])
    }

    fn frequentist_mask() -> Array2<bool> {
        array![
            [true, true, true, false],
            [true, true, false, false],
            [true, true, false, false],
            [false, false, false, false],
            [true, true, false, false]
        ]
    }

    fn frequentist(p: f64) -> SignificanceOptions {
        SignificanceOptions {
            method: TestMethod::Frequentist,
            p,
            ..SignificanceOptions::default()
        }
    }

    #[test]
    fn test_frequentist_mask() {
        let surr = fixture().into_dyn();
        let data = surr.index_axis(Axis(2), 4).to_owned();
        let out = test_significance(&surr.view(), Some(&data.view()), &frequentist(0.4)).unwrap();
        assert_eq!(out.as_mask().unwrap(), &frequentist_mask().into_dyn());
    }

    #[test]
    fn test_bernoulli_group_mask() {
        let surr = fixture().into_dyn();
        let opts = SignificanceOptions {
            p: 0.4,
            p_bernoulli: Some(0.35),
            ..SignificanceOptions::default()
        };
        let out = test_significance(&surr.view(), None, &opts).unwrap();
        let expected = Array2::from_shape_fn((5, 4), |(o, _)| o == 0).into_dyn();
        assert_eq!(out.as_mask().unwrap(), &expected);
    }

    #[test]
    fn test_masked_and_masked_mean() {
        let surr = fixture().into_dyn();
        let data = surr.index_axis(Axis(2), 4).to_owned();
        let mask = frequentist_mask();
        let opts = SignificanceOptions {
            return_masked: true,
            ..frequentist(0.4)
        };
        let out = test_significance(&surr.view(), None, &opts).unwrap();
        let SignificanceOutput::Masked(masked) = out else {
            panic!("expected masked data");
        };
        for ((o, s), keep) in mask.indexed_iter() {
            let expected = if *keep { data[[o, s]] } else { 0.0 };
            assert_eq!(masked[[o, s]], expected);
        }

        let opts = SignificanceOptions { mean: true, ..opts };
        let out = test_significance(&surr.view(), None, &opts).unwrap();
        let SignificanceOutput::Masked(avg) = out else {
            panic!("expected masked data");
        };
        assert_eq!(avg.shape(), &[5]);
        assert!((avg[[0]] - (0.4 + 0.4 - 0.1) / 3.0).abs() < 1e-12);
        assert!((avg[[1]] - 0.4).abs() < 1e-12);
        // no subject survives: fill value
        assert_eq!(avg[[3]], 0.0);
    }

    #[test]
    fn test_mask_fraction() {
        let surr = fixture().into_dyn();
        let opts = SignificanceOptions {
            mean: true,
            ..frequentist(0.4)
        };
        let out = test_significance(&surr.view(), None, &opts).unwrap();
        assert_eq!(out, SignificanceOutput::MaskFraction(array![0.75, 0.5, 0.5, 0.0, 0.5].into_dyn()));
    }

    #[test]
    fn test_extremes_flagged_median_not() {
        let surrogates = [0.2, 0.4, 0.6, 0.8, 1.0];
        for (real, expected) in [(0.0, true), (2.0, true), (0.5, false)] {
            let mut lane = surrogates.to_vec();
            lane.push(real);
            let surr = ndarray::Array1::from(lane).insert_axis(Axis(0)).into_dyn();
            let out = test_significance(&surr.view(), None, &frequentist(0.4)).unwrap();
            assert_eq!(out.as_mask().unwrap()[[0]], expected, "real = {real}");
        }
    }

    #[test]
    fn test_data_appended_when_missing() {
        let surr = array![[0.2, 0.4, 0.6, 0.8, 1.0]].into_dyn();
        let data = array![5.0].into_dyn();
        let out = test_significance(&surr.view(), Some(&data.view()), &frequentist(0.4)).unwrap();
        assert_eq!(out.as_mask().unwrap(), &array![true].into_dyn());
    }

    #[test]
    fn test_ties_rank_real_above() {
        // all equal: real ranks at the top
        let surr = array![[1.0, 1.0, 1.0, 1.0, 1.0, 1.0]].into_dyn();
        let out = test_significance(&surr.view(), None, &frequentist(0.4)).unwrap();
        assert_eq!(out.as_mask().unwrap()[[0]], true);
    }

    #[test]
    fn test_shape_mismatch() {
        let surr = Array3::<f64>::zeros((2, 3, 5)).into_dyn();
        let data = Array2::<f64>::zeros((2, 4)).into_dyn();
        let err = test_significance(&surr.view(), Some(&data.view()), &SignificanceOptions::default()).unwrap_err();
        assert!(err.to_string().contains("shapes do not agree"));
    }

    #[test]
    fn test_probability_bounds() {
        let surr = Array3::<f64>::zeros((2, 4, 3)).into_dyn();
        for bad in [-0.1, 1.5] {
            let err = test_significance(&surr.view(), None, &frequentist(bad)).unwrap_err();
            assert!(err.to_string().contains("p values should always be between 0 and 1"));
        }
        let opts = SignificanceOptions {
            p_bernoulli: Some(2.0),
            ..SignificanceOptions::default()
        };
        assert!(matches!(
            test_significance(&surr.view(), None, &opts),
            Err(SdiError::Probability(_))
        ));
    }

    #[test]
    fn test_bernoulli_needs_subjects() {
        // A 2D ensemble leaves the subject-level mask untouched.
        let surr = array![[0.2, 0.4, 0.6, 0.8, 1.0, 9.0], [0.2, 0.4, 0.6, 0.8, 1.0, 0.5]].into_dyn();
        let opts = SignificanceOptions {
            p: 0.2,
            p_bernoulli: Some(0.35),
            ..SignificanceOptions::default()
        };
        let out = test_significance(&surr.view(), None, &opts).unwrap();
        assert_eq!(out.as_mask().unwrap(), &array![true, false].into_dyn());
    }

    #[test]
    fn test_group_p_only_relaxed_when_group_step_runs() {
        let opts = SignificanceOptions::default();
        // No subject axis: the requested group p is not touched.
        assert_eq!(bernoulli_thresholds(&opts, None, 1001), (0.1, None));
        assert_eq!(bernoulli_thresholds(&opts, Some(2), 1001), (0.1, Some(0.5)));
        assert_eq!(bernoulli_thresholds(&opts, Some(40), 1001), (0.1, Some(0.05)));

        let opts = SignificanceOptions {
            p: 0.4,
            p_bernoulli: Some(0.35),
            ..SignificanceOptions::default()
        };
        assert_eq!(bernoulli_thresholds(&opts, Some(4), 5), (0.4, Some(0.35)));
        // Two surrogates cannot resolve p=0.4 at the subject level.
        assert_eq!(bernoulli_thresholds(&opts, None, 2), (0.5, None));
    }

    #[test]
    fn test_frequentist_threshold_relaxed_for_small_ensembles() {
        assert_eq!(frequentist_threshold(0.1, 1000), 0.05);
        assert_eq!(frequentist_threshold(0.1, 5), 0.2);
    }

    #[test]
    fn test_binomial_threshold() {
        let x = binomial_threshold(0.4, 0.07);
        assert!((45..=49).contains(&x), "got {x}");
        assert!(binomial_threshold(0.4, 0.001) > x);
        assert_eq!(binomial_threshold(0.0, 0.05), 0);
        assert_eq!(binomial_threshold(1.0, 0.05), 100);
    }

    #[test]
    fn test_binomial_pmf_sums_to_one() {
        let total: f64 = binomial_pmf(0.3).iter().sum();
        // x = 100 is excluded, its mass is 0.3^100
        assert!((total - 1.0).abs() < 1e-9);
    }
}
