// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Analysis Configuration
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::error::{SdiError, SdiResult};
use crate::params::{
    NegativeHandling, Normalisation, SelfLoops, SplitSelection, SurrogateKind, TestMethod,
};

/// Runtime configuration for one structural decoupling analysis.
///
/// Every field has a default, so a partial JSON document only needs to
/// name the knobs it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Resolution of negative connectivity weights.
    /// Default: absolute.
    pub negative_handling: NegativeHandling,

    /// Diagonal handling before degree computation.
    /// Default: remove.
    pub self_loops: SelfLoops,

    /// Laplacian normalisation; `None` keeps the combinatorial Laplacian.
    /// Default: symmetric.
    pub normalisation: Option<Normalisation>,

    /// Replace zero degrees by 1 before inverting.
    /// Default: true.
    pub fix_zeros: bool,

    /// Z-score the timeseries along time before projecting.
    /// Default: false.
    pub normalise_timeseries: bool,

    /// Spectral split point(s).
    /// Default: median.
    pub split: SplitSelection,

    /// Band names, one per band (cutoffs + 1).
    /// Default: ["low", "high"].
    pub keys: Vec<String>,

    /// Compute the two-band structural decoupling index.
    /// Default: true.
    pub compute_sdi: bool,

    /// Compute the generalised index over every band combination.
    /// Default: false.
    pub compute_gsdi: bool,

    /// Compute functional connectivity of the full and split timeseries.
    /// Default: true.
    pub compute_fc: bool,

    /// Null model for surrogates.
    /// Default: informed.
    pub surrogate_kind: SurrogateKind,

    /// Number of surrogates; 0 skips surrogates and significance testing.
    /// Default: 1000.
    pub n_surrogates: usize,

    /// Seed of the sign-flip generator.
    /// Default: 42.
    pub seed: u64,

    /// Significance testing method.
    /// Default: Bernoulli.
    pub test_method: TestMethod,

    /// Subject-level (or two-tailed) p threshold.
    /// Default: 0.05.
    pub p: f64,

    /// Group-level binomial threshold; `None` lets the Bernoulli test
    /// take `p` here and use 0.1 at subject level.
    /// Default: None.
    pub p_bernoulli: Option<f64>,

    /// Average tested metrics over the subject axis.
    /// Default: true.
    pub mean: bool,

    /// Return masked metric values instead of a boolean mask.
    /// Default: true.
    pub return_masked: bool,

    /// Value written where a metric is not significant.
    /// Default: 0.0.
    pub fill_value: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            negative_handling: NegativeHandling::Absolute,
            self_loops: SelfLoops::Remove,
            normalisation: Some(Normalisation::Symmetric),
            fix_zeros: true,
            normalise_timeseries: false,
            split: SplitSelection::Median,
            keys: vec!["low".to_string(), "high".to_string()],
            compute_sdi: true,
            compute_gsdi: false,
            compute_fc: true,
            surrogate_kind: SurrogateKind::Informed,
            n_surrogates: 1000,
            seed: 42,
            test_method: TestMethod::Bernoulli,
            p: 0.05,
            p_bernoulli: None,
            mean: true,
            return_masked: true,
            fill_value: 0.0,
        }
    }
}

impl AnalysisConfig {
    /// Number of bands the split produces.
    pub fn n_bands(&self) -> usize {
        match &self.split {
            SplitSelection::Median => 2,
            SplitSelection::Fixed(cutoffs) => cutoffs.len() + 1,
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> SdiResult<()> {
        if !(0.0..=1.0).contains(&self.p) {
            return Err(SdiError::Config(format!(
                "p must be in [0, 1], got {}",
                self.p
            )));
        }
        if let Some(pb) = self.p_bernoulli {
            if !(0.0..=1.0).contains(&pb) {
                return Err(SdiError::Config(format!(
                    "p_bernoulli must be in [0, 1], got {pb}"
                )));
            }
        }
        if let SplitSelection::Fixed(cutoffs) = &self.split {
            if cutoffs.is_empty() {
                return Err(SdiError::Config(
                    "split must list at least one cutoff".to_string(),
                ));
            }
            if cutoffs.windows(2).any(|w| w[0] >= w[1]) {
                return Err(SdiError::Config(format!(
                    "split cutoffs must be strictly increasing, got {cutoffs:?}"
                )));
            }
        }
        if self.keys.len() < 2 {
            return Err(SdiError::Config(format!(
                "keys must name at least two bands, got {:?}",
                self.keys
            )));
        }
        for (i, k) in self.keys.iter().enumerate() {
            if k.trim().is_empty() {
                return Err(SdiError::Config("keys must not be empty".to_string()));
            }
            if self.keys[..i].contains(k) {
                return Err(SdiError::Config(format!("duplicate band key \"{k}\"")));
            }
        }
        if self.compute_sdi && self.n_bands() != 2 {
            return Err(SdiError::Config(format!(
                "compute_sdi needs exactly two bands, split gives {}",
                self.n_bands()
            )));
        }
        if !self.fill_value.is_finite() {
            return Err(SdiError::Config(format!(
                "fill_value must be finite, got {}",
                self.fill_value
            )));
        }
        Ok(())
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> SdiResult<Self> {
        serde_json::from_str(json).map_err(|e| SdiError::Config(format!("JSON parse error: {e}")))
    }

    /// Serialise to a JSON string.
    pub fn to_json(&self) -> SdiResult<String> {
        serde_json::to_string(self).map_err(|e| SdiError::Config(format!("JSON encode error: {e}")))
    }
}
