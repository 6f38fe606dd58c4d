// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Analysis Runner
// ─────────────────────────────────────────────────────────────────────
//! Config-driven execution of the full pipeline:
//!   1. Validate inputs (square SC, matching parcels, ≤ 3 dims)
//!   2. Optionally z-score the timeseries
//!   3. Laplacian → normalisation → eigenpairs
//!   4. Verify eigenvalue ordering
//!   5. Median or fixed spectral split
//!   6. SDI / gSDI / FC of full and split timeseries
//!   7. Surrogates + significance (skipped when `n_surrogates == 0`)
//!   8. Summarise

use log::{info, warn};
use ndarray::{Array1, Array2, ArrayD, ArrayView2, ArrayViewD};
use serde::{Deserialize, Serialize};
use sdi_spectral::eigen::is_symmetric;
use sdi_spectral::SplitBundle;
use sdi_surrogates::{SignificanceOptions, SignificanceOutput};
use sdi_types::{AnalysisConfig, BandMap, RatioMap, SdiError, SdiResult, SurrogateKind, TestMethod};

use crate::container::{LaplacianOptions, ScGraph};

/// Every artifact of one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub n_nodes: usize,
    pub n_timepoints: usize,
    pub n_subjects: usize,
    pub laplacian: Array2<f64>,
    pub eigenvalues: Array1<f64>,
    pub eigenvectors: Array2<f64>,
    pub zero_crossings: Array1<usize>,
    pub node_strength: ArrayD<f64>,
    pub cutoffs: Vec<usize>,
    pub split: SplitBundle,
    pub sdi: Option<ArrayD<f64>>,
    pub gsdi: Option<RatioMap<ArrayD<f64>>>,
    pub fc: Option<ArrayD<f64>>,
    pub fc_split: Option<BandMap<ArrayD<f64>>>,
    pub sdi_significance: Option<SignificanceOutput>,
    pub gsdi_significance: Option<RatioMap<SignificanceOutput>>,
    /// Input connectivity matrix was symmetric.
    pub mtx_symmetric: bool,
    pub eigenvalues_ordered: bool,
    pub surrogate_kind: SurrogateKind,
    pub n_surrogates: usize,
    pub test_method: TestMethod,
}

/// Serialisable digest of an [`AnalysisReport`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub n_nodes: usize,
    pub n_timepoints: usize,
    pub n_subjects: usize,
    pub cutoffs: Vec<usize>,
    pub keys: Vec<String>,
    pub eigenvalue_min: f64,
    pub eigenvalue_max: f64,
    /// Second-smallest eigenvalue (algebraic connectivity).
    pub fiedler_value: f64,
    pub mtx_symmetric: bool,
    pub eigenvalues_ordered: bool,
    pub sdi_mean: Option<f64>,
    pub sdi_min: Option<f64>,
    pub sdi_max: Option<f64>,
    pub gsdi_labels: Vec<String>,
    pub surrogate_kind: Option<SurrogateKind>,
    pub n_surrogates: usize,
    pub test_method: Option<TestMethod>,
    /// Entries of the SDI significance output that are nonzero
    /// (significant mask entries, or surviving masked values).
    pub sdi_significant: Option<usize>,
}

impl AnalysisSummary {
    pub fn to_json(&self) -> SdiResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SdiError::Config(e.to_string()))
    }
}

fn eigenvalues_ordered(vals: &Array1<f64>) -> bool {
    vals.windows(2).into_iter().all(|w| w[0] <= w[1] + 1e-10)
}

fn finite_stats(values: &ArrayD<f64>) -> Option<(f64, f64, f64)> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    let mean = finite.iter().sum::<f64>() / finite.len() as f64;
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((mean, min, max))
}

impl AnalysisReport {
    pub fn keys(&self) -> Vec<String> {
        self.split.timeseries.labels()
    }

    pub fn summary(&self) -> AnalysisSummary {
        let stats = self.sdi.as_ref().and_then(finite_stats);
        let tested = self.sdi_significance.is_some() || self.gsdi_significance.is_some();
        AnalysisSummary {
            n_nodes: self.n_nodes,
            n_timepoints: self.n_timepoints,
            n_subjects: self.n_subjects,
            cutoffs: self.cutoffs.clone(),
            keys: self.keys(),
            eigenvalue_min: self.eigenvalues.get(0).copied().unwrap_or(0.0),
            eigenvalue_max: self
                .eigenvalues
                .len()
                .checked_sub(1)
                .and_then(|i| self.eigenvalues.get(i).copied())
                .unwrap_or(0.0),
            fiedler_value: self.eigenvalues.get(1).copied().unwrap_or(0.0),
            mtx_symmetric: self.mtx_symmetric,
            eigenvalues_ordered: self.eigenvalues_ordered,
            sdi_mean: stats.map(|s| s.0),
            sdi_min: stats.map(|s| s.1),
            sdi_max: stats.map(|s| s.2),
            gsdi_labels: self.gsdi.as_ref().map(|g| g.labels()).unwrap_or_default(),
            surrogate_kind: tested.then_some(self.surrogate_kind),
            n_surrogates: self.n_surrogates,
            test_method: tested.then_some(self.test_method),
            sdi_significant: self
                .sdi_significance
                .as_ref()
                .map(|s| s.to_f64().iter().filter(|v| **v != 0.0).count()),
        }
    }
}

/// Run the full pipeline described by `config`.
pub fn run_analysis(
    mtx: &ArrayView2<'_, f64>,
    timeseries: &ArrayViewD<'_, f64>,
    config: &AnalysisConfig,
) -> SdiResult<AnalysisReport> {
    config.validate()?;

    // 1. Validate
    let mut graph = ScGraph::from_views(mtx, timeseries)?;
    let mtx_symmetric = is_symmetric(mtx);
    if !mtx_symmetric {
        warn!("Connectivity matrix is not symmetric; the Laplacian spectrum may not be real");
    }

    // 2. Z-score
    if config.normalise_timeseries {
        info!("Normalising timeseries");
        graph = graph.normalise_timeseries()?;
    }
    let (n_nodes, n_timepoints, n_subjects) = (graph.nnodes(), graph.ntimepoints(), graph.nsubjects());
    let node_strength = graph.node_strength(config.mean)?;
    let fc = if config.compute_fc {
        Some(graph.functional_connectivity(config.mean)?)
    } else {
        None
    };

    // 3-4. Spectral decomposition
    let spectral = graph.decompose(&LaplacianOptions::from_config(config))?;
    let eigenvalues_ordered = eigenvalues_ordered(spectral.eigenvalues());
    let zero_crossings = spectral.zero_crossings();

    // 5. Split
    let split = spectral.split(&config.split, &config.keys)?;
    info!("Split at {:?} into {:?}", split.cutoffs(), split.split_keys());

    // 6. Metrics
    let sdi = if config.compute_sdi {
        Some(split.sdi(config.mean, None)?)
    } else {
        None
    };
    let gsdi = if config.compute_gsdi {
        Some(split.gsdi(config.mean, None)?)
    } else {
        None
    };
    let fc_split = if config.compute_fc {
        Some(split.fc_split(config.mean)?)
    } else {
        None
    };

    // 7. Surrogates + significance
    let opts = SignificanceOptions::from_config(config);
    let wants_test = config.n_surrogates > 0 && (config.compute_sdi || config.compute_gsdi);
    let (split, sdi_significance, gsdi_significance) = if wants_test {
        let surr = split.surrogates(config.surrogate_kind, config.n_surrogates, config.seed)?;
        let sdi_sig = if config.compute_sdi {
            Some(surr.test_sdi(&opts)?)
        } else {
            None
        };
        let gsdi_sig = if config.compute_gsdi {
            Some(surr.test_gsdi(&opts)?)
        } else {
            None
        };
        (surr.split().clone(), sdi_sig, gsdi_sig)
    } else {
        info!("No surrogates requested, skipping significance testing");
        (split, None, None)
    };

    // 8. Assemble
    let spectral = split.spectral();
    Ok(AnalysisReport {
        n_nodes,
        n_timepoints,
        n_subjects,
        laplacian: spectral.laplacian().clone(),
        eigenvalues: spectral.eigenvalues().clone(),
        eigenvectors: spectral.eigenvectors().clone(),
        zero_crossings,
        node_strength,
        cutoffs: split.cutoffs().to_vec(),
        split: split.bundle().clone(),
        sdi,
        gsdi,
        fc,
        fc_split,
        sdi_significance,
        gsdi_significance,
        mtx_symmetric,
        eigenvalues_ordered,
        surrogate_kind: config.surrogate_kind,
        n_surrogates: config.n_surrogates,
        test_method: config.test_method,
    })
}
