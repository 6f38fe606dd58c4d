// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Graph Container
// ─────────────────────────────────────────────────────────────────────
//! Analysis state threaded through the pipeline as type-state stages:
//!
//!   ScGraph ──decompose──▶ SpectralGraph ──split──▶ SplitGraph
//!     ──surrogates──▶ SurrogateGraph
//!
//! Each stage owns its upstream stage, so an operation can only be called
//! once the artifacts it consumes exist.

use log::{info, warn};
use ndarray::{Array1, Array2, ArrayD, ArrayView2, ArrayViewD};
use sdi_metrics::{
    functional_connectivity, functional_connectivity_split, generalised_decoupling_index,
    node_strength, structural_decoupling_index, zero_crossings,
};
use sdi_spectral::{
    compute_laplacian, decompose, graph_filter, graph_fourier_transform,
    median_cutoff_frequency_index, normalise, normalise_timeseries, symmetric_normalised_laplacian,
    DegreeInput, EigenDecomposition, SplitBundle,
};
use sdi_surrogates::{surrogates_of_kind, test_significance, SignificanceOptions, SignificanceOutput};
use sdi_types::{
    AnalysisConfig, BandMap, NegativeHandling, Normalisation, RatioMap, SdiError, SdiResult,
    SelfLoops, SplitSelection, SurrogateKind,
};

/// Laplacian construction knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct LaplacianOptions {
    pub negative_handling: NegativeHandling,
    pub self_loops: SelfLoops,
    /// `None` keeps the combinatorial Laplacian.
    pub normalisation: Option<Normalisation>,
    pub fix_zeros: bool,
}

impl Default for LaplacianOptions {
    fn default() -> Self {
        Self {
            negative_handling: NegativeHandling::Absolute,
            self_loops: SelfLoops::Remove,
            normalisation: Some(Normalisation::Symmetric),
            fix_zeros: true,
        }
    }
}

impl LaplacianOptions {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            negative_handling: config.negative_handling,
            self_loops: config.self_loops.clone(),
            normalisation: config.normalisation,
            fix_zeros: config.fix_zeros,
        }
    }
}

// ---------------------------------------------------------------------
// Stage 0: validated inputs
// ---------------------------------------------------------------------

/// Structural connectivity matrix and the timeseries sampled on its nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct ScGraph {
    mtx: Array2<f64>,
    timeseries: ArrayD<f64>,
}

impl ScGraph {
    /// Validate and take ownership of the inputs.
    ///
    /// `mtx` must be square; `timeseries` must be `nodes × time` or
    /// `nodes × time × subjects` with one row per node.
    pub fn new(mtx: Array2<f64>, timeseries: ArrayD<f64>) -> SdiResult<Self> {
        if !mtx.is_square() {
            return Err(SdiError::shape(format!(
                "Graph matrix must be a square matrix, but given matrix has shape {:?}",
                mtx.shape()
            )));
        }
        if timeseries.ndim() < 2 || timeseries.ndim() > 3 {
            return Err(SdiError::shape(format!(
                "Timeseries must be nodes x time [x subjects], but given timeseries has {} dimensions",
                timeseries.ndim()
            )));
        }
        if timeseries.shape()[0] != mtx.nrows() {
            return Err(SdiError::shape(format!(
                "Timeseries extracted from {} parcels, but graph has {} nodes. \
                 The number of parcels and nodes must be the same.",
                timeseries.shape()[0],
                mtx.nrows()
            )));
        }
        Ok(Self { mtx, timeseries })
    }

    pub fn from_views(mtx: &ArrayView2<'_, f64>, timeseries: &ArrayViewD<'_, f64>) -> SdiResult<Self> {
        Self::new(mtx.to_owned(), timeseries.to_owned())
    }

    pub fn mtx(&self) -> &Array2<f64> {
        &self.mtx
    }

    pub fn timeseries(&self) -> &ArrayD<f64> {
        &self.timeseries
    }

    pub fn nnodes(&self) -> usize {
        self.mtx.nrows()
    }

    pub fn ntimepoints(&self) -> usize {
        self.timeseries.shape()[1]
    }

    /// Subjects along axis 2 (1 for a single timeseries).
    pub fn nsubjects(&self) -> usize {
        self.timeseries.shape().get(2).copied().unwrap_or(1)
    }

    /// Z-score the timeseries along time.
    pub fn normalise_timeseries(mut self) -> SdiResult<Self> {
        self.timeseries = normalise_timeseries(&self.timeseries.view())?;
        Ok(self)
    }

    pub fn node_strength(&self, mean: bool) -> SdiResult<ArrayD<f64>> {
        node_strength(&self.mtx.view().into_dyn(), mean)
    }

    pub fn functional_connectivity(&self, mean: bool) -> SdiResult<ArrayD<f64>> {
        info!("Compute FC of original timeseries.");
        functional_connectivity(&self.timeseries.view(), mean)
    }

    /// Build (and optionally normalise) the Laplacian, then decompose it.
    ///
    /// The symmetric normalisation of the same adjacency is kept alongside
    /// as the input of the configuration-model null, whatever `opts`
    /// selects for the analysis itself.
    pub fn decompose(self, opts: &LaplacianOptions) -> SdiResult<SpectralGraph> {
        let (lapl, degree) = compute_laplacian(&self.mtx.view(), opts.negative_handling, &opts.self_loops)?;
        let symmetric = normalise(
            &lapl.view(),
            DegreeInput::Vector(degree.view()),
            Normalisation::Symmetric,
            opts.fix_zeros,
        )?;
        let laplacian = match opts.normalisation {
            Some(Normalisation::Symmetric) => symmetric.clone(),
            Some(mode) => normalise(&lapl.view(), DegreeInput::Vector(degree.view()), mode, opts.fix_zeros)?,
            None => lapl,
        };
        SpectralGraph::from_laplacian(self, laplacian, symmetric)
    }

    /// `I - D^-1/2 A D^-1/2` of the raw matrix, then its eigenpairs.
    pub fn structural_decomposition(self) -> SdiResult<SpectralGraph> {
        let laplacian = symmetric_normalised_laplacian(&self.mtx.view(), None, true)?;
        let null_laplacian = laplacian.clone();
        SpectralGraph::from_laplacian(self, laplacian, null_laplacian)
    }
}

// ---------------------------------------------------------------------
// Stage 1: Laplacian eigenbasis
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SpectralGraph {
    graph: ScGraph,
    laplacian: Array2<f64>,
    /// Symmetric normalised Laplacian of the resolved adjacency.
    null_laplacian: Array2<f64>,
    eigen: EigenDecomposition,
}

impl SpectralGraph {
    fn from_laplacian(graph: ScGraph, laplacian: Array2<f64>, null_laplacian: Array2<f64>) -> SdiResult<Self> {
        let eigen = decompose(&laplacian.view())?;
        info!("Decomposed {}-node Laplacian", eigen.n_modes());
        Ok(Self {
            graph,
            laplacian,
            null_laplacian,
            eigen,
        })
    }

    pub fn graph(&self) -> &ScGraph {
        &self.graph
    }

    pub fn laplacian(&self) -> &Array2<f64> {
        &self.laplacian
    }

    /// Laplacian the uninformed surrogates derive their null model from.
    pub fn null_laplacian(&self) -> &Array2<f64> {
        &self.null_laplacian
    }

    pub fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigen.eigenvalues
    }

    pub fn eigenvectors(&self) -> &Array2<f64> {
        &self.eigen.eigenvectors
    }

    pub fn zero_crossings(&self) -> Array1<usize> {
        zero_crossings(&self.eigen.eigenvectors.view())
    }

    /// Spectral energy of the timeseries per mode.
    pub fn graph_energy(&self, mean: bool) -> SdiResult<ArrayD<f64>> {
        graph_fourier_transform(&self.graph.timeseries.view(), &self.eigen.eigenvectors.view(), true, mean)
    }

    /// Half-energy cutoff of the time-averaged spectrum.
    pub fn median_cutoff(&self) -> SdiResult<usize> {
        median_cutoff_frequency_index(&self.graph_energy(true)?.view())
    }

    /// Split eigenvectors and timeseries into bands.
    pub fn split(self, selection: &SplitSelection, keys: &[String]) -> SdiResult<SplitGraph> {
        let cutoffs = match selection {
            SplitSelection::Median => vec![self.median_cutoff()?],
            SplitSelection::Fixed(idx) => idx.clone(),
        };
        let bundle = graph_filter(
            &self.graph.timeseries.view(),
            &self.eigen.eigenvectors.view(),
            &cutoffs,
            keys,
        )?;
        Ok(SplitGraph {
            spectral: self,
            cutoffs,
            bundle,
        })
    }
}

// ---------------------------------------------------------------------
// Stage 2: spectral split
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SplitGraph {
    spectral: SpectralGraph,
    cutoffs: Vec<usize>,
    bundle: SplitBundle,
}

impl SplitGraph {
    pub fn spectral(&self) -> &SpectralGraph {
        &self.spectral
    }

    pub fn cutoffs(&self) -> &[usize] {
        &self.cutoffs
    }

    pub fn bundle(&self) -> &SplitBundle {
        &self.bundle
    }

    pub fn split_keys(&self) -> Vec<String> {
        self.bundle.timeseries.labels()
    }

    /// Move to a different cutoff, recomputing the split.
    pub fn resplit(self, selection: &SplitSelection, keys: &[String]) -> SdiResult<SplitGraph> {
        let previous = self.cutoffs.clone();
        let next = self.spectral.split(selection, keys)?;
        if next.cutoffs != previous {
            warn!("Updating stored index from {previous:?} to {:?}", next.cutoffs);
        }
        Ok(next)
    }

    pub fn sdi(&self, mean: bool, keys: Option<&[String]>) -> SdiResult<ArrayD<f64>> {
        structural_decoupling_index(&self.bundle.timeseries, mean, keys)
    }

    pub fn gsdi(&self, mean: bool, keys: Option<&[String]>) -> SdiResult<RatioMap<ArrayD<f64>>> {
        generalised_decoupling_index(&self.bundle.timeseries, mean, keys)
    }

    pub fn fc_split(&self, mean: bool) -> SdiResult<BandMap<ArrayD<f64>>> {
        info!("Compute FC of split timeseries.");
        functional_connectivity_split(&self.bundle.timeseries, mean)
    }

    /// Generate `n_surrogates` null timeseries of `kind`.
    pub fn surrogates(self, kind: SurrogateKind, n_surrogates: usize, seed: u64) -> SdiResult<SurrogateGraph> {
        info!("Creating {n_surrogates} {kind} surrogates (seed {seed})");
        let graph = &self.spectral.graph;
        let ensemble = surrogates_of_kind(
            kind,
            &graph.timeseries.view(),
            &self.spectral.eigen.eigenvectors.view(),
            &self.spectral.null_laplacian.view(),
            n_surrogates,
            seed,
        )?;
        Ok(SurrogateGraph {
            split: self,
            kind,
            ensemble,
        })
    }
}

// ---------------------------------------------------------------------
// Stage 3: surrogates and significance
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SurrogateGraph {
    split: SplitGraph,
    kind: SurrogateKind,
    ensemble: ArrayD<f64>,
}

impl SurrogateGraph {
    pub fn split(&self) -> &SplitGraph {
        &self.split
    }

    pub fn kind(&self) -> SurrogateKind {
        self.kind
    }

    /// `timeseries.shape + [n_surrogates]`.
    pub fn ensemble(&self) -> &ArrayD<f64> {
        &self.ensemble
    }

    pub fn n_surrogates(&self) -> usize {
        self.ensemble.shape().last().copied().unwrap_or(0)
    }

    /// Split the surrogates with the empirical cutoffs and band keys.
    pub fn surrogate_split(&self) -> SdiResult<SplitBundle> {
        graph_filter(
            &self.ensemble.view(),
            &self.split.spectral.eigen.eigenvectors.view(),
            &self.split.cutoffs,
            &self.split.split_keys(),
        )
    }

    /// Test the per-subject SDI against the surrogate SDI.
    pub fn test_sdi(&self, opts: &SignificanceOptions) -> SdiResult<SignificanceOutput> {
        let surr_split = self.surrogate_split()?;
        let surr_sdi = structural_decoupling_index(&surr_split.timeseries, false, None)?;
        let sdi = self.split.sdi(false, None)?;
        test_significance(&surr_sdi.view(), Some(&sdi.view()), opts)
    }

    /// Test every generalised ratio against its surrogate distribution.
    pub fn test_gsdi(&self, opts: &SignificanceOptions) -> SdiResult<RatioMap<SignificanceOutput>> {
        let surr_split = self.surrogate_split()?;
        let surr_gsdi = generalised_decoupling_index(&surr_split.timeseries, false, None)?;
        let gsdi = self.split.gsdi(false, None)?;
        gsdi.try_map_values(|key, empirical| {
            let surr = surr_gsdi.get(key).ok_or_else(|| SdiError::UnknownBand {
                requested: vec![key.to_string()],
                available: surr_gsdi.labels(),
            })?;
            test_significance(&surr.view(), Some(&empirical.view()), opts)
        })
    }
}
