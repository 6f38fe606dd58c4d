// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — PyO3 FFI Bindings
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
// Note: #[deny(unsafe_code)] not applied, PyO3 proc macros generate
// unsafe blocks internally. All hand-written code in this crate is safe.
//! Python-callable wrappers around the SDI Kernel.
//!
//! Arrays cross the boundary as nested lists (1 to 3 levels deep, or 4
//! for surrogate ensembles); band maps cross as dicts in band order.
//! Every `SdiError` surfaces as `ValueError` with the error's message.
//!
//! Install: `pip install -e crates/sdi-ffi` (requires maturin).
//!
//! Usage from Python:
//! ```python
//! from sdi_kernel import ScGraph, decompose, graph_filter, sdi
//!
//! graph = ScGraph(sc, timeseries, '{"n_surrogates": 100}')
//! report = graph.run()
//! ```

use ndarray::{Array1, Array2, ArrayD, ArrayViewD, Ix2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use pyo3::BoundObject;

use sdi_graph::{run_analysis, AnalysisReport};
use sdi_spectral::{from_nested, DegreeInput, SplitBundle};
use sdi_surrogates::{SignificanceOptions, SignificanceOutput};
use sdi_types::{
    AnalysisConfig, BandKey, BandMap, NegativeHandling, Normalisation, OrderedMap, SdiError, SelfLoops,
    SurrogateKind, TestMethod,
};

// ─── Conversions ────────────────────────────────────────────────────

fn to_py_err(e: SdiError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn parse<T: std::str::FromStr<Err = SdiError>>(s: &str) -> PyResult<T> {
    s.parse::<T>().map_err(to_py_err)
}

/// Nested Python list of floats, outermost axis first.
#[derive(FromPyObject)]
enum Nested {
    Four(Vec<Vec<Vec<Vec<f64>>>>),
    Three(Vec<Vec<Vec<f64>>>),
    Two(Vec<Vec<f64>>),
    One(Vec<f64>),
}

impl Nested {
    fn into_array(self) -> PyResult<ArrayD<f64>> {
        match self {
            Nested::Four(v) => from_nested(v),
            Nested::Three(v) => from_nested(v),
            Nested::Two(v) => from_nested(v),
            Nested::One(v) => from_nested(v),
        }
        .map_err(to_py_err)
    }

    fn into_matrix(self) -> PyResult<Array2<f64>> {
        let a = self.into_array()?;
        let ndim = a.ndim();
        a.into_dimensionality::<Ix2>()
            .map_err(|_| PyValueError::new_err(format!("expected a 2D matrix, got {ndim} dimensions")))
    }
}

/// Nested list (or scalar for 0-d arrays) from an array view.
fn array_to_py<'py, T>(py: Python<'py>, a: &ArrayViewD<'_, T>) -> PyResult<PyObject>
where
    T: Clone + IntoPyObject<'py>,
    PyErr: From<T::Error>,
{
    match a.ndim() {
        0 => {
            let v = a
                .iter()
                .next()
                .cloned()
                .ok_or_else(|| PyValueError::new_err("empty 0-d array"))?;
            Ok(v.into_pyobject(py)?.into_any().unbind())
        }
        1 => {
            let v: Vec<T> = a.iter().cloned().collect();
            Ok(v.into_pyobject(py)?.unbind())
        }
        _ => {
            let rows = a
                .outer_iter()
                .map(|sub| array_to_py(py, &sub))
                .collect::<PyResult<Vec<PyObject>>>()?;
            Ok(rows.into_pyobject(py)?.unbind())
        }
    }
}

fn f64_to_py(py: Python<'_>, a: &ArrayD<f64>) -> PyResult<PyObject> {
    array_to_py(py, &a.view())
}

fn map_to_py<K: PartialEq + std::fmt::Display>(py: Python<'_>, map: &OrderedMap<K, ArrayD<f64>>) -> PyResult<PyObject> {
    let dict = PyDict::new(py);
    for (k, v) in map.iter() {
        dict.set_item(k.to_string(), f64_to_py(py, v)?)?;
    }
    Ok(dict.into())
}

fn bands_from_py(bands: &Bound<'_, PyDict>) -> PyResult<BandMap<ArrayD<f64>>> {
    let mut out = BandMap::new();
    for (k, v) in bands.iter() {
        let key: String = k.extract()?;
        let arr = v.extract::<Nested>()?.into_array()?;
        out.insert(BandKey::named(key), arr);
    }
    Ok(out)
}

fn significance_to_py(py: Python<'_>, out: &SignificanceOutput) -> PyResult<PyObject> {
    match out {
        SignificanceOutput::Mask(m) => array_to_py(py, &m.view()),
        SignificanceOutput::MaskFraction(a) | SignificanceOutput::Masked(a) => f64_to_py(py, a),
    }
}

fn split_to_py(py: Python<'_>, split: &SplitBundle) -> PyResult<(PyObject, PyObject)> {
    let evec = PyDict::new(py);
    for (k, v) in split.eigenvectors.iter() {
        evec.set_item(k.to_string(), f64_to_py(py, &v.clone().into_dyn())?)?;
    }
    Ok((evec.into(), map_to_py(py, &split.timeseries)?))
}

// ─── Laplacian ──────────────────────────────────────────────────────

/// Laplacian and degree of a connectivity matrix.
#[pyfunction]
#[pyo3(name = "compute_laplacian", signature = (mtx, negative = "absolute", self_loops = "remove", self_loop_weights = None))]
fn py_compute_laplacian(
    py: Python<'_>,
    mtx: Nested,
    negative: &str,
    self_loops: &str,
    self_loop_weights: Option<Vec<f64>>,
) -> PyResult<(PyObject, PyObject)> {
    let mtx = mtx.into_matrix()?;
    let negative: NegativeHandling = parse(negative)?;
    let loops = match self_loop_weights {
        Some(w) => SelfLoops::Custom(w),
        None => parse(self_loops)?,
    };
    let (lapl, degree) = sdi_spectral::compute_laplacian(&mtx.view(), negative, &loops).map_err(to_py_err)?;
    Ok((f64_to_py(py, &lapl.into_dyn())?, f64_to_py(py, &degree.into_dyn())?))
}

/// Normalised Laplacian; `degree` is a vector or a diagonal matrix.
#[pyfunction]
#[pyo3(name = "normalise", signature = (laplacian, degree, mode = "symmetric", fix_zeros = true))]
fn py_normalise(py: Python<'_>, laplacian: Nested, degree: Nested, mode: &str, fix_zeros: bool) -> PyResult<PyObject> {
    let lapl = laplacian.into_matrix()?;
    let degree = degree.into_array()?;
    let mode: Normalisation = parse(mode)?;
    let out = match degree.ndim() {
        1 => {
            let d = degree.into_dimensionality::<ndarray::Ix1>().map_err(|e| PyValueError::new_err(e.to_string()))?;
            sdi_spectral::normalise(&lapl.view(), DegreeInput::Vector(d.view()), mode, fix_zeros)
        }
        _ => {
            let d = degree.into_dimensionality::<Ix2>().map_err(|e| PyValueError::new_err(e.to_string()))?;
            sdi_spectral::normalise(&lapl.view(), DegreeInput::Diagonal(d.view()), mode, fix_zeros)
        }
    }
    .map_err(to_py_err)?;
    f64_to_py(py, &out.into_dyn())
}

/// `I - D^-1/2 A D^-1/2`.
#[pyfunction]
#[pyo3(name = "symmetric_normalised_laplacian", signature = (mtx, degree = None, fix_zeros = true))]
fn py_symmetric_normalised_laplacian(
    py: Python<'_>,
    mtx: Nested,
    degree: Option<Vec<f64>>,
    fix_zeros: bool,
) -> PyResult<PyObject> {
    let mtx = mtx.into_matrix()?;
    let degree = degree.map(Array1::from);
    let out = sdi_spectral::symmetric_normalised_laplacian(
        &mtx.view(),
        degree.as_ref().map(|d| DegreeInput::Vector(d.view())),
        fix_zeros,
    )
    .map_err(to_py_err)?;
    f64_to_py(py, &out.into_dyn())
}

/// `(eigenvalues, eigenvectors)` sorted ascending.
#[pyfunction]
#[pyo3(name = "decompose")]
fn py_decompose(py: Python<'_>, mtx: Nested) -> PyResult<(PyObject, PyObject)> {
    let mtx = mtx.into_matrix()?;
    let eig = sdi_spectral::decompose(&mtx.view()).map_err(to_py_err)?;
    Ok((
        f64_to_py(py, &eig.eigenvalues.into_dyn())?,
        f64_to_py(py, &eig.eigenvectors.into_dyn())?,
    ))
}

/// `V Λ Vᵀ` from a vector or diagonal matrix of eigenvalues.
#[pyfunction]
#[pyo3(name = "recompose")]
fn py_recompose(py: Python<'_>, eigenvalues: Nested, eigenvectors: Nested) -> PyResult<PyObject> {
    let vals = eigenvalues.into_array()?;
    let vecs = eigenvectors.into_array()?;
    let out = sdi_spectral::recompose(&vals.view(), &vecs.view()).map_err(to_py_err)?;
    f64_to_py(py, &out.into_dyn())
}

// ─── Projection / filter ────────────────────────────────────────────

#[pyfunction]
#[pyo3(name = "graph_fourier_transform", signature = (timeseries, eigenvectors, energy = false, mean = false))]
fn py_graph_fourier_transform(
    py: Python<'_>,
    timeseries: Nested,
    eigenvectors: Nested,
    energy: bool,
    mean: bool,
) -> PyResult<PyObject> {
    let ts = timeseries.into_array()?;
    let v = eigenvectors.into_matrix()?;
    let out = sdi_spectral::graph_fourier_transform(&ts.view(), &v.view(), energy, mean).map_err(to_py_err)?;
    f64_to_py(py, &out)
}

#[pyfunction]
#[pyo3(name = "median_cutoff_frequency_index")]
fn py_median_cutoff_frequency_index(energy: Nested) -> PyResult<usize> {
    let energy = energy.into_array()?;
    sdi_spectral::median_cutoff_frequency_index(&energy.view()).map_err(to_py_err)
}

#[pyfunction]
#[pyo3(name = "normalise_timeseries")]
fn py_normalise_timeseries(py: Python<'_>, timeseries: Nested) -> PyResult<PyObject> {
    let ts = timeseries.into_array()?;
    let out = sdi_spectral::normalise_timeseries(&ts.view()).map_err(to_py_err)?;
    f64_to_py(py, &out)
}

/// `(eigenvector_split, timeseries_split)` as dicts in band order.
#[pyfunction]
#[pyo3(name = "graph_filter", signature = (timeseries, eigenvectors, cutoffs, keys = vec!["low".to_string(), "high".to_string()]))]
fn py_graph_filter(
    py: Python<'_>,
    timeseries: Nested,
    eigenvectors: Nested,
    cutoffs: Vec<usize>,
    keys: Vec<String>,
) -> PyResult<(PyObject, PyObject)> {
    let ts = timeseries.into_array()?;
    let v = eigenvectors.into_matrix()?;
    let split = sdi_spectral::graph_filter(&ts.view(), &v.view(), &cutoffs, &keys).map_err(to_py_err)?;
    split_to_py(py, &split)
}

// ─── Metrics ────────────────────────────────────────────────────────

#[pyfunction]
#[pyo3(name = "zero_crossings")]
fn py_zero_crossings(eigenvectors: Nested) -> PyResult<Vec<usize>> {
    let v = eigenvectors.into_matrix()?;
    Ok(sdi_metrics::zero_crossings(&v.view()).to_vec())
}

#[pyfunction]
#[pyo3(name = "node_strength", signature = (mtx, mean = false))]
fn py_node_strength(py: Python<'_>, mtx: Nested, mean: bool) -> PyResult<PyObject> {
    let mtx = mtx.into_array()?;
    let out = sdi_metrics::node_strength(&mtx.view(), mean).map_err(to_py_err)?;
    f64_to_py(py, &out)
}

#[pyfunction]
#[pyo3(name = "sdi", signature = (ts_split, mean = false, keys = None))]
fn py_sdi(py: Python<'_>, ts_split: &Bound<'_, PyDict>, mean: bool, keys: Option<Vec<String>>) -> PyResult<PyObject> {
    let bands = bands_from_py(ts_split)?;
    let out = sdi_metrics::structural_decoupling_index(&bands, mean, keys.as_deref()).map_err(to_py_err)?;
    f64_to_py(py, &out)
}

#[pyfunction]
#[pyo3(name = "gsdi", signature = (ts_split, mean = false, keys = None))]
fn py_gsdi(py: Python<'_>, ts_split: &Bound<'_, PyDict>, mean: bool, keys: Option<Vec<String>>) -> PyResult<PyObject> {
    let bands = bands_from_py(ts_split)?;
    let out = sdi_metrics::generalised_decoupling_index(&bands, mean, keys.as_deref()).map_err(to_py_err)?;
    map_to_py(py, &out)
}

#[pyfunction]
#[pyo3(name = "functional_connectivity", signature = (timeseries, mean = false))]
fn py_functional_connectivity(py: Python<'_>, timeseries: Nested, mean: bool) -> PyResult<PyObject> {
    let ts = timeseries.into_array()?;
    let out = sdi_metrics::functional_connectivity(&ts.view(), mean).map_err(to_py_err)?;
    f64_to_py(py, &out)
}

/// Per-band functional connectivity of a split dict.
#[pyfunction]
#[pyo3(name = "functional_connectivity_split", signature = (ts_split, mean = false))]
fn py_functional_connectivity_split(py: Python<'_>, ts_split: &Bound<'_, PyDict>, mean: bool) -> PyResult<PyObject> {
    let bands = bands_from_py(ts_split)?;
    let out = sdi_metrics::functional_connectivity_split(&bands, mean).map_err(to_py_err)?;
    map_to_py(py, &out)
}

// ─── Surrogates ─────────────────────────────────────────────────────

#[pyfunction]
#[pyo3(name = "random_sign", signature = (eigenvectors, n_surr = 1000, seed = 42, stack = false))]
fn py_random_sign(py: Python<'_>, eigenvectors: Nested, n_surr: usize, seed: u64, stack: bool) -> PyResult<PyObject> {
    let v = eigenvectors.into_matrix()?;
    let out = sdi_surrogates::random_sign(&v.view(), n_surr, seed, stack).map_err(to_py_err)?;
    f64_to_py(py, &out.into_dyn())
}

#[pyfunction]
#[pyo3(name = "sc_informed", signature = (timeseries, eigenvectors, n_surr = 1000, seed = 42, stack = false))]
fn py_sc_informed(
    py: Python<'_>,
    timeseries: Nested,
    eigenvectors: Nested,
    n_surr: usize,
    seed: u64,
    stack: bool,
) -> PyResult<PyObject> {
    let ts = timeseries.into_array()?;
    let v = eigenvectors.into_matrix()?;
    let out = sdi_surrogates::sc_informed(&ts.view(), &v.view(), n_surr, seed, stack).map_err(to_py_err)?;
    f64_to_py(py, &out)
}

/// `laplacian` must be symmetric normalised (`I - D^-1/2 A D^-1/2`).
#[pyfunction]
#[pyo3(name = "sc_uninformed", signature = (timeseries, laplacian, n_surr = 1000, seed = 42, stack = false))]
fn py_sc_uninformed(
    py: Python<'_>,
    timeseries: Nested,
    laplacian: Nested,
    n_surr: usize,
    seed: u64,
    stack: bool,
) -> PyResult<PyObject> {
    let ts = timeseries.into_array()?;
    let lapl = laplacian.into_matrix()?;
    let out = sdi_surrogates::sc_uninformed(&ts.view(), &lapl.view(), n_surr, seed, stack).map_err(to_py_err)?;
    f64_to_py(py, &out)
}

#[pyfunction]
#[pyo3(name = "test_significance", signature = (
    surr,
    data = None,
    method = "Bernoulli",
    p = 0.05,
    p_bernoulli = None,
    return_masked = false,
    mean = false,
    fill_value = 0.0,
))]
#[allow(clippy::too_many_arguments)]
fn py_test_significance(
    py: Python<'_>,
    surr: Nested,
    data: Option<Nested>,
    method: &str,
    p: f64,
    p_bernoulli: Option<f64>,
    return_masked: bool,
    mean: bool,
    fill_value: f64,
) -> PyResult<PyObject> {
    let surr = surr.into_array()?;
    let data = data.map(Nested::into_array).transpose()?;
    let opts = SignificanceOptions {
        method: parse::<TestMethod>(method)?,
        p,
        p_bernoulli,
        return_masked,
        mean,
        fill_value,
    };
    let data_view = data.as_ref().map(|d| d.view());
    let out = sdi_surrogates::test_significance(&surr.view(), data_view.as_ref(), &opts).map_err(to_py_err)?;
    significance_to_py(py, &out)
}

// ─── ScGraph ────────────────────────────────────────────────────────

/// Full analysis of one connectivity matrix and timeseries.
#[pyclass(name = "ScGraph")]
struct PyScGraph {
    mtx: Array2<f64>,
    timeseries: ArrayD<f64>,
    config: AnalysisConfig,
}

fn report_to_py(py: Python<'_>, r: &AnalysisReport) -> PyResult<PyObject> {
    let dict = PyDict::new(py);
    dict.set_item("n_nodes", r.n_nodes)?;
    dict.set_item("n_timepoints", r.n_timepoints)?;
    dict.set_item("n_subjects", r.n_subjects)?;
    dict.set_item("laplacian", f64_to_py(py, &r.laplacian.clone().into_dyn())?)?;
    dict.set_item("eigenvalues", r.eigenvalues.to_vec())?;
    dict.set_item("eigenvectors", f64_to_py(py, &r.eigenvectors.clone().into_dyn())?)?;
    dict.set_item("zero_crossings", r.zero_crossings.to_vec())?;
    dict.set_item("node_strength", f64_to_py(py, &r.node_strength)?)?;
    dict.set_item("cutoffs", r.cutoffs.clone())?;
    dict.set_item("keys", r.keys())?;
    let (evec_split, ts_split) = split_to_py(py, &r.split)?;
    dict.set_item("evec_split", evec_split)?;
    dict.set_item("ts_split", ts_split)?;
    if let Some(sdi) = &r.sdi {
        dict.set_item("sdi", f64_to_py(py, sdi)?)?;
    }
    if let Some(gsdi) = &r.gsdi {
        dict.set_item("gsdi", map_to_py(py, gsdi)?)?;
    }
    if let Some(fc) = &r.fc {
        dict.set_item("fc", f64_to_py(py, fc)?)?;
    }
    if let Some(fc_split) = &r.fc_split {
        dict.set_item("fc_split", map_to_py(py, fc_split)?)?;
    }
    if let Some(sig) = &r.sdi_significance {
        dict.set_item("sdi_significance", significance_to_py(py, sig)?)?;
    }
    if let Some(sig) = &r.gsdi_significance {
        let inner = PyDict::new(py);
        for (k, v) in sig.iter() {
            inner.set_item(k.to_string(), significance_to_py(py, v)?)?;
        }
        dict.set_item("gsdi_significance", inner)?;
    }
    Ok(dict.into())
}

#[pymethods]
impl PyScGraph {
    /// `config_json` is a (partial) `AnalysisConfig` JSON document.
    #[new]
    #[pyo3(signature = (mtx, timeseries, config_json = None))]
    fn new(mtx: Nested, timeseries: Nested, config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => AnalysisConfig::from_json(json).map_err(to_py_err)?,
            None => AnalysisConfig::default(),
        };
        config.validate().map_err(to_py_err)?;
        let mtx = mtx.into_matrix()?;
        let timeseries = timeseries.into_array()?;
        // Validate shapes up front.
        sdi_graph::ScGraph::from_views(&mtx.view(), &timeseries.view()).map_err(to_py_err)?;
        Ok(Self {
            mtx,
            timeseries,
            config,
        })
    }

    #[getter]
    fn nnodes(&self) -> usize {
        self.mtx.nrows()
    }

    #[getter]
    fn ntimepoints(&self) -> usize {
        self.timeseries.shape()[1]
    }

    #[getter]
    fn config_json(&self) -> PyResult<String> {
        self.config.to_json().map_err(to_py_err)
    }

    /// Override the surrogate settings.
    #[pyo3(signature = (kind = "informed", n_surr = 1000, seed = 42))]
    fn set_surrogates(&mut self, kind: &str, n_surr: usize, seed: u64) -> PyResult<()> {
        self.config.surrogate_kind = parse::<SurrogateKind>(kind)?;
        self.config.n_surrogates = n_surr;
        self.config.seed = seed;
        Ok(())
    }

    /// Run the pipeline. Returns a dict of every artifact.
    fn run(&self, py: Python<'_>) -> PyResult<PyObject> {
        let report = run_analysis(&self.mtx.view(), &self.timeseries.view(), &self.config).map_err(to_py_err)?;
        report_to_py(py, &report)
    }

    /// Run the pipeline and return only the JSON summary.
    fn summary_json(&self) -> PyResult<String> {
        let report = run_analysis(&self.mtx.view(), &self.timeseries.view(), &self.config).map_err(to_py_err)?;
        report.summary().to_json().map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        format!(
            "ScGraph(nodes={}, shape={:?}, surrogates={} {})",
            self.mtx.nrows(),
            self.timeseries.shape(),
            self.config.n_surrogates,
            self.config.surrogate_kind
        )
    }
}

// ─── Module Registration ────────────────────────────────────────────

/// SDI Kernel: graph signal processing and structural decoupling.
///
/// - Laplacian: `compute_laplacian`, `normalise`, `symmetric_normalised_laplacian`,
///   `decompose`, `recompose`
/// - Projection: `graph_fourier_transform`, `median_cutoff_frequency_index`,
///   `graph_filter`, `normalise_timeseries`
/// - Metrics: `zero_crossings`, `node_strength`, `sdi`, `gsdi`,
///   `functional_connectivity`, `functional_connectivity_split`
/// - Surrogates: `random_sign`, `sc_informed`, `sc_uninformed`, `test_significance`
/// - `ScGraph`: config-driven full analysis
#[pymodule]
fn sdi_kernel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Laplacian
    m.add_function(wrap_pyfunction!(py_compute_laplacian, m)?)?;
    m.add_function(wrap_pyfunction!(py_normalise, m)?)?;
    m.add_function(wrap_pyfunction!(py_symmetric_normalised_laplacian, m)?)?;
    m.add_function(wrap_pyfunction!(py_decompose, m)?)?;
    m.add_function(wrap_pyfunction!(py_recompose, m)?)?;
    // Projection
    m.add_function(wrap_pyfunction!(py_graph_fourier_transform, m)?)?;
    m.add_function(wrap_pyfunction!(py_median_cutoff_frequency_index, m)?)?;
    m.add_function(wrap_pyfunction!(py_normalise_timeseries, m)?)?;
    m.add_function(wrap_pyfunction!(py_graph_filter, m)?)?;
    // Metrics
    m.add_function(wrap_pyfunction!(py_zero_crossings, m)?)?;
    m.add_function(wrap_pyfunction!(py_node_strength, m)?)?;
    m.add_function(wrap_pyfunction!(py_sdi, m)?)?;
    m.add_function(wrap_pyfunction!(py_gsdi, m)?)?;
    m.add_function(wrap_pyfunction!(py_functional_connectivity, m)?)?;
    m.add_function(wrap_pyfunction!(py_functional_connectivity_split, m)?)?;
    // Surrogates
    m.add_function(wrap_pyfunction!(py_random_sign, m)?)?;
    m.add_function(wrap_pyfunction!(py_sc_informed, m)?)?;
    m.add_function(wrap_pyfunction!(py_sc_uninformed, m)?)?;
    m.add_function(wrap_pyfunction!(py_test_significance, m)?)?;
    // Full analysis
    m.add_class::<PyScGraph>()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_to_four_dimensions() {
        let a = Nested::One(vec![1.0, 2.0]).into_array().unwrap();
        assert_eq!(a.shape(), &[2]);
        let a = Nested::Two(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]])
            .into_array()
            .unwrap();
        assert_eq!(a.shape(), &[3, 2]);
        assert_eq!(a[[2, 0]], 5.0);
        let a = Nested::Three(vec![vec![vec![1.0, 2.0, 3.0]]; 2]).into_array().unwrap();
        assert_eq!(a.shape(), &[2, 1, 3]);
        let a = Nested::Four(vec![vec![vec![vec![0.5; 4]; 3]; 2]; 2]).into_array().unwrap();
        assert_eq!(a.shape(), &[2, 2, 3, 4]);
    }

    #[test]
    fn test_ragged_lists_rejected() {
        assert!(Nested::Two(vec![vec![1.0, 2.0], vec![3.0], vec![4.0, 5.0, 6.0]])
            .into_array()
            .is_err());
        assert!(Nested::Three(vec![vec![vec![1.0, 2.0], vec![3.0, 4.0]], vec![vec![5.0, 6.0], vec![7.0]]])
            .into_array()
            .is_err());
        assert!(Nested::Four(vec![vec![vec![vec![1.0, 2.0]]], vec![vec![vec![3.0]]]])
            .into_array()
            .is_err());
    }

    #[test]
    fn test_matrix_requires_two_dimensions() {
        assert!(Nested::One(vec![1.0, 2.0]).into_matrix().is_err());
        let m = Nested::Two(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).into_matrix().unwrap();
        assert_eq!(m, Array2::<f64>::eye(2));
    }
}
