// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all SDI Kernel failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SdiError {
    /// Array shape or dimensionality does not fit the operation.
    #[error("shape error: {0}")]
    Shape(String),

    /// Categorical parameter outside its supported set.
    #[error("invalid {name} \"{value}\": expected one of {expected}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    /// Cutoff index at (or past) the edge of the eigenvector matrix.
    #[error("index error: {0}")]
    InvalidIndex(String),

    /// Requested band keys are not all present in the band map.
    #[error("the provided keys {requested:?} do not match the available bands {available:?}")]
    UnknownBand {
        requested: Vec<String>,
        available: Vec<String>,
    },

    /// SDI needs exactly two bands.
    #[error("structural decoupling index requires exactly two bands, got {0}")]
    BandCount(usize),

    /// Probability threshold outside [0, 1].
    #[error("p values should always be between 0 and 1, got {0}")]
    Probability(f64),

    /// Eigensolver failed to converge.
    #[error("eigensolver did not converge: {0}")]
    Convergence(String),

    /// Non-symmetric input with complex eigenvalues.
    #[error("matrix has a complex spectrum ({0} complex eigenvalue pairs)")]
    ComplexSpectrum(usize),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

impl SdiError {
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }
}

pub type SdiResult<T> = Result<T, SdiError>;
