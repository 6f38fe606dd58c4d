// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Categorical Parameters
// ─────────────────────────────────────────────────────────────────────
//! Categorical knobs of the pipeline. Every enum parses from the
//! textual names callers use (case-insensitive, `_`/`-` treated as
//! spaces) and fails with the received value plus the supported set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SdiError;

fn canonical(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .replace(|c: char| c == '_' || c == '-', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// How negative connectivity weights are resolved before degree computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeHandling {
    /// Take the absolute value.
    #[default]
    Absolute,
    /// Zero out negative entries.
    Remove,
    /// Shift and scale: `(m - min) / max`.
    Rescale,
}

impl FromStr for NegativeHandling {
    type Err = SdiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical(s).as_str() {
            "absolute" | "abs" => Ok(Self::Absolute),
            "remove" | "zero" => Ok(Self::Remove),
            "rescale" => Ok(Self::Rescale),
            _ => Err(SdiError::InvalidParameter {
                name: "negative value handling",
                value: s.to_string(),
                expected: "absolute, remove, rescale",
            }),
        }
    }
}

/// Diagonal handling of the adjacency matrix.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfLoops {
    /// Zero the diagonal (pure off-diagonal adjacency).
    #[default]
    Remove,
    /// Keep the matrix's own diagonal.
    Keep,
    /// Set the diagonal to each row's off-diagonal degree.
    Degree,
    /// Explicit self-loop weight per node.
    Custom(Vec<f64>),
}

impl FromStr for SelfLoops {
    type Err = SdiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical(s).as_str() {
            "false" | "remove" | "none" | "no" => Ok(Self::Remove),
            "true" | "keep" | "yes" => Ok(Self::Keep),
            "degree" => Ok(Self::Degree),
            _ => Err(SdiError::InvalidParameter {
                name: "self loops",
                value: s.to_string(),
                expected: "remove (false), keep (true), degree",
            }),
        }
    }
}

/// Laplacian normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalisation {
    /// `D^-1/2 L D^-1/2`
    #[default]
    Symmetric,
    /// `D^-1 L`
    RandomWalkInflow,
    /// `L D^-1`
    RandomWalkOutflow,
}

impl FromStr for Normalisation {
    type Err = SdiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical(s).as_str() {
            "symmetric" | "symm" => Ok(Self::Symmetric),
            "random walk" | "randomwalk" | "rw" | "rwi" | "random walk inflow" => {
                Ok(Self::RandomWalkInflow)
            }
            "rwo" | "random walk outflow" => Ok(Self::RandomWalkOutflow),
            _ => Err(SdiError::InvalidParameter {
                name: "normalisation type",
                value: s.to_string(),
                expected: "symmetric, random walk inflow (rwi), random walk outflow (rwo)",
            }),
        }
    }
}

/// Null model used to build surrogates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurrogateKind {
    /// Sign-flipped eigenvectors of the empirical Laplacian.
    #[default]
    Informed,
    /// Sign-flipped eigenvectors of a configuration-model Laplacian.
    Uninformed,
}

impl FromStr for SurrogateKind {
    type Err = SdiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical(s).as_str() {
            "informed" => Ok(Self::Informed),
            "uninformed" => Ok(Self::Uninformed),
            _ => Err(SdiError::InvalidParameter {
                name: "surrogate type",
                value: s.to_string(),
                expected: "informed, uninformed",
            }),
        }
    }
}

/// Significance testing method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMethod {
    /// Group-level binomial test on top of the subject-level percentile test.
    #[default]
    Bernoulli,
    /// Two-tailed percentile test.
    Frequentist,
}

impl FromStr for TestMethod {
    type Err = SdiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match canonical(s).as_str() {
            "bernoulli" => Ok(Self::Bernoulli),
            "frequentist" => Ok(Self::Frequentist),
            _ => Err(SdiError::InvalidParameter {
                name: "testing method",
                value: s.to_string(),
                expected: "Bernoulli, frequentist",
            }),
        }
    }
}

/// How the spectral split point is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitSelection {
    /// Half-energy index of the graph power spectrum.
    #[default]
    Median,
    /// Explicit, strictly increasing cutoff indices.
    Fixed(Vec<usize>),
}

impl FromStr for SplitSelection {
    type Err = SdiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let c = canonical(s);
        if c == "median" {
            return Ok(Self::Median);
        }
        let parsed: Result<Vec<usize>, _> = c
            .split(|c: char| c == ',' || c == ' ')
            .filter(|t| !t.is_empty())
            .map(str::parse::<usize>)
            .collect();
        match parsed {
            Ok(idx) if !idx.is_empty() => Ok(Self::Fixed(idx)),
            _ => Err(SdiError::InvalidParameter {
                name: "frequency split index",
                value: s.to_string(),
                expected: "median, or a list of integers",
            }),
        }
    }
}

impl fmt::Display for TestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bernoulli => write!(f, "Bernoulli"),
            Self::Frequentist => write!(f, "frequentist"),
        }
    }
}

impl fmt::Display for SurrogateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Informed => write!(f, "informed"),
            Self::Uninformed => write!(f, "uninformed"),
        }
    }
}
