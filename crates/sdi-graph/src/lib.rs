// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Graph Analysis
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Structural decoupling analysis as one owned unit of state.
//!
//! Architecture:
//!   - container: ScGraph → SpectralGraph → SplitGraph → SurrogateGraph
//!   - runner: `AnalysisConfig`-driven pipeline, report and JSON summary

pub mod container;
pub mod runner;

pub use container::{LaplacianOptions, ScGraph, SpectralGraph, SplitGraph, SurrogateGraph};
pub use runner::{run_analysis, AnalysisReport, AnalysisSummary};
