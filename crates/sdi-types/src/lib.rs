// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! SDI Kernel, the graph signal processing pipeline behind the
//! structural decoupling index.

pub mod band;
pub mod config;
pub mod error;
pub mod params;

pub use band::{BandKey, BandMap, OrderedMap, RatioKey, RatioMap};
pub use config::AnalysisConfig;
pub use error::{SdiError, SdiResult};
pub use params::{
    NegativeHandling, Normalisation, SelfLoops, SplitSelection, SurrogateKind, TestMethod,
};
