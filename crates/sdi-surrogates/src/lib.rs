// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Surrogate Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Null distributions for the structural decoupling index.
//!
//! Architecture:
//!   - sign: per-surrogate ChaCha streams, sign-flipped eigenbases
//!   - surrogates: informed / configuration-model (uninformed) surrogate timeseries
//!   - significance: frequentist and Bernoulli tests, masks and masked data

pub mod sign;
pub mod significance;
pub mod surrogates;

pub use sign::random_sign;
pub use significance::{binomial_threshold, test_significance, SignificanceOptions, SignificanceOutput};
pub use surrogates::{
    configuration_model_laplacian, create_surrogates, sc_informed, sc_uninformed, surrogates_of_kind,
};
