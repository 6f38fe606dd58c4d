// ─────────────────────────────────────────────────────────────────────
// SDI Kernel — Metrics
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Metrics derived from spectral splits: structural decoupling index
//! (SDI), generalised SDI, functional connectivity, node strength and
//! eigenvector zero crossings.

pub mod connectivity;
pub mod decoupling;
pub mod graph;

pub use connectivity::{functional_connectivity, functional_connectivity_split, pearson};
pub use decoupling::{generalised_decoupling_index, structural_decoupling_index};
pub use graph::{node_strength, zero_crossings};
