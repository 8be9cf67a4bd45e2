//! Efficiency calibration against galaxy samples.
//!
//! Responsibilities:
//!
//! - generate the curve-shape candidate grid
//! - evaluate each candidate (parallel), solving the linear normalization
//!   coefficients per candidate
//! - select the best model kind using BIC + guardrails

pub mod fitter;
pub mod grid;
pub mod selection;

pub use fitter::*;
pub use grid::*;
pub use selection::*;
