//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - run configuration (`FitConfig`, `ModelSpec`)
//! - normalized galaxy observation points (`GalaxyPoint`)
//! - calibration outputs (`FitResult`, `CalibModel`, etc.)
//! - the saved halo-history schema (`HistoryFile`)

pub mod types;

pub use types::*;
