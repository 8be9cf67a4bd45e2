//! In-situ stellar mass histories (SMH).
//!
//! The kernel in this module composes the MAH, efficiency, and quenching
//! models into present-day stellar masses.

pub mod kernel;

pub use kernel::*;
