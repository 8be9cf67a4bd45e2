//! Empirical galaxy–halo model implementations.
//!
//! Models are implemented as small, pure functions so that the kernel and the
//! calibration code can stay generic:
//!
//! - `mah`: sigmoid halo mass accretion histories
//! - `efficiency`: instantaneous baryon-conversion efficiency
//! - `quenching`: quenching times and post-quenching suppression

pub mod efficiency;
pub mod mah;
pub mod quenching;

pub use efficiency::*;
pub use mah::*;
pub use quenching::*;
