//! Shape-candidate grid generation.
//!
//! The efficiency curve is calibrated by a deterministic grid search over the
//! nonlinear shape pair (`logm_crit_0`, `slope_lo_0`).
//!
//! Why grid search?
//! - It avoids local minima issues common in nonlinear optimization.
//! - It is deterministic given the same inputs/flags.
//! - The normalization coefficients are linear given a fixed shape, so each
//!   candidate costs only a tiny least-squares solve on precomputed tables.

use crate::error::AppError;

/// One curve-shape candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeCandidate {
    /// Characteristic halo mass (log10 Msun) at z = 0.
    pub logm_crit_0: f64,
    /// Low-mass power-law slope at z = 0.
    pub slope_lo_0: f64,
}

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
pub fn lin_grid(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && max > min) {
        return Err(AppError::new(
            2,
            format!("Invalid grid range: min={min}, max={max} (must be finite and max>min)."),
        ));
    }
    if steps < 2 {
        return Err(AppError::new(2, "Grid steps must be >= 2."));
    }

    let step = (max - min) / (steps as f64 - 1.0);
    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push(min + step * i as f64);
    }
    Ok(out)
}

/// Cartesian shape grid over characteristic mass × low-mass slope.
pub fn shape_grid(
    logm_crit: (f64, f64, usize),
    slope_lo: (f64, f64, usize),
) -> Result<Vec<ShapeCandidate>, AppError> {
    let crits = lin_grid(logm_crit.0, logm_crit.1, logm_crit.2)?;
    let slopes = lin_grid(slope_lo.0, slope_lo.1, slope_lo.2)?;

    let mut out = Vec::with_capacity(crits.len() * slopes.len());
    for &logm_crit_0 in &crits {
        for &slope_lo_0 in &slopes {
            out.push(ShapeCandidate {
                logm_crit_0,
                slope_lo_0,
            });
        }
    }
    Ok(out)
}
