//! Quenching times and post-quenching suppression.
//!
//! After its quenching time a galaxy's star formation shuts down smoothly
//! rather than instantly: the suppression factor is a logistic step from 1
//! down to a configurable residual floor,
//!
//! ```text
//! suppression(t) = sigmoid(t, qtime, qfunc_k, 1, qfunc_floor)
//! ```
//!
//! so it is exactly bounded by (0, 1] and non-increasing in `t - qtime`.
//! The default quenching time is a smooth function of halo mass (massive
//! halos quench earlier); the lognormal scatter term only feeds the mock
//! survey sampler and never enters the deterministic kernel.

use crate::error::AppError;
use crate::math::sigmoid;
use crate::params::ParamSet;

/// Default parameters of the quenching model.
#[derive(Debug, Clone, PartialEq)]
pub struct QuenchingParams {
    /// Halo mass (log10 Msun) at which the median quenching time transitions.
    pub qt_logmc: f64,
    /// Sharpness of the quenching-time transition in `logm0`.
    pub qt_k: f64,
    /// Median quenching time (Gyr) for the lowest-mass halos.
    pub qt_dwarfs: f64,
    /// Median quenching time (Gyr) for the highest-mass halos.
    pub qt_clusters: f64,
    /// Steepness of the suppression step (1/Gyr).
    pub qfunc_k: f64,
    /// Residual suppression floor long after quenching.
    pub qfunc_floor: f64,
    /// Lognormal scatter (dex) of quenching times in the population.
    pub qt_scatter_dex: f64,
}

impl Default for QuenchingParams {
    fn default() -> Self {
        Self {
            qt_logmc: 12.25,
            qt_k: 0.9,
            qt_dwarfs: 14.8,
            qt_clusters: 6.0,
            qfunc_k: 3.5,
            qfunc_floor: 0.01,
            qt_scatter_dex: 0.15,
        }
    }
}

const QUENCHING_KEYS: &[&str] = &[
    "qt_logmc",
    "qt_k",
    "qt_dwarfs",
    "qt_clusters",
    "qfunc_k",
    "qfunc_floor",
    "qt_scatter_dex",
];

impl ParamSet for QuenchingParams {
    fn model_name(&self) -> &'static str {
        "quenching"
    }

    fn keys(&self) -> &'static [&'static str] {
        QUENCHING_KEYS
    }

    fn get(&self, key: &str) -> Option<f64> {
        match key {
            "qt_logmc" => Some(self.qt_logmc),
            "qt_k" => Some(self.qt_k),
            "qt_dwarfs" => Some(self.qt_dwarfs),
            "qt_clusters" => Some(self.qt_clusters),
            "qfunc_k" => Some(self.qfunc_k),
            "qfunc_floor" => Some(self.qfunc_floor),
            "qt_scatter_dex" => Some(self.qt_scatter_dex),
            _ => None,
        }
    }

    fn set(&mut self, key: &str, value: f64) -> bool {
        match key {
            "qt_logmc" => self.qt_logmc = value,
            "qt_k" => self.qt_k = value,
            "qt_dwarfs" => self.qt_dwarfs = value,
            "qt_clusters" => self.qt_clusters = value,
            "qfunc_k" => self.qfunc_k = value,
            "qfunc_floor" => self.qfunc_floor = value,
            "qt_scatter_dex" => self.qt_scatter_dex = value,
            _ => return false,
        }
        true
    }
}

impl QuenchingParams {
    pub fn validate(&self) -> Result<(), AppError> {
        for key in QUENCHING_KEYS {
            let v = self.get(key).unwrap_or(f64::NAN);
            if !v.is_finite() {
                return Err(AppError::new(2, format!("Non-finite quenching parameter '{key}'.")));
            }
        }
        if self.qfunc_k <= 0.0 {
            return Err(AppError::new(2, "qfunc_k must be > 0."));
        }
        if !(self.qfunc_floor > 0.0 && self.qfunc_floor <= 1.0) {
            return Err(AppError::new(2, "qfunc_floor must be in (0, 1]."));
        }
        if self.qt_scatter_dex < 0.0 {
            return Err(AppError::new(2, "qt_scatter_dex must be >= 0."));
        }
        Ok(())
    }
}

/// Population-median quenching time (Gyr) for a halo of mass `logm0`.
pub fn median_quenching_time(logm0: f64, params: &QuenchingParams) -> f64 {
    sigmoid(logm0, params.qt_logmc, params.qt_k, params.qt_dwarfs, params.qt_clusters)
}

/// Star-formation suppression factor at cosmic time `t` (Gyr).
///
/// Equals 1 well before `qtime`, approaches `qfunc_floor` well after, and
/// never exceeds 1.
pub fn quenching_suppression(t: f64, qtime: f64, params: &QuenchingParams) -> f64 {
    sigmoid(t, qtime, params.qfunc_k, 1.0, params.qfunc_floor)
}
