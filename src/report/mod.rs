//! Reporting utilities: residuals and rankings.

use crate::domain::{FitResult, GalaxyPoint, GalaxyResidual};
use crate::error::AppError;
use crate::fit::{FitOptions, predict_log_mstar};

pub mod format;

pub use format::*;

/// Over/under-massive rankings (top-N each side).
#[derive(Debug, Clone)]
pub struct Rankings {
    pub over: Vec<GalaxyResidual>,
    pub under: Vec<GalaxyResidual>,
}

/// Compute fitted values and dex residuals for each galaxy.
pub fn compute_residuals(points: &[GalaxyPoint], fit: &FitResult) -> Result<Vec<GalaxyResidual>, AppError> {
    let opts = FitOptions::default();
    let mut out = Vec::with_capacity(points.len());
    for p in points {
        let log_mstar_fit = predict_log_mstar(&fit.model, p, &opts)?;
        if !log_mstar_fit.is_finite() {
            return Err(AppError::new(4, "Non-finite model prediction during residual computation."));
        }
        let residual_dex = p.log_mstar_obs - log_mstar_fit;
        out.push(GalaxyResidual {
            point: p.clone(),
            log_mstar_fit,
            residual_dex,
        });
    }
    Ok(out)
}

/// Rank the most over-massive and under-massive galaxies by dex residual.
pub fn rank_over_under(residuals: &[GalaxyResidual], top_n: usize) -> Rankings {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| b.residual_dex.partial_cmp(&a.residual_dex).unwrap_or(std::cmp::Ordering::Equal));

    let over = sorted.iter().take(top_n).cloned().collect();

    let mut sorted_under = residuals.to_vec();
    sorted_under.sort_by(|a, b| a.residual_dex.partial_cmp(&b.residual_dex).unwrap_or(std::cmp::Ordering::Equal));
    let under = sorted_under.iter().take(top_n).cloned().collect();

    Rankings { over, under }
}
