//! Model selection (STATIC vs EVOLVING normalization) using BIC with guardrails.
//!
//! The tool fits each enabled model kind and computes:
//! - SSE / RMSE (dex)
//! - BIC = n * ln(SSE/n) + k * ln(n)
//!
//! Selection rules:
//! 1. Exclude underdetermined models: require `n >= k + 5`
//! 2. Choose the model with minimum BIC
//! 3. If ΔBIC < 2 between the best and a simpler model, pick the simpler model

use crate::domain::{CalibModel, EffModelKind, FitConfig, FitQuality, FitResult, GalaxyPoint, ModelSpec};
use crate::error::AppError;
use crate::fit::fitter::{FitOptions, ModelFit, fit_model, predict_log_mstar_at};
use crate::fit::grid::shape_grid;

/// Minimum number of extra observations beyond parameter count.
const MIN_N_BUFFER: usize = 5;

/// Output of fitting + selection.
#[derive(Debug, Clone)]
pub struct FitSelection {
    pub best: FitResult,
    /// Fits for all attempted models (after guardrails).
    pub fits: Vec<FitResult>,
    /// Any models that were skipped and why (for diagnostics).
    pub skipped: Vec<(EffModelKind, String)>,
}

/// Fit and select the best model.
pub fn fit_and_select(points: &[GalaxyPoint], config: &FitConfig) -> Result<FitSelection, AppError> {
    let n = points.len();

    let kinds: Vec<EffModelKind> = match config.model_spec {
        ModelSpec::Static => vec![EffModelKind::Static],
        ModelSpec::Evolving => vec![EffModelKind::Evolving],
        ModelSpec::All | ModelSpec::Auto => vec![EffModelKind::Static, EffModelKind::Evolving],
    };

    let grid = shape_grid(
        (config.logm_crit_min, config.logm_crit_max, config.logm_crit_steps),
        (config.slope_lo_min, config.slope_lo_max, config.slope_lo_steps),
    )?;
    let opts = FitOptions::default();

    let mut fits = Vec::new();
    let mut skipped = Vec::new();

    for kind in kinds {
        let k = kind.param_count();
        if n < k + MIN_N_BUFFER {
            skipped.push((
                kind,
                format!("Underdetermined: n={n} < k+{MIN_N_BUFFER}={}", k + MIN_N_BUFFER),
            ));
            continue;
        }

        let fit = fit_model(kind, points, &grid, &opts)?;
        fits.push(to_fit_result(fit, n, k));
    }

    if fits.is_empty() {
        return Err(AppError::new(
            3,
            "Insufficient data to fit any model after guardrails.",
        ));
    }

    // If the user requested a single model, it's already the best.
    let best = if matches!(config.model_spec, ModelSpec::Static | ModelSpec::Evolving) {
        fits[0].clone()
    } else {
        select_by_bic(&fits)
    };

    Ok(FitSelection {
        best,
        fits,
        skipped,
    })
}

fn to_fit_result(fit: ModelFit, n: usize, k: usize) -> FitResult {
    let bic = bic(n, fit.sse, k);

    FitResult {
        model: CalibModel {
            name: fit.kind,
            display_name: fit.kind.display_name().to_string(),
            eff_norm_0: fit.eff_norm_0,
            eff_norm_z: fit.eff_norm_z,
            logm_crit_0: fit.shape.logm_crit_0,
            slope_lo_0: fit.shape.slope_lo_0,
        },
        quality: FitQuality {
            sse: fit.sse,
            rmse_dex: fit.rmse_dex,
            bic,
            n,
        },
    }
}

fn bic(n: usize, sse: f64, k: usize) -> f64 {
    let n_f = n as f64;
    let sse_per = (sse / n_f).max(1e-12);
    n_f * sse_per.ln() + (k as f64) * n_f.ln()
}

fn select_by_bic(fits: &[FitResult]) -> FitResult {
    // Find minimum BIC.
    let mut best = &fits[0];
    for f in &fits[1..] {
        if f.quality.bic < best.quality.bic {
            best = f;
        }
    }

    let best_bic = best.quality.bic;

    // Prefer simplicity if within 2 BIC points: iterate in order of
    // increasing complexity and pick the first fit close enough to the best.
    let order = [EffModelKind::Static, EffModelKind::Evolving];
    for kind in order {
        if let Some(f) = fits.iter().find(|f| f.model.name == kind) {
            if f.quality.bic <= best_bic + 2.0 {
                return f.clone();
            }
        }
    }

    best.clone()
}

/// Fitted stellar-mass–halo-mass curve on a halo-mass grid (for plots and
/// debug bundles).
pub fn fitted_smhm_curve(
    model: &CalibModel,
    zobs: f64,
    logm_min: f64,
    logm_max: f64,
    n: usize,
) -> Result<Vec<(f64, f64)>, AppError> {
    let n = n.max(2);
    let opts = FitOptions::default();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let logm0 = logm_min + u * (logm_max - logm_min);
        let log_mstar = predict_log_mstar_at(model, zobs, logm0, &opts)?;
        out.push((logm0, log_mstar));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GalaxyExtras, GalaxyMeta};
    use crate::params::Overrides;
    use crate::smh::{KernelConfig, in_situ_mstar_at_zobs};

    fn base_config() -> FitConfig {
        // A small grid centered on the generating parameters keeps these
        // tests fast while still exercising the search.
        FitConfig {
            logm_crit_min: 11.039,
            logm_crit_max: 11.639,
            logm_crit_steps: 3,
            slope_lo_min: 2.944,
            slope_lo_max: 3.744,
            slope_lo_steps: 3,
            ..FitConfig::default()
        }
    }

    fn kernel_points(n: usize, overrides: Overrides) -> Vec<GalaxyPoint> {
        let cfg = KernelConfig {
            overrides,
            ..KernelConfig::default()
        };
        (0..n)
            .map(|i| {
                let logm0 = 10.5 + 4.0 * i as f64 / (n as f64 - 1.0);
                let m = in_situ_mstar_at_zobs(0.0, logm0, &cfg).unwrap();
                GalaxyPoint {
                    id: format!("GAL-{i:04}"),
                    zobs: 0.0,
                    logm0,
                    log_mstar_obs: m.mstar_q.log10(),
                    weight: 1.0,
                    meta: GalaxyMeta::default(),
                    extras: GalaxyExtras::default(),
                }
            })
            .collect()
    }

    #[test]
    fn bic_prefers_simpler_when_close() {
        let n = 200;
        let fits = vec![
            FitResult {
                model: CalibModel {
                    name: EffModelKind::Static,
                    display_name: "STATIC".to_string(),
                    eff_norm_0: 0.1,
                    eff_norm_z: 0.0,
                    logm_crit_0: 11.3,
                    slope_lo_0: 3.0,
                },
                quality: FitQuality {
                    sse: 100.0,
                    rmse_dex: 0.0,
                    bic: 10.0,
                    n,
                },
            },
            FitResult {
                model: CalibModel {
                    name: EffModelKind::Evolving,
                    display_name: "EVOLVING".to_string(),
                    eff_norm_0: 0.1,
                    eff_norm_z: 0.5,
                    logm_crit_0: 11.3,
                    slope_lo_0: 3.0,
                },
                quality: FitQuality {
                    sse: 99.0,
                    rmse_dex: 0.0,
                    bic: 11.5, // worse than STATIC
                    n,
                },
            },
        ];

        let chosen = select_by_bic(&fits);
        assert_eq!(chosen.model.name, EffModelKind::Static);
    }

    #[test]
    fn fit_and_select_skips_underdetermined() {
        let points = kernel_points(5, Overrides::new());
        let err = fit_and_select(&points, &base_config()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn auto_selects_evolving_on_evolving_data() {
        let points = kernel_points(14, Overrides::new());
        let selection = fit_and_select(&points, &base_config()).unwrap();
        assert_eq!(selection.best.model.name, EffModelKind::Evolving);
        assert!(selection.skipped.is_empty());
    }

    #[test]
    fn auto_selects_static_on_static_data() {
        // Data generated with the evolution term switched off: the evolving
        // model can match it exactly, but BIC should still choose STATIC due
        // to the parameter penalty.
        let points = kernel_points(14, Overrides::new().with("eff_norm_z", 0.0));
        let selection = fit_and_select(&points, &base_config()).unwrap();
        assert_eq!(selection.best.model.name, EffModelKind::Static);
    }

    #[test]
    fn fitted_curve_is_monotonic_in_halo_mass() {
        let defaults = crate::models::EfficiencyParams::default();
        let model = CalibModel {
            name: EffModelKind::Evolving,
            display_name: "EVOLVING".to_string(),
            eff_norm_0: defaults.eff_norm_0,
            eff_norm_z: defaults.eff_norm_z,
            logm_crit_0: defaults.logm_crit_0,
            slope_lo_0: defaults.slope_lo_0,
        };
        let curve = fitted_smhm_curve(&model, 0.0, 10.5, 14.5, 21).unwrap();
        assert_eq!(curve.len(), 21);
        for w in curve.windows(2) {
            assert!(w[1].1 > w[0].1, "fitted SMHM curve not increasing near logm0={}", w[0].0);
        }
    }
}
