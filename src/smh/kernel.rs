//! The in-situ stellar mass kernel.
//!
//! For one halo observed at redshift `zobs` with mass `10^logm0` at that
//! epoch, the kernel:
//!
//! 1. resolves the three model parameter dictionaries (defaults + caller
//!    overrides, validated before any numerical work)
//! 2. resolves the MAH transition time: explicit `logtc`, a formation-time
//!    percentile, or the population median
//! 3. generates the mass accretion history on a linear time grid from
//!    `t_table_min` to `age(zobs)`
//! 4. integrates baryon fraction × accretion rate × conversion efficiency
//!    (cumulative trapezoid) to the main-sequence mass `mstar_ms`
//! 5. multiplies by the quenching suppression at `age(zobs)` for `mstar_q`
//!
//! Everything is a pure function of the inputs: no caching, no shared state,
//! and the diagnostic MAH handed back to callers is the same array the
//! integrator consumed.

use crate::cosmo;
use crate::error::AppError;
use crate::math::{cumtrapz, linspace};
use crate::models::{
    EfficiencyParams, MahParams, QuenchingParams, accretion_rate, conversion_efficiency,
    efficiency_curve_at, generate_mah, logtc_from_percentile, median_quenching_time,
    median_sigmoid_params,
};
use crate::params::{Overrides, merge_with_validation};

/// Earliest tabulated cosmic time (Gyr).
pub const T_TABLE_MIN: f64 = 0.1;

/// Default number of time-grid points.
pub const N_T_TABLE: usize = 400;

/// Per-call configuration of the kernel.
///
/// `logtc` and `mah_percentile` are mutually exclusive; `qtime` defaults to
/// the mass-dependent population median when absent. Model-parameter
/// overrides are routed to the owning dictionary by name.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    pub logtc: Option<f64>,
    pub mah_percentile: Option<f64>,
    pub qtime: Option<f64>,
    pub overrides: Overrides,
    pub t_table_min: f64,
    pub n_table: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            logtc: None,
            mah_percentile: None,
            qtime: None,
            overrides: Overrides::new(),
            t_table_min: T_TABLE_MIN,
            n_table: N_T_TABLE,
        }
    }
}

/// Present-day stellar masses (Msun).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StellarMass {
    /// Main-sequence mass: what would exist absent quenching.
    pub mstar_ms: f64,
    /// Mass accounting for star-formation quenching.
    pub mstar_q: f64,
}

/// Full kernel output for one halo, including diagnostics.
#[derive(Debug, Clone)]
pub struct HaloHistory {
    /// The time grid the MAH was generated on (Gyr).
    pub time_grid: Vec<f64>,
    /// Halo mass at each grid time (Msun).
    pub mah: Vec<f64>,
    /// Resolved MAH transition time actually used.
    pub logtc: f64,
    /// Resolved quenching time actually used (Gyr).
    pub qtime: f64,
    pub stellar: StellarMass,
}

/// Present-day in-situ stellar mass for one halo.
pub fn in_situ_mstar_at_zobs(zobs: f64, logm0: f64, cfg: &KernelConfig) -> Result<StellarMass, AppError> {
    Ok(in_situ_history(zobs, logm0, cfg)?.stellar)
}

/// As [`in_situ_mstar_at_zobs`], additionally returning the generated MAH.
///
/// The returned array is the one the stellar-mass integration consumed, not a
/// recomputation.
pub fn in_situ_mstar_and_mah_at_zobs(
    zobs: f64,
    logm0: f64,
    cfg: &KernelConfig,
) -> Result<(StellarMass, Vec<f64>), AppError> {
    let history = in_situ_history(zobs, logm0, cfg)?;
    Ok((history.stellar, history.mah))
}

/// Run the full kernel and keep every diagnostic.
pub fn in_situ_history(zobs: f64, logm0: f64, cfg: &KernelConfig) -> Result<HaloHistory, AppError> {
    // All validation happens before any integration work.
    if cfg.logtc.is_some() && cfg.mah_percentile.is_some() {
        return Err(AppError::new(
            2,
            "Ambiguous MAH specification: supply either `logtc` or `mah_percentile`, not both.",
        ));
    }
    if !logm0.is_finite() {
        return Err(AppError::new(2, format!("Non-finite logm0 ({logm0}).")));
    }
    if !(zobs.is_finite() && zobs >= 0.0) {
        return Err(AppError::new(2, format!("Invalid zobs {zobs} (must be finite and >= 0).")));
    }
    if let Some(qtime) = cfg.qtime {
        if !qtime.is_finite() {
            return Err(AppError::new(2, format!("Non-finite qtime ({qtime}).")));
        }
    }

    let mut mah_params = MahParams::default();
    let mut eff_params = EfficiencyParams::default();
    let mut q_params = QuenchingParams::default();
    merge_with_validation(
        &mut [&mut mah_params, &mut eff_params, &mut q_params],
        &cfg.overrides,
    )?;
    eff_params.validate()?;
    q_params.validate()?;

    let tobs = cosmo::age_at_redshift(zobs)?;
    if tobs <= cfg.t_table_min {
        return Err(AppError::new(
            2,
            format!(
                "zobs={zobs} corresponds to {tobs:.3} Gyr, at or before the table start ({} Gyr).",
                cfg.t_table_min
            ),
        ));
    }
    let time_grid = linspace(cfg.t_table_min, tobs, cfg.n_table)?;

    let logtc = if let Some(logtc) = cfg.logtc {
        logtc
    } else if let Some(percentile) = cfg.mah_percentile {
        logtc_from_percentile(logm0, percentile, &mah_params)?
    } else {
        median_sigmoid_params(logm0, &mah_params).0
    };

    let mah = generate_mah(&time_grid, logm0, logtc, mah_params.logtk, mah_params.dlogm_height)?;
    let rate = accretion_rate(&time_grid, &mah)?;

    let mut sfr = Vec::with_capacity(time_grid.len());
    for i in 0..time_grid.len() {
        let a = cosmo::scale_factor_at_age(time_grid[i])?;
        let curve = efficiency_curve_at(a, &eff_params);
        let eff = conversion_efficiency(mah[i].log10(), &curve);
        sfr.push(cosmo::BARYON_FRACTION * eff * rate[i]);
    }

    let mstar_table = cumtrapz(&time_grid, &sfr)?;
    let mstar_ms = mstar_table[mstar_table.len() - 1];

    let qtime = cfg.qtime.unwrap_or_else(|| median_quenching_time(logm0, &q_params));
    let suppression = crate::models::quenching_suppression(tobs, qtime, &q_params);
    let mstar_q = mstar_ms * suppression;

    Ok(HaloHistory {
        time_grid,
        mah,
        logtc,
        qtime,
        stellar: StellarMass { mstar_ms, mstar_q },
    })
}

/// Broadcasting convenience over slices of `zobs` / `logm0`.
///
/// Slices must have equal length, or either may have length 1 to be repeated.
/// Each element runs through the scalar kernel: same numerics, no separate
/// code path.
pub fn in_situ_mstar_batch(
    zobs: &[f64],
    logm0: &[f64],
    cfg: &KernelConfig,
) -> Result<Vec<StellarMass>, AppError> {
    let n = match (zobs.len(), logm0.len()) {
        (0, _) | (_, 0) => {
            return Err(AppError::new(2, "Empty input array in in_situ_mstar_batch."));
        }
        (a, b) if a == b => a,
        (1, b) => b,
        (a, 1) => a,
        (a, b) => {
            return Err(AppError::new(
                2,
                format!("Cannot broadcast zobs (len {a}) against logm0 (len {b})."),
            ));
        }
    };

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let z = zobs[i.min(zobs.len() - 1)];
        let m = logm0[i.min(logm0.len() - 1)];
        out.push(in_situ_mstar_at_zobs(z, m, cfg)?);
    }
    Ok(out)
}
