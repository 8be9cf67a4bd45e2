//! Flat ΛCDM cosmology lookups.
//!
//! The stellar-mass kernel only needs the age–redshift relation (and its
//! inverse, for the epoch-dependent conversion efficiency). For a flat
//! matter + Λ universe both directions have closed forms, so no integration
//! or interpolation tables are involved:
//!
//! ```text
//! t(a) = T sinh⁻¹( sqrt(ΩΛ/Ωm) a^{3/2} ),   T = 2 / (3 H0 sqrt(ΩΛ))
//! a(t) = (Ωm/ΩΛ)^{1/3} sinh^{2/3}(t / T)
//! ```
//!
//! Radiation is ignored, which is accurate to better than a percent for the
//! epochs the kernel integrates over (t >= 0.1 Gyr).

use crate::error::AppError;

/// Hubble constant, km/s/Mpc (Planck15-like).
pub const HUBBLE0: f64 = 67.74;

/// Present-day matter density parameter.
pub const OMEGA_M: f64 = 0.3089;

/// Present-day dark-energy density parameter.
pub const OMEGA_L: f64 = 0.6911;

/// Cosmic baryon fraction Ωb/Ωm.
pub const BARYON_FRACTION: f64 = 0.157;

/// 1 km/s/Mpc expressed in 1/Gyr.
const KMS_PER_MPC_IN_INV_GYR: f64 = 1.0 / 977.79222;

/// The Λ expansion time scale `2 / (3 H0 sqrt(ΩΛ))` in Gyr.
fn lambda_time_scale() -> f64 {
    let h0 = HUBBLE0 * KMS_PER_MPC_IN_INV_GYR;
    2.0 / (3.0 * h0 * OMEGA_L.sqrt())
}

/// Age of the universe at redshift `z`, in Gyr.
pub fn age_at_redshift(z: f64) -> Result<f64, AppError> {
    if !z.is_finite() || z <= -1.0 {
        return Err(AppError::new(2, format!("Invalid redshift {z} (must be finite and > -1).")));
    }
    let a = 1.0 / (1.0 + z);
    Ok(lambda_time_scale() * ((OMEGA_L / OMEGA_M).sqrt() * a.powf(1.5)).asinh())
}

/// Age of the universe today (z = 0), in Gyr.
pub fn age_today() -> f64 {
    lambda_time_scale() * (OMEGA_L / OMEGA_M).sqrt().asinh()
}

/// Scale factor at cosmic time `t` (Gyr).
pub fn scale_factor_at_age(t: f64) -> Result<f64, AppError> {
    if !(t.is_finite() && t > 0.0) {
        return Err(AppError::new(2, format!("Invalid cosmic time {t} Gyr (must be finite and > 0).")));
    }
    Ok((OMEGA_M / OMEGA_L).cbrt() * (t / lambda_time_scale()).sinh().powf(2.0 / 3.0))
}

/// Redshift at cosmic time `t` (Gyr).
pub fn redshift_at_age(t: f64) -> Result<f64, AppError> {
    Ok(1.0 / scale_factor_at_age(t)? - 1.0)
}
