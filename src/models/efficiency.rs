//! Instantaneous baryon-conversion efficiency.
//!
//! The fraction of freshly accreted baryons turned into stars is a double
//! power law in halo mass, peaking near a characteristic mass and falling off
//! with independent slopes on either side:
//!
//! ```text
//! eff(logm) = 2 eff_norm / (10^(-slope_lo x) + 10^(slope_hi x)),  x = logm - logm_crit
//! ```
//!
//! The four curve quantities drift with cosmic epoch, linearly in `1 - a`
//! (scale factor `a`), so star formation was more efficient at early times.
//! That drift is what makes present-day stellar mass sensitive to *when* a
//! halo assembled its mass, not just to how much it ends up with.

use crate::error::AppError;
use crate::params::ParamSet;

/// Default parameters of the conversion-efficiency model.
#[derive(Debug, Clone, PartialEq)]
pub struct EfficiencyParams {
    /// Efficiency normalization at z = 0.
    pub eff_norm_0: f64,
    /// Linear `1 - a` evolution of the normalization.
    pub eff_norm_z: f64,
    /// Characteristic halo mass (log10 Msun) at z = 0.
    pub logm_crit_0: f64,
    /// Linear `1 - a` evolution of the characteristic mass.
    pub logm_crit_z: f64,
    /// Low-mass power-law slope at z = 0.
    pub slope_lo_0: f64,
    /// Linear `1 - a` evolution of the low-mass slope.
    pub slope_lo_z: f64,
    /// High-mass power-law slope (epoch-independent).
    pub slope_hi: f64,
}

impl Default for EfficiencyParams {
    fn default() -> Self {
        Self {
            eff_norm_0: 0.005,
            eff_norm_z: 0.689,
            logm_crit_0: 11.339,
            logm_crit_z: 0.692,
            slope_lo_0: 3.344,
            slope_lo_z: -2.079,
            slope_hi: 0.85,
        }
    }
}

const EFFICIENCY_KEYS: &[&str] = &[
    "eff_norm_0",
    "eff_norm_z",
    "logm_crit_0",
    "logm_crit_z",
    "slope_lo_0",
    "slope_lo_z",
    "slope_hi",
];

impl ParamSet for EfficiencyParams {
    fn model_name(&self) -> &'static str {
        "efficiency"
    }

    fn keys(&self) -> &'static [&'static str] {
        EFFICIENCY_KEYS
    }

    fn get(&self, key: &str) -> Option<f64> {
        match key {
            "eff_norm_0" => Some(self.eff_norm_0),
            "eff_norm_z" => Some(self.eff_norm_z),
            "logm_crit_0" => Some(self.logm_crit_0),
            "logm_crit_z" => Some(self.logm_crit_z),
            "slope_lo_0" => Some(self.slope_lo_0),
            "slope_lo_z" => Some(self.slope_lo_z),
            "slope_hi" => Some(self.slope_hi),
            _ => None,
        }
    }

    fn set(&mut self, key: &str, value: f64) -> bool {
        match key {
            "eff_norm_0" => self.eff_norm_0 = value,
            "eff_norm_z" => self.eff_norm_z = value,
            "logm_crit_0" => self.logm_crit_0 = value,
            "logm_crit_z" => self.logm_crit_z = value,
            "slope_lo_0" => self.slope_lo_0 = value,
            "slope_lo_z" => self.slope_lo_z = value,
            "slope_hi" => self.slope_hi = value,
            _ => return false,
        }
        true
    }
}

impl EfficiencyParams {
    /// Reject parameter combinations that break the efficiency contract
    /// (positive curve, falloff on both sides, peak below unity) anywhere on
    /// the `a` in [0, 1] path the kernel integrates over.
    pub fn validate(&self) -> Result<(), AppError> {
        for key in EFFICIENCY_KEYS {
            let v = self.get(key).unwrap_or(f64::NAN);
            if !v.is_finite() {
                return Err(AppError::new(2, format!("Non-finite efficiency parameter '{key}'.")));
            }
        }
        // The `1 - a` evolution is linear, so checking both endpoints bounds
        // the whole path.
        for &one_minus_a in &[0.0, 1.0] {
            let curve = self.curve_at_one_minus_a(one_minus_a);
            if curve.eff_norm <= 0.0 {
                return Err(AppError::new(2, "Efficiency normalization must stay positive over cosmic time."));
            }
            if curve.slope_lo <= 0.0 || curve.slope_hi <= 0.0 {
                return Err(AppError::new(2, "Efficiency slopes must stay positive over cosmic time."));
            }
            let peak = curve.peak();
            if !(peak > 0.0 && peak < 1.0) {
                return Err(AppError::new(
                    2,
                    format!("Efficiency peak {peak:.4} out of (0, 1); adjust eff_norm parameters."),
                ));
            }
        }
        Ok(())
    }

    fn curve_at_one_minus_a(&self, one_minus_a: f64) -> EfficiencyCurve {
        EfficiencyCurve {
            eff_norm: self.eff_norm_0 + self.eff_norm_z * one_minus_a,
            logm_crit: self.logm_crit_0 + self.logm_crit_z * one_minus_a,
            slope_lo: self.slope_lo_0 + self.slope_lo_z * one_minus_a,
            slope_hi: self.slope_hi,
        }
    }
}

/// The fixed-epoch efficiency curve: a pure function of halo mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EfficiencyCurve {
    pub eff_norm: f64,
    pub logm_crit: f64,
    pub slope_lo: f64,
    pub slope_hi: f64,
}

impl EfficiencyCurve {
    /// Peak value of the curve (attained slightly above `logm_crit` when the
    /// slopes are asymmetric).
    pub fn peak(&self) -> f64 {
        let (b, g) = (self.slope_lo, self.slope_hi);
        // Minimize 10^(-b x) + 10^(g x): the optimum has the two terms in
        // ratio g : b.
        let x_star = (b / g).log10() / (b + g);
        conversion_efficiency(self.logm_crit + x_star, self)
    }
}

/// Evaluate the efficiency curve at cosmic scale factor `a`.
pub fn efficiency_curve_at(scale_factor: f64, params: &EfficiencyParams) -> EfficiencyCurve {
    params.curve_at_one_minus_a(1.0 - scale_factor)
}

/// Dimensionless conversion efficiency at halo mass `logm` (log10 Msun).
///
/// Strictly inside (0, 1) for validated parameters.
pub fn conversion_efficiency(logm: f64, curve: &EfficiencyCurve) -> f64 {
    let x = logm - curve.logm_crit;
    2.0 * curve.eff_norm / (10.0_f64.powf(-curve.slope_lo * x) + 10.0_f64.powf(curve.slope_hi * x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn efficiency_equals_norm_at_critical_mass() {
        let p = EfficiencyParams::default();
        let curve = efficiency_curve_at(1.0, &p);
        let eff = conversion_efficiency(curve.logm_crit, &curve);
        assert!((eff - curve.eff_norm).abs() < 1e-15);
    }

    #[test]
    fn efficiency_falls_off_on_both_sides() {
        let p = EfficiencyParams::default();
        let curve = efficiency_curve_at(0.5, &p);
        let peak = curve.peak();

        for &dx in &[2.0, 4.0, 6.0] {
            let lo = conversion_efficiency(curve.logm_crit - dx, &curve);
            let hi = conversion_efficiency(curve.logm_crit + dx, &curve);
            assert!(lo > 0.0 && lo < peak);
            assert!(hi > 0.0 && hi < peak);
        }

        // Far from the critical mass the curve is vanishingly small.
        assert!(conversion_efficiency(curve.logm_crit - 8.0, &curve) < 1e-6);
        assert!(conversion_efficiency(curve.logm_crit + 8.0, &curve) < 1e-4);
    }

    #[test]
    fn efficiency_stays_inside_unit_interval_over_cosmic_time() {
        let p = EfficiencyParams::default();
        p.validate().unwrap();
        for i in 0..=10 {
            let a = 0.05 + 0.95 * i as f64 / 10.0;
            let curve = efficiency_curve_at(a, &p);
            for j in 0..=40 {
                let logm = 6.0 + 0.3 * j as f64;
                let eff = conversion_efficiency(logm, &curve);
                assert!(eff > 0.0 && eff < 1.0, "eff={eff} out of range at a={a}, logm={logm}");
            }
        }
    }

    #[test]
    fn early_epochs_are_more_efficient() {
        // The normalization evolution makes high-z star formation more
        // efficient at fixed mass near the characteristic scale.
        let p = EfficiencyParams::default();
        let late = efficiency_curve_at(1.0, &p);
        let early = efficiency_curve_at(0.25, &p);
        assert!(early.eff_norm > late.eff_norm);

        let logm = early.logm_crit;
        assert!(conversion_efficiency(logm, &early) > conversion_efficiency(logm, &late));
    }

    #[test]
    fn validate_rejects_broken_parameters() {
        let mut p = EfficiencyParams::default();
        p.eff_norm_0 = -0.1;
        assert!(p.validate().is_err());

        let mut p = EfficiencyParams::default();
        p.eff_norm_z = 2.0; // peak above unity at early times
        assert!(p.validate().is_err());

        let mut p = EfficiencyParams::default();
        p.slope_lo_z = -5.0; // low-mass slope goes negative at early times
        assert!(p.validate().is_err());
    }
}
