//! Sigmoid halo mass accretion histories (MAH).
//!
//! A halo's main-progenitor mass is modeled as a logistic curve in log cosmic
//! time:
//!
//! ```text
//! log10 M(t) = logm0 + S(log10 t) - S(log10 t_final)
//! S(x) = sigmoid(x, logtc, logtk, -dlogm_height, 0)
//! ```
//!
//! The subtraction pins `M` to exactly `10^logm0` at the final grid point, so
//! `logm0` is the halo mass at the epoch of observation. `logtc` sets when
//! the halo assembles (early-forming halos have small `logtc`), `logtk` how
//! sharply, and `dlogm_height` the total log-mass growth.
//!
//! Population semantics: at fixed `logm0` the formation-time rank is encoded
//! by a percentile in [0, 1] mapped linearly onto
//! `logtc_med ± logtc_scatter(logm0)`, where the scatter magnitude blends
//! smoothly between a dwarf and a cluster regime (a sigmoid in `logm0`, never
//! a hard threshold). Percentile 0.5 reduces exactly to the median curve.

use crate::error::AppError;
use crate::math::sigmoid;
use crate::params::ParamSet;

/// Default parameters of the sigmoid MAH model.
///
/// The first four entries set the median transition time as a function of
/// present halo mass; the scatter entries control the percentile mapping and
/// are inert for median (percentile 0.5) histories.
#[derive(Debug, Clone, PartialEq)]
pub struct MahParams {
    /// Halo mass (log10 Msun) at which the median `logtc` transitions.
    pub logtc_x0: f64,
    /// Sharpness of the median `logtc` transition in `logm0`.
    pub logtc_k: f64,
    /// Median `logtc` for the lowest-mass halos.
    pub logtc_ymin: f64,
    /// Median `logtc` for the highest-mass halos.
    pub logtc_ymax: f64,
    /// Transition sharpness of the growth curve in log10 time.
    pub logtk: f64,
    /// Total log10 mass growth amplitude.
    pub dlogm_height: f64,
    /// Formation-time scatter (dex of logtc) in the dwarf regime.
    pub logtc_scatter_dwarfs: f64,
    /// Formation-time scatter (dex of logtc) in the cluster regime.
    pub logtc_scatter_clusters: f64,
    /// Halo mass (log10 Msun) where the scatter blend transitions.
    pub logtc_scatter_logmc: f64,
    /// Sharpness of the scatter blend in `logm0`.
    pub logtc_scatter_logmc_k: f64,
}

impl Default for MahParams {
    fn default() -> Self {
        Self {
            logtc_x0: 11.75,
            logtc_k: 0.9,
            logtc_ymin: -0.25,
            logtc_ymax: 0.8,
            logtk: 7.0,
            dlogm_height: 6.0,
            logtc_scatter_dwarfs: 0.30,
            logtc_scatter_clusters: 0.24,
            logtc_scatter_logmc: 12.0,
            logtc_scatter_logmc_k: 1.0,
        }
    }
}

const MAH_KEYS: &[&str] = &[
    "logtc_x0",
    "logtc_k",
    "logtc_ymin",
    "logtc_ymax",
    "logtk",
    "dlogm_height",
    "logtc_scatter_dwarfs",
    "logtc_scatter_clusters",
    "logtc_scatter_logmc",
    "logtc_scatter_logmc_k",
];

impl ParamSet for MahParams {
    fn model_name(&self) -> &'static str {
        "mah"
    }

    fn keys(&self) -> &'static [&'static str] {
        MAH_KEYS
    }

    fn get(&self, key: &str) -> Option<f64> {
        match key {
            "logtc_x0" => Some(self.logtc_x0),
            "logtc_k" => Some(self.logtc_k),
            "logtc_ymin" => Some(self.logtc_ymin),
            "logtc_ymax" => Some(self.logtc_ymax),
            "logtk" => Some(self.logtk),
            "dlogm_height" => Some(self.dlogm_height),
            "logtc_scatter_dwarfs" => Some(self.logtc_scatter_dwarfs),
            "logtc_scatter_clusters" => Some(self.logtc_scatter_clusters),
            "logtc_scatter_logmc" => Some(self.logtc_scatter_logmc),
            "logtc_scatter_logmc_k" => Some(self.logtc_scatter_logmc_k),
            _ => None,
        }
    }

    fn set(&mut self, key: &str, value: f64) -> bool {
        match key {
            "logtc_x0" => self.logtc_x0 = value,
            "logtc_k" => self.logtc_k = value,
            "logtc_ymin" => self.logtc_ymin = value,
            "logtc_ymax" => self.logtc_ymax = value,
            "logtk" => self.logtk = value,
            "dlogm_height" => self.dlogm_height = value,
            "logtc_scatter_dwarfs" => self.logtc_scatter_dwarfs = value,
            "logtc_scatter_clusters" => self.logtc_scatter_clusters = value,
            "logtc_scatter_logmc" => self.logtc_scatter_logmc = value,
            "logtc_scatter_logmc_k" => self.logtc_scatter_logmc_k = value,
            _ => return false,
        }
        true
    }
}

/// Population-median sigmoid parameters `(logtc, logtk, dlogm_height)` for a
/// halo of mass `logm0`.
pub fn median_sigmoid_params(logm0: f64, params: &MahParams) -> (f64, f64, f64) {
    let logtc_med = sigmoid(
        logm0,
        params.logtc_x0,
        params.logtc_k,
        params.logtc_ymin,
        params.logtc_ymax,
    );
    (logtc_med, params.logtk, params.dlogm_height)
}

/// Formation-time scatter (in dex of `logtc`) at halo mass `logm0`.
///
/// Smoothly blends the dwarf-regime and cluster-regime magnitudes.
pub fn logtc_scatter_at_logm0(logm0: f64, params: &MahParams) -> f64 {
    sigmoid(
        logm0,
        params.logtc_scatter_logmc,
        params.logtc_scatter_logmc_k,
        params.logtc_scatter_dwarfs,
        params.logtc_scatter_clusters,
    )
}

/// Map a formation-time percentile onto a transition time.
///
/// Percentile 0 is the earliest-forming halo (`logtc_med - scatter`),
/// percentile 1 the latest; 0.5 returns the median exactly.
pub fn logtc_from_percentile(logm0: f64, percentile: f64, params: &MahParams) -> Result<f64, AppError> {
    if !percentile.is_finite() || !(0.0..=1.0).contains(&percentile) {
        return Err(AppError::new(
            2,
            format!("Invalid mah_percentile {percentile} (must be in [0, 1])."),
        ));
    }
    let (logtc_med, _, _) = median_sigmoid_params(logm0, params);
    let scatter = logtc_scatter_at_logm0(logm0, params);
    Ok(logtc_med + scatter * (2.0 * percentile - 1.0))
}

/// Generate a halo mass accretion history on `time_grid` (Gyr).
///
/// Returns linear masses (Msun). The output is strictly increasing and equals
/// `10^logm0` at the final grid point by construction.
pub fn generate_mah(
    time_grid: &[f64],
    logm0: f64,
    logtc: f64,
    logtk: f64,
    dlogm_height: f64,
) -> Result<Vec<f64>, AppError> {
    if time_grid.len() < 2 {
        return Err(AppError::new(2, "MAH time grid must have at least 2 points."));
    }
    for (i, w) in time_grid.windows(2).enumerate() {
        if !(w[0].is_finite() && w[1].is_finite() && w[0] > 0.0 && w[1] > w[0]) {
            return Err(AppError::new(
                2,
                format!("MAH time grid must be positive and strictly increasing (violated at index {i})."),
            ));
        }
    }
    if !logm0.is_finite() {
        return Err(AppError::new(2, format!("Non-finite logm0 ({logm0}).")));
    }
    if !logtc.is_finite() {
        return Err(AppError::new(2, format!("Non-finite logtc ({logtc}).")));
    }
    if !(logtk.is_finite() && logtk > 0.0) {
        return Err(AppError::new(2, format!("Invalid logtk {logtk} (must be finite and > 0).")));
    }
    if !(dlogm_height.is_finite() && dlogm_height > 0.0) {
        return Err(AppError::new(
            2,
            format!("Invalid dlogm_height {dlogm_height} (must be finite and > 0)."),
        ));
    }

    let growth = |logt: f64| sigmoid(logt, logtc, logtk, -dlogm_height, 0.0);
    let s_final = growth(time_grid[time_grid.len() - 1].log10());

    let mut mah = Vec::with_capacity(time_grid.len());
    for &t in time_grid {
        let logm = logm0 + growth(t.log10()) - s_final;
        mah.push(10.0_f64.powf(logm));
    }

    // Strict monotonicity is a contract, not a tendency: extreme parameter
    // combinations can saturate the sigmoid into flat (equal) steps, and we
    // refuse to hand such a history to the integrator.
    for (i, w) in mah.windows(2).enumerate() {
        if !(w[1] > w[0]) {
            return Err(AppError::new(
                4,
                format!("Degenerate MAH: mass not strictly increasing at index {i} (logtk too large?)."),
            ));
        }
    }

    Ok(mah)
}

/// Accretion rate dM/dt (Msun/Gyr) from a mass history by finite differences.
///
/// Central differences in the interior, one-sided at the ends; same length as
/// the inputs.
pub fn accretion_rate(time_grid: &[f64], mah: &[f64]) -> Result<Vec<f64>, AppError> {
    let n = time_grid.len();
    if mah.len() != n || n < 2 {
        return Err(AppError::new(
            4,
            format!("Accretion rate needs matching grids of >= 2 points (got {n} and {}).", mah.len()),
        ));
    }

    let mut rate = Vec::with_capacity(n);
    rate.push((mah[1] - mah[0]) / (time_grid[1] - time_grid[0]));
    for i in 1..n - 1 {
        rate.push((mah[i + 1] - mah[i - 1]) / (time_grid[i + 1] - time_grid[i - 1]));
    }
    rate.push((mah[n - 1] - mah[n - 2]) / (time_grid[n - 1] - time_grid[n - 2]));
    Ok(rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::linspace;

    #[test]
    fn mah_is_strictly_increasing_and_hits_logm0() {
        let t = linspace(0.1, 13.8, 300).unwrap();
        for &logm0 in &[8.0, 10.0, 12.0, 14.0, 16.0] {
            let p = MahParams::default();
            let (logtc, logtk, h) = median_sigmoid_params(logm0, &p);
            let mah = generate_mah(&t, logm0, logtc, logtk, h).unwrap();

            for w in mah.windows(2) {
                assert!(w[1] > w[0], "MAH not strictly increasing for logm0={logm0}");
            }
            let m_final = mah[mah.len() - 1];
            let target = 10.0_f64.powf(logm0);
            assert!(
                ((m_final - target) / target).abs() < 1e-3,
                "MAH endpoint off target for logm0={logm0}: {m_final} vs {target}"
            );
        }
    }

    #[test]
    fn median_percentile_reduces_to_median_exactly() {
        let p = MahParams::default();
        for &logm0 in &[9.0, 12.0, 15.0] {
            let (logtc_med, _, _) = median_sigmoid_params(logm0, &p);
            let logtc = logtc_from_percentile(logm0, 0.5, &p).unwrap();
            assert_eq!(logtc, logtc_med);
        }
    }

    #[test]
    fn percentile_ordering_matches_formation_time() {
        // Earlier-forming (lower percentile) means earlier transition time.
        let p = MahParams::default();
        let lo = logtc_from_percentile(12.0, 0.0, &p).unwrap();
        let med = logtc_from_percentile(12.0, 0.5, &p).unwrap();
        let hi = logtc_from_percentile(12.0, 1.0, &p).unwrap();
        assert!(lo < med && med < hi);

        let scatter = logtc_scatter_at_logm0(12.0, &p);
        assert!((hi - lo - 2.0 * scatter).abs() < 1e-12);
    }

    #[test]
    fn percentile_outside_unit_interval_is_rejected() {
        let p = MahParams::default();
        assert!(logtc_from_percentile(12.0, -0.1, &p).is_err());
        assert!(logtc_from_percentile(12.0, 1.1, &p).is_err());
        assert!(logtc_from_percentile(12.0, f64::NAN, &p).is_err());
    }

    #[test]
    fn scatter_blend_is_smooth_between_regimes() {
        let p = MahParams::default();
        let dwarf = logtc_scatter_at_logm0(7.0, &p);
        let mid = logtc_scatter_at_logm0(p.logtc_scatter_logmc, &p);
        let cluster = logtc_scatter_at_logm0(16.0, &p);

        assert!((dwarf - p.logtc_scatter_dwarfs).abs() < 1e-2);
        assert!((cluster - p.logtc_scatter_clusters).abs() < 1e-2);
        let expected_mid = 0.5 * (p.logtc_scatter_dwarfs + p.logtc_scatter_clusters);
        assert!((mid - expected_mid).abs() < 1e-12);
    }

    #[test]
    fn generate_mah_rejects_bad_inputs() {
        let t = linspace(0.1, 13.8, 50).unwrap();
        assert!(generate_mah(&t, f64::NAN, 0.3, 7.0, 6.0).is_err());
        assert!(generate_mah(&t, 12.0, 0.3, -1.0, 6.0).is_err());
        assert!(generate_mah(&t, 12.0, 0.3, 7.0, 0.0).is_err());
        assert!(generate_mah(&[1.0], 12.0, 0.3, 7.0, 6.0).is_err());

        let unsorted = [0.5, 0.4, 1.0];
        assert!(generate_mah(&unsorted, 12.0, 0.3, 7.0, 6.0).is_err());
        let negative = [-1.0, 0.5, 1.0];
        assert!(generate_mah(&negative, 12.0, 0.3, 7.0, 6.0).is_err());
    }

    #[test]
    fn accretion_rate_is_positive_for_generated_histories() {
        let t = linspace(0.1, 13.8, 200).unwrap();
        let p = MahParams::default();
        let (logtc, logtk, h) = median_sigmoid_params(12.0, &p);
        let mah = generate_mah(&t, 12.0, logtc, logtk, h).unwrap();
        let rate = accretion_rate(&t, &mah).unwrap();
        assert_eq!(rate.len(), t.len());
        assert!(rate.iter().all(|&r| r > 0.0));
    }
}
