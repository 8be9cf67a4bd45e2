//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during calibration
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which efficiency-normalization model(s) to calibrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelSpec {
    Auto,
    Static,
    Evolving,
    All,
}

/// Concrete calibrated model kind.
///
/// `Static` fits one normalization coefficient; `Evolving` adds a linear
/// `1 - a` evolution term. Both share the gridded curve-shape parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffModelKind {
    Static,
    Evolving,
}

impl EffModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            EffModelKind::Static => "STATIC",
            EffModelKind::Evolving => "EVOLVING",
        }
    }

    /// Number of linear normalization coefficients.
    pub fn coeff_len(self) -> usize {
        match self {
            EffModelKind::Static => 1,
            EffModelKind::Evolving => 2,
        }
    }

    /// Total parameter count for information criteria (linear coefficients
    /// plus the two grid-searched shape parameters).
    pub fn param_count(self) -> usize {
        self.coeff_len() + 2
    }
}

/// A normalized galaxy observation used for calibration.
#[derive(Debug, Clone)]
pub struct GalaxyPoint {
    pub id: String,

    /// Redshift of observation.
    pub zobs: f64,

    /// Host halo mass at `zobs` (log10 Msun).
    pub logm0: f64,

    /// Observed stellar mass (log10 Msun).
    pub log_mstar_obs: f64,

    /// Observation weight (higher means more influence).
    pub weight: f64,

    /// Optional metadata (for filtering and reporting).
    pub meta: GalaxyMeta,

    /// Optional underlying truth fields (for synthetic samples and exports).
    pub extras: GalaxyExtras,
}

#[derive(Debug, Clone, Default)]
pub struct GalaxyMeta {
    pub survey: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GalaxyExtras {
    pub mah_percentile: Option<f64>,
    pub qtime: Option<f64>,
    pub log_mstar_true: Option<f64>,
}

/// Summary stats about the points actually used for calibration.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub n_points: usize,
    pub logm0_min: f64,
    pub logm0_max: f64,
    pub log_mstar_min: f64,
    pub log_mstar_max: f64,
}

/// A per-galaxy fitted result (used for ranking and exports).
#[derive(Debug, Clone)]
pub struct GalaxyResidual {
    pub point: GalaxyPoint,
    pub log_mstar_fit: f64,
    /// Observed minus fitted stellar mass, in dex.
    pub residual_dex: f64,
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    /// Root-mean-square log10 stellar-mass residual.
    pub rmse_dex: f64,
    pub bic: f64,
    pub n: usize,
}

/// Calibrated model parameters and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibModel {
    pub name: EffModelKind,
    pub display_name: String,
    /// Efficiency normalization at z = 0.
    pub eff_norm_0: f64,
    /// Linear `1 - a` evolution of the normalization (0 for `Static`).
    pub eff_norm_z: f64,
    /// Grid-searched characteristic mass at z = 0.
    pub logm_crit_0: f64,
    /// Grid-searched low-mass slope at z = 0.
    pub slope_lo_0: f64,
}

/// Fit output for a single model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    pub model: CalibModel,
    pub quality: FitQuality,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// CSV input for `smh fit`; `None` means a synthetic survey run.
    pub csv_path: Option<PathBuf>,

    /// Survey redshift (also the default for CSV rows without a `zobs` column).
    pub zobs: f64,

    pub sample_count: usize,
    pub sample_seed: u64,

    /// Halo mass range: synthetic sampling bounds, and an ingest filter.
    pub logm_min: f64,
    pub logm_max: f64,

    /// Lognormal observational scatter (dex) for synthetic samples.
    pub obs_scatter_dex: f64,

    pub model_spec: ModelSpec,

    pub logm_crit_min: f64,
    pub logm_crit_max: f64,
    pub logm_crit_steps: usize,
    pub slope_lo_min: f64,
    pub slope_lo_max: f64,
    pub slope_lo_steps: usize,

    pub top_n: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_results: Option<PathBuf>,
    pub debug_bundle: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            csv_path: None,
            zobs: 0.0,
            sample_count: 150,
            sample_seed: 42,
            logm_min: 10.5,
            logm_max: 14.5,
            obs_scatter_dex: 0.15,
            model_spec: ModelSpec::Auto,
            logm_crit_min: 10.9,
            logm_crit_max: 12.1,
            logm_crit_steps: 13,
            slope_lo_min: 2.4,
            slope_lo_max: 4.2,
            slope_lo_steps: 7,
            top_n: 15,
            plot: true,
            plot_width: 100,
            plot_height: 25,
            export_results: None,
            debug_bundle: false,
        }
    }
}

/// A saved halo history file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryFile {
    pub tool: String,
    pub generated: String,
    pub zobs: f64,
    pub logm0: f64,
    /// Resolved MAH sigmoid parameters.
    pub logtc: f64,
    pub logtk: f64,
    pub dlogm_height: f64,
    /// Resolved quenching time (Gyr).
    pub qtime: f64,
    pub mstar_ms: f64,
    pub mstar_q: f64,
    pub grid: HistoryGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryGrid {
    pub t_gyr: Vec<f64>,
    pub logmah: Vec<f64>,
}
