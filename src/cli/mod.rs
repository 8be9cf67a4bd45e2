//! Command-line parsing for the stellar-mass-history calibration tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::ModelSpec;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "smh", version, about = "In-situ stellar mass from halo accretion histories")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a synthetic galaxy survey, calibrate the efficiency model,
    /// print diagnostics/rankings, and optionally plot/export.
    Survey(SurveyArgs),
    /// Calibrate against an observed galaxy sample CSV.
    Fit(FitArgs),
    /// Compute one halo's history and present-day stellar masses.
    History(HistoryArgs),
    /// Plot a previously exported halo history JSON.
    Plot(PlotArgs),
}

/// Options shared by survey generation and CSV fitting.
#[derive(Debug, Parser, Clone)]
pub struct CommonFitArgs {
    /// Observation redshift (also the default for CSV rows without `zobs`).
    #[arg(short = 'z', long, default_value_t = 0.0)]
    pub zobs: f64,

    /// Which model(s) to calibrate.
    #[arg(long, value_enum, default_value_t = ModelSpec::Auto)]
    pub model: ModelSpec,

    /// Minimum halo mass (log10 Msun).
    #[arg(long, default_value_t = 10.5)]
    pub logm_min: f64,

    /// Maximum halo mass (log10 Msun).
    #[arg(long, default_value_t = 14.5)]
    pub logm_max: f64,

    /// Minimum characteristic mass (log10 Msun) for the shape grid.
    #[arg(long, default_value_t = 10.9)]
    pub logm_crit_min: f64,

    /// Maximum characteristic mass (log10 Msun) for the shape grid.
    #[arg(long, default_value_t = 12.1)]
    pub logm_crit_max: f64,

    /// Shape-grid steps in characteristic mass.
    #[arg(long, default_value_t = 13)]
    pub logm_crit_steps: usize,

    /// Minimum low-mass slope for the shape grid.
    #[arg(long, default_value_t = 2.4)]
    pub slope_lo_min: f64,

    /// Maximum low-mass slope for the shape grid.
    #[arg(long, default_value_t = 4.2)]
    pub slope_lo_max: f64,

    /// Shape-grid steps in low-mass slope.
    #[arg(long, default_value_t = 7)]
    pub slope_lo_steps: usize,

    /// Show top-N over- and under-massive galaxies.
    #[arg(long, default_value_t = 15)]
    pub top: usize,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export per-galaxy results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Write a markdown debug bundle under ./debug.
    #[arg(long)]
    pub debug_bundle: bool,
}

/// Options for `smh survey`.
#[derive(Debug, Parser, Clone)]
pub struct SurveyArgs {
    /// Number of synthetic galaxies to generate.
    #[arg(short = 'n', long, default_value_t = 150)]
    pub sample_count: usize,

    /// Random seed for sample generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Lognormal observational scatter (dex) on stellar masses.
    #[arg(long, default_value_t = 0.15)]
    pub obs_scatter: f64,

    #[command(flatten)]
    pub common: CommonFitArgs,
}

/// Options for `smh fit`.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Galaxy sample CSV (columns: id, logm0, log_mstar[, zobs, weight, survey]).
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,

    #[command(flatten)]
    pub common: CommonFitArgs,
}

/// Options for `smh history`.
#[derive(Debug, Parser)]
pub struct HistoryArgs {
    /// Observation redshift.
    #[arg(short = 'z', long, default_value_t = 0.0)]
    pub zobs: f64,

    /// Halo mass at the observation epoch (log10 Msun).
    #[arg(short = 'm', long)]
    pub logm0: f64,

    /// Explicit MAH transition time (mutually exclusive with --percentile).
    #[arg(long)]
    pub logtc: Option<f64>,

    /// Formation-time percentile in [0, 1] (mutually exclusive with --logtc).
    #[arg(long)]
    pub percentile: Option<f64>,

    /// Explicit quenching time (Gyr); defaults to the mass-dependent median.
    #[arg(long)]
    pub qtime: Option<f64>,

    /// Export the history to JSON.
    #[arg(long = "export-history")]
    pub export_history: Option<PathBuf>,

    /// Render an ASCII plot of the mass history.
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for plotting a saved history.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// History JSON file produced by `smh history --export-history`.
    #[arg(long, value_name = "JSON")]
    pub history: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
