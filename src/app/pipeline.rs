//! Shared "calibration pipeline" logic used by the CLI front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! sample generation/ingest -> fit/search -> selection -> residuals -> rankings

use crate::data::generate_sample;
use crate::domain::{FitConfig, GalaxyResidual};
use crate::error::AppError;
use crate::fit::selection::{FitSelection, fit_and_select};
use crate::io::ingest::{IngestedData, load_galaxy_points};
use crate::report::Rankings;

/// All computed outputs of a single calibration run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub selection: FitSelection,
    pub residuals: Vec<GalaxyResidual>,
    pub rankings: Rankings,
}

/// Execute the full pipeline on a synthetic survey.
pub fn run_survey(config: &FitConfig) -> Result<RunOutput, AppError> {
    // 1) Generate the mock sample.
    let sample = generate_sample(config)?;
    let ingest = IngestedData::from_sample(sample.points, sample.stats);
    finish_run(ingest, config)
}

/// Execute the full pipeline on an ingested galaxy CSV.
pub fn run_fit_from_csv(config: &FitConfig) -> Result<RunOutput, AppError> {
    let ingest = load_galaxy_points(config)?;
    finish_run(ingest, config)
}

fn finish_run(ingest: IngestedData, config: &FitConfig) -> Result<RunOutput, AppError> {
    // 2) Fit curves and select the best model per config.
    let selection = fit_and_select(&ingest.points, config)?;

    // 3) Compute residuals and rankings.
    let residuals = crate::report::compute_residuals(&ingest.points, &selection.best)?;
    let rankings = crate::report::rank_over_under(&residuals, config.top_n);

    Ok(RunOutput {
        ingest,
        selection,
        residuals,
        rankings,
    })
}
