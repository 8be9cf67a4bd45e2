//! Debug bundle writer for inspecting samples, dictionaries, and fit variants.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

use crate::app::pipeline::RunOutput;
use crate::domain::FitConfig;
use crate::error::AppError;
use crate::fit::fitted_smhm_curve;
use crate::models::{EfficiencyParams, MahParams, QuenchingParams};
use crate::params::ParamSet;

pub fn write_debug_bundle(run: &RunOutput, config: &FitConfig) -> Result<PathBuf, AppError> {
    let dir = PathBuf::from("debug");
    create_dir_all(&dir).map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("smh_debug_z{:.2}_seed{}_{ts}.md", config.zobs, config.sample_seed));

    let mut file =
        File::create(&path).map_err(|e| AppError::new(4, format!("Failed to create debug file: {e}")))?;

    writeln!(file, "# smh debug bundle")
        .map_err(|e| AppError::new(4, format!("Failed to write debug header: {e}")))?;
    writeln!(file, "- generated: {}", Local::now().to_rfc3339())
        .map_err(|e| AppError::new(4, format!("Failed to write debug header: {e}")))?;
    writeln!(file, "- zobs: {}", config.zobs)
        .map_err(|e| AppError::new(4, format!("Failed to write debug header: {e}")))?;
    match &config.csv_path {
        Some(p) => writeln!(file, "- input: {}", p.display())
            .map_err(|e| AppError::new(4, format!("Failed to write debug header: {e}")))?,
        None => writeln!(
            file,
            "- sample: synthetic, n={}, seed={}, obs_scatter={} dex",
            config.sample_count, config.sample_seed, config.obs_scatter_dex
        )
        .map_err(|e| AppError::new(4, format!("Failed to write debug header: {e}")))?,
    }
    writeln!(
        file,
        "- shape grid: logm_crit=[{}, {}] x{}, slope_lo=[{}, {}] x{}",
        config.logm_crit_min,
        config.logm_crit_max,
        config.logm_crit_steps,
        config.slope_lo_min,
        config.slope_lo_max,
        config.slope_lo_steps
    )
    .map_err(|e| AppError::new(4, format!("Failed to write debug header: {e}")))?;

    writeln!(file, "\n## Default parameter dictionaries")
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    write_param_dict(&mut file, &MahParams::default())?;
    write_param_dict(&mut file, &EfficiencyParams::default())?;
    write_param_dict(&mut file, &QuenchingParams::default())?;

    writeln!(file, "\n## Sample points (n={})", run.ingest.stats.n_points)
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    writeln!(file, "| id | logm0 | log_mstar_obs | percentile | qtime |")
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    writeln!(file, "| - | - | - | - | - |")
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    for p in &run.ingest.points {
        writeln!(
            file,
            "| {} | {:.4} | {:.4} | {} | {} |",
            p.id,
            p.logm0,
            p.log_mstar_obs,
            fmt_opt(p.extras.mah_percentile),
            fmt_opt(p.extras.qtime)
        )
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    }

    writeln!(file, "\n## Fits")
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    writeln!(file, "| model | sse | rmse_dex | bic | eff_norm_0 | eff_norm_z | logm_crit_0 | slope_lo_0 |")
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    writeln!(file, "| - | - | - | - | - | - | - | - |")
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    for fit in &run.selection.fits {
        writeln!(
            file,
            "| {} | {:.6e} | {:.6} | {:.3} | {:.6} | {:.6} | {:.4} | {:.4} |",
            fit.model.display_name,
            fit.quality.sse,
            fit.quality.rmse_dex,
            fit.quality.bic,
            fit.model.eff_norm_0,
            fit.model.eff_norm_z,
            fit.model.logm_crit_0,
            fit.model.slope_lo_0
        )
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    }
    for (kind, reason) in &run.selection.skipped {
        writeln!(file, "- skipped {}: {}", kind.display_name(), reason)
            .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    }

    writeln!(file, "\n## Fitted SMHM curves")
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    writeln!(file, "| logm0 | {} |", fit_headers(run))
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    writeln!(file, "| - | {} |", run.selection.fits.iter().map(|_| "-").collect::<Vec<_>>().join(" | "))
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;

    let n_grid = 17;
    let mut curves = Vec::new();
    for fit in &run.selection.fits {
        curves.push(fitted_smhm_curve(
            &fit.model,
            config.zobs,
            run.ingest.stats.logm0_min,
            run.ingest.stats.logm0_max,
            n_grid,
        )?);
    }
    for i in 0..n_grid {
        let logm0 = curves.first().map(|c| c[i].0).unwrap_or(0.0);
        let row: Vec<String> = curves.iter().map(|c| format!("{:.4}", c[i].1)).collect();
        writeln!(file, "| {:.3} | {} |", logm0, row.join(" | "))
            .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    }

    Ok(path)
}

fn write_param_dict(file: &mut File, dict: &dyn ParamSet) -> Result<(), AppError> {
    writeln!(file, "\n### {}", dict.model_name())
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    writeln!(file, "| key | value |")
        .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    writeln!(file, "| - | - |").map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    for key in dict.keys() {
        let value = dict.get(key).unwrap_or(f64::NAN);
        writeln!(file, "| {key} | {value} |")
            .map_err(|e| AppError::new(4, format!("Failed to write debug: {e}")))?;
    }
    Ok(())
}

fn fit_headers(run: &RunOutput) -> String {
    run.selection
        .fits
        .iter()
        .map(|f| f.model.display_name.clone())
        .collect::<Vec<_>>()
        .join(" | ")
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.4}"),
        _ => "-".to_string(),
    }
}
