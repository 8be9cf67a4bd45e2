//! Export per-galaxy results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts; truth columns are only populated for synthetic samples.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::GalaxyResidual;
use crate::error::AppError;

/// Write per-galaxy results to a CSV file.
pub fn write_results_csv(path: &Path, residuals: &[GalaxyResidual]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(
        file,
        "id,zobs,logm0,log_mstar_obs,log_mstar_fit,residual_dex,weight,survey,mah_percentile,qtime_gyr,log_mstar_true"
    )
    .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in residuals {
        let p = &r.point;
        writeln!(
            file,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{},{},{},{}",
            p.id,
            p.zobs,
            p.logm0,
            p.log_mstar_obs,
            r.log_mstar_fit,
            r.residual_dex,
            p.weight,
            p.meta.survey.as_deref().unwrap_or(""),
            fmt_opt(p.extras.mah_percentile),
            fmt_opt(p.extras.qtime),
            fmt_opt(p.extras.log_mstar_true),
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}
