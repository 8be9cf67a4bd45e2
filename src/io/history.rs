//! Read/write halo history JSON files.
//!
//! History JSON is the "portable" representation of one kernel run:
//! - inputs (`zobs`, `logm0`) and the resolved MAH/quenching parameters
//! - present-day masses
//! - the time grid and log halo mass for quick plotting
//!
//! The schema is defined by `domain::HistoryFile`.

use std::fs::File;
use std::path::Path;

use chrono::Local;

use crate::domain::{HistoryFile, HistoryGrid};
use crate::error::AppError;
use crate::models::MahParams;
use crate::smh::HaloHistory;

/// Build the serializable history record from a kernel run.
pub fn history_file(zobs: f64, logm0: f64, mah_params: &MahParams, history: &HaloHistory) -> HistoryFile {
    HistoryFile {
        tool: "smh".to_string(),
        generated: Local::now().to_rfc3339(),
        zobs,
        logm0,
        logtc: history.logtc,
        logtk: mah_params.logtk,
        dlogm_height: mah_params.dlogm_height,
        qtime: history.qtime,
        mstar_ms: history.stellar.mstar_ms,
        mstar_q: history.stellar.mstar_q,
        grid: HistoryGrid {
            t_gyr: history.time_grid.clone(),
            logmah: history.mah.iter().map(|m| m.log10()).collect(),
        },
    }
}

/// Write a history JSON file.
pub fn write_history_json(path: &Path, history: &HistoryFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create history JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, history)
        .map_err(|e| AppError::new(2, format!("Failed to write history JSON: {e}")))?;
    Ok(())
}

/// Read a history JSON file.
pub fn read_history_json(path: &Path) -> Result<HistoryFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open history JSON '{}': {e}", path.display())))?;
    let history: HistoryFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid history JSON: {e}")))?;
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smh::{KernelConfig, in_situ_history};

    #[test]
    fn history_round_trips_through_json() {
        let run = in_situ_history(0.0, 12.0, &KernelConfig::default()).unwrap();
        let record = history_file(0.0, 12.0, &MahParams::default(), &run);

        let path = std::env::temp_dir().join(format!("smh_history_{}.json", std::process::id()));
        write_history_json(&path, &record).unwrap();
        let loaded = read_history_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.tool, "smh");
        assert_eq!(loaded.logm0, 12.0);
        assert_eq!(loaded.grid.t_gyr.len(), loaded.grid.logmah.len());
        assert_eq!(loaded.mstar_ms, run.stellar.mstar_ms);
        assert_eq!(loaded.grid.logmah[loaded.grid.logmah.len() - 1], run.mah[run.mah.len() - 1].log10());
    }

    #[test]
    fn reading_a_missing_file_is_a_usage_error() {
        let err = read_history_json(Path::new("/nonexistent/smh_history.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
