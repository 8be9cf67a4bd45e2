//! CSV ingest and normalization.
//!
//! This module turns a galaxy-sample CSV into a clean set of
//! `(logm0, log_mstar, weight, metadata)` points that are safe to fit.
//!
//! Design goals:
//! - **Strict schema** for required fields (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (no hidden randomness)
//! - **Separation of concerns**: no fitting logic here
//!
//! Required columns: `id`, `logm0`, `log_mstar`. Optional: `zobs` (defaults
//! to the run's survey redshift), `weight` (defaults to 1), `survey`.

use std::collections::HashMap;
use std::fs::File;

use csv::StringRecord;

use crate::data::compute_stats;
use crate::domain::{DatasetStats, FitConfig, GalaxyExtras, GalaxyMeta, GalaxyPoint};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub id: Option<String>,
    pub message: String,
}

/// Ingest output: normalized points + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub points: Vec<GalaxyPoint>,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

impl IngestedData {
    /// Wrap an in-memory (synthetic) sample in the same shape the CSV path
    /// produces, so downstream reporting is uniform.
    pub fn from_sample(points: Vec<GalaxyPoint>, stats: DatasetStats) -> Self {
        let rows = points.len();
        Self {
            points,
            stats,
            row_errors: Vec::new(),
            rows_read: rows,
            rows_used: rows,
        }
    }
}

/// Load and normalize a galaxy CSV, applying the halo-mass filter.
pub fn load_galaxy_points(config: &FitConfig) -> Result<IngestedData, AppError> {
    let Some(path) = &config.csv_path else {
        return Err(AppError::new(2, "No CSV path configured for ingest."));
    };
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map, config) {
            Ok(Some(point)) => points.push(point),
            Ok(None) => {} // filtered out by the halo-mass range
            Err((id, message)) => row_errors.push(RowError { line, id, message }),
        }
    }

    let rows_used = points.len();
    if rows_used == 0 {
        return Err(AppError::new(3, "No valid rows remain after normalization/filtering."));
    }

    let stats = compute_stats(&points)
        .ok_or_else(|| AppError::new(3, "No valid points remain after normalization/filtering."))?;

    Ok(IngestedData {
        points,
        stats,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿id"). If we don't strip it, schema validation will
    // incorrectly report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    for col in ["id", "logm0", "log_mstar"] {
        if !header_map.contains_key(col) {
            return Err(AppError::new(2, format!("Missing required column: `{col}`")));
        }
    }
    Ok(())
}

type RowResult = Result<Option<GalaxyPoint>, (Option<String>, String)>;

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>, config: &FitConfig) -> RowResult {
    let id = get_required(record, header_map, "id")
        .map_err(|e| (None, e))?
        .to_string();
    let err = |message: String| (Some(id.clone()), message);

    let logm0 = parse_f64(get_required(record, header_map, "logm0").map_err(&err)?)
        .map_err(|e| err(format!("Bad `logm0`: {e}")))?;
    let log_mstar_obs = parse_f64(get_required(record, header_map, "log_mstar").map_err(&err)?)
        .map_err(|e| err(format!("Bad `log_mstar`: {e}")))?;

    let zobs = match get_optional(record, header_map, "zobs") {
        Some(s) => parse_f64(s).map_err(|e| err(format!("Bad `zobs`: {e}")))?,
        None => config.zobs,
    };
    let weight = match get_optional(record, header_map, "weight") {
        Some(s) => parse_f64(s).map_err(|e| err(format!("Bad `weight`: {e}")))?,
        None => 1.0,
    };
    let survey = get_optional(record, header_map, "survey").map(str::to_string);

    if !(6.0..=18.0).contains(&logm0) {
        return Err(err(format!("logm0={logm0} outside the plausible halo mass range [6, 18].")));
    }
    if !(2.0..=14.0).contains(&log_mstar_obs) {
        return Err(err(format!("log_mstar={log_mstar_obs} outside the plausible range [2, 14].")));
    }
    if !(zobs.is_finite() && zobs >= 0.0) {
        return Err(err(format!("zobs={zobs} must be >= 0.")));
    }
    if !(weight.is_finite() && weight > 0.0) {
        return Err(err(format!("weight={weight} must be > 0.")));
    }

    // Halo-mass range filter (not an error: the row is just out of scope).
    if logm0 < config.logm_min || logm0 > config.logm_max {
        return Ok(None);
    }

    Ok(Some(GalaxyPoint {
        id,
        zobs,
        logm0,
        log_mstar_obs,
        weight,
        meta: GalaxyMeta { survey },
        extras: GalaxyExtras::default(),
    }))
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    match get_optional(record, header_map, name) {
        Some(v) => Ok(v),
        None => Err(format!("Missing `{name}` value.")),
    }
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = *header_map.get(name)?;
    let value = record.get(idx)?.trim();
    if value.is_empty() { None } else { Some(value) }
}

fn parse_f64(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if v.is_finite() { Ok(v) } else { Err(format!("'{s}' is not finite")) }
}
