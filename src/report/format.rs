//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{FitConfig, GalaxyResidual};
use crate::error::AppError;
use crate::fit::FitSelection;
use crate::io::ingest::IngestedData;
use crate::report::Rankings;
use crate::smh::HaloHistory;

/// Format the full run summary (dataset stats + fit diagnostics + chosen model).
pub fn format_run_summary(ingest: &IngestedData, selection: &FitSelection, config: &FitConfig) -> String {
    let mut out = String::new();

    out.push_str("=== smh - Stellar Mass vs Halo Mass Calibration ===\n");
    match &config.csv_path {
        Some(path) => out.push_str(&format!("Input: {}\n", path.display())),
        None => out.push_str(&format!(
            "Sample: synthetic | n={} | seed={}\n",
            config.sample_count, config.sample_seed
        )),
    }
    out.push_str(&format!("zobs: {:.3}\n", config.zobs));
    out.push_str(&format!(
        "Points: n={} (read {}, dropped {}) | logm0=[{:.2}, {:.2}] | log M*=[{:.2}, {:.2}]\n",
        ingest.stats.n_points,
        ingest.rows_read,
        ingest.row_errors.len(),
        ingest.stats.logm0_min,
        ingest.stats.logm0_max,
        ingest.stats.log_mstar_min,
        ingest.stats.log_mstar_max
    ));

    out.push_str("\nModel diagnostics:\n");
    for fit in &selection.fits {
        let chosen = if fit.model.name == selection.best.model.name { "*" } else { " " };
        out.push_str(&format!(
            "{chosen} {:<10} SSE={:.4e} RMSE={:.4}dex BIC={:.3}\n",
            fit.model.display_name, fit.quality.sse, fit.quality.rmse_dex, fit.quality.bic
        ));
    }
    for (kind, reason) in &selection.skipped {
        out.push_str(&format!("  (skipped {}) {reason}\n", kind.display_name()));
    }

    let best = &selection.best.model;
    out.push_str("\nChosen model:\n");
    out.push_str(&format!("- {} (kind={:?})\n", best.display_name, best.name));
    out.push_str(&format!(
        "- eff_norm_0={:.6} eff_norm_z={:.6}\n",
        best.eff_norm_0, best.eff_norm_z
    ));
    out.push_str(&format!(
        "- logm_crit_0={:.4} slope_lo_0={:.4}\n",
        best.logm_crit_0, best.slope_lo_0
    ));
    out.push('\n');

    out
}

/// Format the over/under-massive tables.
pub fn format_rankings(rankings: &Rankings) -> String {
    let mut out = String::new();

    out.push_str("Most over-massive (positive residual):\n");
    out.push_str(&format_table(&rankings.over));
    out.push('\n');

    out.push_str("Most under-massive (negative residual):\n");
    out.push_str(&format_table(&rankings.under));

    out
}

/// One-halo summary for `smh history`.
pub fn format_history_summary(zobs: f64, logm0: f64, history: &HaloHistory) -> String {
    let mut out = String::new();
    out.push_str("=== smh - Halo History ===\n");
    out.push_str(&format!("zobs: {zobs:.3} | logm0: {logm0:.3}\n"));
    out.push_str(&format!(
        "logtc: {:.4} | qtime: {:.3} Gyr\n",
        history.logtc, history.qtime
    ));
    out.push_str(&format!(
        "mstar_ms: {:.4e} Msun (log10 {:.4})\n",
        history.stellar.mstar_ms,
        history.stellar.mstar_ms.log10()
    ));
    out.push_str(&format!(
        "mstar_q : {:.4e} Msun (log10 {:.4})\n",
        history.stellar.mstar_q,
        history.stellar.mstar_q.log10()
    ));
    let suppression = history.stellar.mstar_q / history.stellar.mstar_ms;
    out.push_str(&format!("quenching suppression: {suppression:.4}\n"));
    out
}

/// Echo row-level ingest problems to stderr (kept terse on purpose).
pub fn warn_row_errors(ingest: &IngestedData) -> Result<(), AppError> {
    for e in &ingest.row_errors {
        match &e.id {
            Some(id) => eprintln!("warning: line {} ({id}): {}", e.line, e.message),
            None => eprintln!("warning: line {}: {}", e.line, e.message),
        }
    }
    Ok(())
}

fn format_table(rows: &[GalaxyResidual]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<12} {:>8} {:>12} {:>12} {:>10} {:<12}\n",
            "id", "logm0", "log_mstar", "fit", "resid_dex", "survey"
        )
        .trim_end(),
    );
    out.push('\n');

    out.push_str(format!("{:-<12} {:-<8} {:-<12} {:-<12} {:-<10} {:-<12}\n", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for r in rows {
        let p = &r.point;
        out.push_str(
            format!(
                "{:<12} {:>8.3} {:>12.4} {:>12.4} {:>10.4} {:<12}\n",
                truncate(&p.id, 12),
                p.logm0,
                p.log_mstar_obs,
                r.log_mstar_fit,
                r.residual_dex,
                truncate(p.meta.survey.as_deref().unwrap_or(""), 12),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GalaxyExtras, GalaxyMeta, GalaxyPoint};

    #[test]
    fn rankings_table_contains_ids_and_columns() {
        let rankings = Rankings {
            over: vec![GalaxyResidual {
                point: GalaxyPoint {
                    id: "GAL-0001".to_string(),
                    zobs: 0.0,
                    logm0: 12.0,
                    log_mstar_obs: 10.8,
                    weight: 1.0,
                    meta: GalaxyMeta {
                        survey: Some("synthetic".to_string()),
                    },
                    extras: GalaxyExtras::default(),
                },
                log_mstar_fit: 10.4,
                residual_dex: 0.4,
            }],
            under: vec![],
        };

        let text = format_rankings(&rankings);
        assert!(text.contains("GAL-0001"));
        assert!(text.contains("resid_dex"));
        assert!(text.contains("over-massive"));
    }

    #[test]
    fn truncate_shortens_long_names() {
        assert_eq!(truncate("short", 12), "short");
        let long = truncate("a-very-long-galaxy-name", 12);
        assert_eq!(long.chars().count(), 12);
        assert!(long.ends_with('.'));
    }
}
