//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed galaxies: `o`
//! - fitted median curve: `-` line
//! - optional highlights: `O` (over-massive), `U` (under-massive)

use std::collections::HashSet;

use crate::domain::{GalaxyResidual, HistoryFile};
use crate::report::Rankings;

/// Render the stellar-mass–halo-mass plane with the fitted median curve.
pub fn render_smhm_plot(
    residuals: &[GalaxyResidual],
    curve: &[(f64, f64)],
    width: usize,
    height: usize,
    rankings: Option<&Rankings>,
) -> String {
    let (x_min, x_max) = logm0_range_from_residuals(residuals)
        .or_else(|| x_range_from_curve(curve))
        .unwrap_or((10.0, 15.0));

    render_plot(
        residuals,
        if curve.is_empty() { None } else { Some(curve) },
        x_min,
        x_max,
        width,
        height,
        rankings,
        &format!("Plot: logm0=[{x_min:.3}, {x_max:.3}]"),
        "log M*",
    )
}

/// Render a saved halo history (log halo mass vs cosmic time).
pub fn render_history_plot(history: &HistoryFile, width: usize, height: usize) -> String {
    let curve: Vec<(f64, f64)> = history
        .grid
        .t_gyr
        .iter()
        .zip(history.grid.logmah.iter())
        .map(|(&t, &logm)| (t, logm))
        .collect();

    let (x_min, x_max) = x_range_from_curve(&curve).unwrap_or((0.1, 13.8));
    render_plot(
        &[],
        Some(&curve),
        x_min,
        x_max,
        width,
        height,
        None,
        &format!("Plot: t=[{x_min:.3}, {x_max:.3}] Gyr"),
        "log10 M_halo",
    )
}

#[allow(clippy::too_many_arguments)]
fn render_plot(
    residuals: &[GalaxyResidual],
    curve: Option<&[(f64, f64)]>,
    x_min: f64,
    x_max: f64,
    width: usize,
    height: usize,
    rankings: Option<&Rankings>,
    x_label: &str,
    y_label: &str,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    // Determine y-range from observed points and curve points.
    let (y_min, y_max) = y_range(residuals, curve).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curve first (so points can overlay).
    if let Some(curve) = curve {
        draw_curve(&mut grid, curve, x_min, x_max, y_min, y_max);
    }

    // Highlight sets (ids).
    let (over_ids, under_ids): (HashSet<String>, HashSet<String>) = rankings
        .map(|r| {
            (
                r.over.iter().map(|x| x.point.id.clone()).collect(),
                r.under.iter().map(|x| x.point.id.clone()).collect(),
            )
        })
        .unwrap_or_else(|| (HashSet::new(), HashSet::new()));

    for r in residuals {
        let x = map_x(r.point.logm0, x_min, x_max, width);
        let y = map_y(r.point.log_mstar_obs, y_min, y_max, height);

        let ch = if over_ids.contains(&r.point.id) {
            'O'
        } else if under_ids.contains(&r.point.id) {
            'U'
        } else {
            'o'
        };

        grid[y][x] = ch;
    }

    // Build final string. We include a small header with ranges.
    let mut out = String::new();
    out.push_str(&format!("{x_label} | {y_label}=[{y_min:.2}, {y_max:.2}]\n"));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn logm0_range_from_residuals(residuals: &[GalaxyResidual]) -> Option<(f64, f64)> {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for r in residuals {
        min_x = min_x.min(r.point.logm0);
        max_x = max_x.max(r.point.logm0);
    }
    if min_x.is_finite() && max_x.is_finite() && max_x > min_x {
        Some((min_x, max_x))
    } else {
        None
    }
}

fn x_range_from_curve(curve: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for &(x, _) in curve {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }
    if min_x.is_finite() && max_x.is_finite() && max_x > min_x {
        Some((min_x, max_x))
    } else {
        None
    }
}

fn y_range(residuals: &[GalaxyResidual], curve: Option<&[(f64, f64)]>) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for r in residuals {
        min_y = min_y.min(r.point.log_mstar_obs);
        max_y = max_y.max(r.point.log_mstar_obs);
    }
    if let Some(curve) = curve {
        for &(_, y) in curve {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        let xx = map_x(x, x_min, x_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, xx, yy, '-');
        } else {
            grid[yy][xx] = '-';
        }
        prev = Some((xx, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GalaxyExtras, GalaxyMeta, GalaxyPoint, HistoryGrid};

    fn residual(id: &str, logm0: f64, log_mstar_obs: f64) -> GalaxyResidual {
        GalaxyResidual {
            point: GalaxyPoint {
                id: id.to_string(),
                zobs: 0.0,
                logm0,
                log_mstar_obs,
                weight: 1.0,
                meta: GalaxyMeta::default(),
                extras: GalaxyExtras::default(),
            },
            log_mstar_fit: log_mstar_obs,
            residual_dex: 0.0,
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let points = vec![residual("G1", 11.0, 10.0), residual("G2", 13.0, 11.0)];
        let curve = vec![(11.0, 10.0), (13.0, 10.0)];

        let txt = render_smhm_plot(&points, &curve, 10, 5, None);
        let expected = concat!(
            "Plot: logm0=[11.000, 13.000] | log M*=[9.95, 11.05]\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn rankings_highlight_markers() {
        let points = vec![residual("G1", 11.0, 10.0), residual("G2", 13.0, 11.0)];
        let rankings = Rankings {
            over: vec![points[1].clone()],
            under: vec![points[0].clone()],
        };
        let txt = render_smhm_plot(&points, &[], 20, 8, Some(&rankings));
        assert!(txt.contains('O'));
        assert!(txt.contains('U'));
        // Every point is ranked, so no plain markers remain in the grid body.
        assert!(txt.lines().skip(1).all(|line| !line.contains('o')));
    }

    #[test]
    fn history_plot_draws_the_mass_curve() {
        let history = HistoryFile {
            tool: "smh".to_string(),
            generated: String::new(),
            zobs: 0.0,
            logm0: 12.0,
            logtc: 0.3,
            logtk: 7.0,
            dlogm_height: 6.0,
            qtime: 10.0,
            mstar_ms: 1e10,
            mstar_q: 5e9,
            grid: HistoryGrid {
                t_gyr: vec![1.0, 5.0, 9.0, 13.0],
                logmah: vec![8.0, 10.0, 11.5, 12.0],
            },
        };
        let txt = render_history_plot(&history, 30, 10);
        assert!(txt.starts_with("Plot: t=[1.000, 13.000] Gyr"));
        assert!(txt.contains('-'));
    }
}
