//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - generates or ingests galaxy samples
//! - runs calibration + model selection
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, CommonFitArgs, FitArgs, HistoryArgs, PlotArgs, SurveyArgs};
use crate::domain::FitConfig;
use crate::error::AppError;
use crate::models::MahParams;
use crate::params::Overrides;
use crate::smh::KernelConfig;

pub mod pipeline;

/// Entry point for the `smh` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Survey(args) => handle_survey(args),
        Command::Fit(args) => handle_fit(args),
        Command::History(args) => handle_history(args),
        Command::Plot(args) => handle_plot(args),
    }
}

fn handle_survey(args: SurveyArgs) -> Result<(), AppError> {
    let config = survey_config_from_args(&args);
    let run = pipeline::run_survey(&config)?;
    print_run(&run, &config)
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = csv_config_from_args(&args);
    let run = pipeline::run_fit_from_csv(&config)?;
    crate::report::warn_row_errors(&run.ingest)?;
    print_run(&run, &config)
}

fn print_run(run: &pipeline::RunOutput, config: &FitConfig) -> Result<(), AppError> {
    println!(
        "{}",
        crate::report::format_run_summary(&run.ingest, &run.selection, config)
    );
    println!("{}", crate::report::format_rankings(&run.rankings));

    if config.plot {
        let curve = crate::fit::fitted_smhm_curve(
            &run.selection.best.model,
            config.zobs,
            run.ingest.stats.logm0_min,
            run.ingest.stats.logm0_max,
            config.plot_width.max(2),
        )?;
        let plot = crate::plot::render_smhm_plot(
            &run.residuals,
            &curve,
            config.plot_width,
            config.plot_height,
            Some(&run.rankings),
        );
        println!("{plot}");
    }

    if let Some(path) = &config.export_results {
        crate::io::export::write_results_csv(path, &run.residuals)?;
    }
    if config.debug_bundle {
        let path = crate::debug::write_debug_bundle(run, config)?;
        println!("Debug bundle written to {}", path.display());
    }

    Ok(())
}

fn handle_history(args: HistoryArgs) -> Result<(), AppError> {
    let kernel_cfg = KernelConfig {
        logtc: args.logtc,
        mah_percentile: args.percentile,
        qtime: args.qtime,
        overrides: Overrides::new(),
        ..KernelConfig::default()
    };
    let history = crate::smh::in_situ_history(args.zobs, args.logm0, &kernel_cfg)?;

    println!(
        "{}",
        crate::report::format_history_summary(args.zobs, args.logm0, &history)
    );

    let record = crate::io::history::history_file(args.zobs, args.logm0, &MahParams::default(), &history);
    if let Some(path) = &args.export_history {
        crate::io::history::write_history_json(path, &record)?;
    }

    if args.plot && !args.no_plot {
        let plot = crate::plot::render_history_plot(&record, args.width, args.height);
        println!("{plot}");
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let history = crate::io::history::read_history_json(&args.history)?;
    let plot = crate::plot::render_history_plot(&history, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn survey_config_from_args(args: &SurveyArgs) -> FitConfig {
    FitConfig {
        csv_path: None,
        sample_count: args.sample_count,
        sample_seed: args.seed,
        obs_scatter_dex: args.obs_scatter,
        ..common_config(&args.common)
    }
}

fn csv_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        csv_path: Some(args.csv.clone()),
        ..common_config(&args.common)
    }
}

fn common_config(common: &CommonFitArgs) -> FitConfig {
    FitConfig {
        zobs: common.zobs,
        model_spec: common.model,
        logm_min: common.logm_min,
        logm_max: common.logm_max,
        logm_crit_min: common.logm_crit_min,
        logm_crit_max: common.logm_crit_max,
        logm_crit_steps: common.logm_crit_steps,
        slope_lo_min: common.slope_lo_min,
        slope_lo_max: common.slope_lo_max,
        slope_lo_steps: common.slope_lo_steps,
        top_n: common.top,
        plot: common.plot && !common.no_plot,
        plot_width: common.width,
        plot_height: common.height,
        export_results: common.export.clone(),
        debug_bundle: common.debug_bundle,
        ..FitConfig::default()
    }
}
