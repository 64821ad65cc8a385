//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the target catalogue
//! - runs the per-target pipeline (analyse and/or process)
//! - writes the aggregate metrics export
//! - prints the batch summary

use clap::Parser;
use tracing::{info, warn};

use crate::cli::{BatchArgs, Command};
use crate::domain::{FlattenConfig, PipelineConfig, SelectionConfig, Stage, TargetReport};
use crate::engine::{CommandEngine, FittingEngine};
use crate::error::AppError;
use crate::io::{load_catalogue, write_metrics_csv};

pub mod pipeline;

/// Entry point for the `ebflat` binary.
pub fn run() -> Result<(), AppError> {
    // We want `ebflat` and `ebflat my_targets.csv --overwrite` to behave like
    // `ebflat run ...`. Clap requires a subcommand name, so we rewrite argv
    // before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let (stage, args) = match cli.command {
        Command::Run(args) => (Stage::Run, args),
        Command::Analyse(args) => (Stage::Analyse, args),
        Command::Process(args) => (Stage::Process, args),
    };
    let config = pipeline_config_from_args(stage, &args);
    let engine = resolve_engine(&args, &config)?;

    let reports = run_pipeline(&config, engine.as_ref().map(|e| e as &dyn FittingEngine))?;
    println!("{}", crate::report::format_batch_summary(&reports, config.stage));
    Ok(())
}

/// Load the catalogue, run the batch and write the aggregate export.
///
/// Only catalogue problems are fatal; per-target failures are in the reports.
pub fn run_pipeline(
    config: &PipelineConfig,
    engine: Option<&dyn FittingEngine>,
) -> Result<Vec<TargetReport>, AppError> {
    let catalogue = load_catalogue(config)?;
    info!(
        catalogue = %config.catalogue_path.display(),
        rows_read = catalogue.rows_read,
        targets = catalogue.rows.len(),
        skipped_rows = catalogue.row_errors.len(),
        "loaded target catalogue"
    );

    let reports = pipeline::run_batch(config, &catalogue.rows, engine)?;

    if config.stage.processes() && !config.simulate {
        let metrics: Vec<_> = reports.iter().flat_map(|r| r.metrics.iter().cloned()).collect();
        let path = config.aggregate_metrics_path();
        write_metrics_csv(&path, &metrics)?;
        info!(path = %path.display(), sectors = metrics.len(), "wrote aggregate variability metrics");
    }

    Ok(reports)
}

/// Resolve the fitting engine from `--engine` or `EBFLAT_ENGINE`.
///
/// The engine is only required when the analyse phase will actually call it.
fn resolve_engine(args: &BatchArgs, config: &PipelineConfig) -> Result<Option<CommandEngine>, AppError> {
    let engine = match &args.engine {
        Some(program) => {
            let mut parts = program.split_whitespace().map(str::to_string);
            parts
                .next()
                .map(|p| CommandEngine::new(p).with_args(parts.collect()))
        }
        None => CommandEngine::from_env(),
    };

    if engine.is_none() && config.stage.analyses() && !config.simulate {
        return Err(AppError::new(
            2,
            "No fitting engine configured: pass --engine <PROGRAM> or set EBFLAT_ENGINE.",
        ));
    }
    if let Some(e) = &engine {
        info!(engine = %e.program().display(), "using fitting engine");
    }
    Ok(engine)
}

pub fn pipeline_config_from_args(stage: Stage, args: &BatchArgs) -> PipelineConfig {
    let mut config = PipelineConfig::new(&args.catalogue, &args.catalogue_dir);
    config.stage = stage;
    config.index_col = args.index_col.clone();
    config.tic_col = args.tic_col.clone();
    config.period_col = args.period_col.clone();
    config.targets = args.targets.clone();
    config.sort_by = args.sort_by.clone();
    config.overwrite = args.overwrite;
    config.pool_size = args.pool_size;
    config.simulate = args.simulate;
    config.quality_bitmask = args.quality_bitmask;
    config.plot = !args.no_plot;
    config.selection = SelectionConfig {
        noise_threshold: args.noise_threshold,
        noise_penalty: args.noise_penalty,
        ..SelectionConfig::default()
    };
    config.flatten = FlattenConfig {
        window_length: args.window_length,
        polyorder: args.polyorder,
        ..FlattenConfig::default()
    };

    config.duration_scale = if args.duration_scale.is_finite() && args.duration_scale > 0.0 {
        args.duration_scale
    } else {
        warn!(
            duration_scale = args.duration_scale,
            "ignoring non-positive duration scale; using 1.0"
        );
        1.0
    };
    config
}

/// Rewrite argv so `ebflat` defaults to `ebflat run`.
///
/// Rules:
/// - `ebflat`                        -> `ebflat run`
/// - `ebflat targets.csv ...`        -> `ebflat run targets.csv ...`
/// - `ebflat --overwrite ...`        -> `ebflat run --overwrite ...`
/// - `ebflat --help/--version/-h`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    let is_subcommand = matches!(arg1.as_str(), "run" | "analyse" | "process");
    if is_top_level_help_or_version || is_subcommand {
        return argv;
    }

    argv.insert(1, "run".to_string());
    argv
}
