//! Per-target batch pipeline shared by the `run`, `analyse` and `process` commands.
//!
//! Each target walks a small state machine:
//!
//! `Pending → {Skipped, Analysing → {Analysed | Simulated | NoData | Failed}} → Processed`
//!
//! Targets are independent: each one owns its own output subtree
//! (`analysis/<tic>_analysis/`, `plots/<target>/`), so the batch fans out over a
//! rayon pool without any shared mutable state. Per-target failures are recorded
//! in the target's report and never abort the batch.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::domain::{
    Ephemeris, PipelineConfig, SectorMetrics, TargetReport, TargetRow, TargetState, file_stem,
};
use crate::engine::{EngineRequest, FittingEngine};
use crate::ephemeris::load_ephemeris;
use crate::epochs::{find_epoch_files, scan_epochs, select_epochs};
use crate::error::{AppError, PipelineError};
use crate::io::{
    echo_analysis_log, load_light_curve, write_ephemeris_json, write_metrics_csv,
};
use crate::lightcurve::{eclipse_mask, flatten, normalize, validate_period, variability_metric};
use crate::plot::render_diagnostic_plot;
use crate::report::{format_ephemeris, format_selection};

/// Run every target through the configured stage(s).
///
/// `pool_size <= 1` runs inline on the calling thread; otherwise a dedicated
/// rayon pool of `pool_size` threads is used. Reports come back in input order.
pub fn run_batch(
    config: &PipelineConfig,
    rows: &[TargetRow],
    engine: Option<&dyn FittingEngine>,
) -> Result<Vec<TargetReport>, AppError> {
    let total = rows.len();
    let task = |(i, row): (usize, &TargetRow)| run_target(config, row, engine, i + 1, total);

    if config.pool_size <= 1 {
        return Ok(rows.iter().enumerate().map(task).collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.pool_size)
        .build()
        .map_err(|e| AppError::new(4, format!("Failed to start worker pool: {e}")))?;
    Ok(pool.install(|| rows.par_iter().enumerate().map(task).collect()))
}

/// Drive one target through analysis and/or processing.
pub fn run_target(
    config: &PipelineConfig,
    row: &TargetRow,
    engine: Option<&dyn FittingEngine>,
    position: usize,
    total: usize,
) -> TargetReport {
    info!(
        target_name = %row.name,
        tic = row.tic,
        "processing target ({position}/{total})"
    );
    let mut report = TargetReport::new(row);

    if config.stage.analyses() {
        analyse_target(config, row, engine, &mut report);
    }

    // simulated, failed and empty targets have nothing to process
    let ready = matches!(
        report.state,
        TargetState::Pending | TargetState::Skipped | TargetState::Analysed
    );
    if config.stage.processes() && ready {
        if config.simulate {
            info!(
                target_name = %row.name,
                plots = %config.plots_dir(&row.name).display(),
                "simulate: target would be processed"
            );
        } else {
            process_target(config, row, &mut report);
        }
    }

    debug!(target_name = %row.name, state = report.state.label(), "target finished");
    report
}

/// Analysis phase: marker check, epoch scan, selection and the engine call.
///
/// Leaves the report in its post-analysis state with the number of epochs
/// selected.
pub fn analyse_target(
    config: &PipelineConfig,
    row: &TargetRow,
    engine: Option<&dyn FittingEngine>,
    report: &mut TargetReport,
) {
    let marker = config.analysis_summary(row.tic);
    if marker.exists() && !config.overwrite {
        info!(
            target_name = %row.name,
            marker = %marker.display(),
            "analysis summary already exists; skipping analysis"
        );
        report.state = TargetState::Skipped;
        return;
    }
    report.state = TargetState::Analysing;
    debug!(target_name = %row.name, state = report.state.label(), "scanning epochs");

    let epochs = match scan_epochs(&config.download_dir(row.tic)) {
        Ok(epochs) => epochs,
        Err(e) => {
            report.state = failed(row, e);
            return;
        }
    };
    let selected = select_epochs(epochs, row.period, &config.selection);
    if selected.is_empty() {
        warn!(target_name = %row.name, tic = row.tic, "no epoch files found; nothing to analyse");
        report.state = TargetState::NoData;
        return;
    }
    for line in format_selection(&selected).lines() {
        info!(target_name = %row.name, "{line}");
    }

    let request = EngineRequest {
        target: row.name.clone(),
        tic: row.tic,
        epoch_files: selected.iter().map(|e| e.path.clone()).collect(),
        period: row.period,
        save_dir: config.analysis_dir(),
        overwrite: config.overwrite,
    };
    report.epochs_selected = request.epoch_files.len();

    if config.simulate {
        info!(
            target_name = %row.name,
            "simulate: fitting engine would be called with: {}",
            request.to_args().join(" ")
        );
        report.state = TargetState::Simulated;
        return;
    }

    let Some(engine) = engine else {
        let e = PipelineError::ExternalEngine {
            tic: row.tic,
            message: "no fitting engine configured".to_string(),
        };
        report.state = failed(row, e);
        return;
    };

    report.state = match engine.analyse(&request) {
        Ok(()) => {
            if !marker.exists() {
                warn!(
                    target_name = %row.name,
                    marker = %marker.display(),
                    "fitting engine finished but wrote no analysis summary"
                );
            }
            info!(target_name = %row.name, epochs = report.epochs_selected, "analysis complete");
            TargetState::Analysed
        }
        Err(e) => failed(row, e),
    };
}

/// Processing phase: ephemeris, per-sector mask/flatten/score, plots and exports.
///
/// A target without an analysis summary is flagged as missing analysis and left
/// in its current state (`Skipped` when it had not been touched yet).
pub fn process_target(config: &PipelineConfig, row: &TargetRow, report: &mut TargetReport) {
    let marker = config.analysis_summary(row.tic);
    if !marker.exists() {
        warn!(
            target_name = %row.name,
            marker = %marker.display(),
            "did not find analysis summary; unable to process target"
        );
        report.missing_analysis = true;
        if report.state == TargetState::Pending {
            report.state = TargetState::Skipped;
        }
        return;
    }

    echo_analysis_log(&config.analysis_log(row.tic), &row.name);

    match process_sectors(config, row, &marker) {
        Ok(metrics) => {
            info!(target_name = %row.name, sectors = metrics.len(), "target processed");
            report.metrics = metrics;
            report.state = TargetState::Processed;
        }
        Err(e) => report.state = failed(row, e),
    }
}

fn process_sectors(
    config: &PipelineConfig,
    row: &TargetRow,
    marker: &Path,
) -> Result<Vec<SectorMetrics>, PipelineError> {
    let eph = load_ephemeris(marker, config.duration_scale)?;
    for line in format_ephemeris(&eph).lines() {
        info!(target_name = %row.name, "{line}");
    }
    if !eph.eclipses.is_empty() {
        validate_period(eph.period_days())?;
    }

    let plots_dir = config.plots_dir(&row.name);
    let stem = file_stem(&row.name);
    write_ephemeris_json(
        &plots_dir.join(format!("{stem}_ephemeris.json")),
        &row.name,
        row.tic,
        config.duration_scale,
        &eph,
    )?;

    let download_dir = config.download_dir(row.tic);
    let files = if download_dir.is_dir() {
        find_epoch_files(&download_dir)?
    } else {
        Vec::new()
    };
    info!(target_name = %row.name, files = files.len(), "loaded epoch file list");

    let mut metrics = Vec::with_capacity(files.len());
    for path in &files {
        match process_sector(config, row, &eph, path, &plots_dir) {
            Ok(m) => metrics.push(m),
            Err(e) => warn!(target_name = %row.name, "skipping epoch: {e}"),
        }
    }
    metrics.sort_by_key(|m| m.sector);

    write_metrics_csv(
        &plots_dir.join(format!("{stem}_variability.csv")),
        &metrics,
    )?;
    Ok(metrics)
}

/// Normalize, mask, flatten and score one epoch file.
pub fn process_sector(
    config: &PipelineConfig,
    row: &TargetRow,
    eph: &Ephemeris,
    path: &Path,
    plots_dir: &Path,
) -> Result<SectorMetrics, PipelineError> {
    let raw = load_light_curve(path, config.quality_bitmask)?;
    let sector = raw.sector;
    let lc = normalize(&raw).ok_or_else(|| PipelineError::MalformedEpoch {
        path: path.to_path_buf(),
        message: "no samples with a positive median flux".to_string(),
    })?;

    let (mask, _) = eclipse_mask(&lc.time, &eph.eclipses, eph.period_days())?;
    let flattened = flatten(&lc, &mask, &config.flatten)?;
    let variability = variability_metric(&flattened.residual);
    info!(
        target_name = %row.name,
        sector,
        samples = lc.len(),
        masked = mask.count(),
        variability,
        "sector flattened"
    );

    if config.plot {
        let stem = file_stem(&row.name);
        let plot_path: PathBuf = plots_dir.join(format!("{stem}_{sector:03}.svg"));
        if let Err(e) =
            render_diagnostic_plot(&plot_path, &lc, &flattened.flat, &flattened.residual, &mask)
        {
            warn!(target_name = %row.name, sector, "{e}");
        }
    }

    Ok(SectorMetrics {
        target: row.name.clone(),
        tic: row.tic,
        sector,
        samples: lc.len(),
        masked: mask.count(),
        variability,
    })
}

fn failed(row: &TargetRow, e: PipelineError) -> TargetState {
    error!(target_name = %row.name, tic = row.tic, "{e}");
    TargetState::Failed(e.to_string())
}
