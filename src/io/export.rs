//! Export per-sector metrics (CSV) and ephemeris summaries (JSON).
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Ephemeris, SectorMetrics};
use crate::error::PipelineError;

/// Write metrics rows (`target,tic,sector,samples,masked,variability`) to a CSV file.
///
/// Used for both the per-target file and the catalogue-wide aggregate.
pub fn write_metrics_csv(path: &Path, metrics: &[SectorMetrics]) -> Result<(), PipelineError> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path).map_err(|e| PipelineError::csv(path, e))?;
    if metrics.is_empty() {
        writer
            .write_record(["target", "tic", "sector", "samples", "masked", "variability"])
            .map_err(|e| PipelineError::csv(path, e))?;
    }
    for m in metrics {
        writer.serialize(m).map_err(|e| PipelineError::csv(path, e))?;
    }
    writer.flush().map_err(|e| PipelineError::io(path, e))
}

#[derive(Debug, Serialize)]
struct EphemerisSummary<'a> {
    target: &'a str,
    tic: u64,
    generated_at: DateTime<Utc>,
    duration_scale: f64,
    ephemeris: &'a Ephemeris,
}

/// Write the parsed ephemeris (with its warnings) as pretty-printed JSON.
pub fn write_ephemeris_json(
    path: &Path,
    target: &str,
    tic: u64,
    duration_scale: f64,
    ephemeris: &Ephemeris,
) -> Result<(), PipelineError> {
    ensure_parent(path)?;
    let summary = EphemerisSummary {
        target,
        tic,
        generated_at: Utc::now(),
        duration_scale,
        ephemeris,
    };
    let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &summary)
        .map_err(|e| PipelineError::json(path, e))
}

fn ensure_parent(path: &Path) -> Result<(), PipelineError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))
        }
        _ => Ok(()),
    }
}
