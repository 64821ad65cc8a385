//! Epoch light-curve files.
//!
//! Each downloaded sector is stored as one JSON document:
//!
//! ```json
//! {
//!   "header": { "sector": 14, "object": "TIC 12345", "pdc_tot": 0.93, "pdc_noi": 0.71 },
//!   "time": [...], "flux": [...], "flux_err": [...], "quality": [...]
//! }
//! ```
//!
//! Missing samples are `null`. `flux_err` and `quality` are optional.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::LightCurve;
use crate::error::PipelineError;

/// File name suffix identifying epoch light-curve files.
pub const EPOCH_FILE_SUFFIX: &str = "_lc.json";

/// Per-sector metadata written by the archive pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochHeader {
    pub sector: u32,
    #[serde(default)]
    pub object: Option<String>,
    /// PDC total goodness metric.
    pub pdc_tot: f64,
    /// PDC noise goodness metric.
    pub pdc_noi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochFile {
    pub header: EpochHeader,
    pub time: Vec<Option<f64>>,
    pub flux: Vec<Option<f64>>,
    #[serde(default)]
    pub flux_err: Vec<Option<f64>>,
    #[serde(default)]
    pub quality: Vec<u32>,
}

#[derive(Deserialize)]
struct HeaderOnly {
    header: EpochHeader,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PipelineError> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| PipelineError::json(path, e))
}

/// Read only the header of an epoch file.
pub fn read_epoch_header(path: &Path) -> Result<EpochHeader, PipelineError> {
    read_json::<HeaderOnly>(path).map(|h| h.header)
}

/// Load an epoch file as a light curve.
///
/// Samples are dropped when their quality flags intersect `quality_bitmask` or
/// when time/flux is missing. The result is sorted by time with duplicate
/// timestamps removed, so time is strictly increasing.
pub fn load_light_curve(path: &Path, quality_bitmask: u32) -> Result<LightCurve, PipelineError> {
    let epoch: EpochFile = read_json(path)?;
    let n = epoch.time.len();
    if epoch.flux.len() != n
        || (!epoch.flux_err.is_empty() && epoch.flux_err.len() != n)
        || (!epoch.quality.is_empty() && epoch.quality.len() != n)
    {
        return Err(PipelineError::MalformedEpoch {
            path: path.to_path_buf(),
            message: "time/flux/flux_err/quality columns differ in length".to_string(),
        });
    }

    let mut samples: Vec<(f64, f64, f64)> = (0..n)
        .filter(|&i| (epoch.quality.get(i).copied().unwrap_or(0) & quality_bitmask) == 0)
        .filter_map(|i| {
            let t = epoch.time[i].filter(|v| v.is_finite())?;
            let f = epoch.flux[i].filter(|v| v.is_finite())?;
            let e = epoch.flux_err.get(i).copied().flatten().unwrap_or(f64::NAN);
            Some((t, f, e))
        })
        .collect();
    samples.sort_by(|a, b| a.0.total_cmp(&b.0));
    samples.dedup_by(|later, earlier| later.0 == earlier.0);

    let object = epoch.header.object.clone().unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    Ok(LightCurve {
        object,
        sector: epoch.header.sector,
        time: samples.iter().map(|s| s.0).collect(),
        flux: samples.iter().map(|s| s.1).collect(),
        flux_err: samples.iter().map(|s| s.2).collect(),
    })
}
