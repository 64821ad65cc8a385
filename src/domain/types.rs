//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - passed between pipeline stages without shared mutable state
//! - handed to worker threads as immutable per-target inputs
//! - exported to JSON/CSV where useful

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::Measurement;

/// One eclipse derived from the analysis summary (primary = 1, secondary = 2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Eclipse {
    pub index: u8,
    /// Central time of the eclipse (reference time + offset).
    pub time: Measurement,
    /// Duration between first and last contact (after any duration scaling).
    pub duration: Measurement,
}

/// Recoverable problems found while reconstructing an ephemeris.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EphemerisWarning {
    /// `t_mean` is absent so no eclipse timing can be derived.
    MissingReferenceTime,
    /// At least one of the timing/contact keys for an eclipse is absent.
    IncompleteEclipse { index: u8, missing: Vec<String> },
    /// A derived duration is exactly zero; the eclipse may not have been found.
    ZeroDuration { index: u8 },
    /// Last contact precedes first contact.
    NegativeDuration { index: u8 },
}

impl std::fmt::Display for EphemerisWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EphemerisWarning::MissingReferenceTime => {
                write!(f, "cannot derive any eclipse timings: t_mean is not set")
            }
            EphemerisWarning::IncompleteEclipse { index, missing } => write!(
                f,
                "cannot derive timing/duration for eclipse {index}: missing {}",
                missing.join(", ")
            ),
            EphemerisWarning::ZeroDuration { index } => {
                write!(f, "eclipse {index} has zero duration; were eclipses found?")
            }
            EphemerisWarning::NegativeDuration { index } => {
                write!(f, "eclipse {index} has a negative duration")
            }
        }
    }
}

/// Eclipse timing parameters for one target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ephemeris {
    pub reference_time: Option<Measurement>,
    pub period: Option<Measurement>,
    /// Usable eclipses in index order; may hold fewer than two entries.
    pub eclipses: Vec<Eclipse>,
    pub warnings: Vec<EphemerisWarning>,
}

impl Ephemeris {
    pub fn eclipse_times(&self) -> Vec<Measurement> {
        self.eclipses.iter().map(|e| e.time).collect()
    }

    pub fn eclipse_durations(&self) -> Vec<Measurement> {
        self.eclipses.iter().map(|e| e.duration).collect()
    }

    /// Nominal orbital period, if the report supplied one.
    pub fn period_days(&self) -> Option<f64> {
        self.period.map(|p| p.value)
    }
}

/// Metadata for one downloaded epoch (sector) light-curve file.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochRecord {
    pub sector: u32,
    pub path: PathBuf,
    /// Pipeline "total goodness" metric (higher is better).
    pub total_goodness: f64,
    /// Pipeline noise metric; values above the noise threshold are demoted.
    pub noise: f64,
}

/// A time series of normalized (or raw) flux measurements for one sector.
#[derive(Debug, Clone, PartialEq)]
pub struct LightCurve {
    pub object: String,
    pub sector: u32,
    pub time: Vec<f64>,
    pub flux: Vec<f64>,
    pub flux_err: Vec<f64>,
}

impl LightCurve {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Copy with the same time axis and metadata but new flux values.
    pub fn with_flux(&self, flux: Vec<f64>, flux_err: Vec<f64>) -> LightCurve {
        LightCurve {
            object: self.object.clone(),
            sector: self.sector,
            time: self.time.clone(),
            flux,
            flux_err,
        }
    }
}

/// One flag per light-curve sample, `true` inside a modelled eclipse.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EclipseMask(pub Vec<bool>);

impl EclipseMask {
    pub fn none(len: usize) -> Self {
        Self(vec![false; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|&m| m)
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&m| m).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }
}

/// One row of the input target catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRow {
    /// Star name (the catalogue index column).
    pub name: String,
    /// Numeric archive identifier used to build storage paths.
    pub tic: u64,
    /// A-priori orbital period estimate in days.
    pub period: Option<f64>,
    /// Remaining columns, passed through untouched.
    pub extra: Vec<(String, String)>,
}

/// Variability metric and sample counts for one processed sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorMetrics {
    pub target: String,
    pub tic: u64,
    pub sector: u32,
    /// Samples remaining after quality filtering.
    pub samples: usize,
    /// Samples flagged as in eclipse.
    pub masked: usize,
    pub variability: f64,
}

/// Per-target lifecycle.
///
/// `Pending → {Skipped, Analysing → {Analysed | Simulated | NoData | Failed}} → Processed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
    Pending,
    /// Completion marker already present and overwrite not requested.
    Skipped,
    Analysing,
    Analysed,
    /// `--simulate`: the planned engine call was reported but not made.
    Simulated,
    /// No epoch files were available to analyse.
    NoData,
    Failed(String),
    Processed,
}

impl TargetState {
    pub fn label(&self) -> &'static str {
        match self {
            TargetState::Pending => "pending",
            TargetState::Skipped => "skipped",
            TargetState::Analysing => "analysing",
            TargetState::Analysed => "analysed",
            TargetState::Simulated => "simulated",
            TargetState::NoData => "no data",
            TargetState::Failed(_) => "failed",
            TargetState::Processed => "processed",
        }
    }
}

/// Outcome of one target's pass through the pipeline, used for the final report.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetReport {
    pub name: String,
    pub tic: u64,
    pub state: TargetState,
    /// Epochs handed (or planned to be handed) to the fitting engine.
    pub epochs_selected: usize,
    /// The process phase ran but found no analysis summary.
    pub missing_analysis: bool,
    pub metrics: Vec<SectorMetrics>,
}

impl TargetReport {
    pub fn new(row: &TargetRow) -> Self {
        Self {
            name: row.name.clone(),
            tic: row.tic,
            state: TargetState::Pending,
            epochs_selected: 0,
            missing_analysis: false,
            metrics: Vec::new(),
        }
    }
}

/// Epoch selection heuristic parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionConfig {
    /// Noise metric above which an epoch is considered noise dominated.
    pub noise_threshold: f64,
    /// Divisor applied to the goodness score of noise dominated epochs.
    pub noise_penalty: f64,
    /// Minimum number of epochs selected.
    pub min_epochs: usize,
    /// One extra epoch is selected per this many days of orbital period.
    pub days_per_epoch: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            noise_threshold: 0.99,
            noise_penalty: 100.0,
            min_epochs: 5,
            days_per_epoch: 4.0,
        }
    }
}

/// Detrending parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenConfig {
    /// Number of unmasked samples in each local trend fit.
    pub window_length: usize,
    /// Order of the local polynomial.
    pub polyorder: usize,
    /// Sigma-clipping passes.
    pub niters: usize,
    /// Clipping threshold in robust standard deviations.
    pub sigma: f64,
    /// A gap larger than this many median cadences starts a new segment.
    pub break_tolerance: f64,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            window_length: 101,
            polyorder: 2,
            niters: 3,
            sigma: 3.0,
            break_tolerance: 5.0,
        }
    }
}

/// Which part of the per-target workflow to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Select epochs and invoke the fitting engine.
    Analyse,
    /// Mask, flatten and score using an existing analysis summary.
    Process,
    /// Both, end to end.
    Run,
}

impl Stage {
    pub fn analyses(self) -> bool {
        matches!(self, Stage::Analyse | Stage::Run)
    }

    pub fn processes(self) -> bool {
        matches!(self, Stage::Process | Stage::Run)
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub stage: Stage,
    pub catalogue_path: PathBuf,
    /// Root of the on-disk working tree (`download/`, `analysis/`, `plots/`).
    pub catalogue_dir: PathBuf,
    pub index_col: String,
    pub tic_col: String,
    pub period_col: String,
    /// Restrict processing to these star names (all when empty).
    pub targets: Vec<String>,
    /// Optional sort column; `+col` ascending, `-col` descending.
    pub sort_by: Option<String>,
    pub overwrite: bool,
    pub pool_size: usize,
    pub simulate: bool,
    /// Multiplier applied to every derived eclipse duration.
    pub duration_scale: f64,
    /// Samples whose quality flags intersect this mask are dropped on load.
    pub quality_bitmask: u32,
    pub plot: bool,
    pub selection: SelectionConfig,
    pub flatten: FlattenConfig,
}

impl PipelineConfig {
    pub fn new(catalogue_path: impl Into<PathBuf>, catalogue_dir: impl Into<PathBuf>) -> Self {
        Self {
            stage: Stage::Run,
            catalogue_path: catalogue_path.into(),
            catalogue_dir: catalogue_dir.into(),
            index_col: "Star".to_string(),
            tic_col: "TIC".to_string(),
            period_col: "Period".to_string(),
            targets: Vec::new(),
            sort_by: None,
            overwrite: false,
            pool_size: 1,
            simulate: false,
            duration_scale: 1.0,
            quality_bitmask: u32::MAX,
            plot: true,
            selection: SelectionConfig::default(),
            flatten: FlattenConfig::default(),
        }
    }

    /// Directory holding the downloaded epoch files for a target.
    pub fn download_dir(&self, tic: u64) -> PathBuf {
        self.catalogue_dir.join("download").join(format!("{tic:010}"))
    }

    /// Directory the fitting engine writes its `<tic>_analysis/` folders into.
    pub fn analysis_dir(&self) -> PathBuf {
        self.catalogue_dir.join("analysis")
    }

    /// Completion marker; the engine uses the TIC without leading zeros.
    pub fn analysis_summary(&self, tic: u64) -> PathBuf {
        self.analysis_dir()
            .join(format!("{tic}_analysis"))
            .join(format!("{tic}_analysis_summary.csv"))
    }

    pub fn analysis_log(&self, tic: u64) -> PathBuf {
        self.analysis_dir()
            .join(format!("{tic}_analysis"))
            .join(format!("{tic}.log"))
    }

    /// Per-target plot and export directory, named by `file_stem(target)`.
    pub fn plots_dir(&self, target: &str) -> PathBuf {
        self.catalogue_dir.join("plots").join(file_stem(target))
    }

    pub fn aggregate_metrics_path(&self) -> PathBuf {
        self.catalogue_dir.join("variability.csv")
    }
}

/// A single path component for a star name.
///
/// Separators and NUL become `_`, and names that would resolve to the current
/// or parent directory are replaced, so every target stays in its own subtree.
pub fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    match stem.trim() {
        "" | "." | ".." => stem.replace('.', "_").replace(' ', "_") + "_",
        _ => stem,
    }
}
