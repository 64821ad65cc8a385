//! Command-line parsing for the eclipsing-binary flattening pipeline.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline stages; `app` turns the parsed arguments into a `PipelineConfig`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "ebflat",
    version,
    about = "Batch eclipse masking, flattening and variability scoring for eclipsing binaries"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyse then process every target (the default).
    Run(BatchArgs),
    /// Select epochs and invoke the fitting engine for each target.
    Analyse(BatchArgs),
    /// Mask, flatten and score targets that already have an analysis summary.
    Process(BatchArgs),
}

/// Options shared by every stage.
#[derive(Debug, Parser, Clone)]
pub struct BatchArgs {
    /// Target catalogue CSV.
    #[arg(value_name = "CATALOGUE", default_value = "tessebs_extra.csv")]
    pub catalogue: PathBuf,

    /// Only process these targets (star names from the index column).
    #[arg(short = 't', long, num_args = 1..)]
    pub targets: Vec<String>,

    /// Re-run analyses that already have a completion marker.
    #[arg(long)]
    pub overwrite: bool,

    /// Number of targets processed concurrently (1 = inline).
    #[arg(short = 'p', long, default_value_t = 1)]
    pub pool_size: usize,

    /// Report the planned engine calls without running them.
    #[arg(long)]
    pub simulate: bool,

    /// Working tree holding `download/`, `analysis/` and `plots/`.
    #[arg(long, default_value = "catalogue")]
    pub catalogue_dir: PathBuf,

    /// Fitting engine program (overrides `EBFLAT_ENGINE`).
    #[arg(long, value_name = "PROGRAM")]
    pub engine: Option<String>,

    /// Multiplier applied to every eclipse duration before masking.
    #[arg(long, default_value_t = 1.0)]
    pub duration_scale: f64,

    /// Sort the catalogue by a column; prefix `-` for descending.
    #[arg(long, value_name = "[+|-]COL", allow_hyphen_values = true)]
    pub sort_by: Option<String>,

    /// Catalogue column holding the star name.
    #[arg(long, default_value = "Star")]
    pub index_col: String,

    /// Catalogue column holding the TIC identifier.
    #[arg(long, default_value = "TIC")]
    pub tic_col: String,

    /// Catalogue column holding the a-priori period (days).
    #[arg(long, default_value = "Period")]
    pub period_col: String,

    /// Disable the SVG diagnostic plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Noise metric above which an epoch's score is penalised.
    #[arg(long, default_value_t = 0.99)]
    pub noise_threshold: f64,

    /// Divisor applied to the score of noise dominated epochs.
    #[arg(long, default_value_t = 100.0)]
    pub noise_penalty: f64,

    /// Samples whose quality flags intersect this mask are dropped.
    #[arg(long, default_value_t = u32::MAX)]
    pub quality_bitmask: u32,

    /// Samples per local trend fit.
    #[arg(long, default_value_t = 101)]
    pub window_length: usize,

    /// Polynomial order of the local trend.
    #[arg(long, default_value_t = 2)]
    pub polyorder: usize,
}
