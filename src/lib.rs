//! `ebflat` library crate.
//!
//! Batch eclipse masking, light-curve flattening and variability scoring for
//! eclipsing-binary catalogues. The binary (`ebflat`) is a thin wrapper around
//! this library so that:
//!
//! - core logic is testable without spawning processes
//! - the numeric stages (mask, flatten, metric) are reusable on their own
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod ephemeris;
pub mod epochs;
pub mod error;
pub mod io;
pub mod lightcurve;
pub mod math;
pub mod plot;
pub mod report;
