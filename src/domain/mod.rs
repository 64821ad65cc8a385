//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - values with uncertainty (`Measurement`)
//! - eclipse timing (`Ephemeris`, `Eclipse`)
//! - per-epoch inputs (`EpochRecord`, `LightCurve`, `EclipseMask`)
//! - catalogue rows, target states and run configuration

pub mod measurement;
pub mod types;

pub use measurement::*;
pub use types::*;
