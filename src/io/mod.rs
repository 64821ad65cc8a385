//! Input/output helpers.
//!
//! - target catalogue ingest (`catalogue`)
//! - epoch light-curve JSON files (`lightcurve`)
//! - fitting engine log echo (`analysis_log`)
//! - metrics / ephemeris exports (CSV/JSON) (`export`)

pub mod analysis_log;
pub mod catalogue;
pub mod export;
pub mod lightcurve;

pub use analysis_log::*;
pub use catalogue::*;
pub use export::*;
pub use lightcurve::*;
