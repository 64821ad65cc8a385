//! Mathematical utilities: polynomial basis, least squares and robust statistics.

pub mod basis;
pub mod ols;
pub mod stats;

pub use basis::*;
pub use ols::*;
pub use stats::*;
