//! Eclipse ephemeris from the fitting engine's analysis summary.
//!
//! - row-typed summary reader (`report`)
//! - value/uncertainty lookup and eclipse reconstruction (`parse`)

pub mod parse;
pub mod report;

pub use parse::*;
pub use report::*;
