//! Diagnostic plot rendering.

pub mod svg;

pub use svg::*;
