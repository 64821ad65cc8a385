//! Epoch discovery and selection.
//!
//! - enumerate downloaded epoch files and their quality metrics (`scan`)
//! - rank and pick the epochs handed to the fitting engine (`selection`)

pub mod scan;
pub mod selection;

pub use scan::*;
pub use selection::*;
