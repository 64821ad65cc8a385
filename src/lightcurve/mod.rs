//! Per-sector light-curve processing.
//!
//! - eclipse masks from the ephemeris (`mask`)
//! - eclipse-protected detrending (`flatten`)
//! - residual variability metric (`metric`)

pub mod flatten;
pub mod mask;
pub mod metric;

pub use flatten::*;
pub use mask::*;
pub use metric::*;

use crate::domain::LightCurve;
use crate::math::median;

/// Divide flux and flux error by the median flux so the curve sits around 1.0.
///
/// Returns `None` when the median is not a finite, positive number.
pub fn normalize(lc: &LightCurve) -> Option<LightCurve> {
    let med = median(&lc.flux).filter(|m| m.is_finite() && *m > 0.0)?;
    Some(lc.with_flux(
        lc.flux.iter().map(|f| f / med).collect(),
        lc.flux_err.iter().map(|e| e / med).collect(),
    ))
}
