//! Variability metric for residual light curves.

use crate::domain::LightCurve;
use crate::math::iqr;

/// `2 × IQR(flux)` of a residual light curve; higher means more variability.
///
/// NaN samples are ignored and quartiles use linear interpolation. Only the
/// nominal flux is used: weighting by `flux_err` gave inconsistent results,
/// with some sectors reporting an order of magnitude less variability than
/// similar ones. Returns NaN when no finite flux remains.
pub fn variability_metric(residual: &LightCurve) -> f64 {
    iqr(&residual.flux).map(|v| 2.0 * v).unwrap_or(f64::NAN)
}
