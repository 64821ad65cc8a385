//! Eclipse masks.
//!
//! A sample at time `t` is inside eclipse `(centre, duration)` when it lies in
//! the closed window around the nearest cycle of the eclipse:
//!
//! ```text
//! n = round((t - centre) / P)
//! c = centre + n * P
//! c - duration/2 <= t <= c + duration/2
//! ```
//!
//! For cycle 0 this is the plain interval test against `centre`, so samples on
//! a window edge are always masked.

use tracing::warn;

use crate::domain::{Eclipse, EclipseMask};
use crate::error::PipelineError;

/// How a mask came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskOutcome {
    /// At least one eclipse window was applied.
    Masked,
    /// No eclipses were available; the mask is all false.
    NoEclipses,
}

/// Validate a period for folding.
pub fn validate_period(period: Option<f64>) -> Result<f64, PipelineError> {
    match period {
        Some(p) if p.is_finite() && p > 0.0 => Ok(p),
        Some(p) => Err(PipelineError::InvalidPeriod(format!(
            "period must be finite and positive, got {p}"
        ))),
        None => Err(PipelineError::InvalidPeriod(
            "no orbital period available".to_string(),
        )),
    }
}

/// Whether `t` falls within `duration / 2` of any cycle of `centre`.
pub fn in_eclipse(t: f64, centre: f64, duration: f64, period: f64) -> bool {
    let half = 0.5 * duration;
    let n = ((t - centre) / period).round();
    // neighbours matter only when the window is wider than a period
    [n - 1.0, n, n + 1.0].iter().any(|&k| {
        let c = centre + k * period;
        t >= c - half && t <= c + half
    })
}

/// Compute the eclipse mask for a set of sample times.
///
/// Only nominal eclipse times and durations are used. An empty eclipse list
/// produces an all-false mask (without needing a period); otherwise the period
/// must be finite and positive.
pub fn eclipse_mask(
    times: &[f64],
    eclipses: &[Eclipse],
    period: Option<f64>,
) -> Result<(EclipseMask, MaskOutcome), PipelineError> {
    if eclipses.is_empty() {
        warn!("no eclipses available; the eclipse mask is empty");
        return Ok((EclipseMask::none(times.len()), MaskOutcome::NoEclipses));
    }
    let period = validate_period(period)?;

    let mask = times
        .iter()
        .map(|&t| {
            eclipses
                .iter()
                .any(|e| in_eclipse(t, e.time.value, e.duration.value, period))
        })
        .collect();

    Ok((EclipseMask(mask), MaskOutcome::Masked))
}
