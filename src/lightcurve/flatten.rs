//! Light-curve flattening (detrending) with eclipse protection.
//!
//! The trend is a Savitzky–Golay style local polynomial: for every sample we take
//! the `window_length` nearest *unmasked* samples of the same segment, fit a
//! polynomial of order `polyorder` by least squares, and evaluate it at the sample
//! time. Masked (eclipse) samples never contribute to any fit, but still receive a
//! trend value interpolated from their unmasked neighbours, so the eclipse keeps
//! its shape in the flattened curve.
//!
//! Robustness:
//! - the light curve is split into segments at gaps larger than
//!   `break_tolerance` median cadences (e.g. the mid-sector data downlink)
//! - `niters` passes of sigma clipping drop flares and other outliers from the fits
//!
//! Outputs:
//! - `flat = flux / trend`
//! - `residual = flux - flat`, point-wise on the same time axis

use rayon::prelude::*;
use tracing::warn;

use crate::domain::{EclipseMask, FlattenConfig, LightCurve};
use crate::error::PipelineError;
use crate::math::{mad_std, median, median_cadence, poly_design, solve_least_squares};

/// Whether any samples were excluded from the trend fit as eclipses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlattenOutcome {
    Protected,
    /// The mask was all false; flattening ran over the whole curve.
    Unprotected,
}

#[derive(Debug, Clone)]
pub struct Flattened {
    pub flat: LightCurve,
    pub residual: LightCurve,
    pub trend: Vec<f64>,
    pub outcome: FlattenOutcome,
}

/// Flatten a light curve, excluding masked samples from the trend fit.
pub fn flatten(
    lc: &LightCurve,
    mask: &EclipseMask,
    config: &FlattenConfig,
) -> Result<Flattened, PipelineError> {
    if mask.len() != lc.len() || lc.flux.len() != lc.len() || lc.flux_err.len() != lc.len() {
        return Err(PipelineError::LengthMismatch {
            expected: lc.len(),
            found: mask.len(),
        });
    }

    let outcome = if mask.any() {
        FlattenOutcome::Protected
    } else {
        warn!(
            sector = lc.sector,
            "there are no masked eclipses so flatten will apply over the whole light curve"
        );
        FlattenOutcome::Unprotected
    };

    let mut trend = vec![f64::NAN; lc.len()];
    for (start, end) in segments(&lc.time, config.break_tolerance) {
        let seg_trend = segment_trend(
            &lc.time[start..end],
            &lc.flux[start..end],
            &mask.as_slice()[start..end],
            config,
        );
        trend[start..end].copy_from_slice(&seg_trend);
    }

    let flat_flux: Vec<f64> = lc
        .flux
        .iter()
        .zip(&trend)
        .map(|(&f, &tr)| divide(f, tr))
        .collect();
    let flat_err: Vec<f64> = lc
        .flux_err
        .iter()
        .zip(&trend)
        .map(|(&e, &tr)| divide(e, tr))
        .collect();

    let residual_flux: Vec<f64> = lc.flux.iter().zip(&flat_flux).map(|(&f, &ff)| f - ff).collect();
    let residual_err: Vec<f64> = lc
        .flux_err
        .iter()
        .zip(&flat_err)
        .map(|(&e, &fe)| e.hypot(fe))
        .collect();

    Ok(Flattened {
        flat: lc.with_flux(flat_flux, flat_err),
        residual: lc.with_flux(residual_flux, residual_err),
        trend,
        outcome,
    })
}

fn divide(value: f64, trend: f64) -> f64 {
    if trend.is_finite() && trend != 0.0 {
        value / trend
    } else {
        f64::NAN
    }
}

/// Half-open index ranges of contiguous data, split at large cadence gaps.
pub fn segments(times: &[f64], break_tolerance: f64) -> Vec<(usize, usize)> {
    if times.is_empty() {
        return Vec::new();
    }
    let Some(cadence) = median_cadence(times) else {
        return vec![(0, times.len())];
    };
    let max_gap = break_tolerance * cadence;

    let mut out = Vec::new();
    let mut start = 0;
    for i in 1..times.len() {
        if times[i] - times[i - 1] > max_gap {
            out.push((start, i));
            start = i;
        }
    }
    out.push((start, times.len()));
    out
}

/// Trend for one segment, with sigma-clipping passes over the unmasked samples.
fn segment_trend(time: &[f64], flux: &[f64], mask: &[bool], config: &FlattenConfig) -> Vec<f64> {
    let mut keep: Vec<bool> = mask
        .iter()
        .zip(flux)
        .map(|(&m, f)| !m && f.is_finite())
        .collect();

    let fallback = median(flux).unwrap_or(f64::NAN);
    let mut trend = local_trend(time, flux, &keep, config, fallback);

    for _ in 0..config.niters {
        let residuals: Vec<f64> = (0..time.len())
            .filter(|&i| keep[i])
            .map(|i| flux[i] - trend[i])
            .collect();
        let Some(std) = mad_std(&residuals).filter(|s| s.is_finite() && *s > 0.0) else {
            break;
        };

        let mut clipped = 0usize;
        for i in 0..time.len() {
            if keep[i] && (flux[i] - trend[i]).abs() > config.sigma * std {
                keep[i] = false;
                clipped += 1;
            }
        }
        if clipped == 0 {
            break;
        }
        trend = local_trend(time, flux, &keep, config, fallback);
    }

    trend
}

/// Evaluate the local polynomial trend at every sample of a segment.
fn local_trend(
    time: &[f64],
    flux: &[f64],
    keep: &[bool],
    config: &FlattenConfig,
    fallback: f64,
) -> Vec<f64> {
    let fit_idx: Vec<usize> = (0..time.len()).filter(|&i| keep[i]).collect();
    if fit_idx.is_empty() {
        return vec![fallback; time.len()];
    }
    let fit_t: Vec<f64> = fit_idx.iter().map(|&i| time[i]).collect();
    let fit_f: Vec<f64> = fit_idx.iter().map(|&i| flux[i]).collect();

    let w = config.window_length.max(1).min(fit_t.len());
    let order = config.polyorder.min(w - 1);

    time.par_iter()
        .map(|&t| {
            let k = fit_t.partition_point(|&ft| ft < t);
            let lo = k.saturating_sub(w / 2).min(fit_t.len() - w);
            let hi = lo + w;
            let wt = &fit_t[lo..hi];
            let wf = &fit_f[lo..hi];

            if order == 0 {
                return wf.iter().sum::<f64>() / wf.len() as f64;
            }
            let half_width = (t - wt[0]).abs().max((wt[w - 1] - t).abs());
            let x = poly_design(wt, t, half_width, order);
            let y = nalgebra::DVector::from_column_slice(wf);
            match solve_least_squares(&x, &y) {
                Some(beta) => beta[0],
                None => median(wf).unwrap_or(fallback),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal};

    use super::*;
    use crate::lightcurve::mask::in_eclipse;

    fn curve(time: Vec<f64>, flux: Vec<f64>) -> LightCurve {
        let n = time.len();
        LightCurve {
            object: "TIC 1".to_string(),
            sector: 1,
            time,
            flux,
            flux_err: vec![1e-4; n],
        }
    }

    /// Slow sinusoidal variability with a box eclipse at t = 5 and small noise.
    fn synthetic(n: usize) -> (LightCurve, Vec<bool>) {
        let mut rng = StdRng::seed_from_u64(7);
        let noise = Normal::new(0.0, 1e-4).unwrap();
        let time: Vec<f64> = (0..n).map(|i| i as f64 * 0.005).collect();
        let in_ecl: Vec<bool> = time.iter().map(|&t| in_eclipse(t, 5.0, 0.1, 100.0)).collect();
        let flux = time
            .iter()
            .zip(&in_ecl)
            .map(|(&t, &e)| {
                let base = 1.0 + 0.01 * (2.0 * std::f64::consts::PI * t / 5.0).sin();
                let depth = if e { 0.8 } else { 1.0 };
                base * depth + noise.sample(&mut rng)
            })
            .collect();
        (curve(time, flux), in_ecl)
    }

    #[test]
    fn masked_eclipse_keeps_its_depth() {
        let (lc, in_ecl) = synthetic(2000);
        let mask = EclipseMask(in_ecl.clone());
        let out = flatten(&lc, &mask, &FlattenConfig::default()).unwrap();
        assert_eq!(out.outcome, FlattenOutcome::Protected);

        for i in 0..lc.len() {
            let expected = if in_ecl[i] { 0.8 } else { 1.0 };
            assert!(
                (out.flat.flux[i] - expected).abs() < 2e-3,
                "i={i} flat={} expected={expected}",
                out.flat.flux[i]
            );
        }
    }

    #[test]
    fn residual_is_exact_difference_even_without_mask() {
        let (lc, _) = synthetic(800);
        let mask = EclipseMask::none(lc.len());
        let out = flatten(&lc, &mask, &FlattenConfig::default()).unwrap();
        assert_eq!(out.outcome, FlattenOutcome::Unprotected);
        assert_eq!(out.residual.time, lc.time);
        for i in 0..lc.len() {
            assert_eq!(out.residual.flux[i], lc.flux[i] - out.flat.flux[i]);
        }
    }

    #[test]
    fn outliers_are_clipped_from_the_trend() {
        let time: Vec<f64> = (0..400).map(|i| i as f64 * 0.01).collect();
        let mut flux = vec![1.0; 400];
        for (i, f) in flux.iter_mut().enumerate() {
            *f += if i % 2 == 0 { 1e-4 } else { -1e-4 };
        }
        flux[200] = 1.5;
        let lc = curve(time, flux);
        let out = flatten(&lc, &EclipseMask::none(400), &FlattenConfig::default()).unwrap();
        assert!((out.trend[199] - 1.0).abs() < 1e-3);
        assert!((out.trend[201] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn gaps_split_segments() {
        let mut time: Vec<f64> = (0..100).map(|i| i as f64 * 0.01).collect();
        time.extend((0..100).map(|i| 5.0 + i as f64 * 0.01));
        let segs = segments(&time, 5.0);
        assert_eq!(segs, vec![(0, 100), (100, 200)]);
    }

    #[test]
    fn fully_masked_segment_uses_median_level() {
        let time: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let lc = curve(time, vec![2.0; 10]);
        let out = flatten(&lc, &EclipseMask(vec![true; 10]), &FlattenConfig::default()).unwrap();
        assert!(out.flat.flux.iter().all(|&f| (f - 1.0).abs() < 1e-12));
    }

    #[test]
    fn mask_length_must_match() {
        let lc = curve(vec![0.0, 1.0], vec![1.0, 1.0]);
        let err = flatten(&lc, &EclipseMask::none(3), &FlattenConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::LengthMismatch { .. }));
    }
}
