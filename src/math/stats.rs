//! Robust summary statistics over `f64` samples.
//!
//! All functions ignore non-finite values (NaN flux is common in light curves
//! after quality filtering) and return `None` when nothing finite remains.

/// Finite values sorted ascending.
fn sorted_finite(data: &[f64]) -> Vec<f64> {
    let mut v: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

/// Quantile of already sorted data using linear interpolation between order
/// statistics (Hyndman & Fan type 7, the NumPy/SciPy default):
///
/// ```text
/// h = (n - 1) * p
/// q = x[floor(h)] + (h - floor(h)) * (x[ceil(h)] - x[floor(h)])
/// ```
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let frac = h - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

pub fn quantile(data: &[f64], p: f64) -> Option<f64> {
    quantile_sorted(&sorted_finite(data), p)
}

pub fn median(data: &[f64]) -> Option<f64> {
    quantile(data, 0.5)
}

/// Interquartile range `Q3 - Q1` with linear interpolation.
pub fn iqr(data: &[f64]) -> Option<f64> {
    let v = sorted_finite(data);
    let q1 = quantile_sorted(&v, 0.25)?;
    let q3 = quantile_sorted(&v, 0.75)?;
    Some(q3 - q1)
}

/// Median absolute deviation scaled to a normal standard deviation.
pub fn mad_std(data: &[f64]) -> Option<f64> {
    let med = median(data)?;
    let deviations: Vec<f64> = data
        .iter()
        .filter(|x| x.is_finite())
        .map(|x| (x - med).abs())
        .collect();
    median(&deviations).map(|mad| 1.4826 * mad)
}

/// Median spacing between consecutive, strictly increasing times.
pub fn median_cadence(times: &[f64]) -> Option<f64> {
    let dts: Vec<f64> = times
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|dt| dt.is_finite() && *dt > 0.0)
        .collect();
    median(&dts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantiles_match_linear_interpolation() {
        let data = [1.0, 2.0, 3.0, 4.0];
        // h = 3 * 0.25 = 0.75 -> 1 + 0.75 * (2 - 1)
        assert_eq!(quantile(&data, 0.25), Some(1.75));
        assert_eq!(quantile(&data, 0.75), Some(3.25));
        assert_eq!(iqr(&data), Some(1.5));
    }

    #[test]
    fn nan_values_are_ignored() {
        let data = [f64::NAN, 5.0, 1.0, f64::NAN, 3.0];
        assert_eq!(median(&data), Some(3.0));
        assert_eq!(iqr(&[f64::NAN]), None);
    }

    #[test]
    fn mad_std_of_constant_is_zero() {
        assert_eq!(mad_std(&[2.0; 7]), Some(0.0));
    }

    #[test]
    fn cadence_ignores_non_increasing_steps() {
        let t = [0.0, 0.1, 0.2, 0.2, 0.3, 5.0];
        let c = median_cadence(&t).unwrap();
        assert!((c - 0.1).abs() < 1e-12);
    }
}
