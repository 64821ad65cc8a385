//! Epoch (sector) selection.
//!
//! Long-baseline targets can have 30+ sectors, far more than the fitting engine
//! needs. We score each sector from its pipeline quality metrics and keep the
//! best `top_n`, where `top_n` grows with the orbital period so that systems with
//! infrequent eclipses still get enough coverage.
//!
//! Selection rules:
//! 1. `score = total_goodness / penalty`, `penalty = noise_penalty` when the noise
//!    metric exceeds `noise_threshold` (noise swamps the signal), else 1
//! 2. `top_n = max(min_epochs, ceil(period_or_1 / days_per_epoch))`
//! 3. stable sort by score (descending), truncate to `top_n`
//! 4. stable sort the survivors by sector (chronological order for the engine)

use std::cmp::Ordering;

use crate::domain::{EpochRecord, SelectionConfig};

/// Quality score of one epoch; higher is better.
pub fn quality_score(epoch: &EpochRecord, config: &SelectionConfig) -> f64 {
    let penalty = if epoch.noise <= config.noise_threshold {
        1.0
    } else {
        config.noise_penalty
    };
    epoch.total_goodness / penalty
}

/// Number of epochs to select for a given a-priori period.
///
/// An unknown, zero or non-finite period counts as 1 day.
pub fn top_n(period: Option<f64>, config: &SelectionConfig) -> usize {
    let period_or_1 = match period {
        Some(p) if p.is_finite() && p != 0.0 => p,
        _ => 1.0,
    };
    let by_period = (period_or_1 / config.days_per_epoch).ceil();
    let by_period = if by_period.is_finite() && by_period > 0.0 {
        by_period as usize
    } else {
        0
    };
    by_period.max(config.min_epochs)
}

fn by_score_desc(a: f64, b: f64) -> Ordering {
    // NaN scores rank after every real score.
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

/// Select the best epochs for analysis, returned in sector order.
pub fn select_epochs(
    epochs: Vec<EpochRecord>,
    period: Option<f64>,
    config: &SelectionConfig,
) -> Vec<EpochRecord> {
    let n = top_n(period, config);

    let mut scored: Vec<(f64, EpochRecord)> = epochs
        .into_iter()
        .map(|e| (quality_score(&e, config), e))
        .collect();
    scored.sort_by(|a, b| by_score_desc(a.0, b.0));
    scored.truncate(n);

    let mut selected: Vec<EpochRecord> = scored.into_iter().map(|(_, e)| e).collect();
    selected.sort_by_key(|e| e.sector);
    selected
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn epoch(sector: u32, total_goodness: f64, noise: f64) -> EpochRecord {
        EpochRecord {
            sector,
            path: PathBuf::from(format!("s{sector:03}_lc.json")),
            total_goodness,
            noise,
        }
    }

    fn sectors(epochs: &[EpochRecord]) -> Vec<u32> {
        epochs.iter().map(|e| e.sector).collect()
    }

    #[test]
    fn noisy_epochs_are_demoted_by_exactly_the_penalty() {
        let config = SelectionConfig::default();
        for &goodness in &[0.1, 0.5, 0.97, 1.0] {
            let clean = quality_score(&epoch(1, goodness, 0.99), &config);
            let noisy = quality_score(&epoch(1, goodness, 0.991), &config);
            assert!((clean / noisy - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn top_n_follows_period() {
        let config = SelectionConfig::default();
        assert_eq!(top_n(None, &config), 5);
        assert_eq!(top_n(Some(0.0), &config), 5);
        assert_eq!(top_n(Some(1.0), &config), 5);
        assert_eq!(top_n(Some(16.0), &config), 5);
        assert_eq!(top_n(Some(17.0), &config), 5);
        assert_eq!(top_n(Some(21.0), &config), 6);
        assert_eq!(top_n(Some(f64::NAN), &config), 5);
        assert_eq!(top_n(Some(-40.0), &config), 5);
    }

    #[test]
    fn selection_keeps_best_and_returns_chronological_order() {
        let epochs = vec![
            epoch(10, 0.50, 0.5),
            epoch(2, 0.90, 0.5),
            epoch(7, 0.95, 0.999), // demoted to 0.0095
            epoch(5, 0.80, 0.5),
            epoch(1, 0.60, 0.5),
            epoch(3, 0.70, 0.5),
            epoch(9, 0.40, 0.5),
        ];
        let selected = select_epochs(epochs, Some(2.0), &SelectionConfig::default());
        assert_eq!(sectors(&selected), vec![1, 2, 3, 5, 10]);
    }

    #[test]
    fn fewer_epochs_than_top_n_returns_all_reordered() {
        let epochs = vec![epoch(30, 0.1, 0.5), epoch(4, 0.2, 0.5), epoch(12, 0.3, 0.995)];
        let selected = select_epochs(epochs, None, &SelectionConfig::default());
        assert_eq!(sectors(&selected), vec![4, 12, 30]);
    }

    #[test]
    fn ties_preserve_enumeration_order() {
        let config = SelectionConfig {
            min_epochs: 2,
            ..SelectionConfig::default()
        };
        let epochs = vec![
            epoch(8, 0.5, 0.5),
            epoch(3, 0.5, 0.5),
            epoch(1, 0.5, 0.5),
        ];
        let selected = select_epochs(epochs, None, &config);
        assert_eq!(sectors(&selected), vec![3, 8]);
    }

    #[test]
    fn empty_input_yields_empty_selection() {
        assert!(select_epochs(Vec::new(), Some(50.0), &SelectionConfig::default()).is_empty());
    }

    #[test]
    fn overridden_threshold_and_penalty_apply() {
        let config = SelectionConfig {
            noise_threshold: 0.5,
            noise_penalty: 10.0,
            ..SelectionConfig::default()
        };
        let score = quality_score(&epoch(1, 1.0, 0.6), &config);
        assert!((score - 0.1).abs() < 1e-12);
    }

    #[test]
    fn nan_scores_rank_last() {
        let config = SelectionConfig {
            min_epochs: 1,
            ..SelectionConfig::default()
        };
        let epochs = vec![epoch(1, f64::NAN, 0.5), epoch(2, 0.01, 0.5)];
        let selected = select_epochs(epochs, None, &config);
        assert_eq!(sectors(&selected), vec![2]);
    }
}
