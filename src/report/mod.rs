//! Reporting utilities: per-state tallies and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{TargetReport, TargetState};

/// Display order of states in the batch summary.
pub const STATE_ORDER: [&str; 8] = [
    "processed",
    "analysed",
    "skipped",
    "simulated",
    "no data",
    "failed",
    "analysing",
    "pending",
];

/// Number of targets per final state, in `STATE_ORDER` (zero counts omitted).
pub fn count_states(reports: &[TargetReport]) -> Vec<(&'static str, usize)> {
    STATE_ORDER
        .iter()
        .map(|&label| {
            let n = reports.iter().filter(|r| r.state.label() == label).count();
            (label, n)
        })
        .filter(|(_, n)| *n > 0)
        .collect()
}

/// Names of targets whose epochs could not be found.
pub fn no_data_targets(reports: &[TargetReport]) -> Vec<&str> {
    reports
        .iter()
        .filter(|r| r.state == TargetState::NoData)
        .map(|r| r.name.as_str())
        .collect()
}

/// `(name, reason)` for every failed target.
pub fn failed_targets(reports: &[TargetReport]) -> Vec<(&str, &str)> {
    reports
        .iter()
        .filter_map(|r| match &r.state {
            TargetState::Failed(reason) => Some((r.name.as_str(), reason.as_str())),
            _ => None,
        })
        .collect()
}

pub fn missing_analysis_targets(reports: &[TargetReport]) -> Vec<&str> {
    reports
        .iter()
        .filter(|r| r.missing_analysis)
        .map(|r| r.name.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, state: TargetState) -> TargetReport {
        TargetReport {
            name: name.to_string(),
            tic: 1,
            state,
            epochs_selected: 0,
            missing_analysis: false,
            metrics: Vec::new(),
        }
    }

    #[test]
    fn counts_follow_display_order() {
        let reports = vec![
            report("a", TargetState::Failed("boom".to_string())),
            report("b", TargetState::Processed),
            report("c", TargetState::Failed("bang".to_string())),
            report("d", TargetState::NoData),
        ];
        assert_eq!(
            count_states(&reports),
            vec![("processed", 1), ("no data", 1), ("failed", 2)]
        );
        assert_eq!(failed_targets(&reports), vec![("a", "boom"), ("c", "bang")]);
        assert_eq!(no_data_targets(&reports), vec!["d"]);
    }
}
