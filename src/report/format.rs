//! Formatted terminal output.
//!
//! We keep formatting code in one place so the pipeline stages stay free of
//! presentation details and output changes are localized.

use crate::domain::{Ephemeris, EpochRecord, Measurement, Stage, TargetReport};
use crate::report::{count_states, failed_targets, missing_analysis_targets, no_data_targets};

/// Ephemeris block printed for each processed target.
pub fn format_ephemeris(eph: &Ephemeris) -> String {
    let mut out = String::new();
    out.push_str("From analysis summary\n");
    out.push_str(&format!("Reference time:     {}\n", fmt_opt(eph.reference_time)));
    out.push_str(&format!("Orbital period:     {}\n", fmt_opt(eph.period)));
    out.push_str(&format!("Eclipse times:      {}\n", fmt_list(&eph.eclipse_times())));
    out.push_str(&format!("Eclipse durations:  {}\n", fmt_list(&eph.eclipse_durations())));
    for w in &eph.warnings {
        out.push_str(&format!("Warning: {w}\n"));
    }
    out
}

/// One line per selected epoch.
pub fn format_selection(selected: &[EpochRecord]) -> String {
    let mut out = format!("Selected {} epoch(s):\n", selected.len());
    for e in selected {
        out.push_str(&format!(
            "  sector {:03}  pdc_tot={:.3}  pdc_noi={:.3}  {}\n",
            e.sector,
            e.total_goodness,
            e.noise,
            e.path.display()
        ));
    }
    out
}

/// End-of-batch summary: per-state counts and the targets needing attention.
pub fn format_batch_summary(reports: &[TargetReport], stage: Stage) -> String {
    let mut out = String::new();
    let stage_name = match stage {
        Stage::Analyse => "analyse",
        Stage::Process => "process",
        Stage::Run => "run",
    };

    out.push_str(&format!("=== ebflat {stage_name}: {} target(s) ===\n", reports.len()));
    for (label, n) in count_states(reports) {
        out.push_str(&format!("{label:<10} {n:>5}\n"));
    }

    let sectors: usize = reports.iter().map(|r| r.metrics.len()).sum();
    if sectors > 0 {
        out.push_str(&format!("Sectors scored: {sectors}\n"));
    }

    let no_data = no_data_targets(reports);
    if !no_data.is_empty() {
        out.push_str("\nNo epoch data:\n");
        for name in no_data {
            out.push_str(&format!("- {name}\n"));
        }
    }

    let failed = failed_targets(reports);
    if !failed.is_empty() {
        out.push_str("\nFailed:\n");
        for (name, reason) in failed {
            out.push_str(&format!("- {name}: {reason}\n"));
        }
    }

    let missing = missing_analysis_targets(reports);
    if !missing.is_empty() {
        out.push_str("\nMissing analysis summary:\n");
        for name in missing {
            out.push_str(&format!("- {name}\n"));
        }
    }

    out
}

fn fmt_opt(m: Option<Measurement>) -> String {
    m.map(|m| format!("{m:.6}")).unwrap_or_else(|| "n/a".to_string())
}

fn fmt_list(values: &[Measurement]) -> String {
    if values.is_empty() {
        return "n/a".to_string();
    }
    values
        .iter()
        .map(|m| format!("{m:.6}"))
        .collect::<Vec<_>>()
        .join(", ")
}
