//! Eclipse ephemeris reconstruction from an analysis summary.
//!
//! Keys read from the summary:
//!
//! - `t_mean` (reference time) with `t_mean_err`
//! - `period` with `p_err` (the one key whose error name does not follow `<key>_err`)
//! - per eclipse `i ∈ {1, 2}`: `t_i` (offset from `t_mean`) and the contact
//!   points `t_i_1` / `t_i_2`, each with their `_err` companions
//!
//! Eclipse time is `t_mean + t_i`; duration is `(t_i_2 - t_i_1) * scale`.

use std::path::Path;

use tracing::warn;

use crate::domain::{Eclipse, Ephemeris, EphemerisWarning, Measurement};
use crate::ephemeris::report::SummaryReport;
use crate::error::PipelineError;

pub const REFERENCE_TIME_KEY: &str = "t_mean";
pub const PERIOD_KEY: &str = "period";
pub const PERIOD_ERR_KEY: &str = "p_err";

/// Eclipse indices reported by the engine (primary, secondary).
pub const ECLIPSE_INDICES: [u8; 2] = [1, 2];

/// Read a value and its error from the summary.
///
/// The measurement is present only when `key` exists with a finite value. The
/// error key defaults to `<key>_err`; a missing error is treated as zero.
pub fn read_value(report: &SummaryReport, key: &str, err_key: Option<&str>) -> Option<Measurement> {
    let value = report.get(key)?.number()?;
    let default_err_key;
    let err_key = match err_key {
        Some(k) => k,
        None => {
            default_err_key = format!("{key}_err");
            &default_err_key
        }
    };
    let error = report.get(err_key).and_then(|r| r.number()).unwrap_or(0.0);
    Some(Measurement::new(value, error))
}

/// Reconstruct the ephemeris; never fails, problems become warnings.
pub fn parse_ephemeris(report: &SummaryReport, duration_scale: f64) -> Ephemeris {
    let reference_time = read_value(report, REFERENCE_TIME_KEY, None);
    let period = read_value(report, PERIOD_KEY, Some(PERIOD_ERR_KEY));

    let mut eclipses = Vec::new();
    let mut warnings = Vec::new();

    match reference_time {
        Some(t0) => {
            for index in ECLIPSE_INDICES {
                let offset_key = format!("t_{index}");
                let first_key = format!("t_{index}_1");
                let last_key = format!("t_{index}_2");

                let offset = read_value(report, &offset_key, None);
                let first = read_value(report, &first_key, None);
                let last = read_value(report, &last_key, None);

                match (offset, first, last) {
                    (Some(offset), Some(first), Some(last)) => {
                        let duration = (last - first).scale(duration_scale);
                        if duration.value == 0.0 {
                            warnings.push(EphemerisWarning::ZeroDuration { index });
                        } else if duration.value < 0.0 {
                            warnings.push(EphemerisWarning::NegativeDuration { index });
                        }
                        eclipses.push(Eclipse {
                            index,
                            time: t0 + offset,
                            duration,
                        });
                    }
                    _ => {
                        let missing = [
                            (offset_key, offset.is_none()),
                            (first_key, first.is_none()),
                            (last_key, last.is_none()),
                        ]
                        .into_iter()
                        .filter_map(|(k, absent)| absent.then_some(k))
                        .collect();
                        warnings.push(EphemerisWarning::IncompleteEclipse { index, missing });
                    }
                }
            }
        }
        None => warnings.push(EphemerisWarning::MissingReferenceTime),
    }

    for w in &warnings {
        warn!("{w}");
    }

    Ephemeris {
        reference_time,
        period,
        eclipses,
        warnings,
    }
}

/// Open a summary file and reconstruct its ephemeris.
///
/// Fails only when the file is absent or structurally malformed; a summary
/// without usable eclipses yields an ephemeris with an empty eclipse list.
pub fn load_ephemeris(path: &Path, duration_scale: f64) -> Result<Ephemeris, PipelineError> {
    let report = SummaryReport::open(path)?;
    Ok(parse_ephemeris(&report, duration_scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(body: &str) -> SummaryReport {
        let text = format!("preamble,1,x\nname,val,desc\n{body}");
        SummaryReport::from_reader(text.as_bytes(), Path::new("summary.csv")).unwrap()
    }

    const FULL: &str = "t_mean,100.0,reference\n\
                        period,2.5,period\n\
                        p_err,0.001,period error\n\
                        t_1,0.5,offset 1\n\
                        t_1_err,0.01,\n\
                        t_1_1,0.4,first contact 1\n\
                        t_1_2,0.6,last contact 1\n\
                        t_2,1.75,offset 2\n\
                        t_2_1,1.7,first contact 2\n\
                        t_2_2,1.8,last contact 2\n";

    #[test]
    fn missing_error_defaults_to_zero() {
        let r = report("t_mean,100.0,reference\n");
        assert_eq!(read_value(&r, "t_mean", None), Some(Measurement::new(100.0, 0.0)));
    }

    #[test]
    fn zero_value_is_present_not_missing() {
        let r = report("t_1,0.0,offset\n");
        assert_eq!(read_value(&r, "t_1", None), Some(Measurement::exact(0.0)));
        assert_eq!(read_value(&r, "t_2", None), None);
    }

    #[test]
    fn period_uses_irregular_error_key() {
        let eph = parse_ephemeris(&report(FULL), 1.0);
        let period = eph.period.unwrap();
        assert_eq!(period.value, 2.5);
        assert_eq!(period.error, 0.001);
    }

    #[test]
    fn full_report_yields_two_eclipses() {
        let eph = parse_ephemeris(&report(FULL), 1.0);
        assert!(eph.warnings.is_empty());
        assert_eq!(eph.eclipses.len(), 2);
        assert_eq!(eph.eclipses[0].index, 1);
        assert!((eph.eclipses[0].time.value - 100.5).abs() < 1e-12);
        assert!((eph.eclipses[0].time.error - 0.01).abs() < 1e-12);
        assert!((eph.eclipses[0].duration.value - 0.2).abs() < 1e-12);
        assert!((eph.eclipses[1].time.value - 101.75).abs() < 1e-12);
    }

    #[test]
    fn missing_contact_point_drops_that_eclipse_with_warning() {
        let body = "t_mean,100.0,\nt_1,0.5,\nt_1_2,0.6,\nt_2,1.75,\nt_2_1,1.7,\nt_2_2,1.8,\n";
        let eph = parse_ephemeris(&report(body), 1.0);
        assert_eq!(eph.eclipses.len(), 1);
        assert_eq!(eph.eclipses[0].index, 2);
        assert_eq!(
            eph.warnings,
            vec![EphemerisWarning::IncompleteEclipse {
                index: 1,
                missing: vec!["t_1_1".to_string()],
            }]
        );
    }

    #[test]
    fn missing_reference_time_yields_no_eclipses() {
        let body = "period,2.5,\nt_1,0.5,\nt_1_1,0.4,\nt_1_2,0.6,\n";
        let eph = parse_ephemeris(&report(body), 1.0);
        assert!(eph.reference_time.is_none());
        assert!(eph.eclipses.is_empty());
        assert_eq!(eph.period.map(|p| p.value), Some(2.5));
        assert_eq!(eph.warnings, vec![EphemerisWarning::MissingReferenceTime]);
    }

    #[test]
    fn duration_scale_multiplies_every_duration() {
        let eph = parse_ephemeris(&report(FULL), 1.5);
        assert!((eph.eclipses[0].duration.value - 0.3).abs() < 1e-12);
        assert!((eph.eclipses[1].duration.value - 0.15).abs() < 1e-12);
    }

    #[test]
    fn zero_duration_is_a_warning_not_an_error() {
        let body = "t_mean,100.0,\nt_1,0.5,\nt_1_1,0.4,\nt_1_2,0.4,\n";
        let eph = parse_ephemeris(&report(body), 1.0);
        assert_eq!(eph.eclipses.len(), 1);
        assert!(eph.warnings.contains(&EphemerisWarning::ZeroDuration { index: 1 }));
    }

    #[test]
    fn absent_file_is_distinct_from_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_ephemeris(&dir.path().join("x_analysis_summary.csv"), 1.0);
        assert!(matches!(missing, Err(PipelineError::MissingInput { .. })));

        let path = dir.path().join("empty_analysis_summary.csv");
        std::fs::write(&path, "a,b,c\nname,val,desc\n").unwrap();
        let eph = load_ephemeris(&path, 1.0).unwrap();
        assert!(eph.eclipses.is_empty());
    }
}
