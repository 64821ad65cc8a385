//! Target catalogue ingest.
//!
//! The catalogue is a CSV with a header row. Three columns are interpreted:
//! - the index column (star name, `Star` by default)
//! - the TIC column (numeric archive identifier)
//! - the period column (a-priori orbital period in days; may be blank or `nan`)
//!
//! Every other column is carried through as text so it can be used for sorting.
//! Rows with an unusable TIC are skipped and reported, not fatal.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs::File;

use csv::StringRecord;
use tracing::warn;

use crate::domain::{PipelineConfig, TargetRow};
use crate::error::PipelineError;

/// A row-level problem found while reading the catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub name: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Catalogue {
    /// Targets to process, filtered and sorted as configured.
    pub rows: Vec<TargetRow>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    /// Requested targets that do not appear in the catalogue.
    pub unknown_targets: Vec<String>,
}

/// Sort direction parsed from `--sort-by [+|-]COL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn parse(arg: &str) -> Self {
        let arg = arg.trim();
        match arg.strip_prefix('-') {
            Some(col) => Self {
                column: col.trim().to_string(),
                descending: true,
            },
            None => Self {
                column: arg.trim_start_matches('+').trim().to_string(),
                descending: false,
            },
        }
    }
}

/// Load the catalogue named by `config.catalogue_path`.
pub fn load_catalogue(config: &PipelineConfig) -> Result<Catalogue, PipelineError> {
    let path = &config.catalogue_path;
    if !path.exists() {
        return Err(PipelineError::MissingInput {
            what: "catalogue",
            path: path.clone(),
        });
    }
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::csv(path, e))?
        .clone();
    let header_map = build_header_map(&headers);

    let column = |name: &str| -> Result<usize, PipelineError> {
        header_map
            .get(name)
            .copied()
            .ok_or_else(|| PipelineError::UnknownColumn {
                column: name.to_string(),
                path: path.clone(),
            })
    };
    let index_idx = column(&config.index_col)?;
    let tic_idx = column(&config.tic_col)?;
    let period_idx = header_map.get(config.period_col.as_str()).copied();
    let sort_key = config.sort_by.as_deref().map(SortKey::parse);
    let sort_idx = sort_key.as_ref().map(|k| column(&k.column)).transpose()?;

    let mut keyed: Vec<(TargetRow, Option<String>)> = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // header is line 1
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    name: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let name = cell(&record, index_idx).unwrap_or_default().to_string();
        let tic = match cell(&record, tic_idx).map(parse_tic) {
            Some(Some(tic)) => tic,
            other => {
                let message = match other {
                    None => format!("missing value in column `{}`", config.tic_col),
                    _ => format!("invalid value in column `{}`", config.tic_col),
                };
                row_errors.push(RowError {
                    line,
                    name: Some(name),
                    message,
                });
                continue;
            }
        };
        let period = period_idx.and_then(|i| cell(&record, i)).and_then(parse_opt_f64);

        let extra = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index_idx && *i != tic_idx && Some(*i) != period_idx)
            .map(|(i, h)| (h.to_string(), record.get(i).unwrap_or_default().to_string()))
            .collect();

        let sort_value = sort_idx.and_then(|i| cell(&record, i)).map(str::to_string);
        keyed.push((
            TargetRow {
                name,
                tic,
                period,
                extra,
            },
            sort_value,
        ));
    }

    for e in &row_errors {
        warn!(line = e.line, name = ?e.name, "skipping catalogue row: {}", e.message);
    }

    let mut unknown_targets = Vec::new();
    if !config.targets.is_empty() {
        keyed.retain(|(row, _)| config.targets.iter().any(|t| t == &row.name));
        for t in &config.targets {
            if !keyed.iter().any(|(row, _)| &row.name == t) {
                warn!(target_name = %t, "requested target is not in the catalogue");
                unknown_targets.push(t.clone());
            }
        }
    }

    if let Some(key) = &sort_key {
        keyed.sort_by(|(_, a), (_, b)| compare_cells(a.as_deref(), b.as_deref(), key.descending));
    }

    Ok(Catalogue {
        rows: keyed.into_iter().map(|(row, _)| row).collect(),
        row_errors,
        rows_read,
        unknown_targets,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<&str, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.trim().trim_start_matches('\u{feff}'), idx))
        .collect()
}

fn cell(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

/// TICs are integers but spreadsheet exports sometimes write them as `123.0`.
fn parse_tic(s: &str) -> Option<u64> {
    if let Ok(v) = s.parse::<u64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}

fn parse_opt_f64(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Missing cells sort last in either direction; numbers compare numerically.
fn compare_cells(a: Option<&str>, b: Option<&str>, descending: bool) -> Ordering {
    let a = a.filter(|s| !s.eq_ignore_ascii_case("nan"));
    let b = b.filter(|s| !s.eq_ignore_ascii_case("nan"));
    let ord = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(a), Some(b)) => match (a.parse::<f64>(), b.parse::<f64>()) {
            (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.cmp(b),
        },
    };
    if descending { ord.reverse() } else { ord }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_catalogue(contents: &str) -> (tempfile::TempDir, PipelineConfig) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("targets.csv");
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        let config = PipelineConfig::new(&path, dir.path().join("catalogue"));
        (dir, config)
    }

    const CSV: &str = "\
Star,TIC,Period,Vmag
V* AN Cam,103098373,20.998,10.2
V* V455 Aur,1716252,,7.4
V* ZZ Boo,357358259,nan,6.8
HD 1234,12.0,4.5,11.0
";

    #[test]
    fn reads_rows_and_blank_periods() {
        let (_dir, config) = write_catalogue(CSV);
        let cat = load_catalogue(&config).unwrap();
        assert_eq!(cat.rows.len(), 4);
        assert_eq!(cat.rows[0].name, "V* AN Cam");
        assert_eq!(cat.rows[0].tic, 103098373);
        assert_eq!(cat.rows[0].period, Some(20.998));
        assert_eq!(cat.rows[1].period, None);
        assert_eq!(cat.rows[2].period, None);
        assert_eq!(cat.rows[3].tic, 12);
        assert_eq!(cat.rows[0].extra, vec![("Vmag".to_string(), "10.2".to_string())]);
    }

    #[test]
    fn filters_and_reports_unknown_targets() {
        let (_dir, mut config) = write_catalogue(CSV);
        config.targets = vec!["V* ZZ Boo".to_string(), "Nope".to_string()];
        let cat = load_catalogue(&config).unwrap();
        assert_eq!(cat.rows.len(), 1);
        assert_eq!(cat.rows[0].tic, 357358259);
        assert_eq!(cat.unknown_targets, vec!["Nope".to_string()]);
    }

    #[test]
    fn sorts_numerically_with_missing_last() {
        let (_dir, mut config) = write_catalogue(CSV);
        config.sort_by = Some("-Period".to_string());
        let names: Vec<String> = load_catalogue(&config)
            .unwrap()
            .rows
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["V* AN Cam", "HD 1234", "V* V455 Aur", "V* ZZ Boo"]);

        config.sort_by = Some("+Vmag".to_string());
        let first = load_catalogue(&config).unwrap().rows[0].name.clone();
        assert_eq!(first, "V* ZZ Boo");
    }

    #[test]
    fn bad_tic_rows_are_skipped() {
        let (_dir, config) = write_catalogue("Star,TIC,Period\nA,abc,1.0\nB,,2.0\nC,7,3.0\n");
        let cat = load_catalogue(&config).unwrap();
        assert_eq!(cat.rows.len(), 1);
        assert_eq!(cat.rows_read, 3);
        assert_eq!(cat.row_errors.len(), 2);
        assert_eq!(cat.row_errors[0].line, 2);
    }

    #[test]
    fn missing_catalogue_is_missing_input() {
        let config = PipelineConfig::new("/nonexistent/targets.csv", "catalogue");
        let err = load_catalogue(&config).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput { what: "catalogue", .. }));
    }

    #[test]
    fn unknown_sort_column_is_an_error() {
        let (_dir, mut config) = write_catalogue(CSV);
        config.sort_by = Some("Teff".to_string());
        let err = load_catalogue(&config).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownColumn { .. }));
    }

    #[test]
    fn sort_key_parsing() {
        assert_eq!(
            SortKey::parse("-Period"),
            SortKey {
                column: "Period".to_string(),
                descending: true
            }
        );
        assert!(!SortKey::parse("+Vmag").descending);
        assert_eq!(SortKey::parse("Vmag").column, "Vmag");
    }
}
