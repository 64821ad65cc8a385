//! Row-typed reader for the fitting engine's analysis summary.
//!
//! The summary is a fixed external format:
//!
//! ```text
//! <preamble row 1>
//! <preamble row 2>
//! name,val,desc
//! name,val,desc
//! ...
//! ```
//!
//! The two preamble rows are skipped unconditionally. Every remaining row must
//! have exactly three columns; anything else is reported with its line number.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::PipelineError;

/// Rows before the `name,val,desc` body.
pub const PREAMBLE_ROWS: usize = 2;

/// One `name,val,desc` row.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub name: String,
    pub val: String,
    pub desc: String,
}

impl SummaryRow {
    /// The value as a finite number; empty, `nan` and non-numeric text are `None`.
    pub fn number(&self) -> Option<f64> {
        self.val.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

/// Parsed summary keyed by parameter name.
#[derive(Debug, Clone, Default)]
pub struct SummaryReport {
    rows: Vec<SummaryRow>,
    index: HashMap<String, usize>,
}

impl SummaryReport {
    /// Read a summary file; a missing file is `MissingInput`.
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::MissingInput {
                what: "analysis summary",
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
        Self::from_reader(file, path)
    }

    /// Parse summary rows from any reader; `source` is only used in errors.
    pub fn from_reader<R: Read>(rdr: R, source: &Path) -> Result<Self, PipelineError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(rdr);

        let mut report = SummaryReport::default();
        for (idx, result) in reader.records().enumerate() {
            let record = result.map_err(|e| PipelineError::csv(source, e))?;
            if idx < PREAMBLE_ROWS {
                continue;
            }
            let line = record.position().map(|p| p.line() as usize).unwrap_or(idx + 1);
            if record.len() != 3 {
                return Err(PipelineError::MalformedReport {
                    path: source.to_path_buf(),
                    line,
                    message: format!("expected 3 columns (name,val,desc), found {}", record.len()),
                });
            }
            report.push(SummaryRow {
                name: record[0].to_string(),
                val: record[1].to_string(),
                desc: record[2].to_string(),
            });
        }
        Ok(report)
    }

    fn push(&mut self, row: SummaryRow) {
        // First occurrence wins for duplicated names.
        self.index.entry(row.name.clone()).or_insert(self.rows.len());
        self.rows.push(row);
    }

    pub fn get(&self, name: &str) -> Option<&SummaryRow> {
        self.index.get(name).map(|&i| &self.rows[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<SummaryReport, PipelineError> {
        SummaryReport::from_reader(text.as_bytes(), Path::new("summary.csv"))
    }

    #[test]
    fn skips_preamble_and_indexes_rows() {
        let report = parse(
            "tic,123,target id\n\
             header,val,desc\n\
             t_mean,1500.25,mean time\n\
             period,3.5,\"orbital period, days\"\n",
        )
        .unwrap();
        assert_eq!(report.get("t_mean").unwrap().number(), Some(1500.25));
        assert_eq!(report.get("period").unwrap().desc, "orbital period, days");
        assert!(report.get("tic").is_none());
        assert!(report.get("header").is_none());
    }

    #[test]
    fn rejects_rows_with_wrong_column_count() {
        let err = parse("a\nb\nt_mean,1.0\n").unwrap_err();
        match err {
            PipelineError::MalformedReport { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nan_and_text_values_are_not_numbers() {
        let report = parse("a\nb\nt_1,nan,offset\nflag,True,text\n").unwrap();
        assert_eq!(report.get("t_1").unwrap().number(), None);
        assert_eq!(report.get("flag").unwrap().number(), None);
    }

    #[test]
    fn missing_file_is_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = SummaryReport::open(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput { .. }));
    }
}
