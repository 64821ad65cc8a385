//! Enumerate the epoch files downloaded for a target.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::EpochRecord;
use crate::error::PipelineError;
use crate::io::lightcurve::{EPOCH_FILE_SUFFIX, read_epoch_header};

/// All epoch files below `dir` (recursively), sorted by path.
pub fn find_epoch_files(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut files = Vec::new();
    if dir.is_dir() {
        collect_epoch_files(dir, &mut files)?;
    }
    files.sort();
    Ok(files)
}

fn collect_epoch_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), PipelineError> {
    for entry in fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))? {
        let path = entry.map_err(|e| PipelineError::io(dir, e))?.path();
        if path.is_dir() {
            collect_epoch_files(&path, files)?;
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(EPOCH_FILE_SUFFIX))
        {
            files.push(path);
        }
    }
    Ok(())
}

/// Epoch records for every readable epoch file below `dir`.
///
/// A missing directory yields no epochs. Files whose header cannot be read are
/// skipped with a warning rather than failing the target.
pub fn scan_epochs(dir: &Path) -> Result<Vec<EpochRecord>, PipelineError> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "download directory not found");
        return Ok(Vec::new());
    }

    let mut epochs = Vec::new();
    for path in find_epoch_files(dir)? {
        match read_epoch_header(&path) {
            Ok(header) => {
                debug!(
                    sector = header.sector,
                    pdc_tot = header.pdc_tot,
                    pdc_noi = header.pdc_noi,
                    "found epoch file"
                );
                epochs.push(EpochRecord {
                    sector: header.sector,
                    path,
                    total_goodness: header.pdc_tot,
                    noise: header.pdc_noi,
                });
            }
            Err(e) => warn!("skipping unreadable epoch file: {e}"),
        }
    }
    Ok(epochs)
}
