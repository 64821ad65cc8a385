//! Echo the fitting engine's free-text analysis log.

use std::fs;
use std::path::Path;

use tracing::info;

/// Log every line of `<tic>.log` at info level, or a note when it is absent.
///
/// Returns the number of lines echoed. Read failures are logged, never fatal.
pub fn echo_analysis_log(path: &Path, target: &str) -> usize {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            info!(target_name = %target, path = %path.display(), "analysis log not found ({e})");
            return 0;
        }
    };
    info!(target_name = %target, "analysis log:");
    let mut n = 0;
    for line in text.lines().map(str::trim) {
        info!(target_name = %target, "  {line}");
        n += 1;
    }
    n
}
