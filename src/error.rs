use std::path::PathBuf;

/// Application-level error carrying the process exit code.
///
/// Exit codes:
/// - `2`: bad input or configuration (missing catalogue, unknown engine, ...)
/// - `4`: internal or I/O failure
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures raised by the per-target pipeline stages.
///
/// Incomplete ephemerides and empty epoch selections are deliberately absent:
/// they are recoverable conditions reported as warnings / target states.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{what} not found: '{}'", path.display())]
    MissingInput { what: &'static str, path: PathBuf },

    #[error("column `{column}` not found in '{}'", path.display())]
    UnknownColumn { column: String, path: PathBuf },

    #[error("malformed analysis summary '{}' (line {line}): {message}", path.display())]
    MalformedReport {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("malformed epoch file '{}': {message}", path.display())]
    MalformedEpoch { path: PathBuf, message: String },

    #[error("sample count mismatch: light curve has {expected} samples, mask has {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("invalid orbital period for eclipse masking: {0}")]
    InvalidPeriod(String),

    #[error("fitting engine failed for TIC {tic}: {message}")]
    ExternalEngine { tic: u64, message: String },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error in '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to render plot '{}': {message}", path.display())]
    Plot { path: PathBuf, message: String },
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let exit_code = match err {
            PipelineError::MissingInput { .. }
            | PipelineError::UnknownColumn { .. }
            | PipelineError::MalformedReport { .. }
            | PipelineError::MalformedEpoch { .. }
            | PipelineError::InvalidPeriod(_) => 2,
            _ => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}
