//! External model-fitting engine.
//!
//! The engine is a separate program: given a target, an ordered list of epoch
//! files and a period estimate it writes `<save_dir>/<tic>_analysis/` containing
//! the analysis summary CSV and a free-text log. It is expected to resume or
//! no-op when re-invoked with unchanged inputs and `overwrite` unset.
//!
//! The driver only depends on the `FittingEngine` trait so tests (and future
//! in-process engines) can stand in for the real program.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::error::PipelineError;

/// Number of trailing stderr lines kept in failure messages.
const STDERR_TAIL_LINES: usize = 20;

/// Environment variable naming the engine program (also read from `.env`).
pub const ENGINE_ENV_VAR: &str = "EBFLAT_ENGINE";

/// One analysis request for a single target.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRequest {
    pub target: String,
    pub tic: u64,
    /// Selected epoch files in sector order.
    pub epoch_files: Vec<PathBuf>,
    pub period: Option<f64>,
    pub save_dir: PathBuf,
    pub overwrite: bool,
}

impl EngineRequest {
    /// Command-line arguments describing this request.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--tic".to_string(),
            self.tic.to_string(),
            "--data-id".to_string(),
            self.target.clone(),
            "--save-dir".to_string(),
            self.save_dir.display().to_string(),
        ];
        if let Some(p) = self.period {
            args.push("--period".to_string());
            args.push(p.to_string());
        }
        if self.overwrite {
            args.push("--overwrite".to_string());
        }
        args.push("--".to_string());
        args.extend(self.epoch_files.iter().map(|f| f.display().to_string()));
        args
    }
}

/// Something that can analyse a target's selected epochs.
pub trait FittingEngine: Send + Sync {
    fn analyse(&self, request: &EngineRequest) -> Result<(), PipelineError>;
}

/// Runs an external program per request.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Arguments placed before the request arguments (e.g. a script path).
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Engine from `EBFLAT_ENGINE` (whitespace separated program and leading args).
    pub fn from_env() -> Option<Self> {
        dotenvy::dotenv().ok();
        let value = std::env::var(ENGINE_ENV_VAR).ok()?;
        let mut parts = value.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program).with_args(parts.collect()))
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    /// Human-readable command line for a request (used by `--simulate`).
    pub fn describe(&self, request: &EngineRequest) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.extra_args.iter().cloned())
            .chain(request.to_args())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FittingEngine for CommandEngine {
    fn analyse(&self, request: &EngineRequest) -> Result<(), PipelineError> {
        debug!(command = %self.describe(request), "invoking fitting engine");
        let output = Command::new(&self.program)
            .args(&self.extra_args)
            .args(request.to_args())
            .output()
            .map_err(|e| PipelineError::ExternalEngine {
                tic: request.tic,
                message: format!("failed to start '{}': {e}", self.program.display()),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().collect();
        let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
        Err(PipelineError::ExternalEngine {
            tic: request.tic,
            message: format!("exited with {}: {tail}", output.status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> EngineRequest {
        EngineRequest {
            target: "V* AN Cam".to_string(),
            tic: 103098373,
            epoch_files: vec![PathBuf::from("a_lc.json"), PathBuf::from("b_lc.json")],
            period: Some(20.998),
            save_dir: PathBuf::from("catalogue/analysis"),
            overwrite: false,
        }
    }

    #[test]
    fn request_arguments_end_with_epoch_files() {
        let args = request().to_args();
        assert_eq!(&args[..2], &["--tic".to_string(), "103098373".to_string()]);
        assert!(args.contains(&"--period".to_string()));
        assert!(!args.contains(&"--overwrite".to_string()));
        let sep = args.iter().position(|a| a == "--").unwrap();
        assert_eq!(&args[sep + 1..], &["a_lc.json".to_string(), "b_lc.json".to_string()]);
    }

    #[test]
    fn describe_includes_program_and_leading_args() {
        let engine = CommandEngine::new("python").with_args(vec!["run_fit.py".to_string()]);
        let line = engine.describe(&request());
        assert!(line.starts_with("python run_fit.py --tic 103098373"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_is_an_engine_error() {
        let engine = CommandEngine::new("false");
        let err = engine.analyse(&request()).unwrap_err();
        assert!(matches!(err, PipelineError::ExternalEngine { tic: 103098373, .. }));
    }

    #[test]
    fn missing_program_is_an_engine_error() {
        let engine = CommandEngine::new("/nonexistent/ebflat-engine");
        let err = engine.analyse(&request()).unwrap_err();
        assert!(matches!(err, PipelineError::ExternalEngine { .. }));
    }
}
