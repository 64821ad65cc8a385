use std::process::ExitCode;

use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the batch summary.
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    match ebflat::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
